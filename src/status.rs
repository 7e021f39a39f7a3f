//! Status codes and labels for reporting focuser state to people.
//!
//! Nothing here is part of the wire protocol. These are the codes and labels
//! a focuser daemon reports to its clients, optionally decorated with ANSI
//! terminal formatting.

use std::fmt;

const FMT_RED: &str = "\u{1b}[91m";
const FMT_YELLOW: &str = "\u{1b}[93m";
const FMT_BOLD: &str = "\u{1b}[1m";
const FMT_CLEAR: &str = "\u{1b}[0m";

/// The label used for codes that do not correspond to a status.
const UNKNOWN_LABEL: &str = "UNKNOWN";

/// The state of a focuser channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FocuserStatus {
	/// The controller cannot be reached, or nothing is attached to the channel.
	Disconnected,
	/// The last exchange with the controller failed.
	Error,
	/// The focuser is stationary.
	Idle,
	/// The focuser is moving.
	Moving,
}

impl FocuserStatus {
	/// Get the status with the specified numeric code, if there is one.
	pub fn from_code(code: i32) -> Option<FocuserStatus> {
		match code {
			0 => Some(FocuserStatus::Disconnected),
			1 => Some(FocuserStatus::Error),
			2 => Some(FocuserStatus::Idle),
			3 => Some(FocuserStatus::Moving),
			_ => None,
		}
	}

	/// The numeric code of the status.
	pub fn code(self) -> i32 {
		match self {
			FocuserStatus::Disconnected => 0,
			FocuserStatus::Error => 1,
			FocuserStatus::Idle => 2,
			FocuserStatus::Moving => 3,
		}
	}

	/// A short upper case label, such as `IDLE`.
	pub fn label(self) -> &'static str {
		match self {
			FocuserStatus::Disconnected => "DISCONNECTED",
			FocuserStatus::Error => "ERROR",
			FocuserStatus::Idle => "IDLE",
			FocuserStatus::Moving => "MOVING",
		}
	}

	/// The label wrapped in ANSI terminal formatting codes.
	pub fn formatted_label(self) -> String {
		let format = match self {
			FocuserStatus::Disconnected => format!("{FMT_BOLD}{FMT_RED}"),
			FocuserStatus::Error | FocuserStatus::Idle => FMT_BOLD.to_string(),
			FocuserStatus::Moving => format!("{FMT_BOLD}{FMT_YELLOW}"),
		};
		format!("{format}{}{FMT_CLEAR}", self.label())
	}

	/// The label for a raw status code, or `UNKNOWN` if it is not a valid code.
	///
	/// If `formatting` is true the label is wrapped in ANSI terminal
	/// formatting codes.
	pub fn label_for_code(code: i32, formatting: bool) -> String {
		match (FocuserStatus::from_code(code), formatting) {
			(Some(status), true) => status.formatted_label(),
			(Some(status), false) => status.label().to_string(),
			(None, true) => format!("{FMT_RED}{FMT_BOLD}{UNKNOWN_LABEL}{FMT_CLEAR}"),
			(None, false) => UNKNOWN_LABEL.to_string(),
		}
	}
}

impl fmt::Display for FocuserStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// The outcome of a request made to a focuser daemon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandStatus {
	/// The request succeeded.
	Succeeded,
	/// The request failed.
	Failed,
	/// Another request is already running.
	Blocked,
	/// The request was not accepted from the client's address.
	InvalidControlIp,
	/// The channel does not exist.
	InvalidChannel,
	/// The channel is disconnected or in an error state.
	ChannelNotAvailable,
	/// The requested position is outside the channel's soft limits.
	PositionOutsideLimits,
	/// The request was interrupted by the user.
	TerminatedByUser,
	/// The daemon could not be reached.
	DaemonUnavailable,
}

impl CommandStatus {
	const ALL: [CommandStatus; 9] = [
		CommandStatus::Succeeded,
		CommandStatus::Failed,
		CommandStatus::Blocked,
		CommandStatus::InvalidControlIp,
		CommandStatus::InvalidChannel,
		CommandStatus::ChannelNotAvailable,
		CommandStatus::PositionOutsideLimits,
		CommandStatus::TerminatedByUser,
		CommandStatus::DaemonUnavailable,
	];

	/// Get the status with the specified numeric code, if there is one.
	pub fn from_code(code: i32) -> Option<CommandStatus> {
		CommandStatus::ALL
			.into_iter()
			.find(|status| status.code() == code)
	}

	/// The numeric code of the status.
	///
	/// Client side failures have negative codes.
	pub fn code(self) -> i32 {
		match self {
			CommandStatus::Succeeded => 0,
			CommandStatus::Failed => 1,
			CommandStatus::Blocked => 2,
			CommandStatus::InvalidControlIp => 3,
			CommandStatus::InvalidChannel => 4,
			CommandStatus::ChannelNotAvailable => 5,
			CommandStatus::PositionOutsideLimits => 6,
			CommandStatus::TerminatedByUser => -100,
			CommandStatus::DaemonUnavailable => -101,
		}
	}

	/// A human readable description of the failure, or `None` for
	/// [`Succeeded`](CommandStatus::Succeeded).
	pub fn message(self) -> Option<&'static str> {
		match self {
			CommandStatus::Succeeded => None,
			CommandStatus::Failed => Some("error: command failed"),
			CommandStatus::Blocked => Some("error: another command is already running"),
			CommandStatus::InvalidControlIp => Some("error: command not accepted from this IP"),
			CommandStatus::InvalidChannel => Some("error: invalid channel"),
			CommandStatus::ChannelNotAvailable => {
				Some("error: channel disconnected or in error state")
			}
			CommandStatus::PositionOutsideLimits => {
				Some("error: requested position outside channel range")
			}
			CommandStatus::TerminatedByUser => Some("error: terminated by user"),
			CommandStatus::DaemonUnavailable => {
				Some("error: unable to communicate with focus daemon")
			}
		}
	}

	/// A human readable description of a raw failure code.
	///
	/// Codes without a description, including success, produce
	/// `error: Unknown error code {code}`.
	pub fn message_for_code(code: i32) -> String {
		CommandStatus::from_code(code)
			.and_then(CommandStatus::message)
			.map_or_else(
				|| format!("error: Unknown error code {code}"),
				str::to_string,
			)
	}
}
