//! Types for building FocusLynx commands.
//!
//! Every command is a single ASCII string of the form `<F{channel}{body}>`,
//! where `{channel}` is exactly one decimal digit. Commands that carry a step
//! count render it zero-padded to six digits.
//!
//! ```
//! # use focuslynx::command::{Channel, Command, Steps};
//! # fn wrapper() -> Result<(), focuslynx::error::Error> {
//! let cmd = Command::MoveAbsolute(Channel::new(0)?, Steps::new(12345)?);
//! assert_eq!(cmd.to_string(), "<F0MA012345>");
//! assert_eq!("<F0MA012345>".parse::<Command>()?, cmd);
//! # Ok(())
//! # }
//! ```

use crate::error::{CommandParseError, InvalidChannelError, InvalidStepsError};
use std::{fmt, io, str::FromStr};

/// The number of digits in the step field of a command.
const STEP_DIGITS: usize = 6;

/// A focuser channel on the controller.
///
/// The command grammar allows any single decimal digit, but only channels 0
/// and 1 correspond to focuser connections on the hardware. What the
/// controller does with other channels is undefined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
	/// The largest channel number the command grammar can express.
	pub const MAX: u8 = 9;

	/// Create a channel, checking that it fits in a single digit.
	pub const fn new(channel: u8) -> Result<Channel, InvalidChannelError> {
		if channel <= Channel::MAX {
			Ok(Channel(channel))
		} else {
			Err(InvalidChannelError::new(channel))
		}
	}

	/// Get the channel number.
	pub const fn get(self) -> u8 {
		self.0
	}
}

impl TryFrom<u8> for Channel {
	type Error = InvalidChannelError;
	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Channel::new(value)
	}
}

impl From<Channel> for u8 {
	fn from(channel: Channel) -> Self {
		channel.0
	}
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// An absolute step count, as sent in move and sync commands.
///
/// The value is limited only by the width of the command's step field.
/// Callers are responsible for keeping it within the focuser's travel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Steps(u32);

impl Steps {
	/// The smallest step count.
	pub const ZERO: Steps = Steps(0);
	/// The largest step count the command grammar can express.
	pub const MAX: Steps = Steps(999_999);

	/// Create a step count, checking that it fits in six digits.
	pub const fn new(steps: u32) -> Result<Steps, InvalidStepsError> {
		if steps <= Steps::MAX.0 {
			Ok(Steps(steps))
		} else {
			Err(InvalidStepsError::new(steps))
		}
	}

	/// Get the step count.
	pub const fn get(self) -> u32 {
		self.0
	}
}

impl TryFrom<u32> for Steps {
	type Error = InvalidStepsError;
	fn try_from(value: u32) -> Result<Self, Self::Error> {
		Steps::new(value)
	}
}

impl From<Steps> for u32 {
	fn from(steps: Steps) -> Self {
		steps.0
	}
}

impl fmt::Display for Steps {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:0width$}", self.0, width = STEP_DIGITS)
	}
}

/// A command that can be sent to the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
	/// `<F{c}GETCONFIG>`: read the channel's configuration.
	GetConfig(Channel),
	/// `<F{c}GETSTATUS>`: read the channel's status.
	GetStatus(Channel),
	/// `<F{c}MA{steps}>`: move the focuser to an absolute step position.
	MoveAbsolute(Channel, Steps),
	/// `<F{c}HALT>`: stop any motion.
	Halt(Channel),
	/// `<F{c}SCCP{steps}>`: redefine the focuser's current position.
	SyncPosition(Channel, Steps),
}

impl Command {
	/// The channel the command is addressed to.
	pub fn channel(&self) -> Channel {
		match *self {
			Command::GetConfig(channel)
			| Command::GetStatus(channel)
			| Command::MoveAbsolute(channel, _)
			| Command::Halt(channel)
			| Command::SyncPosition(channel, _) => channel,
		}
	}

	/// The step argument of the command, if it has one.
	pub fn steps(&self) -> Option<Steps> {
		match *self {
			Command::MoveAbsolute(_, steps) | Command::SyncPosition(_, steps) => Some(steps),
			Command::GetConfig(_) | Command::GetStatus(_) | Command::Halt(_) => None,
		}
	}

	/// Write the encoded command into the specified writer.
	pub fn write_into<W: io::Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
		write!(writer, "{self}")
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Command::GetConfig(channel) => write!(f, "<F{channel}GETCONFIG>"),
			Command::GetStatus(channel) => write!(f, "<F{channel}GETSTATUS>"),
			Command::MoveAbsolute(channel, steps) => write!(f, "<F{channel}MA{steps}>"),
			Command::Halt(channel) => write!(f, "<F{channel}HALT>"),
			Command::SyncPosition(channel, steps) => write!(f, "<F{channel}SCCP{steps}>"),
		}
	}
}

/// Parse the six digit step field of a command.
fn parse_steps(field: &str) -> Option<Steps> {
	if field.len() != STEP_DIGITS || !field.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	field.parse().ok().and_then(|steps| Steps::new(steps).ok())
}

impl FromStr for Command {
	type Err = CommandParseError;

	/// Parse a command in exactly the form [`Display`](fmt::Display) renders it.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let parse = || -> Option<Command> {
			let inner = s.strip_prefix("<F")?.strip_suffix('>')?;
			let digit = *inner.as_bytes().first()?;
			if !digit.is_ascii_digit() {
				return None;
			}
			let channel = Channel(digit - b'0');
			let body = &inner[1..];
			match body {
				"GETCONFIG" => Some(Command::GetConfig(channel)),
				"GETSTATUS" => Some(Command::GetStatus(channel)),
				"HALT" => Some(Command::Halt(channel)),
				_ => {
					if let Some(field) = body.strip_prefix("MA") {
						Some(Command::MoveAbsolute(channel, parse_steps(field)?))
					} else if let Some(field) = body.strip_prefix("SCCP") {
						Some(Command::SyncPosition(channel, parse_steps(field)?))
					} else {
						None
					}
				}
			}
		};
		parse().ok_or_else(|| CommandParseError::new(s))
	}
}
