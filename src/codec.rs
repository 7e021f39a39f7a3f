//! Command/reply exchanges understood by the controller.
//!
//! Each exchange knows the [`Command`] it sends and how to decode the reply
//! the firmware sends back. Every reply starts with a `!` acknowledgement
//! followed by a header line specific to the command. Replies are validated
//! line by line and the first line that does not match aborts the exchange
//! with a [`ProtocolViolationError`](crate::error::ProtocolViolationError).
//!
//! The number of lines each decoder skips is tied to the firmware revision,
//! so each count is kept next to the decoder that depends on it.
//!
//! Exchanges are normally run through the convenience methods on
//! [`Port`](crate::Port), but can also be passed to [`Port::run`](crate::Port::run).

use crate::{
	backend::Backend,
	command::{Channel, Command, Steps},
	error::Error,
	reply::Lines,
	response::{ChannelConfig, ChannelStatus},
};

/// A command and the decoder for its reply.
pub trait Exchange: private::Sealed {
	/// The result of a successful exchange.
	type Output;

	/// The command to send.
	fn command(&self) -> Command;

	/// Decode the complete reply to [`command`](Exchange::command).
	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<Self::Output, Error>;
}

/// Check the acknowledgement and header lines every reply starts with.
fn acknowledged<B: Backend>(lines: &mut Lines<'_, B>, header: &str) -> Result<(), Error> {
	lines.expect_exact("!")?;
	lines.expect_exact(header)
}

/// Read a channel's configuration (`<F{c}GETCONFIG>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConfigQuery(pub Channel);

impl Exchange for ConfigQuery {
	type Output = ChannelConfig;

	fn command(&self) -> Command {
		Command::GetConfig(self.0)
	}

	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<ChannelConfig, Error> {
		// The temperature compensation coefficient table.
		const TEMPERATURE_COEFFICIENT_LINES: usize = 6;
		// Backlash compensation size and LED brightness.
		const BACKLASH_AND_LED_LINES: usize = 2;

		acknowledged(lines, &format!("CONFIG{}", self.0))?;
		let nickname = lines.expect_prefixed("Nickname =")?.trimmed()?;
		let max_steps = lines
			.expect_prefixed("Max Pos  =")?
			.parse_with("positive integer", |value| {
				value.parse::<u32>().ok().filter(|&steps| steps > 0)
			})?;
		let device_type = lines.expect_prefixed("Dev Typ  =")?.trimmed()?;
		lines.expect_exact("TComp ON = 0")?;
		lines.skip(TEMPERATURE_COEFFICIENT_LINES)?;
		lines.expect_exact("BLC En   = 0")?;
		lines.skip(BACKLASH_AND_LED_LINES)?;
		lines.expect_exact("TC@Start = 0")?;
		lines.expect_exact("END")?;

		Ok(ChannelConfig::new(nickname, device_type, max_steps))
	}
}

/// Read a channel's status (`<F{c}GETSTATUS>`).
///
/// Decodes to `None` when no focuser is attached to the channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusQuery(pub Channel);

impl Exchange for StatusQuery {
	type Output = Option<ChannelStatus>;

	fn command(&self) -> Command {
		Command::GetStatus(self.0)
	}

	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<Option<ChannelStatus>, Error> {
		// The temperature reading of a channel with nothing attached.
		const NOT_PRESENT: &[u8] = b" NP";
		// Everything after the temperature line, up to and including `END`.
		const NOT_PRESENT_REMAINING_LINES: usize = 11;
		// IsHoming, IsHomed, FFDetect, TmpProbe, RemoteIO, Hnd Ctlr and Reverse.
		const UNUSED_FLAG_LINES: usize = 7;

		acknowledged(lines, &format!("STATUS{}", self.0))?;

		// The temperature probe stands in for the whole focuser: without one,
		// the rest of the reply carries nothing worth validating.
		let temperature = lines.expect_prefixed("Temp(C)  =")?;
		if temperature.raw() == NOT_PRESENT {
			lines.skip(NOT_PRESENT_REMAINING_LINES)?;
			log::debug!("channel {} reports no focuser present", self.0);
			return Ok(None);
		}
		let temperature: f64 = temperature.parse("decimal number")?;
		let current_steps: i32 = lines.expect_prefixed("Curr Pos =")?.parse("integer")?;
		let target_steps: i32 = lines.expect_prefixed("Targ Pos =")?.parse("integer")?;
		let is_moving: i64 = lines.expect_prefixed("IsMoving =")?.parse("integer")?;
		lines.skip(UNUSED_FLAG_LINES)?;
		lines.expect_exact("END")?;

		Ok(Some(ChannelStatus::new(
			temperature,
			current_steps,
			target_steps,
			is_moving == 1,
		)))
	}
}

/// Start a move to an absolute position (`<F{c}MA{steps}>`).
///
/// The reply only acknowledges the command; progress must be followed with
/// [`StatusQuery`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SetTargetSteps(pub Channel, pub Steps);

impl Exchange for SetTargetSteps {
	type Output = ();

	fn command(&self) -> Command {
		Command::MoveAbsolute(self.0, self.1)
	}

	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<(), Error> {
		acknowledged(lines, "M")
	}
}

/// Halt any motion (`<F{c}HALT>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Stop(pub Channel);

impl Exchange for Stop {
	type Output = ();

	fn command(&self) -> Command {
		Command::Halt(self.0)
	}

	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<(), Error> {
		acknowledged(lines, "HALTED")
	}
}

/// Redefine the focuser's current position (`<F{c}SCCP{steps}>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SyncPosition(pub Channel, pub Steps);

impl Exchange for SyncPosition {
	type Output = ();

	fn command(&self) -> Command {
		Command::SyncPosition(self.0, self.1)
	}

	fn decode<B: Backend>(&self, lines: &mut Lines<'_, B>) -> Result<(), Error> {
		acknowledged(lines, "SET")
	}
}

mod private {
	pub trait Sealed {}

	impl Sealed for super::ConfigQuery {}
	impl Sealed for super::StatusQuery {}
	impl Sealed for super::SetTargetSteps {}
	impl Sealed for super::Stop {}
	impl Sealed for super::SyncPosition {}
}
