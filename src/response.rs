//! Typed results decoded from controller replies.

/// The configuration of a focuser channel, as reported by `<F{c}GETCONFIG>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelConfig {
	nickname: String,
	device_type: String,
	max_steps: u32,
}

impl ChannelConfig {
	/// Create a new `ChannelConfig`.
	pub fn new(nickname: String, device_type: String, max_steps: u32) -> Self {
		ChannelConfig {
			nickname,
			device_type,
			max_steps,
		}
	}

	/// The user assigned name of the focuser.
	pub fn nickname(&self) -> &str {
		&self.nickname
	}

	/// The code identifying the kind of focuser attached to the channel.
	pub fn device_type(&self) -> &str {
		&self.device_type
	}

	/// The largest position the focuser can travel to. Always greater than zero.
	pub fn max_steps(&self) -> u32 {
		self.max_steps
	}
}

/// The state of a focuser channel, as reported by `<F{c}GETSTATUS>`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChannelStatus {
	temperature: f64,
	current_steps: i32,
	target_steps: i32,
	is_moving: bool,
}

impl ChannelStatus {
	/// Create a new `ChannelStatus`.
	pub fn new(temperature: f64, current_steps: i32, target_steps: i32, is_moving: bool) -> Self {
		ChannelStatus {
			temperature,
			current_steps,
			target_steps,
			is_moving,
		}
	}

	/// The focuser's temperature probe reading, in degrees Celsius.
	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	/// The focuser's current position.
	pub fn current_steps(&self) -> i32 {
		self.current_steps
	}

	/// The position the focuser is moving to, or last moved to.
	pub fn target_steps(&self) -> i32 {
		self.target_steps
	}

	/// Whether the focuser is moving.
	pub fn is_moving(&self) -> bool {
		self.is_moving
	}
}
