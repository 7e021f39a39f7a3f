//! Demo: report each FocusLynx channel and move it to mid-travel.

use focuslynx::{
	command::{Channel, Steps},
	status::FocuserStatus,
	Port,
};
use simple_logger::SimpleLogger;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Enable logging
	SimpleLogger::new().init().unwrap();

	let path = std::env::args()
		.nth(1)
		.unwrap_or_else(|| "/dev/ttyUSB0".to_string());
	let mut port = Port::open_serial(&path)?;

	for channel in [Channel::new(0)?, Channel::new(1)?] {
		let Some(status) = port.channel_status(channel)? else {
			println!("channel {channel}: {}", FocuserStatus::Disconnected.formatted_label());
			continue;
		};
		// The configuration reply is long, so give it more time.
		let config = port
			.timeout_guard(Some(Duration::from_secs(5)))?
			.channel_config(channel)?;
		println!(
			"channel {channel}: {} ({}) at {} of {} steps, {:.2} C",
			config.nickname(),
			config.device_type(),
			status.current_steps(),
			config.max_steps(),
			status.temperature(),
		);

		// Move to the middle of travel and follow the move until it ends.
		port.set_target_steps(channel, Steps::new(config.max_steps() / 2)?)?;
		while let Some(status) = port.channel_status(channel)? {
			if !status.is_moving() {
				break;
			}
			println!(
				"channel {channel}: {} {} -> {}",
				FocuserStatus::Moving.formatted_label(),
				status.current_steps(),
				status.target_steps()
			);
			std::thread::sleep(Duration::from_millis(500));
		}
	}
	Ok(())
}
