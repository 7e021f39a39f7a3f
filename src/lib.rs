//! A library for communicating with Optec FocusLynx focuser controllers.
//!
//! The controller speaks a line oriented ASCII protocol over a serial (or
//! serial-over-TCP) connection. Each command, such as `<F0GETSTATUS>`, is
//! answered by a fixed sequence of `\n` terminated lines. A [`Port`] sends
//! the commands and validates every line of the reply in order, so a reply
//! that deviates from what the firmware is known to send is reported as a
//! [`ProtocolViolationError`](error::ProtocolViolationError) rather than
//! silently misread.
//!
//! ```rust
//! # use focuslynx::{command::{Channel, Steps}, Port};
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut port = Port::open_serial("/dev/ttyUSB0")?;
//! let channel = Channel::new(0)?;
//! port.set_target_steps(channel, Steps::new(50_000)?)?;
//! while port.channel_status(channel)?.is_some_and(|status| status.is_moving()) {
//!     std::thread::sleep(std::time::Duration::from_millis(500));
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(all(doc, feature = "doc_cfg"), feature(doc_cfg))]

pub mod backend;
pub mod codec;
pub mod command;
pub mod error;
pub mod port;
pub mod reply;
pub mod response;
pub mod status;
pub mod timeout_guard;

pub use port::{OpenSerialOptions, OpenTcpOptions, Port};
