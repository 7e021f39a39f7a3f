//! Types for opening and using a connection to a FocusLynx controller.
//!
//! A [`Port`] owns a [`Backend`] and runs one [`Exchange`] at a time: it
//! discards any stale input, sends the command, and then decodes the reply
//! line by line.
//!
//! ```rust
//! # use focuslynx::{command::{Channel, Steps}, Port};
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut port = Port::open_serial("/dev/ttyUSB0")?;
//! let channel = Channel::new(0)?;
//!
//! let config = port.channel_config(channel)?;
//! port.set_target_steps(channel, Steps::new(config.max_steps() / 2)?)?;
//! if let Some(status) = port.channel_status(channel)? {
//!     println!("moving: {}", status.is_moving());
//! }
//! # Ok(())
//! # }
//! ```

mod options;
#[cfg(test)]
mod test;

#[cfg(any(test, feature = "mock"))]
use crate::backend::Mock;
use crate::{
	backend::{Backend, Serial, UNKNOWN_BACKEND_NAME},
	codec::{ConfigQuery, Exchange, SetTargetSteps, StatusQuery, Stop, SyncPosition},
	command::{Channel, Command, Steps},
	error::Error,
	reply::Lines,
	response::{ChannelConfig, ChannelStatus},
	timeout_guard::TimeoutGuard,
};
pub use options::*;
use std::{
	io,
	net::{TcpStream, ToSocketAddrs},
	time::Duration,
};

/// A connection to a FocusLynx controller.
///
/// Use the convenience methods [`open_serial`] and [`open_tcp`] to construct
/// a serial port (`Port<Serial>`) or a TCP port (`Port<TcpStream>`). To
/// customize the construction of these types, or to construct a port with a
/// dynamic backend, use the [`OpenSerialOptions`] and [`OpenTcpOptions`]
/// builder types.
///
/// Every operation takes `&mut self`, so only one exchange can be in flight at
/// a time. To share a port between threads, wrap it in a `Mutex`.
///
/// [`open_serial`]: Port::open_serial
/// [`open_tcp`]: Port::open_tcp
pub struct Port<B> {
	/// The underlying backend
	backend: B,
	/// If populated, the error that has "poisoned" the port. This error MUST be
	/// reported before the port is used for communication again.
	///
	/// For instance, if a [`TimeoutGuard`] cannot restore the original timeout
	/// in its Drop implementation, rather than panicking it poisons the port.
	poison: Option<io::Error>,
}

impl<B: Backend> std::fmt::Debug for Port<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Port")
			.field("name", &self.backend.name())
			.finish_non_exhaustive()
	}
}

impl Port<Serial> {
	/// Open the serial port at the specified path using the default options.
	///
	/// Alternatively, use [`Port::open_serial_options`] to customize how the port is opened.
	///
	/// ## Example
	///
	/// ```rust
	/// # use focuslynx::Port;
	/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
	/// let mut port = Port::open_serial("/dev/ttyUSB0")?;
	/// // Or equivalently
	/// let mut port = Port::open_serial_options().open("/dev/ttyUSB0")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn open_serial(path: &str) -> Result<Port<Serial>, Error> {
		OpenSerialOptions::new().open(path)
	}

	/// Get an [`OpenSerialOptions`] to customize how a serial port is opened.
	pub fn open_serial_options() -> OpenSerialOptions {
		OpenSerialOptions::default()
	}
}

impl Port<TcpStream> {
	/// Open the TCP port at the specified address using the default options.
	///
	/// This is for controllers reached through a network serial server.
	/// Alternatively, use [`Port::open_tcp_options`] to customize how the port is opened.
	pub fn open_tcp<A: ToSocketAddrs>(address: A) -> Result<Port<TcpStream>, io::Error> {
		OpenTcpOptions::default().open(address)
	}

	/// Get an [`OpenTcpOptions`] to customize how a TCP port is opened.
	pub fn open_tcp_options() -> OpenTcpOptions {
		OpenTcpOptions::default()
	}
}

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
impl Port<Mock> {
	/// Open a port backed by an in-memory [`Mock`].
	pub fn open_mock() -> Port<Mock> {
		Port::from_backend(Mock::new())
	}
}

impl<B: Backend> Port<B> {
	/// Get a `Port` from the given backend.
	fn from_backend(backend: B) -> Port<B> {
		Port {
			backend,
			poison: None,
		}
	}

	/// Check if the port is poisoned and report the error if it exists.
	fn check_poisoned(&mut self) -> Result<(), io::Error> {
		if let Some(poison) = self.poison.take() {
			Err(poison)
		} else {
			Ok(())
		}
	}

	/// Poison the port so `e` is reported by the next operation.
	pub(crate) fn poison(&mut self, e: io::Error) {
		self.poison = Some(e);
	}

	/// Transmit a command without reading any reply.
	///
	/// The reply, if the controller sends one, is left unread. It is discarded
	/// when the next exchange is [`run`](Port::run).
	///
	/// ## Example
	///
	/// ```rust
	/// # use focuslynx::{backend::Backend, command::{Channel, Command}, Port};
	/// # fn wrapper<B: Backend>(mut port: Port<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// port.command(Command::Halt(Channel::new(1)?))?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn command(&mut self, cmd: Command) -> Result<(), Error> {
		self.check_poisoned()?;

		let encoded = cmd.to_string();
		log::debug!(
			"{} TX:   {}",
			self.backend
				.name()
				.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string()),
			encoded
		);
		io::Write::write_all(&mut self.backend, encoded.as_bytes())?;
		io::Write::flush(&mut self.backend)?;
		Ok(())
	}

	/// Run an [`Exchange`] and return its decoded reply.
	///
	/// Input buffered before the command is sent is discarded first, so a
	/// reply left over from an earlier, abandoned exchange cannot be mistaken
	/// for this one's.
	pub fn run<E: Exchange>(&mut self, exchange: E) -> Result<E::Output, Error> {
		self.check_poisoned()?;
		self.backend.clear_input()?;
		self.command(exchange.command())?;
		exchange.decode(&mut Lines::new(&mut self.backend))
	}

	/// Read the configuration of a channel.
	pub fn channel_config(&mut self, channel: Channel) -> Result<ChannelConfig, Error> {
		self.run(ConfigQuery(channel))
	}

	/// Read the status of a channel.
	///
	/// Returns `None` if no focuser is attached to the channel.
	pub fn channel_status(&mut self, channel: Channel) -> Result<Option<ChannelStatus>, Error> {
		self.run(StatusQuery(channel))
	}

	/// Start moving a channel's focuser to an absolute position.
	///
	/// This returns as soon as the controller accepts the command. Poll
	/// [`channel_status`](Port::channel_status) to follow the move. Keeping the
	/// target within the focuser's travel is the caller's responsibility.
	pub fn set_target_steps(&mut self, channel: Channel, steps: Steps) -> Result<(), Error> {
		self.run(SetTargetSteps(channel, steps))
	}

	/// Halt any motion on a channel.
	pub fn stop(&mut self, channel: Channel) -> Result<(), Error> {
		self.run(Stop(channel))
	}

	/// Redefine the current position of a channel's focuser without moving it.
	pub fn sync_position(&mut self, channel: Channel, steps: Steps) -> Result<(), Error> {
		self.run(SyncPosition(channel, steps))
	}

	/// Set the port timeout and return a "scope guard" that will reset the timeout when it goes out of scope.
	///
	/// If no timeout is specified, reads can block indefinitely.
	///
	/// While the guard is in scope, the port can only be accessed through the guard.
	/// However, because the guard implements [`Deref`](std::ops::Deref) and [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the port.
	///
	/// ## Example
	/// ```rust
	/// # use focuslynx::{backend::Backend, command::Channel, error::Error, Port};
	/// # use std::time::Duration;
	/// # fn helper<B: Backend>(mut port: Port<B>) -> Result<(), Error> {
	/// let channel = Channel::new(0)?;
	/// {
	///     let mut guard = port.timeout_guard(Some(Duration::from_secs(10)))?;
	///     // All exchanges within this scope will use a 10 second timeout
	///     guard.channel_config(channel)?;
	///
	/// }  // The guard is dropped and the timeout is reset.
	///
	/// // This exchange uses the original timeout
	/// port.stop(channel)?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn timeout_guard(
		&mut self,
		timeout: Option<Duration>,
	) -> Result<TimeoutGuard<'_, B>, io::Error> {
		self.check_poisoned()?;

		TimeoutGuard::new(self, timeout)
	}

	/// Set the read timeout and return the old timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	pub fn set_read_timeout(
		&mut self,
		timeout: Option<Duration>,
	) -> Result<Option<Duration>, io::Error> {
		let old = self.backend.read_timeout()?;
		self.backend.set_read_timeout(timeout)?;
		Ok(old)
	}

	/// Get the read timeout.
	///
	/// If it is `None`, reads will block indefinitely.
	pub fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		self.backend.read_timeout()
	}

	/// Get the "name" of the port's backend.
	///
	/// This is often the "name" passed to [`Port::open_serial`] or [`Port::open_tcp`].
	pub fn name(&self) -> Option<String> {
		self.backend.name()
	}

	/// Get a reference to the backend.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Get a mutable reference to the backend.
	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}

	/// Consume the port and return the underlying backend.
	pub fn into_backend(self) -> B {
		self.backend
	}
}

impl<B: Backend> io::Write for Port<B> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.check_poisoned()?;
		io::Write::write(&mut self.backend, buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.check_poisoned()?;
		io::Write::flush(&mut self.backend)
	}
}

impl<B: Backend> io::Read for Port<B> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.check_poisoned()?;
		io::Read::read(&mut self.backend, buf)
	}
}
