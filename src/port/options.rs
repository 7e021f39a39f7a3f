//! Types defining the different options when opening a port.

use super::Port;
use crate::{
	backend::{Backend, Serial},
	error::Error,
};
use serialport as sp;
use std::{
	io,
	net::{TcpStream, ToSocketAddrs},
	time::Duration,
};

/// The read timeout ports are opened with unless configured otherwise.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Options for configuring and opening a serial port.
///
/// The port is always opened with 8 data bits, no parity, one stop bit and no
/// flow control, as the controller requires.
///
/// ## Example
///
/// ```rust
/// # use focuslynx::OpenSerialOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut port = OpenSerialOptions::new()
///     .timeout(Some(Duration::from_millis(500)))
///     .open("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenSerialOptions {
	/// The custom baud rate
	baud_rate: u32,
	/// The custom timeout
	timeout: Option<Duration>,
}

impl OpenSerialOptions {
	/// The default baud rate of the controller's serial interface: 115,200.
	pub const DEFAULT_BAUD_RATE: u32 = 115_200;

	/// Create a blank set of options ready for configuration.
	///
	/// The default baud rate and read timeout are 115,200 and 3 seconds, respectively.
	///
	/// Equivalent to [`default`](OpenSerialOptions::default).
	pub fn new() -> Self {
		OpenSerialOptions {
			baud_rate: OpenSerialOptions::DEFAULT_BAUD_RATE,
			timeout: Some(DEFAULT_TIMEOUT),
		}
	}

	/// Set a custom baud rate.
	///
	/// The default is 115,200.
	pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
		self.baud_rate = baud_rate;
		self
	}

	/// Set a custom read timeout.
	///
	/// If duration is `None`, reads will block indefinitely. The default is 3 seconds.
	pub fn timeout(&mut self, duration: Option<Duration>) -> &mut Self {
		self.timeout = duration;
		self
	}

	/// Open a [`Serial`] port at the specified path.
	fn open_serial_port(&self, path: &str) -> Result<Serial, Error> {
		log::debug!(
			"opening {path} at {} baud, timeout {:?}",
			self.baud_rate,
			self.timeout
		);
		// The baud rate passed to `new` is ignored by some serialport
		// versions, so it is set again with the `baud_rate` method below.
		sp::new(path, OpenSerialOptions::DEFAULT_BAUD_RATE)
			.data_bits(sp::DataBits::Eight)
			.parity(sp::Parity::None)
			.flow_control(sp::FlowControl::None)
			.stop_bits(sp::StopBits::One)
			// The serialport API does not support infinite timeouts.
			.timeout(self.timeout.unwrap_or(Duration::MAX))
			.baud_rate(self.baud_rate)
			.open_native()
			.map(Serial)
			.map_err(Into::into)
	}

	/// Open the port at the specified path with the custom options.
	pub fn open(&self, path: &str) -> Result<Port<Serial>, Error> {
		Ok(Port::from_backend(self.open_serial_port(path)?))
	}

	/// Open the port at the specified path with the custom options.
	///
	/// The type of the underlying backend is erased via dynamic dispatch,
	/// which does have runtime overhead. [`OpenSerialOptions::open`] should
	/// generally be used instead, except when the type of the underlying
	/// backend may not be known at compile time.
	pub fn open_dyn(&self, path: &str) -> Result<Port<Box<dyn Backend>>, Error> {
		Ok(Port::from_backend(Box::new(self.open_serial_port(path)?)))
	}
}

impl Default for OpenSerialOptions {
	fn default() -> Self {
		OpenSerialOptions::new()
	}
}

/// Options for configuring and opening a TCP port.
///
/// ## Example
///
/// ```rust
/// # use focuslynx::OpenTcpOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut port = OpenTcpOptions::new()
///     .timeout(Some(Duration::from_millis(500)))
///     .open("192.168.0.1:4001")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenTcpOptions {
	/// The custom timeout
	timeout: Option<Duration>,
}

impl OpenTcpOptions {
	/// Create a blank set of options ready for configuration.
	///
	/// The default read timeout is 3 seconds.
	///
	/// Equivalent to [`default`](OpenTcpOptions::default).
	pub fn new() -> Self {
		OpenTcpOptions {
			timeout: Some(DEFAULT_TIMEOUT),
		}
	}

	/// Set a custom read timeout.
	///
	/// If duration is `None`, reads will block indefinitely. The default is 3 seconds.
	pub fn timeout(&mut self, duration: Option<Duration>) -> &mut Self {
		self.timeout = duration;
		self
	}

	/// Open a [`TcpStream`] at the specified address.
	fn open_tcp_stream<A: ToSocketAddrs>(&self, address: A) -> io::Result<TcpStream> {
		let stream = TcpStream::connect(address)?;
		stream.set_read_timeout(self.timeout)?;
		log::debug!("connected to {:?}", stream.peer_addr());
		Ok(stream)
	}

	/// Open the port at the specified address with the custom options.
	pub fn open<A: ToSocketAddrs>(&self, address: A) -> io::Result<Port<TcpStream>> {
		Ok(Port::from_backend(self.open_tcp_stream(address)?))
	}

	/// Open the port at the specified address with the custom options.
	///
	/// The type of the underlying backend is erased via dynamic dispatch,
	/// which does have runtime overhead. [`OpenTcpOptions::open`] should
	/// generally be used instead, except when the type of the underlying
	/// backend may not be known at compile time.
	pub fn open_dyn<A: ToSocketAddrs>(&self, address: A) -> io::Result<Port<Box<dyn Backend>>> {
		Ok(Port::from_backend(Box::new(self.open_tcp_stream(address)?)))
	}
}

impl Default for OpenTcpOptions {
	fn default() -> Self {
		OpenTcpOptions::new()
	}
}
