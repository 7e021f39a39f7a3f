//! Types that can exchange (read/write) bytes with a FocusLynx controller.
//!
//! The [`Backend`] trait represents all such types.

use std::io;
use std::time::Duration;

use serialport as sp;

#[cfg(windows)]
use sp::COMPort as ExternSerial;
use sp::SerialPort;
#[cfg(unix)]
use sp::TTYPort as ExternSerial;

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// Types that allow reading and writing bytes with a connected controller.
pub trait Backend: io::Read + io::Write + private::Sealed {
	/// Discard any bytes that have been received but not yet read.
	///
	/// Only data buffered before the call is discarded. Bytes that arrive
	/// afterwards are read normally.
	fn clear_input(&mut self) -> Result<(), io::Error>;

	/// Set the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error>;

	/// Get the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error>;

	/// Get the "name" of the backend.
	///
	/// This can be in any format, but should uniquely identify the backend
	/// instance.
	fn name(&self) -> Option<String>;
}

impl<C: Backend + ?Sized> Backend for Box<C> {
	fn clear_input(&mut self) -> Result<(), io::Error> {
		(**self).clear_input()
	}
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

impl<C: Backend + ?Sized> Backend for &mut C {
	fn clear_input(&mut self) -> Result<(), io::Error> {
		(**self).clear_input()
	}
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

impl Backend for std::net::TcpStream {
	fn clear_input(&mut self) -> Result<(), io::Error> {
		// There is no socket-level equivalent of a serial input flush, so
		// drain whatever is already available without blocking.
		self.set_nonblocking(true)?;
		let mut buf = [0u8; 64];
		let result = loop {
			match io::Read::read(self, &mut buf) {
				Ok(0) => break Ok(()),
				Ok(_) => {}
				Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
				Err(e) => break Err(e),
			}
		};
		self.set_nonblocking(false)?;
		result
	}
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		std::net::TcpStream::set_read_timeout(self, timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		std::net::TcpStream::read_timeout(self)
	}
	fn name(&self) -> Option<String> {
		self.peer_addr().map(|addr| format!("{addr}")).ok()
	}
}

/// A platform agnostic serial port backend.
//
// The `serialport` crate exposes two platform specific serial ports, `COMPort`
// and `TTYPort` for windows and unix, respectively. Wrapping whichever one the
// platform uses in a new type keeps consumers platform agnostic without
// dynamic dispatch or an extra type parameter.
#[derive(Debug)]
pub struct Serial(pub(crate) ExternSerial);

impl io::Read for Serial {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		io::Read::read(&mut self.0, buf)
	}
}

impl io::Write for Serial {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		io::Write::write(&mut self.0, buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		io::Write::flush(&mut self.0)
	}
}

impl Backend for Serial {
	fn clear_input(&mut self) -> Result<(), io::Error> {
		Ok(self.0.clear(sp::ClearBuffer::Input)?)
	}
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		// The serialport API does not support infinite timeouts, so simply set
		// the timeout to the largest possible duration if `timeout` is `None`,
		// which is practically infinite.
		Ok(self.0.set_timeout(timeout.unwrap_or(Duration::MAX))?)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(Some(self.0.timeout()))
	}
	fn name(&self) -> Option<String> {
		self.0.name()
	}
}

/// A mock backend for use in testing.
///
/// It has the following features:
///   * It records all data written to it.
///   * It can be filled with data for reading, either immediately
///     ([`append_data`](Mock::append_data)) or once the next command has been
///     written ([`queue_reply`](Mock::queue_reply)).
///   * [`clear_input`](Backend::clear_input) discards data that is readable
///     but leaves queued replies alone, like a real controller that has not
///     answered yet.
///   * Specific errors can be inserted for calls to `read`, `write`, `flush`,
///     `clear_input`, and `set_read_timeout`.
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
#[derive(Debug)]
pub struct Mock {
	/// The buffer data is read from
	buffer: io::Cursor<Vec<u8>>,
	/// Data that becomes readable after the next successful write.
	queued: Vec<u8>,
	/// Everything successfully written to the backend.
	written: Vec<u8>,
	/// The error to surface on the next read, if any. It is only surfaced once.
	read_error: Option<io::Error>,
	/// The error to surface on the next write, if any. It is only surfaced once.
	write_error: Option<io::Error>,
	/// The error to surface on the next flush, if any. It is only surfaced once.
	flush_error: Option<io::Error>,
	/// The error to surface on the next `clear_input`, if any. It is only surfaced once.
	clear_input_error: Option<io::Error>,
	/// The error to surface on the next `set_read_timeout`, if any. It is only surfaced once.
	set_read_timeout_error: Option<io::Error>,
	/// The read timeout, which is ignored.
	ignored_read_timeout: Option<Duration>,
}

#[cfg(any(test, feature = "mock"))]
impl Mock {
	/// Create a new Mock backend.
	pub fn new() -> Self {
		Mock {
			buffer: io::Cursor::new(Vec::new()),
			queued: Vec::new(),
			written: Vec::new(),
			read_error: None,
			write_error: None,
			flush_error: None,
			clear_input_error: None,
			set_read_timeout_error: None,
			ignored_read_timeout: Some(Duration::ZERO),
		}
	}
	/// Append data to the read buffer. It is readable immediately.
	///
	/// The data is not validated in any way.
	pub fn append_data<T: AsRef<[u8]>>(&mut self, bytes: T) {
		self.buffer.get_mut().extend_from_slice(bytes.as_ref());
	}
	/// Queue reply data that becomes readable after the next write.
	///
	/// The data is not validated in any way.
	pub fn queue_reply<T: AsRef<[u8]>>(&mut self, bytes: T) {
		self.queued.extend_from_slice(bytes.as_ref());
	}
	/// Clear the read buffer and any queued replies.
	pub fn clear_buffer(&mut self) {
		self.buffer.get_mut().clear();
		self.buffer.set_position(0);
		self.queued.clear();
	}
	/// Whether the mock has any data available or not
	pub fn is_empty(&self) -> bool {
		self.remaining().is_empty()
	}
	/// The data that is readable but has not been read yet.
	pub fn remaining(&self) -> &[u8] {
		let position = usize::try_from(self.buffer.position()).unwrap_or(usize::MAX);
		self.buffer.get_ref().get(position..).unwrap_or_default()
	}
	/// Everything written to the backend so far.
	pub fn written(&self) -> &[u8] {
		&self.written
	}
	/// Take everything written to the backend so far, leaving it empty.
	pub fn take_written(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.written)
	}
	/// Set the error for the next `read`, if any.
	pub fn read_error(&mut self, err: Option<io::Error>) {
		self.read_error = err;
	}
	/// Set the error for the next `write`, if any.
	pub fn write_error(&mut self, err: Option<io::Error>) {
		self.write_error = err;
	}
	/// Set the error for the next `flush`, if any.
	pub fn flush_error(&mut self, err: Option<io::Error>) {
		self.flush_error = err;
	}
	/// Set the error for the next `clear_input`, if any.
	pub fn clear_input_error(&mut self, err: Option<io::Error>) {
		self.clear_input_error = err;
	}
	/// Set the error for the next `set_read_timeout`, if any.
	pub fn set_read_timeout_error(&mut self, err: Option<io::Error>) {
		self.set_read_timeout_error = err;
	}
}

#[cfg(any(test, feature = "mock"))]
impl Default for Mock {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(any(test, feature = "mock"))]
impl Backend for Mock {
	fn clear_input(&mut self) -> Result<(), io::Error> {
		if let Some(err) = self.clear_input_error.take() {
			Err(err)
		} else {
			self.buffer.get_mut().clear();
			self.buffer.set_position(0);
			Ok(())
		}
	}

	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		if let Some(err) = self.set_read_timeout_error.take() {
			Err(err)
		} else {
			self.ignored_read_timeout = timeout;
			Ok(())
		}
	}

	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(self.ignored_read_timeout)
	}

	fn name(&self) -> Option<String> {
		Some(format!("<mock 0x{:x}>", std::ptr::from_ref(self) as usize))
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Read for Mock {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if let Some(err) = self.read_error.take() {
			Err(err)
		} else if self.is_empty() {
			// For a real device, having no data ready would result in a wait
			// and then eventual timeout error. However, as our data is in
			// memory that does not happen here. So simulate that behaviour by
			// returning a timeout error immediately.
			Err(io::Error::new(
				io::ErrorKind::TimedOut,
				"Simulated timeout error",
			))
		} else {
			io::Read::read(&mut self.buffer, buf)
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Write for Mock {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if let Some(err) = self.write_error.take() {
			Err(err)
		} else {
			self.written.extend_from_slice(buf);
			let queued = std::mem::take(&mut self.queued);
			self.buffer.get_mut().extend_from_slice(&queued);
			Ok(buf.len())
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		if let Some(err) = self.flush_error.take() {
			Err(err)
		} else {
			Ok(())
		}
	}
}

mod private {
	pub trait Sealed {}

	impl Sealed for super::Serial {}
	impl Sealed for std::net::TcpStream {}
	#[cfg(any(test, feature = "mock"))]
	impl Sealed for super::Mock {}
	impl<C: super::Backend + ?Sized> Sealed for Box<C> {}
	impl<C: super::Backend + ?Sized> Sealed for &mut C {}
}
