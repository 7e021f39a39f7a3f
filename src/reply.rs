//! Line-level primitives that every reply decoder is built from.
//!
//! A FocusLynx reply is a fixed sequence of `\n` terminated ASCII lines. The
//! [`Lines`] reader consumes them strictly in order, one at a time, and
//! offers three operations: match a line exactly, match a fixed-width label
//! and extract the value after it, or discard a number of lines unread.

use crate::{
	backend::{Backend, UNKNOWN_BACKEND_NAME},
	error::{Error, ProtocolViolationError},
};
use std::{io, str::FromStr};

/// The byte terminating every reply line.
pub(crate) const LINE_FEED: u8 = b'\n';

/// Only this many bytes of a line are kept. The rest of a longer line is read
/// and discarded, so the next read still starts on a line boundary.
const MAX_LINE_LENGTH: usize = 128;

/// Whether an I/O error means the backend's read timeout elapsed.
///
/// Serial ports report `TimedOut`, while sockets report `WouldBlock` on some
/// platforms.
fn is_read_timeout(err: &io::Error) -> bool {
	matches!(
		err.kind(),
		io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
	)
}

/// Reads the lines of a single reply from a backend.
///
/// Obtained from a [`Port`](crate::Port) while it runs an
/// [`Exchange`](crate::codec::Exchange).
#[derive(Debug)]
pub struct Lines<'a, B> {
	backend: &'a mut B,
	/// The backend's name, for logging
	name: String,
}

impl<'a, B: Backend> Lines<'a, B> {
	pub(crate) fn new(backend: &'a mut B) -> Self {
		let name = backend
			.name()
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string());
		Lines { backend, name }
	}

	/// Read one line.
	///
	/// Reading stops at the terminator, or when the backend times out (or the
	/// stream ends), in which case the bytes received so far are returned,
	/// which may be none. Any other I/O error is returned as is.
	pub fn read_line(&mut self) -> Result<Line, Error> {
		let mut line = Line {
			bytes: Vec::with_capacity(32),
			overlong: false,
		};
		for byte in io::Read::bytes(&mut *self.backend) {
			match byte {
				Ok(LINE_FEED) => {
					if !line.overlong {
						line.bytes.push(LINE_FEED);
					}
					break;
				}
				Ok(byte) if line.bytes.len() < MAX_LINE_LENGTH => line.bytes.push(byte),
				Ok(_) => line.overlong = true,
				Err(e) if is_read_timeout(&e) => break,
				Err(e) => return Err(e.into()),
			}
		}
		self.log_received(&line);
		Ok(line)
	}

	fn log_received(&self, line: &Line) {
		let text = String::from_utf8_lossy(&line.bytes);
		if line.overlong {
			log::debug!("{} RECV: {}... (overlong)", self.name, text);
		} else if line.is_complete() {
			log::debug!("{} RECV: {}", self.name, text.trim_end());
		} else {
			log::debug!("{} RECV: {} (incomplete)", self.name, text);
		}
	}

	/// Read one line and check it is exactly `literal` followed by the
	/// terminator.
	pub fn expect_exact(&mut self, literal: &str) -> Result<(), Error> {
		let line = self.read_line()?;
		if line.content() == Some(literal.as_bytes()) {
			Ok(())
		} else {
			Err(line.into_violation(literal).into())
		}
	}

	/// Read one line, check it starts with `prefix` and return what follows it.
	///
	/// A line cut short by a timeout never matches, even if the label is
	/// intact, since its value may be truncated.
	pub fn expect_prefixed(&mut self, prefix: &'static str) -> Result<Field, Error> {
		let line = self.read_line()?;
		let matches = line
			.content()
			.is_some_and(|content| content.starts_with(prefix.as_bytes()));
		if matches {
			Ok(Field {
				prefix,
				line: line.bytes,
			})
		} else {
			Err(line.into_violation(format!("{prefix} ...")).into())
		}
	}

	/// Read and discard exactly `n` lines, whatever they contain.
	pub fn skip(&mut self, n: usize) -> Result<(), Error> {
		for _ in 0..n {
			let line = self.read_line()?;
			log::trace!(
				"{} skipped: {}",
				self.name,
				String::from_utf8_lossy(line.bytes()).trim_end()
			);
		}
		Ok(())
	}
}

/// A single line read from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
	/// The bytes received, including the terminator if one was received.
	/// Only the first bytes of an overlong line are kept, without a terminator.
	bytes: Vec<u8>,
	/// Whether bytes of the line were discarded.
	overlong: bool,
}

impl Line {
	/// The bytes that were kept.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Whether the line was too long to keep in full.
	pub fn is_overlong(&self) -> bool {
		self.overlong
	}

	/// Whether the whole line, including its terminator, was received and kept.
	pub fn is_complete(&self) -> bool {
		!self.overlong && self.bytes.last() == Some(&LINE_FEED)
	}

	/// The line without its terminator, if it is [complete](Line::is_complete).
	pub fn content(&self) -> Option<&[u8]> {
		if self.is_complete() {
			self.bytes.strip_suffix(&[LINE_FEED])
		} else {
			None
		}
	}

	/// Report this line as not matching `expected`.
	fn into_violation<E: Into<String>>(self, expected: E) -> ProtocolViolationError {
		if self.overlong {
			ProtocolViolationError::overlong(expected, self.bytes)
		} else {
			ProtocolViolationError::new(expected, self.bytes)
		}
	}
}

/// A labeled reply line, such as `Curr Pos = 5000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
	/// The fixed-width label the line matched.
	prefix: &'static str,
	/// The entire line, including the label and terminator.
	line: Vec<u8>,
}

impl Field {
	/// The whole line as it was received.
	pub fn line(&self) -> &[u8] {
		&self.line
	}

	/// The bytes following the label, without the line terminator.
	pub fn raw(&self) -> &[u8] {
		let value = &self.line[self.prefix.len()..];
		value.strip_suffix(&[LINE_FEED]).unwrap_or(value)
	}

	/// The value following the label with surrounding whitespace removed.
	///
	/// Values that are not ASCII text are a protocol violation.
	pub fn trimmed(&self) -> Result<String, ProtocolViolationError> {
		self.parse_with("ASCII text", |value| Some(value.to_string()))
	}

	/// Convert the trimmed value with `convert`.
	///
	/// If the value is not ASCII, or `convert` returns `None`, the whole line
	/// is reported as a protocol violation, described as this field holding a
	/// `what`.
	pub fn parse_with<T, F>(&self, what: &str, convert: F) -> Result<T, ProtocolViolationError>
	where
		F: FnOnce(&str) -> Option<T>,
	{
		std::str::from_utf8(self.raw())
			.ok()
			.filter(|value| value.is_ascii())
			.map(str::trim)
			.and_then(convert)
			.ok_or_else(|| {
				ProtocolViolationError::new(format!("{} <{what}>", self.prefix), &self.line)
			})
	}

	/// Parse the trimmed value as a `T`.
	pub fn parse<T: FromStr>(&self, what: &str) -> Result<T, ProtocolViolationError> {
		self.parse_with(what, |value| value.parse().ok())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::backend::Mock;

	fn mock_with(data: &[u8]) -> Mock {
		let mut mock = Mock::new();
		mock.append_data(data);
		mock
	}

	#[test]
	fn read_line_stops_at_terminator() {
		let mut mock = mock_with(b"!\nM\n");
		let mut lines = Lines::new(&mut mock);
		assert_eq!(lines.read_line().unwrap().content(), Some(&b"!"[..]));
		assert_eq!(lines.read_line().unwrap().bytes(), b"M\n");
		// Nothing left: the simulated timeout produces an empty line.
		let line = lines.read_line().unwrap();
		assert_eq!(line.bytes(), b"");
		assert!(!line.is_complete());
	}

	#[test]
	fn read_line_returns_partial_line_on_timeout() {
		let mut mock = mock_with(b"HALT");
		let mut lines = Lines::new(&mut mock);
		let line = lines.read_line().unwrap();
		assert_eq!(line.bytes(), b"HALT");
		assert_eq!(line.content(), None);
		assert!(!line.is_overlong());
	}

	#[test]
	fn read_line_propagates_other_io_errors() {
		let mut mock = Mock::new();
		mock.read_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
		let mut lines = Lines::new(&mut mock);
		let err = lines.read_line().unwrap_err();
		assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
	}

	#[test]
	fn read_line_discards_the_rest_of_an_overlong_line() {
		let mut data = vec![b'x'; MAX_LINE_LENGTH + 72];
		data.extend_from_slice(b"\nEND\n");
		let mut mock = mock_with(&data);
		let mut lines = Lines::new(&mut mock);
		let line = lines.read_line().unwrap();
		assert!(line.is_overlong());
		assert!(!line.is_complete());
		assert_eq!(line.bytes(), &data[..MAX_LINE_LENGTH]);
		// The next read starts on the following line.
		lines.expect_exact("END").unwrap();
		assert!(mock.is_empty());
	}

	#[test]
	fn read_line_keeps_a_line_of_the_maximum_length() {
		let mut data = vec![b'x'; MAX_LINE_LENGTH];
		data.push(b'\n');
		let mut mock = mock_with(&data);
		let line = Lines::new(&mut mock).read_line().unwrap();
		assert!(line.is_complete());
		assert_eq!(line.bytes(), data);
	}

	#[test]
	fn overlong_lines_never_match() {
		let mut data = b"Nickname = ".to_vec();
		data.extend_from_slice(&[b'n'; MAX_LINE_LENGTH]);
		data.extend_from_slice(b"\nEND");
		data.extend_from_slice(&[b' '; MAX_LINE_LENGTH]);
		data.push(b'\n');
		let mut mock = mock_with(&data);
		let mut lines = Lines::new(&mut mock);

		let err = ProtocolViolationError::try_from(lines.expect_prefixed("Nickname =").unwrap_err())
			.unwrap();
		assert!(err.is_overlong());
		assert!(!err.is_timeout());
		assert_eq!(err.actual(), &data[..MAX_LINE_LENGTH]);

		let err = ProtocolViolationError::try_from(lines.expect_exact("END").unwrap_err()).unwrap();
		assert!(err.is_overlong());
		assert!(mock.is_empty());
	}

	#[test]
	fn expect_exact() {
		let mut mock = mock_with(b"END\nEND \nEND");
		let mut lines = Lines::new(&mut mock);
		lines.expect_exact("END").unwrap();

		let err = ProtocolViolationError::try_from(lines.expect_exact("END").unwrap_err()).unwrap();
		assert_eq!(err.expected(), "END");
		assert_eq!(err.actual(), b"END \n");

		// A line cut short by a timeout never matches.
		let err = ProtocolViolationError::try_from(lines.expect_exact("END").unwrap_err()).unwrap();
		assert_eq!(err.actual(), b"END");
		assert!(err.is_timeout());
	}

	#[test]
	fn expect_prefixed() {
		let mut mock = mock_with(b"Nickname = Focuser\nMax Pos = 100\n");
		let mut lines = Lines::new(&mut mock);
		let field = lines.expect_prefixed("Nickname =").unwrap();
		assert_eq!(field.raw(), b" Focuser");
		assert_eq!(field.trimmed().unwrap(), "Focuser");
		assert_eq!(field.line(), b"Nickname = Focuser\n");

		// The label is fixed width, so a single missing space is a mismatch.
		let err = ProtocolViolationError::try_from(lines.expect_prefixed("Max Pos  =").unwrap_err())
			.unwrap();
		assert_eq!(err.expected(), "Max Pos  = ...");
		assert_eq!(err.actual(), b"Max Pos = 100\n");
	}

	#[test]
	fn expect_prefixed_rejects_partial_line() {
		let mut mock = mock_with(b"Curr Pos = 00");
		let mut lines = Lines::new(&mut mock);
		let err = ProtocolViolationError::try_from(lines.expect_prefixed("Curr Pos =").unwrap_err())
			.unwrap();
		assert_eq!(err.expected(), "Curr Pos = ...");
		assert!(err.is_timeout());
	}

	#[test]
	fn field_parse() {
		let mut mock = mock_with(b"Curr Pos = 05000\nTemp(C)  = warm\n");
		let mut lines = Lines::new(&mut mock);
		let value: i32 = lines.expect_prefixed("Curr Pos =").unwrap().parse("integer").unwrap();
		assert_eq!(value, 5000);

		let field = lines.expect_prefixed("Temp(C)  =").unwrap();
		let err = field.parse::<f64>("number").unwrap_err();
		assert_eq!(err.expected(), "Temp(C)  = <number>");
		assert_eq!(err.actual(), b"Temp(C)  = warm\n");
	}

	#[test]
	fn text_fields_must_be_ascii() {
		let mut data = "Nickname = Fokussierer \u{00fc}\n".as_bytes().to_vec();
		data.extend_from_slice(b"Dev Typ  = \xff\n");
		let mut mock = mock_with(&data);
		let mut lines = Lines::new(&mut mock);
		let err = lines.expect_prefixed("Nickname =").unwrap().trimmed().unwrap_err();
		assert_eq!(err.expected(), "Nickname = <ASCII text>");
		assert_eq!(err.actual(), "Nickname = Fokussierer \u{00fc}\n".as_bytes());
		let err = lines.expect_prefixed("Dev Typ  =").unwrap().trimmed().unwrap_err();
		assert_eq!(err.actual(), b"Dev Typ  = \xff\n");
	}

	#[test]
	fn skip_ignores_content() {
		let mut data = b"one\n\xff\xfe\n".to_vec();
		data.extend_from_slice(&[b'#'; 3 * MAX_LINE_LENGTH]);
		data.extend_from_slice(b"\n\nEND\n");
		let mut mock = mock_with(&data);
		let mut lines = Lines::new(&mut mock);
		lines.skip(4).unwrap();
		lines.expect_exact("END").unwrap();
		assert!(mock.is_empty());
	}
}
