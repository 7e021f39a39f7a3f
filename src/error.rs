//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! Port operations return the higher level [`Error`] enum, which every error
//! type converts into, so they can be used with `?`:
//!
//! ```
//! use focuslynx::command::Channel;
//! use focuslynx::error::{Error, InvalidChannelError};
//!
//! fn channel(digit: u8) -> Result<Channel, InvalidChannelError> {
//!     Channel::new(digit)
//! }
//!
//! fn bar() -> Result<(), Error> {
//!     let _first = channel(0)?;
//!     // ...
//! # Ok(())
//! }
//! ```
//!
//! The only error a well-formed exchange can produce is a
//! [`ProtocolViolationError`], which carries what was expected and the raw
//! line that was actually received.

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
	(
		$name:path,
		$self:ident =>
		$display:literal
		$(,
			$($arg:expr),+
		)?
	) => {
		impl std::error::Error for $name {}

		impl std::fmt::Display for $name {
			fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(
					f,
					$display
					$(,
						$($arg),+
					)?
				)
			}
		}
	};
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and its underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
///
/// ```compile_fail
/// # // This fails to compile because the macro is not exported.
/// error_enum!{
///     #[non_exhaustive]
///     pub enum ThisError {
///         VariantA(A),
///         VariantB(B),
///     }
/// }
/// ```
macro_rules! error_enum {
	(
		$(#[$attr:meta])*
		pub enum $name:ident {
			$(
				$variant:ident($inner:path)
			),+
			$(,)?
		}
	) => {
		$(
			#[$attr]
		)*
		#[allow(missing_docs)]
		pub enum $name {
			$(
				$variant($inner)
			),+
		}

		impl std::error::Error for $name {}

		// Defer the display to the inner error type
		impl std::fmt::Display for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				match self {
					$(
						$name::$variant(e) => e.fmt(f)
					),+
				}
			}
		}

		impl From<std::convert::Infallible> for $name {
			fn from(_: std::convert::Infallible) -> Self {
				unreachable!();
			}
		}

		$(
			impl From<$inner> for $name {
				fn from(other: $inner) -> Self {
					$name::$variant(other)
				}
			}

			impl TryFrom<$name> for $inner {
				type Error = $name;
				fn try_from(other: $name) -> Result<Self, Self::Error> {
					match other {
						$name::$variant(value) => Ok(value),
						#[allow(unreachable_patterns)]
						value => Err(value)
					}
				}
			}
		)+
	};
}

/// The specified device is either disconnected or already in use by another process.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SerialDeviceInUseOrDisconnectedError(Box<str>);

impl_error_display! {
	SerialDeviceInUseOrDisconnectedError,
	self =>
	"the specified device is either disconnected or already in use by another process: {}", self.0
}

/// A reply line did not match what the controller's firmware grammar requires.
///
/// Once this error is returned the position in the reply stream is unknown:
/// any remaining lines of the reply are still unread. The connection should be
/// treated as desynchronized and reset before further commands are sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolViolationError(Box<(Box<str>, Box<[u8]>, bool)>);

impl ProtocolViolationError {
	/// Create a new `ProtocolViolationError`.
	///
	/// `expected` describes the token or pattern that was required and
	/// `actual` is the raw line that was received, including its terminator
	/// if one was received.
	pub fn new<E, A>(expected: E, actual: A) -> Self
	where
		E: Into<String>,
		A: AsRef<[u8]>,
	{
		ProtocolViolationError(Box::new((
			expected.into().into_boxed_str(),
			Box::from(actual.as_ref()),
			false,
		)))
	}

	/// Create a `ProtocolViolationError` for a line that was too long to
	/// keep in full.
	///
	/// `start` holds the bytes of the line that were kept.
	pub(crate) fn overlong<E, A>(expected: E, start: A) -> Self
	where
		E: Into<String>,
		A: AsRef<[u8]>,
	{
		ProtocolViolationError(Box::new((
			expected.into().into_boxed_str(),
			Box::from(start.as_ref()),
			true,
		)))
	}

	/// The token or pattern that was expected.
	pub fn expected(&self) -> &str {
		&self.0 .0
	}

	/// The raw bytes that were received instead.
	///
	/// This is empty if nothing was received before the read timed out. For
	/// an [overlong](ProtocolViolationError::is_overlong) line, only its
	/// beginning is available.
	pub fn actual(&self) -> &[u8] {
		&self.0 .1
	}

	/// Whether the offending line was too long to be kept in full.
	pub fn is_overlong(&self) -> bool {
		self.0 .2
	}

	/// Whether the read that produced the offending line ended before a line
	/// terminator was received, i.e. the port timed out.
	pub fn is_timeout(&self) -> bool {
		!self.is_overlong() && self.actual().last() != Some(&b'\n')
	}
}

impl std::error::Error for ProtocolViolationError {}

impl std::fmt::Display for ProtocolViolationError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let actual = self.actual();
		if self.is_overlong() {
			write!(
				f,
				"unexpected reply from FocusLynx: expected `{}`, got an overlong line starting `{}`",
				self.expected(),
				actual.escape_ascii()
			)
		} else if actual.is_empty() {
			write!(
				f,
				"unexpected reply from FocusLynx: expected `{}`, got nothing before timing out",
				self.expected()
			)
		} else if self.is_timeout() {
			write!(
				f,
				"unexpected reply from FocusLynx: expected `{}`, got `{}` before timing out",
				self.expected(),
				actual.escape_ascii()
			)
		} else {
			let line = actual.strip_suffix(b"\n").unwrap_or(actual);
			write!(
				f,
				"unexpected reply from FocusLynx: expected `{}`, got `{}`",
				self.expected(),
				line.escape_ascii()
			)
		}
	}
}

/// A channel number that cannot be represented by the single channel digit
/// of a FocusLynx command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InvalidChannelError(u8);

impl InvalidChannelError {
	pub(crate) const fn new(channel: u8) -> Self {
		InvalidChannelError(channel)
	}

	/// The rejected channel number.
	pub fn channel(&self) -> u8 {
		self.0
	}
}

impl_error_display! {
	InvalidChannelError,
	self => "invalid channel {}: must be a single decimal digit", self.0
}

/// A step count that does not fit the six digit step field of a FocusLynx command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InvalidStepsError(u32);

impl InvalidStepsError {
	pub(crate) const fn new(steps: u32) -> Self {
		InvalidStepsError(steps)
	}

	/// The rejected step count.
	pub fn steps(&self) -> u32 {
		self.0
	}
}

impl_error_display! {
	InvalidStepsError,
	self => "invalid step count {}: must be at most {}", self.0, crate::command::Steps::MAX.get()
}

/// A string could not be parsed as a FocusLynx command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandParseError(Box<str>);

impl CommandParseError {
	pub(crate) fn new<S: Into<String>>(command: S) -> Self {
		CommandParseError(command.into().into_boxed_str())
	}

	/// The string that could not be parsed.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl_error_display! {
	CommandParseError,
	self => "not a FocusLynx command: `{}`", self.0.escape_debug()
}

error_enum! {
	/// Any error returned by this library.
	#[derive(Debug)]
	#[non_exhaustive]
	pub enum Error {
		SerialDeviceInUseOrDisconnected(SerialDeviceInUseOrDisconnectedError),
		Io(std::io::Error),
		ProtocolViolation(ProtocolViolationError),
		InvalidChannel(InvalidChannelError),
		InvalidSteps(InvalidStepsError),
		CommandParse(CommandParseError),
	}
}

impl Error {
	/// A convenience function for determining if the error is due to the
	/// port timing out, either while waiting for a reply line or part way
	/// through one.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
			Error::ProtocolViolation(e) => e.is_timeout(),
			_ => false,
		}
	}

	/// A convenience function for determining if the error indicates the
	/// controller replied with data the firmware grammar does not allow.
	pub fn is_protocol_violation(&self) -> bool {
		matches!(self, Error::ProtocolViolation(_))
	}
}

impl From<serialport::Error> for Error {
	fn from(other: serialport::Error) -> Self {
		use std::io;

		match other.kind() {
			serialport::ErrorKind::NoDevice => Error::SerialDeviceInUseOrDisconnected(
				SerialDeviceInUseOrDisconnectedError(other.description.into_boxed_str()),
			),
			serialport::ErrorKind::InvalidInput => Error::Io(io::Error::new(
				io::ErrorKind::InvalidInput,
				other.description,
			)),
			serialport::ErrorKind::Unknown => {
				Error::Io(io::Error::new(io::ErrorKind::Other, other.description))
			}
			serialport::ErrorKind::Io(kind) => Error::Io(io::Error::new(kind, other.description)),
		}
	}
}
