use crate::{
	backend::Mock,
	command::{Channel, Command, Steps},
	error::*,
	response::{ChannelConfig, ChannelStatus},
	Port,
};
use std::io;

/// Generate code to check the outcome of port operations against canned replies.
///
/// The syntax is `<port>, <case>...` where multiple `<case>`s are separated
/// by `,` and can be of two flavors:
///
///   * `ok case <reply_bytes>... via <closure_running_the_operation>`
///   * `err case <reply_bytes>... via <closure_running_the_operation> => <expected_error_type>`
///
/// The reply bytes are queued, so they only become readable once the
/// operation has sent its command.
macro_rules! check_cases {
	(
		$port:ident, ok case $($reply_bytes:literal),+ via $method:expr, $($rest:tt)*
	) => {
		// Make sure there are no other replies left over from other test cases
		$port.backend_mut().clear_buffer();
		$(
			$port.backend_mut().queue_reply($reply_bytes);
		)+
		let m: fn(&mut Port<Mock>) -> Result<_, Error> = $method; // Give the compiler the necessary type hints
		if let Err(e) = (m)(&mut $port) {
			panic!("unexpected error when reading {} via {}:\n\tactual error: {}\n\t{:?}\n",
				stringify!($($reply_bytes),+),
				stringify!($method),
				e,
				e);
		}
		check_cases!($port, $($rest)*)
	};

	(
		$port:ident, err case $($reply_bytes:literal),+ via $method:expr => $err_type:ident, $($rest:tt)*
	) => {
		$port.backend_mut().clear_buffer();
		$(
			$port.backend_mut().queue_reply($reply_bytes);
		)+
		let m: fn(&mut Port<Mock>) -> Result<_, Error> = $method; // Give the compiler the necessary type hints
		match (m)(&mut $port) {
			Err(e) => {
				if let Err(e) = $err_type::try_from(e) {
					panic!("unexpected error when reading {} via {}:\n\texpected:\t{}\n\tgot:\t\t{}\n\t\t\t{:?}\n",
						stringify!($($reply_bytes),+),
						stringify!($method),
						stringify!($err_type),
						e,
						e);
				}
			}
			Ok(_) => panic!("unexpected Ok when reading {} via {}", stringify!($($reply_bytes),+), stringify!($method)),
		};
		check_cases!($port, $($rest)*)
	};

	($port:ident, ) => {};
}

const C0: Channel = match Channel::new(0) {
	Ok(channel) => channel,
	Err(_) => panic!("channel 0 is valid"),
};
const C1: Channel = match Channel::new(1) {
	Ok(channel) => channel,
	Err(_) => panic!("channel 1 is valid"),
};

fn steps(value: u32) -> Steps {
	Steps::new(value).unwrap()
}

fn violation(err: Error) -> ProtocolViolationError {
	match err {
		Error::ProtocolViolation(e) => e,
		other => panic!("expected a protocol violation, got {other:?}"),
	}
}

#[test]
fn channel_config_ok() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(
		b"!\n\
		CONFIG1\n\
		Nickname = Secondary\n\
		Max Pos  = 125000\n\
		Dev Typ  = OB\n\
		TComp ON = 0\n\
		TempCo A = +0086\n\
		TempCo B = +0086\n\
		TempCo C = +0086\n\
		TempCo D = +0086\n\
		TempCo E = +0086\n\
		TC Mode  = A\n\
		BLC En   = 0\n\
		BLC Stps = +40\n\
		LED Brt  = 075\n\
		TC@Start = 0\n\
		END\n",
	);
	let config = port.channel_config(C1).unwrap();
	assert_eq!(
		config,
		ChannelConfig::new("Secondary".to_string(), "OB".to_string(), 125_000)
	);
	assert_eq!(port.backend().written(), b"<F1GETCONFIG>");
	assert!(port.backend().is_empty());
}

#[test]
fn channel_config_wrong_header() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(b"!\nCONFIG1\nNickname = Focuser\n");
	let err = violation(port.channel_config(C0).unwrap_err());
	assert_eq!(err.expected(), "CONFIG0");
	assert_eq!(err.actual(), b"CONFIG1\n");
	assert!(!err.is_timeout());
	// Nothing after the offending line is read.
	assert_eq!(port.backend().remaining(), b"Nickname = Focuser\n");
}

#[test]
fn channel_status() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(
		b"!\n\
		STATUS0\n\
		Temp(C)  = +21.50\n\
		Curr Pos = 005000\n\
		Targ Pos = 005500\n\
		IsMoving = 1\n\
		IsHoming = 0\n\
		IsHomed  = 0\n\
		FFDetect = 0\n\
		TmpProbe = 1\n\
		RemoteIO = 0\n\
		Hnd Ctlr = 0\n\
		Reverse  = 0\n\
		END\n",
	);
	let status = port.channel_status(C0).unwrap().unwrap();
	assert_eq!(status, ChannelStatus::new(21.5, 5000, 5500, true));
	assert_eq!(port.backend().written(), b"<F0GETSTATUS>");
	assert!(port.backend().is_empty());
}

#[test]
fn channel_status_not_present() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(
		b"!\n\
		STATUS1\n\
		Temp(C)  = NP\n\
		Curr Pos = NP\n\
		Targ Pos = \xde\xad\n\
		IsMoving = ?\n\
		\n\
		\n\
		garbage\n\
		garbage\n\
		garbage\n\
		garbage\n\
		garbage\n\
		END?\n",
	);
	assert_eq!(port.channel_status(C1).unwrap(), None);
	assert!(port.backend().is_empty());
}

#[test]
fn set_target_steps() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(b"!\nM\n");
	port.set_target_steps(C0, steps(12345)).unwrap();
	assert_eq!(port.backend().written(), b"<F0MA012345>");

	port.backend_mut().take_written();
	port.backend_mut().queue_reply(b"!\nMOVING\n");
	let err = violation(port.set_target_steps(C1, Steps::ZERO).unwrap_err());
	assert_eq!(err.expected(), "M");
	assert_eq!(err.actual(), b"MOVING\n");
	assert_eq!(port.backend().written(), b"<F1MA000000>");
}

#[test]
fn stop_and_sync_consume_two_lines() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(b"!\nHALTED\nextra\n");
	port.stop(C1).unwrap();
	assert_eq!(port.backend().remaining(), b"extra\n");

	// The earlier leftover is flushed before sending, the new one stays unread.
	port.backend_mut().queue_reply(b"!\nSET\nmore\n");
	port.sync_position(C0, steps(50_000)).unwrap();
	assert_eq!(port.backend().remaining(), b"more\n");
	assert_eq!(port.backend().written(), b"<F1HALT><F0SCCP050000>");
}

#[test]
fn acknowledgement_failures() {
	let mut port = Port::open_mock();
	check_cases!(port,
		ok case b"!\nHALTED\n" via |p| p.stop(C0),
		err case b"?\nHALTED\n" via |p| p.stop(C0) => ProtocolViolationError,
		err case b"! \nHALTED\n" via |p| p.stop(C0) => ProtocolViolationError,
		err case b"!\r\nHALTED\r\n" via |p| p.stop(C0) => ProtocolViolationError,
		ok case b"!\nSET\n" via |p| p.sync_position(C1, Steps::MAX),
		err case b"HALTED\n" via |p| p.stop(C0) => ProtocolViolationError,
		err case b"!\n" via |p| p.sync_position(C0, Steps::ZERO) => ProtocolViolationError,
		err case b"!\nM\n" via |p| p.sync_position(C0, Steps::ZERO) => ProtocolViolationError,
		err case b"SET\n" via |p| p.sync_position(C0, Steps::ZERO) => ProtocolViolationError,
		err case b"?\nSET\n" via |p| p.sync_position(C0, Steps::ZERO) => ProtocolViolationError,
		ok case b"!\n", b"M\n" via |p| p.set_target_steps(C0, Steps::MAX),
	);
}

#[test]
fn not_present_reply_with_overlong_line() {
	let mut port = Port::open_mock();
	let mut reply = b"!\nSTATUS1\nTemp(C)  = NP\n".to_vec();
	reply.extend_from_slice(&[b'#'; 200]);
	reply.extend_from_slice(b"\n1\n2\n3\n4\n5\n6\n7\n8\n9\nEND\n");
	port.backend_mut().queue_reply(&reply);
	assert_eq!(port.channel_status(C1).unwrap(), None);
	assert!(port.backend().is_empty());
}

#[test]
fn stale_input_is_discarded() {
	let mut port = Port::open_mock();
	// A reply from an earlier exchange that was abandoned part way through.
	port.backend_mut().append_data(b"TC@Start = 0\nEND\n!\nHALTED\n");
	port.backend_mut().queue_reply(b"!\nM\n");
	port.set_target_steps(C0, steps(1)).unwrap();
	assert!(port.backend().is_empty());
}

#[test]
fn timeout_mid_reply() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(b"!\nSTATUS0\nTemp(C)  = +21.50\nCurr Pos = 00");
	let err = port.channel_status(C0).unwrap_err();
	assert!(err.is_timeout());
	assert!(err.is_protocol_violation());
	let err = violation(err);
	assert_eq!(err.expected(), "Curr Pos = ...");
	assert_eq!(err.actual(), b"Curr Pos = 00");

	// No reply at all.
	let err = violation(port.stop(C0).unwrap_err());
	assert_eq!(err.expected(), "!");
	assert!(err.actual().is_empty());
	assert!(err.is_timeout());
}

#[test]
fn io_errors_propagate() {
	let mut port = Port::open_mock();
	port.backend_mut()
		.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
	let err = port.stop(C0).unwrap_err();
	assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
	assert!(!err.is_timeout());

	port.backend_mut()
		.clear_input_error(Some(io::Error::new(io::ErrorKind::Other, "flush failed")));
	assert!(matches!(port.stop(C0), Err(Error::Io(_))));
	// Nothing is sent if the input could not be discarded.
	assert!(port.backend().written().is_empty());
}

#[test]
fn poisoned_port_reports_error_first() {
	let mut port = Port::open_mock();
	port.poison(io::Error::new(io::ErrorKind::Other, "poisoned"));
	port.backend_mut().queue_reply(b"!\nHALTED\n");
	let err = port.stop(C0).unwrap_err();
	assert!(matches!(err, Error::Io(ref e) if e.to_string() == "poisoned"));
	assert!(port.backend().written().is_empty());

	port.stop(C0).unwrap();
}

#[test]
fn command_writes_without_reading() {
	let mut port = Port::open_mock();
	port.backend_mut().queue_reply(b"!\nHALTED\n");
	port.command(Command::Halt(C0)).unwrap();
	assert_eq!(port.backend().written(), b"<F0HALT>");
	assert_eq!(port.backend().remaining(), b"!\nHALTED\n");
}

#[test]
fn read_write_passthrough() {
	use std::io::{Read as _, Write as _};

	let mut port = Port::open_mock();
	port.write_all(b"<F0HALT>").unwrap();
	port.backend_mut().append_data(b"!\n");
	let mut buf = [0; 2];
	port.read_exact(&mut buf).unwrap();
	assert_eq!(&buf, b"!\n");

	port.poison(io::Error::new(io::ErrorKind::Other, "poisoned"));
	assert!(port.flush().is_err());
	assert!(port.flush().is_ok());
}
