//! End-to-end protocol tests against the public API, driven by the mock
//! device.

use pretty_assertions::assert_eq;
use serial_line::{
    BaudRate, ConfigWord, DataBits, FlowControl, LineSettings, MockSerialDevice, Parity,
    PortConfiguration, SerialSession, SessionError, StopBits,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_8n1(baud: BaudRate) -> PortConfiguration {
    PortConfiguration::new(
        baud,
        DataBits::Eight,
        Parity::Off,
        FlowControl::None,
        StopBits::One,
    )
}

fn session_over(mock: &MockSerialDevice) -> SerialSession {
    SerialSession::from_device(Box::new(mock.clone()), config_8n1(BaudRate::B9600))
}

#[test]
fn command_response_roundtrip() {
    init_logging();
    let mock = MockSerialDevice::new("MOCK0");
    let mut session = session_over(&mock);

    // Device echoes a banner fragment before answering the command.
    mock.enqueue_read(b"...booting\nREADY\n");

    let written = session.write(b"STATUS\n").unwrap();
    assert_eq!(written, 7);
    assert_eq!(mock.written(), b"STATUS\n");

    let line = session.read_line(64).unwrap();
    assert_eq!(line.as_bytes(), b"READY");
    assert!(!line.is_truncated());
}

#[test]
fn capacity_bound_read_is_detectable() {
    init_logging();
    let mock = MockSerialDevice::new("MOCK0");
    let mut session = session_over(&mock);
    mock.enqueue_read(b"garbage\nHello World\n");

    let line = session.read_line(5).unwrap();
    assert_eq!(line.as_bytes(), b"Hello");
    assert_eq!(line.len(), 5);
    assert!(line.is_truncated());
}

#[test]
fn consecutive_lines_need_no_reframing_garbage() {
    init_logging();
    let mock = MockSerialDevice::new("MOCK0");
    let mut session = session_over(&mock);
    mock.enqueue_read(b"\nfirst\n\nsecond\n");

    let first = session.read_line(32).unwrap();
    assert_eq!(first.as_bytes(), b"first");
    // Each read frames itself on a fresh delimiter, so the blank line
    // between payloads keeps the second line intact.
    let second = session.read_line(32).unwrap();
    assert_eq!(second.as_bytes(), b"second");
}

#[test]
fn partial_write_reports_progress_and_stops() {
    init_logging();
    let mock = MockSerialDevice::new("MOCK0");
    let mut session = session_over(&mock);
    mock.fail_write_at(3);

    let err = session.write(&[0x10, 0x20, 0x30, 0x40, 0x50]).unwrap_err();
    match err {
        SessionError::Transmission { written, .. } => assert_eq!(written, 2),
        other => panic!("expected Transmission, got {other:?}"),
    }
    assert_eq!(mock.written(), &[0x10, 0x20]);
}

#[test]
fn packed_word_session_applies_decoded_settings() {
    init_logging();
    // 5 data bits, even parity, no flow control, one stop bit, over an
    // invalid path: the configuration decodes but the open fails.
    let session = SerialSession::connect_packed(
        "/dev/nonexistent_serial_line_12345",
        9600,
        ConfigWord(0b0001000),
    );
    assert!(matches!(
        session.fault(),
        Some(SessionError::InvalidDevicePath { .. })
    ));

    // A reserved-bit word fails before any device access.
    let session =
        SerialSession::connect_packed("/dev/nonexistent_serial_line_12345", 9600, ConfigWord(0xff));
    assert!(matches!(session.fault(), Some(SessionError::Config(_))));
}

#[test]
fn invalid_session_never_performs_io() {
    init_logging();
    let settings = LineSettings {
        stop_bits: 3,
        ..LineSettings::default()
    };
    let mut session = SerialSession::connect("/dev/null", 9600, settings);

    assert!(!session.is_valid());
    assert!(matches!(
        session.write(b"x"),
        Err(SessionError::Unconfigured)
    ));
    assert!(matches!(
        session.read_line(8),
        Err(SessionError::Unconfigured)
    ));
}

#[test]
fn requested_baud_is_floored_onto_the_ladder() {
    init_logging();
    let mock = MockSerialDevice::new("MOCK0");
    let config = config_8n1(BaudRate::nearest(14_000).unwrap());
    let session = SerialSession::from_device(Box::new(mock), config);

    assert_eq!(session.configuration().unwrap().baud, BaudRate::B9600);
}
