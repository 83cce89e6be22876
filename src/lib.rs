//! Serial Line
//!
//! Validated serial line-discipline configuration and line-oriented,
//! blocking I/O sessions for talking to external devices (sensors, modems,
//! controllers) over a character device.
//!
//! # Modules
//!
//! - `baud`: the supported rate ladder and the floor resolver
//! - `config`: typed line settings, validation, and the packed
//!   configuration byte
//! - `port`: the `SerialDevice` seam, the real tty implementation, and a
//!   mock for tests
//! - `session`: session lifecycle plus the write and line-read protocols
//!
//! # Quick start
//!
//! ```no_run
//! use serial_line::{LineSettings, SerialSession};
//!
//! let mut session = SerialSession::connect("/dev/ttyUSB0", 19200, LineSettings::default());
//! session.write(b"STATUS\n")?;
//! let line = session.read_line(256)?;
//! println!("device said: {}", String::from_utf8_lossy(line.without_trailing_cr()));
//! # Ok::<(), serial_line::SessionError>(())
//! ```

pub mod baud;
pub mod config;
pub mod port;
pub mod session;

// Re-export commonly used types for convenience
pub use baud::BaudRate;
pub use config::{
    ConfigError, ConfigWord, DataBits, FlowControl, LineSettings, Parity, PortConfiguration,
    StopBits,
};
pub use port::{MockSerialDevice, PortError, SerialDevice, TtyDevice};
pub use session::{Line, SerialSession, SessionError, LINE_DELIMITER};
