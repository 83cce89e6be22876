//! Device abstraction layer.
//!
//! Provides the `SerialDevice` trait separating session logic from the
//! underlying hardware, the real tty implementation, and a mock for tests.

pub mod error;
pub mod mock;
#[cfg(target_os = "linux")]
pub(crate) mod termios;
pub mod tty;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialDevice;
pub use traits::SerialDevice;
pub use tty::TtyDevice;
