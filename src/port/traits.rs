//! The `SerialDevice` trait.
//!
//! Session logic talks to the device only through this trait, so real
//! hardware and mock implementations are interchangeable.

use super::error::PortError;

/// Blocking byte-level access to a serial device.
///
/// Implementations are single-owner and non-reentrant; the caller
/// serializes access.
pub trait SerialDevice: Send + std::fmt::Debug {
    /// Write bytes to the device.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the device into the provided buffer.
    ///
    /// Blocks until at least one byte arrives or the device-level read
    /// timeout expires. Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Block until all pending output has been transmitted.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Discard any buffered, unread input.
    fn discard_input(&mut self) -> Result<(), PortError>;

    /// The path or name identifying this device.
    fn name(&self) -> &str;
}
