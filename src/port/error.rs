//! Device-level error types.

use thiserror::Error;

/// Errors raised by the device layer.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device path could not be opened.
    #[error("serial device not found: {0}")]
    NotFound(String),

    /// An I/O error during a device operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device rejected the line-discipline configuration, or its
    /// current attributes could not be read back.
    #[error("failed to apply line discipline: {0}")]
    Apply(String),

    /// A serialport-specific error.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an Apply error from a message.
    pub fn apply(message: impl Into<String>) -> Self {
        Self::Apply(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "serial device not found: /dev/ttyUSB0");

        let err = PortError::apply("tcsetattr failed");
        assert_eq!(
            err.to_string(),
            "failed to apply line discipline: tcsetattr failed"
        );
    }
}
