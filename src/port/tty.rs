//! Real serial device implementation.
//!
//! Opens the device through the `serialport` builder and, on Linux,
//! finishes the line discipline through the termios translation so the
//! full configuration (echo, CR/NL handling, VMIN/VTIME, combined flow
//! control) lands on the device.

use super::error::PortError;
use super::traits::SerialDevice;
use crate::config::PortConfiguration;
use std::io::{Read, Write};

/// A synchronous, exclusively-owned serial device.
pub struct TtyDevice {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The device path for identification.
    name: String,
}

impl TtyDevice {
    /// Open a device path and apply the given line configuration.
    ///
    /// # Example
    /// ```no_run
    /// use serial_line::{BaudRate, DataBits, FlowControl, Parity, PortConfiguration, StopBits, TtyDevice};
    ///
    /// let config = PortConfiguration::new(
    ///     BaudRate::B115200,
    ///     DataBits::Eight,
    ///     Parity::Off,
    ///     FlowControl::None,
    ///     StopBits::One,
    /// );
    /// let device = TtyDevice::open("/dev/ttyUSB0", &config)?;
    /// # Ok::<(), serial_line::PortError>(())
    /// ```
    pub fn open(path: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let builder = serialport::new(path, config.baud.as_u32())
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout());

        #[cfg(target_os = "linux")]
        let port: Box<dyn serialport::SerialPort> = {
            use std::os::unix::io::AsRawFd;

            let native = builder.open_native().map_err(|e| Self::map_open_error(path, e))?;
            super::termios::apply_to_fd(native.as_raw_fd(), config)?;
            Box::new(native)
        };

        #[cfg(not(target_os = "linux"))]
        let port = builder.open().map_err(|e| Self::map_open_error(path, e))?;

        tracing::debug!(device = path, baud = %config.baud, "serial device opened");

        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    fn map_open_error(path: &str, e: serialport::Error) -> PortError {
        match e.kind() {
            serialport::ErrorKind::NoDevice => PortError::not_found(path),
            serialport::ErrorKind::InvalidInput => PortError::apply(e.to_string()),
            _ => PortError::Serial(e),
        }
    }
}

impl SerialDevice for TtyDevice {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.port.flush().map_err(PortError::Io)
    }

    fn discard_input(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(PortError::Serial)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TtyDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyDevice")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}
