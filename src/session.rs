//! Serial session lifecycle and line-oriented I/O.
//!
//! A [`SerialSession`] owns exactly one device handle. Construction walks
//! the lifecycle Closed → open device → Opened → apply configuration and
//! discard stale input → Valid; a failure at any step leaves the session
//! Invalid, which is terminal. Every read and write is gated on validity:
//! an Invalid session fails immediately with
//! [`SessionError::Unconfigured`] and never touches the device. There is
//! no retry-in-place; callers construct a new session to reconnect.
//!
//! The I/O model is single-threaded and fully blocking. Blocked reads are
//! bounded only by the VMIN/VTIME gating carried in the applied
//! [`PortConfiguration`].

use crate::baud::BaudRate;
use crate::config::{ConfigError, ConfigWord, LineSettings, PortConfiguration};
use crate::port::{PortError, SerialDevice, TtyDevice};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The byte terminating a line in the read protocol.
pub const LINE_DELIMITER: u8 = b'\n';

/// Delay before flushing stale input after configuration, giving bursty
/// devices time to finish emitting.
const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Errors surfaced by session construction and I/O.
///
/// I/O errors carry the progress made before the fault so callers can
/// decide whether to retry or abort; the session itself never retries.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The device path could not be opened.
    #[error("could not open serial device {path}: {source}")]
    InvalidDevicePath { path: String, source: PortError },

    /// The requested configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The device rejected the line-discipline configuration.
    #[error("could not configure serial device: {0}")]
    Apply(PortError),

    /// I/O was attempted through an Invalid session.
    #[error("session is not configured; construct a new session before performing I/O")]
    Unconfigured,

    /// A write failed partway through a transmission.
    #[error("transmission failed after {written} byte(s) written")]
    Transmission {
        written: usize,
        #[source]
        source: PortError,
    },

    /// A read failed partway through receiving a line.
    #[error("reception failed after {received} byte(s) received")]
    Reception {
        received: usize,
        #[source]
        source: PortError,
    },
}

/// One received line, delimiter excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
    delimited: bool,
}

impl Line {
    /// The received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The received bytes with a trailing carriage return removed, for
    /// devices that terminate lines with CRLF.
    pub fn without_trailing_cr(&self) -> &[u8] {
        self.bytes.strip_suffix(b"\r").unwrap_or(&self.bytes)
    }

    /// Number of bytes placed in the line.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the read stopped at the capacity bound before a delimiter
    /// was seen. The line is then a prefix of a longer transmission.
    pub fn is_truncated(&self) -> bool {
        !self.delimited
    }

    /// Consume the line, yielding its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Debug)]
enum SessionState {
    Valid {
        device: Box<dyn SerialDevice>,
        config: PortConfiguration,
    },
    Invalid {
        fault: SessionError,
    },
}

/// A configured serial session owning one device handle.
///
/// # Example
/// ```no_run
/// use serial_line::{LineSettings, SerialSession};
///
/// let mut session = SerialSession::connect("/dev/ttyUSB0", 115200, LineSettings::default());
/// if session.is_valid() {
///     session.write(b"AT\r\n")?;
///     let line = session.read_line(128)?;
///     println!("{}", String::from_utf8_lossy(line.as_bytes()));
/// }
/// # Ok::<(), serial_line::SessionError>(())
/// ```
#[derive(Debug)]
pub struct SerialSession {
    state: SessionState,
}

impl SerialSession {
    /// Open `path`, resolve `requested_baud` onto the supported ladder,
    /// validate and apply the explicit line settings.
    ///
    /// Always yields a session; on failure the session is Invalid and
    /// [`fault`](Self::fault) reports the cause.
    pub fn connect(path: &str, requested_baud: u32, settings: LineSettings) -> Self {
        Self::establish(path, requested_baud, |baud| {
            PortConfiguration::from_fields(baud, settings)
        })
    }

    /// Like [`connect`](Self::connect), with the line settings decoded
    /// from a packed configuration byte.
    pub fn connect_packed(path: &str, requested_baud: u32, word: ConfigWord) -> Self {
        Self::establish(path, requested_baud, |baud| {
            PortConfiguration::from_packed(baud, word)
        })
    }

    /// Build a session around an already-open device, for dependency
    /// injection. Stale input is discarded as in normal construction.
    pub fn from_device(mut device: Box<dyn SerialDevice>, config: PortConfiguration) -> Self {
        match device.discard_input() {
            Ok(()) => Self {
                state: SessionState::Valid { device, config },
            },
            Err(source) => Self::invalid(SessionError::Apply(source)),
        }
    }

    fn establish(
        path: &str,
        requested_baud: u32,
        build: impl FnOnce(BaudRate) -> Result<PortConfiguration, ConfigError>,
    ) -> Self {
        match Self::try_establish(path, requested_baud, build) {
            Ok(state) => Self { state },
            Err(fault) => {
                warn!(device = path, error = %fault, "serial session invalid");
                Self::invalid(fault)
            }
        }
    }

    fn try_establish(
        path: &str,
        requested_baud: u32,
        build: impl FnOnce(BaudRate) -> Result<PortConfiguration, ConfigError>,
    ) -> Result<SessionState, SessionError> {
        let baud = BaudRate::nearest(requested_baud)?;
        let config = build(baud)?;

        let mut device = TtyDevice::open(path, &config).map_err(|source| match source {
            apply @ PortError::Apply(_) => SessionError::Apply(apply),
            source => SessionError::InvalidDevicePath {
                path: path.to_string(),
                source,
            },
        })?;

        // Devices tend to emit bursty or stale bytes right after being
        // reconfigured; let the line settle and drop them.
        std::thread::sleep(SETTLE_DELAY);
        device.discard_input().map_err(SessionError::Apply)?;

        debug!(device = path, baud = %config.baud, "serial session established");

        Ok(SessionState::Valid {
            device: Box::new(device),
            config,
        })
    }

    fn invalid(fault: SessionError) -> Self {
        Self {
            state: SessionState::Invalid { fault },
        }
    }

    /// Whether the session reached the Valid state and still accepts I/O.
    pub fn is_valid(&self) -> bool {
        matches!(self.state, SessionState::Valid { .. })
    }

    /// The failure that made this session Invalid, if any.
    pub fn fault(&self) -> Option<&SessionError> {
        match &self.state {
            SessionState::Invalid { fault } => Some(fault),
            SessionState::Valid { .. } => None,
        }
    }

    /// The configuration applied to the device, for a Valid session.
    pub fn configuration(&self) -> Option<&PortConfiguration> {
        match &self.state {
            SessionState::Valid { config, .. } => Some(config),
            SessionState::Invalid { .. } => None,
        }
    }

    /// The device path, for a Valid session.
    pub fn device_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Valid { device, .. } => Some(device.name()),
            SessionState::Invalid { .. } => None,
        }
    }

    /// Transmit `data` one byte at a time.
    ///
    /// The first failed write aborts the transmission with
    /// [`SessionError::Transmission`] carrying the count of bytes already
    /// on the wire; remaining bytes are not attempted. On full success
    /// pending output is flushed and the full count is returned.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, SessionError> {
        let device = self.device_mut()?;

        for (written, byte) in data.iter().enumerate() {
            match device.write_bytes(std::slice::from_ref(byte)) {
                Ok(1) => {}
                Ok(_) => {
                    return Err(SessionError::Transmission {
                        written,
                        source: PortError::Io(io::Error::new(
                            io::ErrorKind::WriteZero,
                            "device accepted no bytes",
                        )),
                    })
                }
                Err(source) => return Err(SessionError::Transmission { written, source }),
            }
        }

        device.flush().map_err(|source| SessionError::Transmission {
            written: data.len(),
            source,
        })?;

        trace!(bytes = data.len(), "transmission complete");
        Ok(data.len())
    }

    /// Receive one delimited line of at most `capacity` bytes.
    ///
    /// Bytes are first discarded until a delimiter has been consumed,
    /// dropping any partial line left over from a previous transmission.
    /// Accumulation then stops at the next delimiter or at `capacity`,
    /// whichever comes first; [`Line::is_truncated`] distinguishes the
    /// capacity-bound case. A per-byte read failure aborts the whole read
    /// with [`SessionError::Reception`].
    pub fn read_line(&mut self, capacity: usize) -> Result<Line, SessionError> {
        let device = self.device_mut()?;

        // Framing: skip to the start of the next line. Nothing has been
        // accumulated yet, so a fault here reports zero progress.
        let mut discarded = 0usize;
        loop {
            if read_byte(device, 0)? == LINE_DELIMITER {
                break;
            }
            discarded += 1;
        }

        let mut bytes = Vec::with_capacity(capacity);
        let mut delimited = false;
        while bytes.len() < capacity {
            let byte = read_byte(device, bytes.len())?;
            if byte == LINE_DELIMITER {
                delimited = true;
                break;
            }
            bytes.push(byte);
        }

        trace!(
            bytes = bytes.len(),
            discarded,
            truncated = !delimited,
            "line received"
        );
        Ok(Line { bytes, delimited })
    }

    fn device_mut(&mut self) -> Result<&mut dyn SerialDevice, SessionError> {
        match &mut self.state {
            SessionState::Valid { device, .. } => Ok(device.as_mut()),
            SessionState::Invalid { .. } => Err(SessionError::Unconfigured),
        }
    }
}

fn read_byte(device: &mut dyn SerialDevice, received: usize) -> Result<u8, SessionError> {
    let mut buf = [0u8; 1];
    match device.read_bytes(&mut buf) {
        Ok(1) => Ok(buf[0]),
        Ok(_) => Err(SessionError::Reception {
            received,
            source: PortError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "device returned no bytes",
            )),
        }),
        Err(source) => Err(SessionError::Reception { received, source }),
    }
}
