//! Baud rate ladder and resolution.
//!
//! Serial line disciplines only support a fixed set of discrete rates. This
//! module maps an arbitrary requested rate onto that ladder with a monotone
//! floor policy: the largest supported rate not above the request.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// A discrete baud rate supported by the line discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaudRate {
    B50,
    B75,
    B110,
    B134,
    B150,
    B200,
    B300,
    B600,
    B1200,
    B1800,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
}

/// Supported rates, highest first, in resolution scan order.
const LADDER: [BaudRate; 19] = [
    BaudRate::B460800,
    BaudRate::B230400,
    BaudRate::B115200,
    BaudRate::B57600,
    BaudRate::B38400,
    BaudRate::B19200,
    BaudRate::B9600,
    BaudRate::B4800,
    BaudRate::B2400,
    BaudRate::B1800,
    BaudRate::B1200,
    BaudRate::B600,
    BaudRate::B300,
    BaudRate::B200,
    BaudRate::B150,
    BaudRate::B134,
    BaudRate::B110,
    BaudRate::B75,
    BaudRate::B50,
];

impl BaudRate {
    /// Resolve a requested rate to the nearest supported rate at or below it.
    ///
    /// Requests below the bottom of the ladder floor to [`BaudRate::B50`];
    /// a request of zero is rejected.
    ///
    /// # Example
    /// ```
    /// use serial_line::BaudRate;
    ///
    /// assert_eq!(BaudRate::nearest(115200)?, BaudRate::B115200);
    /// assert_eq!(BaudRate::nearest(1000)?, BaudRate::B600);
    /// # Ok::<(), serial_line::ConfigError>(())
    /// ```
    pub fn nearest(request: u32) -> Result<Self, ConfigError> {
        if request == 0 {
            return Err(ConfigError::InvalidBaudRequest(request));
        }

        Ok(LADDER
            .iter()
            .copied()
            .find(|rate| request >= rate.as_u32())
            .unwrap_or(BaudRate::B50))
    }

    /// The numeric rate in bits per second.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::B50 => 50,
            Self::B75 => 75,
            Self::B110 => 110,
            Self::B134 => 134,
            Self::B150 => 150,
            Self::B200 => 200,
            Self::B300 => 300,
            Self::B600 => 600,
            Self::B1200 => 1200,
            Self::B1800 => 1800,
            Self::B2400 => 2400,
            Self::B4800 => 4800,
            Self::B9600 => 9600,
            Self::B19200 => 19200,
            Self::B38400 => 38400,
            Self::B57600 => 57600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
        }
    }

    /// The termios speed constant for this rate.
    #[cfg(target_os = "linux")]
    pub(crate) fn speed_flag(self) -> libc::speed_t {
        match self {
            Self::B50 => libc::B50,
            Self::B75 => libc::B75,
            Self::B110 => libc::B110,
            Self::B134 => libc::B134,
            Self::B150 => libc::B150,
            Self::B200 => libc::B200,
            Self::B300 => libc::B300,
            Self::B600 => libc::B600,
            Self::B1200 => libc::B1200,
            Self::B1800 => libc::B1800,
            Self::B2400 => libc::B2400,
            Self::B4800 => libc::B4800,
            Self::B9600 => libc::B9600,
            Self::B19200 => libc::B19200,
            Self::B38400 => libc::B38400,
            Self::B57600 => libc::B57600,
            Self::B115200 => libc::B115200,
            Self::B230400 => libc::B230400,
            Self::B460800 => libc::B460800,
        }
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}
