//! Line-discipline configuration: typed selectors, validation, and the
//! packed configuration byte.
//!
//! A [`PortConfiguration`] is only obtainable through validating
//! constructors, so a constructed value is always internally consistent.
//! Configurations come either from explicit fields (the raw selector
//! values external callers supply) or from a [`ConfigWord`], the 7-bit
//! packed encoding used on the wire by configuration frames.

use crate::baud::BaudRate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Validation failures when building a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The requested baud rate was zero.
    #[error("invalid baud request: {0}")]
    InvalidBaudRequest(u32),

    /// Word length outside the 5..=8 range.
    #[error("invalid word length: {0} (supported: 5-8)")]
    InvalidWordLength(u8),

    /// Parity selector not recognized.
    #[error("invalid parity selector: {0} (supported: 1 even, 2 odd)")]
    InvalidParitySelector(u8),

    /// Flow-control selector not recognized.
    #[error("invalid flow control selector: {0} (supported: 0-3)")]
    InvalidFlowControlSelector(u8),

    /// Stop-bit count not recognized.
    #[error("invalid stop bit count: {0} (supported: 1 or 2)")]
    InvalidStopBitSelector(u8),

    /// A packed configuration byte with the reserved high bit set.
    #[error("invalid packed configuration byte: {0:#04x} (bit 7 is reserved)")]
    InvalidConfigWord(u8),
}

/// Number of data bits per transmitted character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// Parse a word length given as a bit count.
    pub fn from_count(count: u8) -> Result<Self, ConfigError> {
        match count {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(ConfigError::InvalidWordLength(other)),
        }
    }

    /// The word length as a bit count.
    pub fn count(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Off,
    Even,
    Odd,
}

impl Parity {
    /// Parse the raw enable flag + type selector pair.
    ///
    /// With parity disabled the selector is ignored and the result is
    /// [`Parity::Off`]. With parity enabled, 1 selects even and 2 selects
    /// odd; anything else is rejected.
    pub fn from_selector(enabled: bool, selector: u8) -> Result<Self, ConfigError> {
        if !enabled {
            return Ok(Self::Off);
        }
        match selector {
            1 => Ok(Self::Even),
            2 => Ok(Self::Odd),
            other => Err(ConfigError::InvalidParitySelector(other)),
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::Off => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
    SoftwareAndHardware,
}

impl FlowControl {
    /// Parse the raw flow-control selector (0 none, 1 software,
    /// 2 hardware, 3 both).
    pub fn from_selector(selector: u8) -> Result<Self, ConfigError> {
        match selector {
            0 => Ok(Self::None),
            1 => Ok(Self::Software),
            2 => Ok(Self::Hardware),
            3 => Ok(Self::SoftwareAndHardware),
            other => Err(ConfigError::InvalidFlowControlSelector(other)),
        }
    }
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            // The serialport builder cannot express both modes at once;
            // the termios pass layers the software half back in on Linux.
            FlowControl::Hardware | FlowControl::SoftwareAndHardware => {
                serialport::FlowControl::Hardware
            }
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Parse a stop-bit count.
    pub fn from_count(count: u8) -> Result<Self, ConfigError> {
        match count {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(ConfigError::InvalidStopBitSelector(other)),
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Default VMIN: block until at least one byte is available.
pub const DEFAULT_MIN_READ: u8 = 1;
/// Default VTIME in deciseconds (0.5 s inter-byte read timeout).
pub const DEFAULT_READ_TIMEOUT_DS: u8 = 5;

/// A validated, immutable serial line configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    pub baud: BaudRate,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    pub stop_bits: StopBits,
    /// Minimum bytes a blocking read waits for (termios VMIN).
    #[serde(default = "default_min_read")]
    pub min_read: u8,
    /// Read timeout in deciseconds (termios VTIME). Bounds every blocking
    /// read; there is no other cancellation mechanism.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ds: u8,
}

fn default_min_read() -> u8 {
    DEFAULT_MIN_READ
}

fn default_read_timeout() -> u8 {
    DEFAULT_READ_TIMEOUT_DS
}

impl PortConfiguration {
    /// Build a configuration from already-typed selectors.
    pub fn new(
        baud: BaudRate,
        data_bits: DataBits,
        parity: Parity,
        flow_control: FlowControl,
        stop_bits: StopBits,
    ) -> Self {
        Self {
            baud,
            data_bits,
            parity,
            flow_control,
            stop_bits,
            min_read: DEFAULT_MIN_READ,
            read_timeout_ds: DEFAULT_READ_TIMEOUT_DS,
        }
    }

    /// Build a configuration from the raw explicit fields, validating each.
    ///
    /// No partial configuration is ever produced: the first invalid field
    /// fails the whole construction.
    pub fn from_fields(baud: BaudRate, fields: LineSettings) -> Result<Self, ConfigError> {
        let data_bits = DataBits::from_count(fields.word_length)?;
        let parity = Parity::from_selector(fields.parity_on, fields.parity_selector)?;
        let flow_control = FlowControl::from_selector(fields.flow_selector)?;
        let stop_bits = StopBits::from_count(fields.stop_bits)?;
        Ok(Self::new(baud, data_bits, parity, flow_control, stop_bits))
    }

    /// Decode a packed configuration byte into a configuration.
    pub fn from_packed(baud: BaudRate, word: ConfigWord) -> Result<Self, ConfigError> {
        Self::from_fields(baud, word.settings()?)
    }

    /// The read timeout as a [`Duration`], for the portable port layer.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.read_timeout_ds) * 100)
    }
}

/// Explicit raw configuration fields, as supplied by external callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// Data bits per character (5-8).
    pub word_length: u8,
    /// Whether parity checking is enabled.
    pub parity_on: bool,
    /// Parity type when enabled (1 even, 2 odd).
    pub parity_selector: u8,
    /// Flow control mode (0 none, 1 software, 2 hardware, 3 both).
    pub flow_selector: u8,
    /// Stop bit count (1 or 2).
    pub stop_bits: u8,
}

impl Default for LineSettings {
    /// 8 data bits, no parity, no flow control, one stop bit.
    fn default() -> Self {
        Self {
            word_length: 8,
            parity_on: false,
            parity_selector: 0,
            flow_selector: 0,
            stop_bits: 1,
        }
    }
}

/// The 7-bit packed line configuration byte.
///
/// Layout (least significant bit first):
///
/// | bits | field        | values                               |
/// |------|--------------|--------------------------------------|
/// | 0-1  | word length  | `00`→5, `01`→6, `10`→7, `11`→8       |
/// | 2-3  | parity       | `10`→even, all other patterns→off    |
/// | 4-5  | flow control | `00` none, `01` sw, `10` hw, `11` both |
/// | 6    | stop bits    | `0`→one, `1`→two                     |
///
/// Parity pattern `11` collapses to off rather than selecting odd; odd
/// parity is only reachable through [`LineSettings`]. Bit 7 is reserved
/// and must be clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWord(pub u8);

impl ConfigWord {
    /// Extract the raw selector fields, rejecting a set reserved bit.
    pub fn settings(self) -> Result<LineSettings, ConfigError> {
        if self.0 & 0x80 != 0 {
            return Err(ConfigError::InvalidConfigWord(self.0));
        }

        let (parity_on, parity_selector) = match (self.0 >> 2) & 0b11 {
            0b10 => (true, 1),
            _ => (false, 0),
        };

        Ok(LineSettings {
            word_length: 5 + (self.0 & 0b11),
            parity_on,
            parity_selector,
            flow_selector: (self.0 >> 4) & 0b11,
            stop_bits: if self.0 & 0x40 != 0 { 2 } else { 1 },
        })
    }
}

impl From<u8> for ConfigWord {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn word_length_range_is_enforced() {
        assert!(DataBits::from_count(5).is_ok());
        assert!(DataBits::from_count(8).is_ok());
        assert_eq!(
            DataBits::from_count(4),
            Err(ConfigError::InvalidWordLength(4))
        );
        assert_eq!(
            DataBits::from_count(9),
            Err(ConfigError::InvalidWordLength(9))
        );
    }

    #[test]
    fn parity_selector_ignored_when_disabled() {
        assert_eq!(Parity::from_selector(false, 7).unwrap(), Parity::Off);
    }

    #[test]
    fn parity_selector_validated_when_enabled() {
        assert_eq!(Parity::from_selector(true, 1).unwrap(), Parity::Even);
        assert_eq!(Parity::from_selector(true, 2).unwrap(), Parity::Odd);
        assert_eq!(
            Parity::from_selector(true, 0),
            Err(ConfigError::InvalidParitySelector(0))
        );
        assert_eq!(
            Parity::from_selector(true, 3),
            Err(ConfigError::InvalidParitySelector(3))
        );
    }

    #[test]
    fn flow_and_stop_selectors_validated() {
        assert_eq!(
            FlowControl::from_selector(3).unwrap(),
            FlowControl::SoftwareAndHardware
        );
        assert_eq!(
            FlowControl::from_selector(4),
            Err(ConfigError::InvalidFlowControlSelector(4))
        );
        assert_eq!(StopBits::from_count(2).unwrap(), StopBits::Two);
        assert_eq!(
            StopBits::from_count(3),
            Err(ConfigError::InvalidStopBitSelector(3))
        );
    }

    #[test]
    fn invalid_field_fails_whole_construction() {
        let fields = LineSettings {
            word_length: 9,
            ..LineSettings::default()
        };
        assert_eq!(
            PortConfiguration::from_fields(BaudRate::B9600, fields),
            Err(ConfigError::InvalidWordLength(9))
        );
    }

    #[test]
    fn packed_even_parity_word() {
        // 0b0001000: 5 data bits, even parity, no flow control, one stop bit.
        let config = PortConfiguration::from_packed(BaudRate::B9600, ConfigWord(8)).unwrap();
        assert_eq!(config.data_bits, DataBits::Five);
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.flow_control, FlowControl::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn packed_parity_pattern_three_collapses_to_off() {
        // 0b0111111: 8 data bits, parity bits `11` (off, not odd), both
        // flow control modes.
        let config = PortConfiguration::from_packed(BaudRate::B9600, ConfigWord(63)).unwrap();
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::Off);
        assert_eq!(config.flow_control, FlowControl::SoftwareAndHardware);
    }

    #[test]
    fn packed_stop_bit_flag() {
        let one = PortConfiguration::from_packed(BaudRate::B9600, ConfigWord(0b0111111)).unwrap();
        assert_eq!(one.stop_bits, StopBits::One);

        let two = PortConfiguration::from_packed(BaudRate::B9600, ConfigWord(0b1111111)).unwrap();
        assert_eq!(two.stop_bits, StopBits::Two);
    }

    #[test]
    fn packed_reserved_bit_rejected() {
        assert_eq!(
            ConfigWord(0x80).settings(),
            Err(ConfigError::InvalidConfigWord(0x80))
        );
        assert_eq!(
            ConfigWord(0xff).settings(),
            Err(ConfigError::InvalidConfigWord(0xff))
        );
    }

    #[test]
    fn configuration_carries_read_gating_defaults() {
        let config = PortConfiguration::new(
            BaudRate::B19200,
            DataBits::Eight,
            Parity::Off,
            FlowControl::None,
            StopBits::One,
        );
        assert_eq!(config.min_read, DEFAULT_MIN_READ);
        assert_eq!(config.read_timeout_ds, DEFAULT_READ_TIMEOUT_DS);
        assert_eq!(config.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn serialport_conversions() {
        let bits: serialport::DataBits = DataBits::Seven.into();
        assert_eq!(bits, serialport::DataBits::Seven);

        let parity: serialport::Parity = Parity::Even.into();
        assert_eq!(parity, serialport::Parity::Even);

        let flow: serialport::FlowControl = FlowControl::SoftwareAndHardware.into();
        assert_eq!(flow, serialport::FlowControl::Hardware);

        let stop: serialport::StopBits = StopBits::Two.into();
        assert_eq!(stop, serialport::StopBits::Two);
    }
}
