//! Device kinds and registry lookup keys.

use core::fmt;
use core::fmt::Write as _;

use crate::error::{HalError, HalResult};

/// Longest accepted device name.
pub const DEVICE_NAME_MAX_LEN: usize = 16;

/// Peripheral type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    /// General-purpose I/O pin
    Gpio,
    /// Serial port
    Uart,
    /// SPI controller
    Spi,
    /// I2C controller
    I2c,
    /// Analog-to-digital converter
    Adc,
    /// Digital-to-analog converter
    Dac,
    /// General-purpose timer
    Timer,
    /// Real-time clock
    Rtc,
    /// CRC unit
    Crc,
    /// Independent watchdog
    Watchdog,
    /// USB device controller
    Usb,
    /// Option-byte storage
    OptionBytes,
}

impl DeviceKind {
    /// Every kind, in registry order.
    pub const ALL: [Self; 12] = [
        Self::Gpio,
        Self::Uart,
        Self::Spi,
        Self::I2c,
        Self::Adc,
        Self::Dac,
        Self::Timer,
        Self::Rtc,
        Self::Crc,
        Self::Watchdog,
        Self::Usb,
        Self::OptionBytes,
    ];

    /// Canonical name prefix, e.g. `"UART"` for `UART1`.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Gpio => "GPIO",
            Self::Uart => "UART",
            Self::Spi => "SPI",
            Self::I2c => "I2C",
            Self::Adc => "ADC",
            Self::Dac => "DAC",
            Self::Timer => "TIMER",
            Self::Rtc => "RTC",
            Self::Crc => "CRC",
            Self::Watchdog => "WATCHDOG",
            Self::Usb => "USB",
            Self::OptionBytes => "OPTBYTES",
        }
    }

    /// Lower-case identifier used in board tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpio => "gpio",
            Self::Uart => "uart",
            Self::Spi => "spi",
            Self::I2c => "i2c",
            Self::Adc => "adc",
            Self::Dac => "dac",
            Self::Timer => "timer",
            Self::Rtc => "rtc",
            Self::Crc => "crc",
            Self::Watchdog => "watchdog",
            Self::Usb => "usb",
            Self::OptionBytes => "option_bytes",
        }
    }

    /// Parse a board-table identifier (see [`DeviceKind::as_str`]).
    #[must_use]
    pub fn from_str_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == id)
    }

    /// Always-on domains are constructed at registration instead of on first
    /// lookup.
    #[must_use]
    pub const fn constructs_eagerly(self) -> bool {
        matches!(self, Self::OptionBytes | Self::Rtc)
    }
}

/// Validated registry key: 1..=16 ASCII alphanumerics or `_`, case-sensitive.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceName(heapless::String<DEVICE_NAME_MAX_LEN>);

impl DeviceName {
    /// Validate `name`.
    pub fn new(name: &str) -> HalResult<Self> {
        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(HalError::InvalidArgument);
        }
        let mut s = heapless::String::new();
        s.push_str(name).map_err(|_| HalError::InvalidArgument)?;
        Ok(Self(s))
    }

    /// `<PREFIX><index>`, e.g. `UART2`.
    pub fn numbered(kind: DeviceKind, index: u16) -> HalResult<Self> {
        let mut s: heapless::String<DEVICE_NAME_MAX_LEN> = heapless::String::new();
        write!(s, "{}{}", kind.prefix(), index).map_err(|_| HalError::InvalidArgument)?;
        Self::new(s.as_str())
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for DeviceName {
    type Error = HalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl PartialEq<str> for DeviceName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for DeviceName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

// Ordering and hashing follow the underlying str, so maps keyed by
// `DeviceName` can be queried with `&str`.
impl core::borrow::Borrow<str> for DeviceName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceName({})", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceName {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_registry_style_names() {
        assert_eq!(DeviceName::new("GPIOA0").unwrap(), "GPIOA0");
        assert!(DeviceName::new("WATCHDOG0").is_ok());
        assert!(DeviceName::new("my_sensor_1").is_ok());
    }

    #[test]
    fn rejects_empty_long_and_punctuated_names() {
        assert_eq!(DeviceName::new(""), Err(HalError::InvalidArgument));
        assert_eq!(
            DeviceName::new("ABCDEFGHIJKLMNOPQ"),
            Err(HalError::InvalidArgument)
        );
        assert_eq!(DeviceName::new("UART-1"), Err(HalError::InvalidArgument));
        assert_eq!(DeviceName::new("uart 1"), Err(HalError::InvalidArgument));
    }

    #[test]
    fn names_are_case_sensitive() {
        let upper = DeviceName::new("UART1").unwrap();
        let lower = DeviceName::new("uart1").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn numbered_uses_kind_prefix() {
        assert_eq!(DeviceName::numbered(DeviceKind::Uart, 2).unwrap(), "UART2");
        assert_eq!(
            DeviceName::numbered(DeviceKind::OptionBytes, 0).unwrap(),
            "OPTBYTES0"
        );
    }

    #[test]
    fn kind_ids_round_trip() {
        for kind in DeviceKind::ALL {
            assert_eq!(DeviceKind::from_str_id(kind.as_str()), Some(kind));
        }
        assert_eq!(DeviceKind::from_str_id("flux"), None);
    }

    #[test]
    fn only_always_on_domains_are_eager() {
        let eager: Vec<_> = DeviceKind::ALL
            .into_iter()
            .filter(|k| k.constructs_eagerly())
            .collect();
        assert_eq!(eager, vec![DeviceKind::Rtc, DeviceKind::OptionBytes]);
    }
}
