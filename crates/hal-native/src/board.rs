//! Board tables: the data-driven list of devices a registry is built from.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "version": 1,
//!   "limits": { "max_per_kind": 8, "max_devices": 64 },
//!   "devices": [
//!     { "kind": "uart", "index": 1, "config": { "baud_rate": 9600 } },
//!     { "kind": "gpio", "index": 3, "name": "LED", "config": { "mode": "output" } },
//!     { "kind": "rtc", "index": 0, "config": { "initial": "2024-06-01T12:00:00" } }
//!   ]
//! }
//! ```
//!
//! `name` defaults to the canonical `<PREFIX><index>`. Every config field is
//! optional and falls back to the kind's default; unknown fields are errors.

use std::path::Path;

use serde::Deserialize;

use hal::{
    AdcConfig, BitOrder, CrcConfig, DacConfig, DataBits, DateTime, DeviceKind, GpioConfig,
    I2cConfig, OptionBytesConfig, Parity, PinLevel, PinMode, ProtectionLevel, RtcConfig,
    SpiConfig, SpiMode, StopBits, TimerConfig, TimerMode, UartConfig, UsbConfig, WatchdogConfig,
    OPTION_USER_DATA_LEN,
};

use crate::config::{RegistryLimits, BOARD_ENV_VAR};
use crate::descriptor::{DeviceConfig, DeviceDescriptor};

/// Supported board-table format version.
pub const BOARD_FORMAT_VERSION: u32 = 1;

/// Board-table loading errors.
#[derive(Debug)]
pub enum BoardError {
    /// Malformed JSON or a field of the wrong type
    Parse(String),
    /// `version` other than [`BOARD_FORMAT_VERSION`]
    UnsupportedVersion(u32),
    /// A device entry that cannot become a descriptor
    InvalidDevice(String),
    /// The table file could not be read
    Io(String),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::Parse(msg) => write!(f, "Parse error: {}", msg),
            BoardError::UnsupportedVersion(v) => write!(f, "Unsupported board version: {}", v),
            BoardError::InvalidDevice(msg) => write!(f, "Invalid device: {}", msg),
            BoardError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for BoardError {}

/// Registry limits plus the devices to register, in order.
#[derive(Debug, Clone, Default)]
pub struct BoardTable {
    /// Capacity limits for the registry
    pub limits: RegistryLimits,
    /// Descriptors in registration order
    pub devices: Vec<DeviceDescriptor>,
}

impl BoardTable {
    /// Empty table with `limits`.
    #[must_use]
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            devices: Vec::new(),
        }
    }

    /// Append a descriptor.
    pub fn push(&mut self, descriptor: DeviceDescriptor) {
        self.devices.push(descriptor);
    }

    /// A representative board: `GPIOA0..7`, `GPIOB0..7`, `UART0..2`,
    /// `SPI0..1`, `I2C0..1`, `ADC0`, `DAC0`, `TIMER0..3`, `RTC0`, `CRC0`,
    /// `WATCHDOG0`, `USB0`, `OPTBYTES0`, all with default configuration.
    #[must_use]
    pub fn default_board() -> Self {
        let gpio = ["A", "B"].into_iter().enumerate().flat_map(|(port, letter)| {
            (0..8u16).map(move |pin| {
                // port * 8 + pin < 16
                let index = u16::try_from(port).unwrap_or(0).saturating_mul(8).saturating_add(pin);
                DeviceDescriptor::named(DeviceKind::Gpio, index, &format!("GPIO{letter}{pin}"))
            })
        });
        let numbered = [
            (DeviceKind::Uart, 3),
            (DeviceKind::Spi, 2),
            (DeviceKind::I2c, 2),
            (DeviceKind::Adc, 1),
            (DeviceKind::Dac, 1),
            (DeviceKind::Timer, 4),
            (DeviceKind::Rtc, 1),
            (DeviceKind::Crc, 1),
            (DeviceKind::Watchdog, 1),
            (DeviceKind::Usb, 1),
            (DeviceKind::OptionBytes, 1),
        ]
        .into_iter()
        .flat_map(|(kind, count): (DeviceKind, u16)| {
            (0..count).map(move |i| DeviceDescriptor::new(kind, i))
        });
        Self {
            limits: RegistryLimits::default(),
            devices: gpio.chain(numbered).filter_map(Result::ok).collect(),
        }
    }

    /// Parse a JSON board table.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let parsed: JsonBoard =
            serde_json::from_str(json).map_err(|e| BoardError::Parse(e.to_string()))?;

        if parsed.version != BOARD_FORMAT_VERSION {
            return Err(BoardError::UnsupportedVersion(parsed.version));
        }

        let mut table = BoardTable::new(parsed.limits.unwrap_or_default());
        for device in parsed.devices {
            table.push(device.into_descriptor()?);
        }
        tracing::debug!(devices = table.devices.len(), "board table parsed");
        Ok(table)
    }

    /// Read and parse a JSON board table file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The table named by `HAL_NATIVE_BOARD`, or [`BoardTable::default_board`]
    /// when the variable is unset.
    pub fn from_env() -> Result<Self, BoardError> {
        match std::env::var_os(BOARD_ENV_VAR) {
            Some(path) => {
                tracing::debug!(path = ?path, "loading board table from environment");
                Self::from_path(path)
            }
            None => Ok(Self::default_board()),
        }
    }
}

// JSON format support

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonBoard {
    version: u32,
    #[serde(default)]
    limits: Option<RegistryLimits>,
    #[serde(default)]
    devices: Vec<JsonDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonDevice {
    kind: String,
    index: u16,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

impl JsonDevice {
    fn into_descriptor(self) -> Result<DeviceDescriptor, BoardError> {
        let kind = DeviceKind::from_str_id(&self.kind)
            .ok_or_else(|| BoardError::InvalidDevice(format!("unknown kind `{}`", self.kind)))?;
        let descriptor = match &self.name {
            Some(name) => DeviceDescriptor::named(kind, self.index, name),
            None => DeviceDescriptor::new(kind, self.index),
        }
        .map_err(|e| {
            BoardError::InvalidDevice(format!("{} {}: {}", self.kind, self.index, e.as_str()))
        })?;

        let Some(value) = self.config else {
            return Ok(descriptor);
        };
        let config = parse_config(kind, value).map_err(|msg| {
            BoardError::InvalidDevice(format!("{}: {}", descriptor.name, msg))
        })?;
        Ok(descriptor.with_config(config))
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn parse_config(kind: DeviceKind, value: serde_json::Value) -> Result<DeviceConfig, String> {
    Ok(match kind {
        DeviceKind::Gpio => DeviceConfig::Gpio(from_value::<JsonGpio>(value)?.into_config()),
        DeviceKind::Uart => DeviceConfig::Uart(from_value::<JsonUart>(value)?.into_config()?),
        DeviceKind::Spi => DeviceConfig::Spi(from_value::<JsonSpi>(value)?.into_config()?),
        DeviceKind::I2c => {
            let j: JsonI2c = from_value(value)?;
            DeviceConfig::I2c(I2cConfig {
                frequency: j.frequency,
                buffer_size: j.buffer_size,
            })
        }
        DeviceKind::Adc => {
            let j: JsonAdc = from_value(value)?;
            DeviceConfig::Adc(AdcConfig {
                channels: j.channels,
                resolution_bits: j.resolution_bits,
                reference_mv: j.reference_mv,
            })
        }
        DeviceKind::Dac => {
            let j: JsonDac = from_value(value)?;
            DeviceConfig::Dac(DacConfig {
                channels: j.channels,
                resolution_bits: j.resolution_bits,
            })
        }
        DeviceKind::Timer => DeviceConfig::Timer(from_value::<JsonTimer>(value)?.into_config()),
        DeviceKind::Rtc => DeviceConfig::Rtc(from_value::<JsonRtc>(value)?.into_config()?),
        DeviceKind::Crc => {
            let j: JsonCrc = from_value(value)?;
            DeviceConfig::Crc(CrcConfig {
                polynomial: j.polynomial,
                initial: j.initial,
            })
        }
        DeviceKind::Watchdog => {
            let j: JsonWatchdog = from_value(value)?;
            DeviceConfig::Watchdog(WatchdogConfig {
                timeout_ms: j.timeout_ms,
            })
        }
        DeviceKind::Usb => {
            let j: JsonUsb = from_value(value)?;
            DeviceConfig::Usb(UsbConfig {
                vendor_id: j.vendor_id,
                product_id: j.product_id,
                buffer_size: j.buffer_size,
            })
        }
        DeviceKind::OptionBytes => {
            DeviceConfig::OptionBytes(from_value::<JsonOptionBytes>(value)?.into_config()?)
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum JsonPinMode {
    Input,
    Output,
    InputOutput,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonGpio {
    mode: JsonPinMode,
    initial_high: bool,
}

impl Default for JsonGpio {
    fn default() -> Self {
        Self {
            mode: JsonPinMode::InputOutput,
            initial_high: false,
        }
    }
}

impl JsonGpio {
    fn into_config(self) -> GpioConfig {
        GpioConfig {
            mode: match self.mode {
                JsonPinMode::Input => PinMode::Input,
                JsonPinMode::Output => PinMode::Output,
                JsonPinMode::InputOutput => PinMode::InputOutput,
            },
            initial_level: PinLevel::from(self.initial_high),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonUart {
    baud_rate: u32,
    data_bits: u8,
    parity: String,
    stop_bits: u8,
    tx_buffer_size: usize,
    rx_buffer_size: usize,
}

impl Default for JsonUart {
    fn default() -> Self {
        let d = UartConfig::default();
        Self {
            baud_rate: d.baud_rate,
            data_bits: 8,
            parity: "none".into(),
            stop_bits: 1,
            tx_buffer_size: d.tx_buffer_size,
            rx_buffer_size: d.rx_buffer_size,
        }
    }
}

impl JsonUart {
    fn into_config(self) -> Result<UartConfig, String> {
        let data_bits = match self.data_bits {
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            9 => DataBits::Nine,
            n => return Err(format!("data_bits {n} not in 7..=9")),
        };
        let parity = match self.parity.as_str() {
            "none" => Parity::None,
            "even" => Parity::Even,
            "odd" => Parity::Odd,
            p => return Err(format!("unknown parity `{p}`")),
        };
        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            n => return Err(format!("stop_bits {n} not 1 or 2")),
        };
        Ok(UartConfig {
            baud_rate: self.baud_rate,
            data_bits,
            parity,
            stop_bits,
            tx_buffer_size: self.tx_buffer_size,
            rx_buffer_size: self.rx_buffer_size,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonSpi {
    frequency: u32,
    mode: u8,
    lsb_first: bool,
    buffer_size: usize,
}

impl Default for JsonSpi {
    fn default() -> Self {
        let d = SpiConfig::default();
        Self {
            frequency: d.frequency,
            mode: 0,
            lsb_first: false,
            buffer_size: d.buffer_size,
        }
    }
}

impl JsonSpi {
    fn into_config(self) -> Result<SpiConfig, String> {
        let mode = match self.mode {
            0 => SpiMode::Mode0,
            1 => SpiMode::Mode1,
            2 => SpiMode::Mode2,
            3 => SpiMode::Mode3,
            n => return Err(format!("spi mode {n} not in 0..=3")),
        };
        Ok(SpiConfig {
            frequency: self.frequency,
            mode,
            bit_order: if self.lsb_first {
                BitOrder::LsbFirst
            } else {
                BitOrder::MsbFirst
            },
            buffer_size: self.buffer_size,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonI2c {
    frequency: u32,
    buffer_size: usize,
}

impl Default for JsonI2c {
    fn default() -> Self {
        let d = I2cConfig::default();
        Self {
            frequency: d.frequency,
            buffer_size: d.buffer_size,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonAdc {
    channels: u8,
    resolution_bits: u8,
    reference_mv: u32,
}

impl Default for JsonAdc {
    fn default() -> Self {
        let d = AdcConfig::default();
        Self {
            channels: d.channels,
            resolution_bits: d.resolution_bits,
            reference_mv: d.reference_mv,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonDac {
    channels: u8,
    resolution_bits: u8,
}

impl Default for JsonDac {
    fn default() -> Self {
        let d = DacConfig::default();
        Self {
            channels: d.channels,
            resolution_bits: d.resolution_bits,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonTimer {
    period: u64,
    one_shot: bool,
}

impl Default for JsonTimer {
    fn default() -> Self {
        Self {
            period: TimerConfig::default().period,
            one_shot: false,
        }
    }
}

impl JsonTimer {
    fn into_config(self) -> TimerConfig {
        TimerConfig {
            period: self.period,
            mode: if self.one_shot {
                TimerMode::OneShot
            } else {
                TimerMode::Periodic
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonRtc {
    /// `YYYY-MM-DDTHH:MM:SS`
    initial: Option<String>,
}

impl JsonRtc {
    fn into_config(self) -> Result<RtcConfig, String> {
        let Some(text) = self.initial else {
            return Ok(RtcConfig::default());
        };
        Ok(RtcConfig {
            initial: parse_datetime(&text).ok_or_else(|| format!("bad datetime `{text}`"))?,
        })
    }
}

fn parse_datetime(text: &str) -> Option<DateTime> {
    let (date, time) = text.split_once('T')?;
    let mut d = date.splitn(3, '-');
    let mut t = time.splitn(3, ':');
    let year = d.next()?.parse().ok()?;
    let month = d.next()?.parse().ok()?;
    let day = d.next()?.parse().ok()?;
    let hour = t.next()?.parse().ok()?;
    let minute = t.next()?.parse().ok()?;
    let second = t.next()?.parse().ok()?;
    DateTime::new(year, month, day, hour, minute, second).ok()
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonCrc {
    polynomial: u32,
    initial: u32,
}

impl Default for JsonCrc {
    fn default() -> Self {
        let d = CrcConfig::default();
        Self {
            polynomial: d.polynomial,
            initial: d.initial,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonWatchdog {
    timeout_ms: u32,
}

impl Default for JsonWatchdog {
    fn default() -> Self {
        Self {
            timeout_ms: WatchdogConfig::default().timeout_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonUsb {
    vendor_id: u16,
    product_id: u16,
    buffer_size: usize,
}

impl Default for JsonUsb {
    fn default() -> Self {
        let d = UsbConfig::default();
        Self {
            vendor_id: d.vendor_id,
            product_id: d.product_id,
            buffer_size: d.buffer_size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonOptionBytes {
    protection_level: u8,
    user_config: u8,
    user_data: Vec<u8>,
    write_protected: bool,
}

impl JsonOptionBytes {
    fn into_config(self) -> Result<OptionBytesConfig, String> {
        let protection_level = ProtectionLevel::try_from(self.protection_level)
            .map_err(|_| format!("protection_level {} above 2", self.protection_level))?;
        let mut user_data = [0u8; OPTION_USER_DATA_LEN];
        user_data
            .get_mut(..self.user_data.len())
            .ok_or_else(|| format!("user_data longer than {OPTION_USER_DATA_LEN} bytes"))?
            .copy_from_slice(&self.user_data);
        Ok(OptionBytesConfig {
            protection_level,
            user_config: self.user_config,
            user_data,
            write_protected: self.write_protected,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn default_board_has_the_representative_set() {
        let board = BoardTable::default_board();
        assert_eq!(board.devices.len(), 34);
        let names: Vec<&str> = board.devices.iter().map(|d| d.name.as_str()).collect();
        for expected in ["GPIOA0", "GPIOB7", "UART2", "TIMER3", "WATCHDOG0", "OPTBYTES0"] {
            assert!(names.contains(&expected), "{expected} missing");
        }
        let b7 = board.devices.iter().find(|d| d.name == "GPIOB7").unwrap();
        assert_eq!(b7.index, 15);
    }

    #[test]
    fn parses_configs_and_names() {
        let json = r#"{
            "version": 1,
            "limits": { "max_per_kind": 4, "max_devices": 16 },
            "devices": [
                { "kind": "uart", "index": 1, "config": { "baud_rate": 9600, "parity": "even" } },
                { "kind": "gpio", "index": 3, "name": "LED", "config": { "mode": "output" } },
                { "kind": "rtc", "index": 0, "config": { "initial": "2024-06-01T12:00:00" } },
                { "kind": "option_bytes", "index": 0, "config": { "user_data": [1, 2, 3] } }
            ]
        }"#;
        let board = BoardTable::from_json(json).unwrap();
        assert_eq!(board.limits.max_per_kind, 4);
        assert_eq!(board.devices.len(), 4);
        match board.devices[0].config {
            DeviceConfig::Uart(c) => {
                assert_eq!(c.baud_rate, 9600);
                assert_eq!(c.parity, Parity::Even);
                assert_eq!(c.rx_buffer_size, hal::DEFAULT_BUFFER_SIZE);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(board.devices[1].name, "LED");
        match board.devices[2].config {
            DeviceConfig::Rtc(c) => assert_eq!(c.initial.hour(), 12),
            other => panic!("unexpected {other:?}"),
        }
        match board.devices[3].config {
            DeviceConfig::OptionBytes(c) => assert_eq!(&c.user_data[..4], &[1, 2, 3, 0]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_other_versions() {
        let err = BoardTable::from_json(r#"{ "version": 2, "devices": [] }"#).unwrap_err();
        assert!(matches!(err, BoardError::UnsupportedVersion(2)));
    }

    #[test]
    fn rejects_unknown_kinds_and_fields() {
        let kind = BoardTable::from_json(r#"{ "version": 1, "devices": [{ "kind": "lcd", "index": 0 }] }"#);
        assert!(matches!(kind, Err(BoardError::InvalidDevice(_))));
        let field = BoardTable::from_json(
            r#"{ "version": 1, "devices": [{ "kind": "adc", "index": 0, "config": { "gain": 2 } }] }"#,
        );
        assert!(matches!(field, Err(BoardError::InvalidDevice(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(BoardTable::from_json("{"), Err(BoardError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BoardTable::from_path("/nonexistent/board.json").unwrap_err();
        assert!(matches!(err, BoardError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
