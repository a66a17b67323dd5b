//! Registration records: what to build, under which name, with which config.

use hal::{
    AdcConfig, CrcConfig, DacConfig, DeviceKind, DeviceName, GpioConfig, HalError, HalResult,
    I2cConfig, OptionBytesConfig, RtcConfig, SpiConfig, TimerConfig, UartConfig, UsbConfig,
    WatchdogConfig,
};

use crate::clock::SimClock;
use crate::device::Device;
use crate::devices::{
    NativeAdc, NativeCrc, NativeDac, NativeGpio, NativeI2c, NativeOptionBytes, NativeRtc,
    NativeSpi, NativeTimer, NativeUart, NativeUsb, NativeWatchdog,
};

/// Type-specific configuration, read once at construction and at `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceConfig {
    /// GPIO pin
    Gpio(GpioConfig),
    /// UART
    Uart(UartConfig),
    /// SPI controller
    Spi(SpiConfig),
    /// I2C controller
    I2c(I2cConfig),
    /// ADC
    Adc(AdcConfig),
    /// DAC
    Dac(DacConfig),
    /// Timer
    Timer(TimerConfig),
    /// Real-time clock
    Rtc(RtcConfig),
    /// CRC unit
    Crc(CrcConfig),
    /// Watchdog
    Watchdog(WatchdogConfig),
    /// USB device
    Usb(UsbConfig),
    /// Option-byte storage
    OptionBytes(OptionBytesConfig),
}

impl DeviceConfig {
    /// Default configuration for `kind`.
    #[must_use]
    pub fn default_for(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Gpio => Self::Gpio(GpioConfig::default()),
            DeviceKind::Uart => Self::Uart(UartConfig::default()),
            DeviceKind::Spi => Self::Spi(SpiConfig::default()),
            DeviceKind::I2c => Self::I2c(I2cConfig::default()),
            DeviceKind::Adc => Self::Adc(AdcConfig::default()),
            DeviceKind::Dac => Self::Dac(DacConfig::default()),
            DeviceKind::Timer => Self::Timer(TimerConfig::default()),
            DeviceKind::Rtc => Self::Rtc(RtcConfig::default()),
            DeviceKind::Crc => Self::Crc(CrcConfig::default()),
            DeviceKind::Watchdog => Self::Watchdog(WatchdogConfig::default()),
            DeviceKind::Usb => Self::Usb(UsbConfig::default()),
            DeviceKind::OptionBytes => Self::OptionBytes(OptionBytesConfig::default()),
        }
    }

    /// Kind this configuration belongs to.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Gpio(_) => DeviceKind::Gpio,
            Self::Uart(_) => DeviceKind::Uart,
            Self::Spi(_) => DeviceKind::Spi,
            Self::I2c(_) => DeviceKind::I2c,
            Self::Adc(_) => DeviceKind::Adc,
            Self::Dac(_) => DeviceKind::Dac,
            Self::Timer(_) => DeviceKind::Timer,
            Self::Rtc(_) => DeviceKind::Rtc,
            Self::Crc(_) => DeviceKind::Crc,
            Self::Watchdog(_) => DeviceKind::Watchdog,
            Self::Usb(_) => DeviceKind::Usb,
            Self::OptionBytes(_) => DeviceKind::OptionBytes,
        }
    }
}

/// Builds a device from its descriptor on the registry's clock.
pub type Constructor = fn(&DeviceDescriptor, &SimClock) -> HalResult<Device>;

/// One registry entry.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Device type
    pub kind: DeviceKind,
    /// Instance index within the kind
    pub index: u16,
    /// Lookup key
    pub name: DeviceName,
    /// Type-specific configuration; must match `kind`
    pub config: DeviceConfig,
    /// Override for the kind's built-in constructor
    pub constructor: Option<Constructor>,
}

impl DeviceDescriptor {
    /// Descriptor with the canonical name (`UART1`, `GPIOA3`, ...) and the
    /// kind's default configuration.
    pub fn new(kind: DeviceKind, index: u16) -> HalResult<Self> {
        Ok(Self {
            kind,
            index,
            name: DeviceName::numbered(kind, index)?,
            config: DeviceConfig::default_for(kind),
            constructor: None,
        })
    }

    /// Descriptor under an explicit name.
    pub fn named(kind: DeviceKind, index: u16, name: &str) -> HalResult<Self> {
        Ok(Self {
            name: DeviceName::new(name)?,
            ..Self::new(kind, index)?
        })
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `constructor` instead of the built-in one.
    #[must_use]
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Configuration matches the kind.
    pub fn validate(&self) -> HalResult<()> {
        if self.config.kind() != self.kind {
            return Err(HalError::InvalidArgument);
        }
        Ok(())
    }

    /// Build the device with the override or the built-in constructor.
    pub(crate) fn construct(&self, clock: &SimClock) -> HalResult<Device> {
        self.validate()?;
        let constructor = self.constructor.unwrap_or(construct_builtin);
        let device = constructor(self, clock)?;
        if device.kind() != self.kind {
            return Err(HalError::InvalidArgument);
        }
        Ok(device)
    }
}

/// Built-in constructor for every kind. Always-on kinds (RTC, watchdog,
/// option bytes) have no power domain.
pub fn construct_builtin(desc: &DeviceDescriptor, clock: &SimClock) -> HalResult<Device> {
    let name = desc.name.clone();
    let index = desc.index;
    Ok(match desc.config {
        DeviceConfig::Gpio(c) => Device::Gpio(NativeGpio::build(name, index, c, true)),
        DeviceConfig::Uart(c) => Device::Uart(NativeUart::build(name, index, c, true)),
        DeviceConfig::Spi(c) => Device::Spi(NativeSpi::build(name, index, c, true)),
        DeviceConfig::I2c(c) => Device::I2c(NativeI2c::build(name, index, c, true)),
        DeviceConfig::Adc(c) => Device::Adc(NativeAdc::build(name, index, c, true)),
        DeviceConfig::Dac(c) => Device::Dac(NativeDac::build(name, index, c, true)),
        DeviceConfig::Timer(c) => {
            Device::Timer(NativeTimer::build_clocked(name, index, c, true, clock))
        }
        DeviceConfig::Rtc(c) => Device::Rtc(NativeRtc::build_clocked(name, index, c, false, clock)),
        DeviceConfig::Crc(c) => Device::Crc(NativeCrc::build(name, index, c, true)),
        DeviceConfig::Watchdog(c) => {
            Device::Watchdog(NativeWatchdog::build_clocked(name, index, c, false, clock))
        }
        DeviceConfig::Usb(c) => Device::Usb(NativeUsb::build(name, index, c, true)),
        DeviceConfig::OptionBytes(c) => {
            Device::OptionBytes(NativeOptionBytes::build(name, index, c, false))
        }
    })
}
