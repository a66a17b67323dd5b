//! Type-erased handle returned by name lookups.

use hal::{DeviceKind, DeviceName, DeviceState, Lifecycle, Power};

use crate::devices::{
    NativeAdc, NativeCrc, NativeDac, NativeGpio, NativeI2c, NativeOptionBytes, NativeRtc,
    NativeSpi, NativeTimer, NativeUart, NativeUsb, NativeWatchdog,
};

/// A resolved device, one variant per kind. Cloning aliases the same state.
#[derive(Debug, Clone)]
pub enum Device {
    /// GPIO pin
    Gpio(NativeGpio),
    /// UART
    Uart(NativeUart),
    /// SPI controller
    Spi(NativeSpi),
    /// I2C controller
    I2c(NativeI2c),
    /// ADC
    Adc(NativeAdc),
    /// DAC
    Dac(NativeDac),
    /// Timer
    Timer(NativeTimer),
    /// Real-time clock
    Rtc(NativeRtc),
    /// CRC unit
    Crc(NativeCrc),
    /// Watchdog
    Watchdog(NativeWatchdog),
    /// USB device
    Usb(NativeUsb),
    /// Option-byte storage
    OptionBytes(NativeOptionBytes),
}

/// Apply `$body` to the handle inside any variant.
macro_rules! each {
    ($self:expr, $dev:ident => $body:expr) => {
        match $self {
            Device::Gpio($dev) => $body,
            Device::Uart($dev) => $body,
            Device::Spi($dev) => $body,
            Device::I2c($dev) => $body,
            Device::Adc($dev) => $body,
            Device::Dac($dev) => $body,
            Device::Timer($dev) => $body,
            Device::Rtc($dev) => $body,
            Device::Crc($dev) => $body,
            Device::Watchdog($dev) => $body,
            Device::Usb($dev) => $body,
            Device::OptionBytes($dev) => $body,
        }
    };
}

macro_rules! into_variant {
    ($($fn:ident => $variant:ident($ty:ty)),* $(,)?) => {
        $(
            #[doc = concat!("The [`", stringify!($ty), "`] inside, if this is one.")]
            #[must_use]
            pub fn $fn(self) -> Option<$ty> {
                match self {
                    Device::$variant(dev) => Some(dev),
                    _ => None,
                }
            }
        )*
    };
}

impl Device {
    /// Device type tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        each!(self, dev => dev.kind())
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> DeviceName {
        each!(self, dev => dev.name())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        each!(self, dev => dev.state())
    }

    /// The lifecycle role every device carries.
    pub fn lifecycle(&mut self) -> &mut dyn Lifecycle {
        each!(self, dev => dev as &mut dyn Lifecycle)
    }

    /// The power role, for clock-gated devices.
    pub fn power(&mut self) -> Option<&mut dyn Power> {
        each!(self, dev => dev.power_domain().map(|p| p as &mut dyn Power))
    }

    /// `true` when both handles refer to the same device state.
    #[must_use]
    pub fn same_device(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Gpio(a), Self::Gpio(b)) => a.same_device(b),
            (Self::Uart(a), Self::Uart(b)) => a.same_device(b),
            (Self::Spi(a), Self::Spi(b)) => a.same_device(b),
            (Self::I2c(a), Self::I2c(b)) => a.same_device(b),
            (Self::Adc(a), Self::Adc(b)) => a.same_device(b),
            (Self::Dac(a), Self::Dac(b)) => a.same_device(b),
            (Self::Timer(a), Self::Timer(b)) => a.same_device(b),
            (Self::Rtc(a), Self::Rtc(b)) => a.same_device(b),
            (Self::Crc(a), Self::Crc(b)) => a.same_device(b),
            (Self::Watchdog(a), Self::Watchdog(b)) => a.same_device(b),
            (Self::Usb(a), Self::Usb(b)) => a.same_device(b),
            (Self::OptionBytes(a), Self::OptionBytes(b)) => a.same_device(b),
            _ => false,
        }
    }

    /// Force the device back to its power-on-reset state.
    pub fn power_on_reset(&self) {
        each!(self, dev => dev.power_on_reset());
    }

    into_variant! {
        into_gpio => Gpio(NativeGpio),
        into_uart => Uart(NativeUart),
        into_spi => Spi(NativeSpi),
        into_i2c => I2c(NativeI2c),
        into_adc => Adc(NativeAdc),
        into_dac => Dac(NativeDac),
        into_timer => Timer(NativeTimer),
        into_rtc => Rtc(NativeRtc),
        into_crc => Crc(NativeCrc),
        into_watchdog => Watchdog(NativeWatchdog),
        into_usb => Usb(NativeUsb),
        into_option_bytes => OptionBytes(NativeOptionBytes),
    }
}
