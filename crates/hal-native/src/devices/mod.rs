//! Simulated peripherals, one module per device kind.

mod link;

pub mod adc;
pub mod crc;
pub mod dac;
pub mod gpio;
pub mod i2c;
pub mod option_bytes;
pub mod rtc;
pub mod spi;
pub mod timer;
pub mod uart;
pub mod usb;
pub mod watchdog;

pub use adc::NativeAdc;
pub use crc::NativeCrc;
pub use dac::NativeDac;
pub use gpio::NativeGpio;
pub use i2c::NativeI2c;
pub use option_bytes::{NativeOptionBytes, OptionImage};
pub use rtc::NativeRtc;
pub use spi::NativeSpi;
pub use timer::NativeTimer;
pub use uart::NativeUart;
pub use usb::NativeUsb;
pub use watchdog::NativeWatchdog;
