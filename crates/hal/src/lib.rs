//! Peripheral Hardware Abstraction Layer
//!
//! Uniform capability interfaces for embedded peripherals (GPIO, UART, SPI,
//! I2C, ADC, DAC, timers, RTC, CRC, watchdog, USB, option bytes), shared by
//! silicon backends and the simulated backend in `hal-native`.
//!
//! # Model
//!
//! ```text
//! Application / drivers
//!         ↓   resolve("UART1")
//! Device registry (backend)
//!         ↓   handle
//! Capability traits (this crate)
//!   Lifecycle · Power · Uart · GpioRead · Timer · ...
//!         ↓
//! Device state (silicon or simulation)
//! ```
//!
//! Capabilities are flat traits. A device composes the roles it supports side
//! by side; no capability inherits from another. Every device implements
//! [`Lifecycle`], and role operations require the device to be
//! [`DeviceState::Running`].
//!
//! # Features
//!
//! - `defmt`: `defmt::Format` for all public value types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

pub mod analog;
pub mod calendar;
pub mod callback;
pub mod crc;
pub mod device;
pub mod error;
pub mod gpio;
pub mod lifecycle;
pub mod option_bytes;
pub mod peripheral;
pub mod power;
pub mod timing;

pub use analog::{full_scale, Adc, AdcConfig, Dac, DacConfig};
pub use calendar::{AlarmTime, DateTime};
pub use callback::{AlarmCallback, EdgeCallback, OverflowCallback, PowerCallback, TimeoutCallback};
pub use crc::{Crc, CrcConfig, CRC32_POLY};
pub use device::{DeviceKind, DeviceName};
pub use error::{HalError, HalResult};
pub use gpio::{
    Edge, EdgeEvent, EdgeTrigger, GpioConfig, GpioInterrupt, GpioRead, GpioReadWrite, GpioWrite,
    PinLevel, PinMode,
};
pub use lifecycle::{DeviceState, Lifecycle, LifecycleFlags};
pub use option_bytes::{OptionBytes, OptionBytesConfig, ProtectionLevel, OPTION_USER_DATA_LEN};
pub use peripheral::{
    BitOrder, DataBits, I2c, I2cConfig, Parity, Spi, SpiConfig, SpiMode, StopBits, TransferStats,
    Uart, UartConfig, Usb, UsbConfig, DEFAULT_BUFFER_SIZE, I2C_MAX_ADDRESS, SPI_IDLE_BYTE,
};
pub use power::Power;
pub use timing::{Rtc, RtcConfig, Timer, TimerConfig, TimerMode, Watchdog, WatchdogConfig};
