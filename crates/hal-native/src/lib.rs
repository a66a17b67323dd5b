//! Simulated peripheral backend for `hal`.
//!
//! Every device kind `hal` defines is modelled in memory so drivers and
//! applications run on a host with deterministic behaviour:
//!
//! ```text
//! BoardTable (JSON or default_board)
//!         ↓
//! Registry ── resolve("UART1") ──▶ Device::Uart(NativeUart)
//!    │                                   │
//!    └── SimClock::advance(ticks) ──▶ timers, RTC, watchdog
//! ```
//!
//! Time is simulated: nothing moves until [`SimClock::advance`] is called,
//! either directly or through [`Registry::advance_time`]. One tick is one
//! millisecond.
//!
//! Tests drive the other side of each peripheral with the `inject_*`,
//! `capture_*` and `set_input` helpers on the device handles.
//!
//! ```
//! use hal::{Lifecycle, Uart};
//! use hal_native::{BoardTable, Registry};
//!
//! let mut registry = Registry::from_board(&BoardTable::default_board()).unwrap();
//! let mut uart = registry.uart("UART0").unwrap();
//! uart.init().unwrap();
//! uart.write(b"ping").unwrap();
//! assert_eq!(uart.take_tx(), b"ping");
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
// Board loading logs paths and parse errors with {:?}.
#![allow(clippy::use_debug)]

pub mod board;
pub mod callback;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod devices;
pub mod engine;
pub mod native;
pub mod power;
pub mod registry;

pub use board::{BoardError, BoardTable, BOARD_FORMAT_VERSION};
pub use clock::SimClock;
pub use config::{RegistryLimits, BOARD_ENV_VAR, TICKS_PER_SECOND};
pub use descriptor::{construct_builtin, Constructor, DeviceConfig, DeviceDescriptor};
pub use device::Device;
pub use devices::{
    NativeAdc, NativeCrc, NativeDac, NativeGpio, NativeI2c, NativeOptionBytes, NativeRtc,
    NativeSpi, NativeTimer, NativeUart, NativeUsb, NativeWatchdog, OptionImage,
};
pub use native::{Model, Native};
pub use power::PowerDomain;
pub use registry::Registry;
