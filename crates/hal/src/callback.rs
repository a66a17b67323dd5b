//! Callback types registered through capability interfaces.
//!
//! Callbacks are boxed closures: whatever user context the caller needs is
//! captured by the closure itself. They are invoked synchronously from within
//! the call that triggered them and never from another thread.

use alloc::boxed::Box;

use crate::calendar::DateTime;
use crate::gpio::EdgeEvent;

/// Power-domain notification, called with the new enabled state.
pub type PowerCallback = Box<dyn FnMut(bool)>;

/// GPIO edge interrupt handler.
pub type EdgeCallback = Box<dyn FnMut(EdgeEvent)>;

/// Timer overflow handler, called with the running overflow count
/// (1-based) once per period boundary crossed.
pub type OverflowCallback = Box<dyn FnMut(u64)>;

/// Watchdog expiry handler, called with the total expiry count.
pub type TimeoutCallback = Box<dyn FnMut(u32)>;

/// RTC alarm handler, called with the calendar time at which the alarm matched.
pub type AlarmCallback = Box<dyn FnMut(DateTime)>;
