//! Time-driven capabilities (timer, watchdog, RTC).
//!
//! All three are driven by a simulated or hardware tick source where one tick
//! is one millisecond. Callbacks run synchronously from whatever call advanced
//! time.

use crate::calendar::{AlarmTime, DateTime};
use crate::callback::{AlarmCallback, OverflowCallback, TimeoutCallback};
use crate::error::HalResult;

// ── Timer ────────────────────────────────────────────────────────────────────

/// What a timer does when its counter reaches the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Wrap to zero and keep counting.
    #[default]
    Periodic,
    /// Stop after the first overflow with the counter at zero.
    OneShot,
}

/// Timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Period in ticks (> 0)
    pub period: u64,
    /// Periodic or one-shot
    pub mode: TimerMode,
}

impl Default for TimerConfig {
    /// 1000-tick periodic timer.
    fn default() -> Self {
        Self {
            period: 1000,
            mode: TimerMode::Periodic,
        }
    }
}

/// Hardware timer role.
pub trait Timer {
    /// Start counting from the current counter value.
    fn start(&mut self) -> HalResult<()>;

    /// Freeze the counter at its current value.
    fn stop(&mut self) -> HalResult<()>;

    /// `true` while counting.
    fn is_running(&self) -> bool;

    /// Change the period. Zero is rejected; the counter is wrapped into the
    /// new period.
    fn set_period(&mut self, period: u64) -> HalResult<()>;

    /// Current period in ticks.
    fn period(&self) -> u64;

    /// Counter position in `[0, period)`.
    fn counter(&self) -> HalResult<u64>;

    /// Preload the counter; values `>= period` are rejected.
    fn set_counter(&mut self, value: u64) -> HalResult<()>;

    /// Overflows since `init` (or the last power-on reset).
    fn overflow_count(&self) -> HalResult<u64>;

    /// Register the overflow callback, called with the running overflow count.
    fn set_callback(&mut self, callback: Option<OverflowCallback>) -> HalResult<()>;
}

// ── Watchdog ─────────────────────────────────────────────────────────────────

/// Watchdog configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogConfig {
    /// Timeout in milliseconds (> 0)
    pub timeout_ms: u32,
}

impl Default for WatchdogConfig {
    /// 5 s timeout.
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Independent watchdog role.
pub trait Watchdog {
    /// Arm the watchdog; elapsed time starts from now.
    fn start(&mut self) -> HalResult<()>;

    /// Disarm the watchdog. Elapsed time is frozen.
    fn stop(&mut self) -> HalResult<()>;

    /// Reset elapsed time to zero and clear an expiry. No effect while the
    /// watchdog is not armed.
    fn feed(&mut self) -> HalResult<()>;

    /// Change the timeout. Zero is rejected. Lowering it to or below the time
    /// already elapsed expires the watchdog immediately.
    fn set_timeout(&mut self, timeout_ms: u32) -> HalResult<()>;

    /// Current timeout in milliseconds.
    fn timeout(&self) -> u32;

    /// `true` while elapsed time is at or past the timeout, or once it got
    /// there without a feed.
    fn has_timed_out(&self) -> HalResult<bool>;

    /// Register the expiry callback, called once per expiry with the number
    /// of expiries since power-on reset.
    fn set_callback(&mut self, callback: Option<TimeoutCallback>) -> HalResult<()>;
}

// ── RTC ──────────────────────────────────────────────────────────────────────

/// RTC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcConfig {
    /// Calendar time after `init`
    pub initial: DateTime,
}

/// Real-time clock role.
pub trait Rtc {
    /// Set the calendar.
    fn set_time(&mut self, time: DateTime) -> HalResult<()>;

    /// Read the calendar.
    fn time(&self) -> HalResult<DateTime>;

    /// Arm a one-shot alarm at `alarm`, replacing any armed alarm. The alarm
    /// disarms itself after firing.
    fn set_alarm(&mut self, alarm: AlarmTime, callback: Option<AlarmCallback>) -> HalResult<()>;

    /// Disarm the alarm.
    fn cancel_alarm(&mut self) -> HalResult<()>;

    /// `true` while an alarm is armed.
    fn alarm_enabled(&self) -> bool;
}
