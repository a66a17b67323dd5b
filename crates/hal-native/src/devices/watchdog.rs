//! Simulated independent watchdog.
//!
//! Once started, elapsed time accumulates until fed. Reaching the timeout
//! marks the watchdog expired and fires the callback once; it stays expired
//! until the next feed. A real part would reset the system at that point; the
//! simulation only reports it.

use std::cell::RefCell;

use hal::{DeviceKind, DeviceName, HalError, HalResult, TimeoutCallback, Watchdog, WatchdogConfig};

use crate::callback::{CallbackSlot, Hooks};
use crate::engine::Threshold;
use crate::native::{fire, Clocked, Core, Model, Native};

/// Watchdog data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogState {
    started: bool,
    threshold: Threshold,
    expiries: u32,
}

/// Watchdog callbacks.
#[derive(Default)]
pub struct WatchdogHooks {
    timeout: CallbackSlot<TimeoutCallback>,
}

impl Hooks for WatchdogHooks {
    fn clear(&mut self) {
        self.timeout.clear();
    }
}

fn timeout_slot(hooks: &mut WatchdogHooks) -> &mut CallbackSlot<TimeoutCallback> {
    &mut hooks.timeout
}

impl WatchdogState {
    fn record_expiry(&mut self, name: &DeviceName) -> u32 {
        self.expiries = self.expiries.saturating_add(1);
        tracing::warn!(
            device = name.as_str(),
            timeout_ms = self.threshold.timeout(),
            expiries = self.expiries,
            "watchdog expired"
        );
        self.expiries
    }
}

impl Model for WatchdogState {
    const KIND: DeviceKind = DeviceKind::Watchdog;
    type Config = WatchdogConfig;
    type Hooks = WatchdogHooks;

    fn power_on(config: &WatchdogConfig) -> Self {
        Self {
            started: false,
            threshold: Threshold::new(u64::from(config.timeout_ms)),
            expiries: 0,
        }
    }

    fn on_init(&mut self, config: &WatchdogConfig) -> HalResult<()> {
        if config.timeout_ms == 0 {
            return Err(HalError::InvalidArgument);
        }
        self.started = false;
        self.threshold = Threshold::new(u64::from(config.timeout_ms));
        Ok(())
    }

    fn on_deinit(&mut self) {
        self.started = false;
    }
}

impl Clocked for WatchdogState {
    fn on_ticks(cell: &RefCell<Core<Self>>, ticks: u64) {
        let expiries = {
            let mut guard = cell.borrow_mut();
            let core = &mut *guard;
            if !core.flags.is_running() || !core.data.started {
                return;
            }
            if !core.data.threshold.advance(ticks) {
                return;
            }
            core.data.record_expiry(&core.name)
        };
        fire(cell, timeout_slot, expiries);
    }
}

/// Simulated watchdog handle.
pub type NativeWatchdog = Native<WatchdogState>;

impl NativeWatchdog {
    /// Expiries since power-on reset.
    #[must_use]
    pub fn expiry_count(&self) -> u32 {
        self.peek(|core| core.data.expiries)
    }

    /// Milliseconds since the last feed (or start).
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.peek(|core| core.data.threshold.elapsed())
    }
}

impl Watchdog for NativeWatchdog {
    fn start(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            if !state.started {
                state.started = true;
                state.threshold.feed();
            }
            Ok(())
        })
    }

    fn stop(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.started = false;
            Ok(())
        })
    }

    /// A watchdog that has not been started ignores feeds.
    fn feed(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            if state.started {
                state.threshold.feed();
            }
            Ok(())
        })
    }

    fn set_timeout(&mut self, timeout_ms: u32) -> HalResult<()> {
        if timeout_ms == 0 {
            return Err(HalError::InvalidArgument);
        }
        let name = self.name();
        let expired = self.running_mut(|state, _| {
            let crossed = state.threshold.set_timeout(u64::from(timeout_ms)) && state.started;
            Ok(crossed.then(|| state.record_expiry(&name)))
        })?;
        if let Some(expiries) = expired {
            self.fire(timeout_slot, expiries);
        }
        Ok(())
    }

    fn timeout(&self) -> u32 {
        self.peek(|core| u32::try_from(core.data.threshold.timeout()).unwrap_or(u32::MAX))
    }

    fn has_timed_out(&self) -> HalResult<bool> {
        self.running(|state, _| Ok(state.threshold.is_expired()))
    }

    fn set_callback(&mut self, callback: Option<TimeoutCallback>) -> HalResult<()> {
        self.running_mut(|_, hooks| {
            hooks.timeout.set(callback);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use hal::Lifecycle;
    use std::rc::Rc;

    fn watchdog(clock: &SimClock, timeout_ms: u32) -> NativeWatchdog {
        let mut w = NativeWatchdog::build_clocked(
            DeviceName::new("WATCHDOG0").unwrap(),
            0,
            WatchdogConfig { timeout_ms },
            false,
            clock,
        );
        w.init().unwrap();
        w
    }

    #[test]
    fn feeding_keeps_it_alive() {
        let clock = SimClock::new();
        let mut w = watchdog(&clock, 5000);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        w.set_callback(Some(Box::new(move |_| *h.borrow_mut() += 1)))
            .unwrap();
        w.start().unwrap();
        clock.advance(4000);
        assert!(!w.has_timed_out().unwrap());
        w.feed().unwrap();
        clock.advance(4000);
        assert!(!w.has_timed_out().unwrap());
        clock.advance(1100);
        assert!(w.has_timed_out().unwrap());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn expiry_fires_once_until_fed() {
        let clock = SimClock::new();
        let mut w = watchdog(&clock, 100);
        w.start().unwrap();
        clock.advance(150);
        clock.advance(150);
        assert_eq!(w.expiry_count(), 1);
        w.feed().unwrap();
        assert!(!w.has_timed_out().unwrap());
        clock.advance(100);
        assert_eq!(w.expiry_count(), 2);
    }

    #[test]
    fn unstarted_watchdog_never_expires() {
        let clock = SimClock::new();
        let mut w = watchdog(&clock, 10);
        w.feed().unwrap();
        clock.advance(1_000);
        assert!(!w.has_timed_out().unwrap());
        assert_eq!(w.elapsed(), 0);
    }

    #[test]
    fn feed_requires_initialization() {
        let clock = SimClock::new();
        let mut w = NativeWatchdog::build_clocked(
            DeviceName::new("WATCHDOG1").unwrap(),
            1,
            WatchdogConfig::default(),
            false,
            &clock,
        );
        assert_eq!(w.feed(), Err(HalError::NotInitialized));
    }

    #[test]
    fn timeout_below_elapsed_expires_immediately() {
        let clock = SimClock::new();
        let mut w = watchdog(&clock, 1000);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        w.set_callback(Some(Box::new(move |n| sink.borrow_mut().push(n))))
            .unwrap();
        w.start().unwrap();
        clock.advance(600);
        w.set_timeout(500).unwrap();
        assert_eq!(w.elapsed(), 600);
        assert_eq!(w.timeout(), 500);
        assert!(w.has_timed_out().unwrap());
        assert_eq!(*seen.borrow(), [1]);
        clock.advance(1);
        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(w.expiry_count(), 1);
    }

    #[test]
    fn raising_timeout_does_not_clear_a_latched_expiry() {
        let clock = SimClock::new();
        let mut w = watchdog(&clock, 100);
        w.start().unwrap();
        clock.advance(100);
        w.set_timeout(5000).unwrap();
        assert!(w.has_timed_out().unwrap());
        w.feed().unwrap();
        assert!(!w.has_timed_out().unwrap());
    }
}
