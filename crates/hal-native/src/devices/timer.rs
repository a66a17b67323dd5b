//! Simulated general-purpose timer.
//!
//! Counts clock ticks modulo its period while started. Each period boundary
//! crossed fires the overflow callback once, in order, even when a single
//! advance crosses several.
//!
//! The callback is detached while it runs. If it advances the clock again,
//! the nested overflows are counted but not reported, and the outer advance
//! keeps numbering its own boundaries from the count it started with.

use std::cell::RefCell;

use hal::{DeviceKind, HalError, HalResult, OverflowCallback, Timer, TimerConfig, TimerMode};

use crate::callback::{CallbackSlot, Hooks};
use crate::engine::ModuloCounter;
use crate::native::{fire, Clocked, Core, Model, Native};

/// Timer data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    mode: TimerMode,
    started: bool,
    counter: ModuloCounter,
}

/// Timer callbacks.
#[derive(Default)]
pub struct TimerHooks {
    overflow: CallbackSlot<OverflowCallback>,
}

impl Hooks for TimerHooks {
    fn clear(&mut self) {
        self.overflow.clear();
    }
}

fn overflow_slot(hooks: &mut TimerHooks) -> &mut CallbackSlot<OverflowCallback> {
    &mut hooks.overflow
}

impl Model for TimerState {
    const KIND: DeviceKind = DeviceKind::Timer;
    type Config = TimerConfig;
    type Hooks = TimerHooks;

    fn power_on(config: &TimerConfig) -> Self {
        Self {
            mode: config.mode,
            started: false,
            counter: ModuloCounter::new(config.period.max(1)),
        }
    }

    fn on_init(&mut self, config: &TimerConfig) -> HalResult<()> {
        if config.period == 0 {
            return Err(HalError::InvalidArgument);
        }
        self.mode = config.mode;
        self.started = false;
        self.counter = ModuloCounter::new(config.period);
        Ok(())
    }

    fn on_deinit(&mut self) {
        self.started = false;
    }

    fn is_consistent(&self) -> bool {
        self.counter.period() > 0 && self.counter.counter() < self.counter.period()
    }
}

impl Clocked for TimerState {
    fn on_ticks(cell: &RefCell<Core<Self>>, ticks: u64) {
        let crossed = {
            let mut core = cell.borrow_mut();
            if !core.flags.is_running() || !core.data.started {
                return;
            }
            let mode = core.data.mode;
            let overflows = core.data.counter.advance(ticks, mode);
            if overflows.finished {
                core.data.started = false;
                tracing::trace!(device = core.name.as_str(), "one-shot expired");
            }
            overflows
        };
        for i in 1..=crossed.crossed {
            fire(cell, overflow_slot, crossed.before.saturating_add(i));
        }
    }
}

/// Simulated timer handle.
pub type NativeTimer = Native<TimerState>;

impl Timer for NativeTimer {
    fn start(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.started = true;
            Ok(())
        })
    }

    fn stop(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.started = false;
            Ok(())
        })
    }

    fn is_running(&self) -> bool {
        self.peek(|core| core.flags.is_running() && core.data.started)
    }

    fn set_period(&mut self, period: u64) -> HalResult<()> {
        if period == 0 {
            return Err(HalError::InvalidArgument);
        }
        self.running_mut(|state, _| {
            state.counter.set_period(period);
            Ok(())
        })
    }

    fn period(&self) -> u64 {
        self.peek(|core| core.data.counter.period())
    }

    fn counter(&self) -> HalResult<u64> {
        self.running(|state, _| Ok(state.counter.counter()))
    }

    fn set_counter(&mut self, value: u64) -> HalResult<()> {
        self.running_mut(|state, _| {
            if state.counter.set_counter(value) {
                Ok(())
            } else {
                Err(HalError::InvalidArgument)
            }
        })
    }

    fn overflow_count(&self) -> HalResult<u64> {
        self.running(|state, _| Ok(state.counter.overflows()))
    }

    fn set_callback(&mut self, callback: Option<OverflowCallback>) -> HalResult<()> {
        self.running_mut(|_, hooks| {
            hooks.overflow.set(callback);
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
    use hal::{DeviceName, Lifecycle};
    use std::rc::Rc;

    fn timer(clock: &SimClock, period: u64, mode: TimerMode) -> NativeTimer {
        let mut t = NativeTimer::build_clocked(
            DeviceName::new("TIMER0").unwrap(),
            0,
            TimerConfig { period, mode },
            true,
            clock,
        );
        t.init().unwrap();
        t
    }

    #[test]
    fn callback_fires_once_per_boundary_in_order() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 100, TimerMode::Periodic);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        t.set_callback(Some(Box::new(move |n| sink.borrow_mut().push(n))))
            .unwrap();
        t.start().unwrap();
        clock.advance(350);
        assert_eq!(*seen.borrow(), [1, 2, 3]);
        assert_eq!(t.counter().unwrap(), 50);
        clock.advance(50);
        assert_eq!(*seen.borrow(), [1, 2, 3, 4]);
    }

    #[test]
    fn stopped_timer_freezes() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 100, TimerMode::Periodic);
        t.start().unwrap();
        clock.advance(30);
        t.stop().unwrap();
        clock.advance(1_000);
        assert_eq!(t.counter().unwrap(), 30);
        assert_eq!(t.overflow_count().unwrap(), 0);
        t.start().unwrap();
        clock.advance(70);
        assert_eq!(t.counter().unwrap(), 0);
        assert_eq!(t.overflow_count().unwrap(), 1);
    }

    #[test]
    fn one_shot_stops_after_first_overflow() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 10, TimerMode::OneShot);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        t.set_callback(Some(Box::new(move |_| *h.borrow_mut() += 1)))
            .unwrap();
        t.start().unwrap();
        clock.advance(45);
        assert!(!t.is_running());
        assert_eq!(t.counter().unwrap(), 0);
        assert_eq!(*hits.borrow(), 1);
        clock.advance(45);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn callback_may_stop_its_own_timer() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 10, TimerMode::Periodic);
        let mut handle = t.clone();
        t.set_callback(Some(Box::new(move |_| {
            handle.stop().unwrap();
        })))
        .unwrap();
        t.start().unwrap();
        clock.advance(25);
        assert!(!t.is_running());
        assert_eq!(t.overflow_count().unwrap(), 2);
    }

    #[test]
    fn reinit_restarts_overflow_count() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 100, TimerMode::Periodic);
        t.start().unwrap();
        clock.advance(250);
        assert_eq!(t.overflow_count().unwrap(), 2);
        t.deinit().unwrap();
        t.init().unwrap();
        assert_eq!(t.overflow_count().unwrap(), 0);
        assert_eq!(t.counter().unwrap(), 0);
        t.set_period(100).unwrap();
        t.start().unwrap();
        clock.advance(100);
        assert_eq!(t.overflow_count().unwrap(), 1);
    }

    #[test]
    fn nested_advance_from_callback_is_counted_silently() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 10, TimerMode::Periodic);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let nested = clock.clone();
        t.set_callback(Some(Box::new(move |n| {
            sink.borrow_mut().push(n);
            if n == 1 {
                nested.advance(10);
            }
        })))
        .unwrap();
        t.start().unwrap();
        clock.advance(25);
        assert_eq!(*seen.borrow(), [1, 2]);
        assert_eq!(t.overflow_count().unwrap(), 3);
        assert_eq!(t.counter().unwrap(), 5);
        clock.advance(5);
        assert_eq!(*seen.borrow(), [1, 2, 4]);
    }

    #[test]
    fn suspended_timer_ignores_ticks() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 100, TimerMode::Periodic);
        t.start().unwrap();
        clock.advance(10);
        t.suspend().unwrap();
        clock.advance(500);
        t.resume().unwrap();
        assert_eq!(t.counter().unwrap(), 10);
        assert!(t.is_running());
    }

    #[test]
    fn period_and_counter_validation() {
        let clock = SimClock::new();
        let mut t = timer(&clock, 100, TimerMode::Periodic);
        assert_eq!(t.set_period(0), Err(HalError::InvalidArgument));
        assert_eq!(t.set_counter(100), Err(HalError::InvalidArgument));
        t.set_counter(99).unwrap();
        assert_eq!(t.counter().unwrap(), 99);
        assert_eq!(t.period(), 100);
    }

    #[test]
    fn zero_period_config_fails_init() {
        let clock = SimClock::new();
        let mut t = NativeTimer::build_clocked(
            DeviceName::new("TIMER1").unwrap(),
            1,
            TimerConfig {
                period: 0,
                mode: TimerMode::Periodic,
            },
            true,
            &clock,
        );
        assert_eq!(t.init(), Err(HalError::InvalidArgument));
    }
}
