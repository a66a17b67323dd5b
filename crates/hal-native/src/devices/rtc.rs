//! Simulated real-time clock.
//!
//! Calendar time advances one second per 1000 ticks, carrying sub-second
//! remainders between advances. The alarm is one-shot: it matches hour,
//! minute and second exactly, checked for every second crossed, then disarms.
//! Past 2099-12-31 23:59:59 the calendar wraps to 2000-01-01.

use std::cell::RefCell;

use hal::{AlarmCallback, AlarmTime, DateTime, DeviceKind, HalResult, Rtc, RtcConfig};

use crate::callback::{CallbackSlot, Hooks};
use crate::config::TICKS_PER_SECOND;
use crate::engine::first_time_of_day_match;
use crate::native::{fire, Clocked, Core, Model, Native};

/// Seconds from 2000-01-01 to 2100-01-01 (36 525 days).
const CENTURY_SECONDS: u64 = 3_155_760_000;

/// RTC data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcState {
    seconds: u64,
    sub_ticks: u64,
    alarm: Option<AlarmTime>,
    alarms_fired: u32,
}

/// RTC callbacks.
#[derive(Default)]
pub struct RtcHooks {
    alarm: CallbackSlot<AlarmCallback>,
}

impl Hooks for RtcHooks {
    fn clear(&mut self) {
        self.alarm.clear();
    }
}

fn alarm_slot(hooks: &mut RtcHooks) -> &mut CallbackSlot<AlarmCallback> {
    &mut hooks.alarm
}

impl RtcState {
    fn calendar(&self) -> HalResult<DateTime> {
        DateTime::from_epoch_seconds(self.seconds)
    }

    /// Move forward by `ticks`; returns the instant the alarm matched, if it
    /// did.
    fn advance(&mut self, ticks: u64) -> Option<u64> {
        let total = self.sub_ticks.saturating_add(ticks);
        let whole = total.checked_div(TICKS_PER_SECOND).unwrap_or(0);
        self.sub_ticks = total.checked_rem(TICKS_PER_SECOND).unwrap_or(0);
        if whole == 0 {
            return None;
        }
        let old = self.seconds;
        let new = old.saturating_add(whole);
        self.seconds = new.checked_rem(CENTURY_SECONDS).unwrap_or(0);
        let target = self.alarm?.seconds_of_day();
        let at = first_time_of_day_match(old, new, target)?;
        self.alarm = None;
        self.alarms_fired = self.alarms_fired.saturating_add(1);
        at.checked_rem(CENTURY_SECONDS)
    }
}

impl Model for RtcState {
    const KIND: DeviceKind = DeviceKind::Rtc;
    type Config = RtcConfig;
    type Hooks = RtcHooks;

    fn power_on(config: &RtcConfig) -> Self {
        Self {
            seconds: config.initial.to_epoch_seconds(),
            sub_ticks: 0,
            alarm: None,
            alarms_fired: 0,
        }
    }

    fn on_init(&mut self, config: &RtcConfig) -> HalResult<()> {
        self.seconds = config.initial.to_epoch_seconds();
        self.sub_ticks = 0;
        self.alarm = None;
        Ok(())
    }

    fn on_deinit(&mut self) {
        self.alarm = None;
    }

    fn is_consistent(&self) -> bool {
        self.seconds < CENTURY_SECONDS && self.sub_ticks < TICKS_PER_SECOND
    }
}

impl Clocked for RtcState {
    fn on_ticks(cell: &RefCell<Core<Self>>, ticks: u64) {
        let matched = {
            let mut core = cell.borrow_mut();
            if !core.flags.is_running() {
                return;
            }
            let Some(at) = core.data.advance(ticks) else {
                return;
            };
            tracing::debug!(device = core.name.as_str(), at, "rtc alarm");
            DateTime::from_epoch_seconds(at).ok()
        };
        if let Some(when) = matched {
            fire(cell, alarm_slot, when);
        }
    }
}

/// Simulated RTC handle.
pub type NativeRtc = Native<RtcState>;

impl NativeRtc {
    /// Alarms that have matched since power-on reset.
    #[must_use]
    pub fn alarm_count(&self) -> u32 {
        self.peek(|core| core.data.alarms_fired)
    }
}

impl Rtc for NativeRtc {
    fn set_time(&mut self, time: DateTime) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.seconds = time.to_epoch_seconds();
            state.sub_ticks = 0;
            Ok(())
        })
    }

    fn time(&self) -> HalResult<DateTime> {
        self.running(|state, _| state.calendar())
    }

    /// Arms the alarm. Without a callback the match is still recorded and the
    /// alarm still disarms.
    fn set_alarm(&mut self, alarm: AlarmTime, callback: Option<AlarmCallback>) -> HalResult<()> {
        self.running_mut(|state, hooks| {
            state.alarm = Some(alarm);
            hooks.alarm.set(callback);
            Ok(())
        })
    }

    fn cancel_alarm(&mut self) -> HalResult<()> {
        self.running_mut(|state, hooks| {
            state.alarm = None;
            hooks.alarm.clear();
            Ok(())
        })
    }

    fn alarm_enabled(&self) -> bool {
        self.peek(|core| core.data.alarm.is_some())
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

    fn rtc(clock: &SimClock, initial: DateTime) -> NativeRtc {
        let mut r = NativeRtc::build_clocked(
            DeviceName::new("RTC0").unwrap(),
            0,
            RtcConfig { initial },
            false,
            clock,
        );
        r.init().unwrap();
        r
    }

    fn at(h: u8, m: u8, s: u8) -> DateTime {
        DateTime::new(2024, 2, 28, h, m, s).unwrap()
    }

    #[test]
    fn seconds_accumulate_across_partial_advances() {
        let clock = SimClock::new();
        let r = rtc(&clock, at(12, 0, 0));
        clock.advance(600);
        clock.advance(600);
        assert_eq!(r.time().unwrap(), at(12, 0, 1));
    }

    #[test]
    fn day_rolls_into_leap_day() {
        let clock = SimClock::new();
        let r = rtc(&clock, at(23, 59, 59));
        clock.advance(1000);
        assert_eq!(r.time().unwrap(), DateTime::new(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn alarm_fires_once_then_disarms() {
        let clock = SimClock::new();
        let mut r = rtc(&clock, at(6, 59, 58));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        r.set_alarm(
            AlarmTime::new(7, 0, 0).unwrap(),
            Some(Box::new(move |t: DateTime| sink.borrow_mut().push(t))),
        )
        .unwrap();
        clock.advance(5_000);
        assert_eq!(*seen.borrow(), [at(7, 0, 0)]);
        assert!(!r.alarm_enabled());
        clock.advance(86_400_000);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(r.alarm_count(), 1);
    }

    #[test]
    fn alarm_matches_inside_a_single_large_advance() {
        let clock = SimClock::new();
        let mut r = rtc(&clock, at(0, 0, 0));
        r.set_alarm(AlarmTime::new(12, 30, 15).unwrap(), None)
            .unwrap();
        clock.advance(13 * 3_600_000);
        assert!(!r.alarm_enabled());
        assert_eq!(r.alarm_count(), 1);
    }

    #[test]
    fn cancelled_alarm_never_fires() {
        let clock = SimClock::new();
        let mut r = rtc(&clock, at(6, 59, 59));
        r.set_alarm(AlarmTime::new(7, 0, 0).unwrap(), None).unwrap();
        r.cancel_alarm().unwrap();
        clock.advance(2_000);
        assert_eq!(r.alarm_count(), 0);
    }

    #[test]
    fn calendar_wraps_after_2099() {
        let clock = SimClock::new();
        let r = rtc(&clock, DateTime::new(2099, 12, 31, 23, 59, 59).unwrap());
        clock.advance(1000);
        assert_eq!(r.time().unwrap(), DateTime::new(2000, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn set_time_discards_sub_second_remainder() {
        let clock = SimClock::new();
        let mut r = rtc(&clock, at(0, 0, 0));
        clock.advance(900);
        r.set_time(at(8, 0, 0)).unwrap();
        clock.advance(900);
        assert_eq!(r.time().unwrap(), at(8, 0, 0));
    }
}
