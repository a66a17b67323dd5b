//! Time-driven counters: threshold crossing (watchdog), modulo counting
//! (timer) and the one-shot time-of-day match (RTC alarm).
//!
//! All three are incremental: they are told how many ticks passed and never
//! read an absolute clock, so stopping one simply means not advancing it.

use hal::timing::TimerMode;

/// Elapsed-since-reference counter with a timeout threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    timeout: u64,
    elapsed: u64,
    expired: bool,
}

impl Threshold {
    /// Counter at zero with `timeout`.
    #[must_use]
    pub const fn new(timeout: u64) -> Self {
        Self {
            timeout,
            elapsed: 0,
            expired: false,
        }
    }

    /// Threshold in ticks.
    #[must_use]
    pub const fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Ticks since the last reference point.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// `elapsed >= timeout` now, or at some point since the last feed.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.expired || self.elapsed >= self.timeout
    }

    /// Change the threshold, keeping elapsed time. Returns `true` when the
    /// new threshold is already reached and this is the first expiry since
    /// the last feed.
    pub fn set_timeout(&mut self, timeout: u64) -> bool {
        self.timeout = timeout;
        self.latch()
    }

    /// Add `ticks`. Returns `true` exactly once per expiry: on the advance that
    /// first reaches the threshold.
    pub fn advance(&mut self, ticks: u64) -> bool {
        self.elapsed = self.elapsed.saturating_add(ticks);
        self.latch()
    }

    fn latch(&mut self) -> bool {
        if !self.expired && self.elapsed >= self.timeout {
            self.expired = true;
            return true;
        }
        false
    }

    /// New reference point: elapsed to zero, expiry cleared.
    pub fn feed(&mut self) {
        self.elapsed = 0;
        self.expired = false;
    }
}

/// Counter wrapping at `period`, tallying overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuloCounter {
    period: u64,
    counter: u64,
    overflows: u64,
}

/// Boundaries crossed by one [`ModuloCounter::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overflows {
    /// Overflow count before the advance; boundary `i` (1-based) of this
    /// advance is overflow number `before + i`.
    pub before: u64,
    /// Boundaries crossed.
    pub crossed: u64,
    /// A one-shot counter reached its period and must stop.
    pub finished: bool,
}

impl ModuloCounter {
    /// Counter at zero. `period` must be non-zero.
    #[must_use]
    pub const fn new(period: u64) -> Self {
        Self {
            period,
            counter: 0,
            overflows: 0,
        }
    }

    /// Period in ticks.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Position in `[0, period)`.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    /// Overflows so far.
    #[must_use]
    pub const fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Change the period, wrapping the counter into it. Zero is ignored.
    pub fn set_period(&mut self, period: u64) {
        if let Some(counter) = self.counter.checked_rem(period) {
            self.period = period;
            self.counter = counter;
        }
    }

    /// Preload the counter. Returns `false` (and changes nothing) when
    /// `value >= period`.
    pub fn set_counter(&mut self, value: u64) -> bool {
        if value >= self.period {
            return false;
        }
        self.counter = value;
        true
    }

    /// Add `ticks`.
    ///
    /// `Periodic`: `counter = (counter + ticks) mod period`, overflows grow by
    /// `(counter + ticks) / period`. `OneShot`: the first boundary ends the
    /// run with the counter at zero and exactly one overflow recorded.
    pub fn advance(&mut self, ticks: u64, mode: TimerMode) -> Overflows {
        let before = self.overflows;
        let total = u128::from(self.counter).saturating_add(u128::from(ticks));
        let period = u128::from(self.period);
        let crossed = total.checked_div(period).unwrap_or(0);
        if crossed == 0 {
            self.counter = u64::try_from(total).unwrap_or(self.counter);
            return Overflows {
                before,
                crossed: 0,
                finished: false,
            };
        }
        match mode {
            TimerMode::Periodic => {
                let rem = total.checked_rem(period).unwrap_or(0);
                self.counter = u64::try_from(rem).unwrap_or(0);
                let crossed = u64::try_from(crossed).unwrap_or(u64::MAX);
                self.overflows = self.overflows.saturating_add(crossed);
                Overflows {
                    before,
                    crossed,
                    finished: false,
                }
            }
            TimerMode::OneShot => {
                self.counter = 0;
                self.overflows = self.overflows.saturating_add(1);
                Overflows {
                    before,
                    crossed: 1,
                    finished: true,
                }
            }
        }
    }
}

/// First instant in `(old, new]` whose second-of-day equals `target`, if any.
///
/// Instants are seconds on one continuous timeline; a window of a full day or
/// more always contains a match.
#[must_use]
pub fn first_time_of_day_match(old: u64, new: u64, target: u32) -> Option<u64> {
    const DAY: u64 = 86_400;
    if new <= old {
        return None;
    }
    let current = old.checked_rem(DAY)?;
    let target = u64::from(target);
    let mut delta = target.wrapping_sub(current).wrapping_add(DAY).checked_rem(DAY)?;
    if delta == 0 {
        delta = DAY;
    }
    let at = old.checked_add(delta)?;
    (at <= new).then_some(at)
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

    #[test]
    fn threshold_fires_once_until_fed() {
        let mut wd = Threshold::new(100);
        assert!(!wd.advance(99));
        assert!(wd.advance(1));
        assert!(!wd.advance(500));
        assert!(wd.is_expired());
        wd.feed();
        assert!(!wd.is_expired());
        assert!(wd.advance(100));
    }

    #[test]
    fn lowering_timeout_below_elapsed_expires_at_once() {
        let mut wd = Threshold::new(1000);
        assert!(!wd.advance(600));
        assert!(wd.set_timeout(500));
        assert!(wd.is_expired());
        assert!(!wd.set_timeout(400));
        assert!(!wd.advance(10));
        wd.feed();
        assert!(!wd.set_timeout(500));
        assert!(!wd.is_expired());
    }

    #[test]
    fn modulo_counts_multiple_boundaries_in_one_advance() {
        let mut t = ModuloCounter::new(10);
        let o = t.advance(35, TimerMode::Periodic);
        assert_eq!(o.crossed, 3);
        assert_eq!(o.before, 0);
        assert_eq!(t.counter(), 5);
        assert_eq!(t.overflows(), 3);
    }

    #[test]
    fn one_shot_stops_at_first_boundary() {
        let mut t = ModuloCounter::new(10);
        let o = t.advance(35, TimerMode::OneShot);
        assert!(o.finished);
        assert_eq!(o.crossed, 1);
        assert_eq!(t.counter(), 0);
        assert_eq!(t.overflows(), 1);
    }

    #[test]
    fn set_period_wraps_counter_and_ignores_zero() {
        let mut t = ModuloCounter::new(100);
        t.advance(75, TimerMode::Periodic);
        t.set_period(50);
        assert_eq!(t.counter(), 25);
        t.set_period(0);
        assert_eq!(t.period(), 50);
    }

    #[test]
    fn set_counter_rejects_values_outside_period() {
        let mut t = ModuloCounter::new(10);
        assert!(!t.set_counter(10));
        assert!(t.set_counter(9));
        assert_eq!(t.counter(), 9);
    }

    #[test]
    fn time_of_day_match_within_window() {
        // 00:00:00 -> 00:00:10, target 00:00:05
        assert_eq!(first_time_of_day_match(0, 10, 5), Some(5));
        // target equal to the start is not in (old, new]
        assert_eq!(first_time_of_day_match(5, 10, 5), None);
        // target equal to the end is
        assert_eq!(first_time_of_day_match(0, 5, 5), Some(5));
    }

    #[test]
    fn time_of_day_match_wraps_midnight() {
        let old = 86_400 - 2; // 23:59:58
        assert_eq!(first_time_of_day_match(old, old + 5, 1), Some(86_401));
    }

    #[test]
    fn full_day_window_always_matches() {
        let old = 1_000;
        assert_eq!(first_time_of_day_match(old, old + 86_400, 1_000), Some(old + 86_400));
    }
}
