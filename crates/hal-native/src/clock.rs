//! Simulated clock context.
//!
//! Time moves only inside [`SimClock::advance`]. Time-driven devices subscribe
//! when constructed and are notified synchronously, in subscription order, so
//! every callback they fire runs before `advance` returns. Clones share one
//! timeline; independent clocks give tests independent timelines.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Receiver of clock advances.
pub(crate) trait TickSink {
    /// `ticks` elapsed.
    fn on_advance(&self, ticks: u64);
}

struct ClockInner {
    now: Cell<u64>,
    sinks: RefCell<Vec<Weak<dyn TickSink>>>,
}

/// Shared handle to a simulated millisecond clock.
#[derive(Clone)]
pub struct SimClock {
    inner: Rc<ClockInner>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimClock")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}

impl SimClock {
    /// A clock at tick 0 with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ClockInner {
                now: Cell::new(0),
                sinks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Ticks since creation or the last [`SimClock::reset`].
    #[must_use]
    pub fn now(&self) -> u64 {
        self.inner.now.get()
    }

    /// Move time forward and notify every live subscriber.
    ///
    /// Subscribers are snapshotted first, so a callback may advance the clock
    /// again; the nested advance is delivered before this one finishes.
    pub fn advance(&self, ticks: u64) {
        self.inner.now.set(self.now().saturating_add(ticks));
        tracing::trace!(ticks, now = self.now(), "clock advance");

        let sinks: Vec<Rc<dyn TickSink>> = {
            let mut list = self.inner.sinks.borrow_mut();
            list.retain(|w| w.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for sink in sinks {
            sink.on_advance(ticks);
        }
    }

    /// Return the clock to tick 0. Device counters keep their values; they
    /// track elapsed time themselves and carry no absolute anchor.
    pub fn reset(&self) {
        tracing::debug!(from = self.now(), "clock reset");
        self.inner.now.set(0);
    }

    /// `true` when both handles share one timeline.
    #[must_use]
    pub fn same_timeline(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn subscribe(&self, sink: Weak<dyn TickSink>) {
        self.inner.sinks.borrow_mut().push(sink);
    }

    /// Live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .sinks
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    struct Recorder(RefCell<Vec<u64>>);

    impl TickSink for Recorder {
        fn on_advance(&self, ticks: u64) {
            self.0.borrow_mut().push(ticks);
        }
    }

    #[test]
    fn advance_accumulates_and_reset_zeroes() {
        let clock = SimClock::new();
        clock.advance(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.reset();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn clones_share_a_timeline() {
        let a = SimClock::new();
        let b = a.clone();
        b.advance(7);
        assert_eq!(a.now(), 7);
        assert!(a.same_timeline(&b));
        assert!(!a.same_timeline(&SimClock::new()));
    }

    #[test]
    fn subscribers_see_every_advance() {
        let clock = SimClock::new();
        let rec = Rc::new(Recorder(RefCell::new(Vec::new())));
        let sink: Rc<dyn TickSink> = rec.clone();
        clock.subscribe(Rc::downgrade(&sink));
        clock.advance(3);
        clock.advance(4);
        assert_eq!(*rec.0.borrow(), vec![3, 4]);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let clock = SimClock::new();
        {
            let sink: Rc<dyn TickSink> = Rc::new(Recorder(RefCell::new(Vec::new())));
            clock.subscribe(Rc::downgrade(&sink));
            assert_eq!(clock.subscriber_count(), 1);
        }
        clock.advance(1);
        assert_eq!(clock.subscriber_count(), 0);
    }

    #[test]
    fn advance_saturates() {
        let clock = SimClock::new();
        clock.advance(u64::MAX);
        clock.advance(1);
        assert_eq!(clock.now(), u64::MAX);
    }
}
