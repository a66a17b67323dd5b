//! Edge-triggered interrupt detection for simulated pins.

use hal::gpio::{Edge, EdgeTrigger, PinLevel};

/// Tracks a pin's level and decides which level changes fire its interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeDetector {
    level: PinLevel,
    trigger: Option<EdgeTrigger>,
    count: u32,
}

impl EdgeDetector {
    /// Detector at `level` with no trigger armed.
    #[must_use]
    pub const fn new(level: PinLevel) -> Self {
        Self {
            level,
            trigger: None,
            count: 0,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> PinLevel {
        self.level
    }

    /// Armed trigger.
    #[must_use]
    pub const fn trigger(&self) -> Option<EdgeTrigger> {
        self.trigger
    }

    /// Interrupts fired so far.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Arm `trigger`, or disarm with `None`. Replaces any previous trigger.
    pub fn arm(&mut self, trigger: Option<EdgeTrigger>) {
        self.trigger = trigger;
    }

    /// Back to `level` with no trigger armed. The fire count is kept.
    pub fn reset(&mut self, level: PinLevel) {
        self.level = level;
        self.trigger = None;
    }

    /// Set the level without evaluating the trigger (pin driven internally).
    pub fn set_level(&mut self, level: PinLevel) {
        self.level = level;
    }

    /// Move to `level`. When `armed_gate` is true and the transition matches
    /// the trigger, the fire count is incremented and the edge returned.
    pub fn transition(&mut self, level: PinLevel, armed_gate: bool) -> Option<Edge> {
        let old = core::mem::replace(&mut self.level, level);
        let trigger = self.trigger?;
        if !armed_gate || !trigger.fires(old, level) {
            return None;
        }
        self.count = self.count.saturating_add(1);
        Some(if level.is_high() {
            Edge::Rising
        } else {
            Edge::Falling
        })
    }
}
