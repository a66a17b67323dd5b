//! Callback storage that survives re-entrant registration.
//!
//! A callback is taken out of its slot before it runs so the device state can
//! be borrowed again from inside it. It goes back only if nothing registered
//! or cleared the slot meanwhile; the generation counter tells the two apart.

/// One registered callback plus a registration generation.
pub struct CallbackSlot<C> {
    callback: Option<C>,
    generation: u64,
}

impl<C> Default for CallbackSlot<C> {
    fn default() -> Self {
        Self {
            callback: None,
            generation: 0,
        }
    }
}

impl<C> CallbackSlot<C> {
    /// Replace the registration; `None` clears it.
    pub fn set(&mut self, callback: Option<C>) {
        self.callback = callback;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop the registration.
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// `true` when a callback is registered (and not currently running).
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.callback.is_some()
    }

    /// Take the callback out for invocation.
    pub fn take(&mut self) -> Option<(C, u64)> {
        let generation = self.generation;
        self.callback.take().map(|c| (c, generation))
    }

    /// Put a taken callback back unless the slot changed while it ran.
    pub fn restore(&mut self, callback: C, generation: u64) {
        if self.generation == generation && self.callback.is_none() {
            self.callback = Some(callback);
        }
    }
}

/// Callback slots owned by one device.
pub trait Hooks: Default {
    /// Clear every slot (bumping generations).
    fn clear(&mut self);
}

impl Hooks for () {
    fn clear(&mut self) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn take_and_restore_round_trips() {
        let mut slot: CallbackSlot<u8> = CallbackSlot::default();
        slot.set(Some(1));
        let (cb, generation) = slot.take().unwrap();
        assert!(!slot.is_set());
        slot.restore(cb, generation);
        assert!(slot.is_set());
    }

    #[test]
    fn registration_during_invocation_wins() {
        let mut slot: CallbackSlot<u8> = CallbackSlot::default();
        slot.set(Some(1));
        let (cb, generation) = slot.take().unwrap();
        slot.set(Some(2));
        slot.restore(cb, generation);
        assert_eq!(slot.take().map(|(c, _)| c), Some(2));
    }

    #[test]
    fn clear_during_invocation_wins() {
        let mut slot: CallbackSlot<u8> = CallbackSlot::default();
        slot.set(Some(1));
        let (cb, generation) = slot.take().unwrap();
        slot.clear();
        slot.restore(cb, generation);
        assert!(!slot.is_set());
    }
}
