//! Simulated clock/power domain.

use std::cell::RefCell;
use std::rc::Rc;

use hal::{HalResult, Power, PowerCallback};

use crate::callback::CallbackSlot;

#[derive(Default)]
struct DomainState {
    enabled: bool,
    notifications: u32,
    callback: CallbackSlot<PowerCallback>,
}

/// Clock gate of one simulated device.
///
/// Advisory: the device's role operations never consult it. Every `enable`
/// and `disable` notifies the callback once, whether or not the flag changed.
#[derive(Clone, Default)]
pub struct PowerDomain {
    state: Rc<RefCell<DomainState>>,
}

impl PowerDomain {
    /// Gated (disabled) domain with no callback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback invocations so far.
    #[must_use]
    pub fn notification_count(&self) -> u32 {
        self.state.borrow().notifications
    }

    /// Back to the power-on state: disabled, no callback, counter cleared.
    pub fn power_on_reset(&self) {
        let mut s = self.state.borrow_mut();
        s.enabled = false;
        s.notifications = 0;
        s.callback.clear();
    }

    fn set(&self, enabled: bool) {
        let taken = {
            let mut s = self.state.borrow_mut();
            s.enabled = enabled;
            s.notifications = s.notifications.saturating_add(1);
            s.callback.take()
        };
        tracing::trace!(enabled, "power domain");
        if let Some((mut callback, generation)) = taken {
            callback(enabled);
            self.state.borrow_mut().callback.restore(callback, generation);
        }
    }
}

impl Power for PowerDomain {
    fn enable(&mut self) -> HalResult<()> {
        self.set(true);
        Ok(())
    }

    fn disable(&mut self) -> HalResult<()> {
        self.set(false);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn set_callback(&mut self, callback: Option<PowerCallback>) -> HalResult<()> {
        self.state.borrow_mut().callback.set(callback);
        Ok(())
    }
}
