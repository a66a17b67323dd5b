//! Power / clock-domain capability.
//!
//! Advisory to the lifecycle: toggling the domain does not change
//! [`DeviceState`](crate::DeviceState), and role operations do not consult it.
//! Each `enable`/`disable` notifies the registered callback exactly once, even
//! when the flag already had the requested value; re-asserting a clock gate
//! is harmless on silicon but still observable.

use crate::callback::PowerCallback;
use crate::error::HalResult;

/// Clock-gating / power-domain control.
pub trait Power {
    /// Turn the domain on and notify the callback with `true`.
    fn enable(&mut self) -> HalResult<()>;

    /// Turn the domain off and notify the callback with `false`.
    fn disable(&mut self) -> HalResult<()>;

    /// Current domain state.
    fn is_enabled(&self) -> bool;

    /// Replace the notification callback. `None` disables notification.
    fn set_callback(&mut self, callback: Option<PowerCallback>) -> HalResult<()>;
}
