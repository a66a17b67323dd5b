//! Shared device handle and the lifecycle every simulated device obeys.
//!
//! A device's state lives in one `Rc<RefCell<Core<M>>>`. Every handle the
//! registry hands out (and every role implemented on it) points at that one
//! cell, so initializing through any handle initializes all of them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hal::{DeviceKind, DeviceName, DeviceState, HalError, HalResult, Lifecycle, LifecycleFlags};

use crate::callback::{CallbackSlot, Hooks};
use crate::clock::{SimClock, TickSink};
use crate::power::PowerDomain;

/// Per-type simulated device data.
///
/// `Self` holds everything a suspend/resume cycle must preserve (it is
/// compared bit-for-bit in tests); callbacks live apart in [`Model::Hooks`].
pub trait Model: Clone + PartialEq + fmt::Debug + 'static {
    /// Device type tag.
    const KIND: DeviceKind;

    /// Construction-time configuration.
    type Config: Copy + fmt::Debug + 'static;

    /// Callback slots.
    type Hooks: Hooks + 'static;

    /// Power-on-reset state for `config`.
    fn power_on(config: &Self::Config) -> Self;

    /// Bring data back to its configured defaults at `init`. Diagnostic
    /// counters survive. An error leaves the device uninitialized.
    fn on_init(&mut self, config: &Self::Config) -> HalResult<()>;

    /// Release runtime resources at `deinit`.
    fn on_deinit(&mut self) {}

    /// Engine invariants hold.
    fn is_consistent(&self) -> bool {
        true
    }
}

/// Time-driven models.
pub(crate) trait Clocked: Model {
    /// `ticks` elapsed on the device's clock.
    fn on_ticks(cell: &RefCell<Core<Self>>, ticks: u64);
}

/// Shared state behind every handle to one device.
pub struct Core<M: Model> {
    pub(crate) name: DeviceName,
    pub(crate) index: u16,
    pub(crate) config: M::Config,
    pub(crate) flags: LifecycleFlags,
    pub(crate) data: M,
    pub(crate) hooks: M::Hooks,
}

impl<M: Clocked> TickSink for RefCell<Core<M>> {
    fn on_advance(&self, ticks: u64) {
        M::on_ticks(self, ticks);
    }
}

/// Invoke the callback in `slot` with `arg` without holding the borrow.
///
/// Returns `false` when no callback was registered.
pub(crate) fn fire<M, A>(
    cell: &RefCell<Core<M>>,
    slot: fn(&mut M::Hooks) -> &mut CallbackSlot<Box<dyn FnMut(A)>>,
    arg: A,
) -> bool
where
    M: Model,
{
    let taken = slot(&mut cell.borrow_mut().hooks).take();
    match taken {
        Some((mut callback, generation)) => {
            callback(arg);
            slot(&mut cell.borrow_mut().hooks).restore(callback, generation);
            true
        }
        None => false,
    }
}

/// Handle to one simulated device. Cheap to clone; clones alias.
pub struct Native<M: Model> {
    core: Rc<RefCell<Core<M>>>,
    power: Option<PowerDomain>,
}

impl<M: Model> Clone for Native<M> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            power: self.power.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for Native<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Native")
            .field("kind", &M::KIND)
            .field("name", &core.name)
            .field("state", &core.flags.state())
            .finish_non_exhaustive()
    }
}

impl<M: Model> Native<M> {
    /// Construct in the power-on state. `gated` adds a clock/power domain.
    pub(crate) fn build(name: DeviceName, index: u16, config: M::Config, gated: bool) -> Self {
        tracing::debug!(device = name.as_str(), kind = M::KIND.as_str(), index, "construct");
        Self {
            core: Rc::new(RefCell::new(Core {
                name,
                index,
                data: M::power_on(&config),
                config,
                flags: LifecycleFlags::new(),
                hooks: M::Hooks::default(),
            })),
            power: gated.then(PowerDomain::new),
        }
    }

    /// Device type tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        M::KIND
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> DeviceName {
        self.core.borrow().name.clone()
    }

    /// Instance index within the kind.
    #[must_use]
    pub fn index(&self) -> u16 {
        self.core.borrow().index
    }

    /// Construction-time configuration.
    #[must_use]
    pub fn construction_config(&self) -> M::Config {
        self.core.borrow().config
    }

    /// `true` when both handles refer to the same device state.
    #[must_use]
    pub fn same_device(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    /// Clock/power domain, for clock-gated kinds.
    pub fn power_domain(&mut self) -> Option<&mut PowerDomain> {
        self.power.as_mut()
    }

    // ── Test support ─────────────────────────────────────────────────────

    /// Copy of the device data, for before/after comparisons.
    #[must_use]
    pub fn snapshot(&self) -> M {
        self.core.borrow().data.clone()
    }

    /// Force the device back to its power-on-reset state: uninitialized,
    /// callbacks cleared, counters zeroed, power domain gated.
    pub fn power_on_reset(&self) {
        {
            let mut guard = self.core.borrow_mut();
            let core = &mut *guard;
            core.flags = LifecycleFlags::new();
            core.data = M::power_on(&core.config);
            core.hooks.clear();
            tracing::debug!(device = core.name.as_str(), "power-on reset");
        }
        if let Some(power) = &self.power {
            power.power_on_reset();
        }
    }

    /// Put the device in [`DeviceState::Error`] as if an engine had found a
    /// broken invariant.
    pub fn inject_fault(&self) {
        let mut core = self.core.borrow_mut();
        core.flags.mark_fault();
        tracing::warn!(device = core.name.as_str(), "fault injected");
    }

    // ── Crate-internal access ────────────────────────────────────────────

    /// Read access without a lifecycle gate (test support, config getters).
    pub(crate) fn peek<R>(&self, f: impl FnOnce(&Core<M>) -> R) -> R {
        f(&self.core.borrow())
    }

    /// Mutable access without a lifecycle gate (test support).
    pub(crate) fn poke<R>(&self, f: impl FnOnce(&mut Core<M>) -> R) -> R {
        f(&mut self.core.borrow_mut())
    }

    /// Read access for a role operation: `Running` only.
    pub(crate) fn running<R>(
        &self,
        f: impl FnOnce(&M, &M::Config) -> HalResult<R>,
    ) -> HalResult<R> {
        let core = self.core.borrow();
        core.flags.ensure_running()?;
        f(&core.data, &core.config)
    }

    /// Mutable access for a role operation: `Running` only. An engine
    /// invariant broken by the operation moves the device to `Error`.
    pub(crate) fn running_mut<R>(
        &self,
        f: impl FnOnce(&mut M, &mut M::Hooks) -> HalResult<R>,
    ) -> HalResult<R> {
        let mut guard = self.core.borrow_mut();
        let core = &mut *guard;
        core.flags.ensure_running()?;
        let out = f(&mut core.data, &mut core.hooks)?;
        if !core.data.is_consistent() {
            core.flags.mark_fault();
            tracing::warn!(device = core.name.as_str(), "engine invariant violated");
            return Err(HalError::InvalidState);
        }
        Ok(out)
    }

    /// Invoke a callback outside the state borrow.
    pub(crate) fn fire<A>(
        &self,
        slot: fn(&mut M::Hooks) -> &mut CallbackSlot<Box<dyn FnMut(A)>>,
        arg: A,
    ) -> bool {
        fire(&self.core, slot, arg)
    }
}

impl<M: Clocked> Native<M> {
    /// Construct and subscribe to `clock`.
    pub(crate) fn build_clocked(
        name: DeviceName,
        index: u16,
        config: M::Config,
        gated: bool,
        clock: &SimClock,
    ) -> Self {
        let device = Self::build(name, index, config, gated);
        let sink: Rc<dyn TickSink> = device.core.clone();
        clock.subscribe(Rc::downgrade(&sink));
        device
    }
}

impl<M: Model> Lifecycle for Native<M> {
    fn init(&mut self) -> HalResult<()> {
        let mut guard = self.core.borrow_mut();
        let core = &mut *guard;
        if core.flags.state() != DeviceState::Uninitialized {
            return core.flags.init();
        }
        if let Err(e) = core.data.on_init(&core.config) {
            tracing::warn!(device = core.name.as_str(), error = e.as_str(), "init rejected");
            return Err(e);
        }
        core.flags.init()?;
        tracing::debug!(device = core.name.as_str(), kind = M::KIND.as_str(), "init");
        Ok(())
    }

    fn deinit(&mut self) -> HalResult<()> {
        let mut guard = self.core.borrow_mut();
        let core = &mut *guard;
        core.flags.deinit()?;
        core.hooks.clear();
        core.data.on_deinit();
        tracing::debug!(device = core.name.as_str(), "deinit");
        Ok(())
    }

    fn suspend(&mut self) -> HalResult<()> {
        let mut core = self.core.borrow_mut();
        core.flags.suspend()?;
        tracing::debug!(device = core.name.as_str(), "suspend");
        Ok(())
    }

    fn resume(&mut self) -> HalResult<()> {
        let mut core = self.core.borrow_mut();
        core.flags.resume()?;
        tracing::debug!(device = core.name.as_str(), "resume");
        Ok(())
    }

    fn state(&self) -> DeviceState {
        self.core.borrow().flags.state()
    }
}
