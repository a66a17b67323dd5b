//! Device lifecycle state machine.
//!
//! ```text
//!                init                 suspend
//! [Uninitialized] ───► [Running] ◄──────────────► [Suspended]
//!        ▲                 │          resume            │
//!        └──── deinit ─────┴────────────────────────────┘
//!
//! [Error] ──deinit──► [Uninitialized]
//! ```
//!
//! `init` is deliberately not idempotent: a second `init` without an
//! intervening `deinit` fails with [`HalError::AlreadyInitialized`]. A rejected
//! transition leaves the flags untouched.

use crate::error::{HalError, HalResult};

/// Observable lifecycle phase of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Not initialized (power-on default).
    Uninitialized,
    /// Initialized and accepting role operations.
    Running,
    /// Initialized but suspended; all data is retained.
    Suspended,
    /// An internal invariant was violated; only `deinit` is accepted.
    Error,
}

impl DeviceState {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Error => "error",
        }
    }
}

/// Universal lifecycle capability.
///
/// Every device role exposes this; roles that share one physical device share
/// one set of flags, so driving any of them drives all of them.
pub trait Lifecycle {
    /// `Uninitialized` → `Running`. Clears device data to its configured defaults.
    fn init(&mut self) -> HalResult<()>;

    /// `Running`/`Suspended`/`Error` → `Uninitialized`. Clears callbacks.
    fn deinit(&mut self) -> HalResult<()>;

    /// `Running` → `Suspended`. Data is preserved bit-for-bit.
    fn suspend(&mut self) -> HalResult<()>;

    /// `Suspended` → `Running`. Data is preserved bit-for-bit.
    fn resume(&mut self) -> HalResult<()>;

    /// Current phase. Never fails.
    fn state(&self) -> DeviceState;
}

/// The `initialized` / `suspended` flag pair backing [`DeviceState`].
///
/// Invariants:
/// - `Uninitialized` ⇔ `!initialized`
/// - `Running` ⇔ `initialized && !suspended`
/// - `Suspended` ⇔ `initialized && suspended`
///
/// `fault` overrides the above and reports [`DeviceState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LifecycleFlags {
    initialized: bool,
    suspended: bool,
    fault: bool,
}

impl LifecycleFlags {
    /// Power-on flags (`Uninitialized`).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initialized: false,
            suspended: false,
            fault: false,
        }
    }

    /// Derived lifecycle phase.
    #[must_use]
    pub const fn state(&self) -> DeviceState {
        if self.fault {
            DeviceState::Error
        } else if !self.initialized {
            DeviceState::Uninitialized
        } else if self.suspended {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        }
    }

    /// Raw `initialized` flag.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Raw `suspended` flag.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// `true` only in `Running`.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state(), DeviceState::Running)
    }

    /// Apply the `init` transition.
    pub fn init(&mut self) -> HalResult<()> {
        match self.state() {
            DeviceState::Uninitialized => {
                self.initialized = true;
                self.suspended = false;
                Ok(())
            }
            DeviceState::Running | DeviceState::Suspended => Err(HalError::AlreadyInitialized),
            DeviceState::Error => Err(HalError::InvalidState),
        }
    }

    /// Apply the `deinit` transition. Also clears a fault.
    pub fn deinit(&mut self) -> HalResult<()> {
        match self.state() {
            DeviceState::Uninitialized => Err(HalError::NotInitialized),
            DeviceState::Running | DeviceState::Suspended | DeviceState::Error => {
                *self = Self::new();
                Ok(())
            }
        }
    }

    /// Apply the `suspend` transition.
    pub fn suspend(&mut self) -> HalResult<()> {
        match self.state() {
            DeviceState::Running => {
                self.suspended = true;
                Ok(())
            }
            DeviceState::Uninitialized => Err(HalError::NotInitialized),
            DeviceState::Suspended | DeviceState::Error => Err(HalError::InvalidState),
        }
    }

    /// Apply the `resume` transition.
    pub fn resume(&mut self) -> HalResult<()> {
        match self.state() {
            DeviceState::Suspended => {
                self.suspended = false;
                Ok(())
            }
            DeviceState::Uninitialized => Err(HalError::NotInitialized),
            DeviceState::Running | DeviceState::Error => Err(HalError::InvalidState),
        }
    }

    /// Gate for role operations: `Ok` only while `Running`.
    pub fn ensure_running(&self) -> HalResult<()> {
        match self.state() {
            DeviceState::Running => Ok(()),
            DeviceState::Uninitialized => Err(HalError::NotInitialized),
            DeviceState::Suspended | DeviceState::Error => Err(HalError::InvalidState),
        }
    }

    /// Gate for operations that only need the device initialized.
    pub fn ensure_initialized(&self) -> HalResult<()> {
        match self.state() {
            DeviceState::Uninitialized => Err(HalError::NotInitialized),
            DeviceState::Error => Err(HalError::InvalidState),
            DeviceState::Running | DeviceState::Suspended => Ok(()),
        }
    }

    /// Record an internal invariant violation.
    pub fn mark_fault(&mut self) {
        self.fault = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized() {
        let flags = LifecycleFlags::new();
        assert_eq!(flags.state(), DeviceState::Uninitialized);
        assert!(!flags.is_initialized());
    }

    #[test]
    fn init_twice_is_rejected_and_state_stays_running() {
        let mut flags = LifecycleFlags::new();
        flags.init().unwrap();
        assert_eq!(flags.init(), Err(HalError::AlreadyInitialized));
        assert_eq!(flags.state(), DeviceState::Running);
    }

    #[test]
    fn init_while_suspended_is_already_initialized() {
        let mut flags = LifecycleFlags::new();
        flags.init().unwrap();
        flags.suspend().unwrap();
        assert_eq!(flags.init(), Err(HalError::AlreadyInitialized));
        assert_eq!(flags.state(), DeviceState::Suspended);
    }

    #[test]
    fn deinit_requires_initialized() {
        let mut flags = LifecycleFlags::new();
        assert_eq!(flags.deinit(), Err(HalError::NotInitialized));
    }

    #[test]
    fn suspend_resume_round_trip() {
        let mut flags = LifecycleFlags::new();
        flags.init().unwrap();
        flags.suspend().unwrap();
        assert_eq!(flags.state(), DeviceState::Suspended);
        assert_eq!(flags.suspend(), Err(HalError::InvalidState));
        flags.resume().unwrap();
        assert_eq!(flags.state(), DeviceState::Running);
        assert_eq!(flags.resume(), Err(HalError::InvalidState));
    }

    #[test]
    fn suspend_and_resume_uninitialized_fail_not_initialized() {
        let mut flags = LifecycleFlags::new();
        assert_eq!(flags.suspend(), Err(HalError::NotInitialized));
        assert_eq!(flags.resume(), Err(HalError::NotInitialized));
    }

    #[test]
    fn deinit_from_suspended_returns_to_uninitialized() {
        let mut flags = LifecycleFlags::new();
        flags.init().unwrap();
        flags.suspend().unwrap();
        flags.deinit().unwrap();
        assert_eq!(flags.state(), DeviceState::Uninitialized);
        assert!(!flags.is_suspended());
    }

    #[test]
    fn fault_only_accepts_deinit() {
        let mut flags = LifecycleFlags::new();
        flags.init().unwrap();
        flags.mark_fault();
        assert_eq!(flags.state(), DeviceState::Error);
        assert_eq!(flags.init(), Err(HalError::InvalidState));
        assert_eq!(flags.suspend(), Err(HalError::InvalidState));
        assert_eq!(flags.resume(), Err(HalError::InvalidState));
        assert_eq!(flags.ensure_running(), Err(HalError::InvalidState));
        flags.deinit().unwrap();
        assert_eq!(flags.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn ensure_running_distinguishes_phases() {
        let mut flags = LifecycleFlags::new();
        assert_eq!(flags.ensure_running(), Err(HalError::NotInitialized));
        flags.init().unwrap();
        assert_eq!(flags.ensure_running(), Ok(()));
        flags.suspend().unwrap();
        assert_eq!(flags.ensure_running(), Err(HalError::InvalidState));
        assert_eq!(flags.ensure_initialized(), Ok(()));
    }
}
