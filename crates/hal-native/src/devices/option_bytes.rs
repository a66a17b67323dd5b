//! Simulated option-byte storage.
//!
//! Setters stage into a pending image; getters read the committed image.
//! The committed image is non-volatile: it survives `deinit`/`init`, which
//! only abandon staged changes. A power-on reset restores the configured
//! factory image.

use hal::{
    DeviceKind, HalError, HalResult, OptionBytes, OptionBytesConfig, ProtectionLevel,
    OPTION_USER_DATA_LEN,
};

use crate::engine::PendingStore;
use crate::native::{Model, Native};

/// One copy of the option-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionImage {
    /// Read-out protection
    pub protection_level: ProtectionLevel,
    /// User configuration byte
    pub user_config: u8,
    /// User data area
    pub user_data: [u8; OPTION_USER_DATA_LEN],
}

impl From<&OptionBytesConfig> for OptionImage {
    fn from(config: &OptionBytesConfig) -> Self {
        Self {
            protection_level: config.protection_level,
            user_config: config.user_config,
            user_data: config.user_data,
        }
    }
}

/// Option-byte data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBytesState {
    store: PendingStore<OptionImage>,
}

impl Model for OptionBytesState {
    const KIND: DeviceKind = DeviceKind::OptionBytes;
    type Config = OptionBytesConfig;
    type Hooks = ();

    fn power_on(config: &OptionBytesConfig) -> Self {
        Self {
            store: PendingStore::new(OptionImage::from(config), config.write_protected),
        }
    }

    fn on_init(&mut self, _config: &OptionBytesConfig) -> HalResult<()> {
        self.store.abandon();
        Ok(())
    }
}

/// Simulated option-byte handle.
pub type NativeOptionBytes = Native<OptionBytesState>;

impl NativeOptionBytes {
    // ── Test support ─────────────────────────────────────────────────────

    /// Open or close the write-protection gate.
    pub fn set_write_protection(&self, on: bool) {
        self.poke(|core| core.data.store.set_write_protected(on));
        tracing::debug!(on, "option bytes write protection");
    }

    /// Write-protection gate state.
    #[must_use]
    pub fn is_write_protected(&self) -> bool {
        self.peek(|core| core.data.store.is_write_protected())
    }

    /// Staged image, as `apply` would commit it.
    #[must_use]
    pub fn pending_image(&self) -> OptionImage {
        self.peek(|core| *core.data.store.pending())
    }

    /// Committed image.
    #[must_use]
    pub fn committed_image(&self) -> OptionImage {
        self.peek(|core| *core.data.store.committed())
    }
}

impl OptionBytes for NativeOptionBytes {
    fn protection_level(&self) -> HalResult<ProtectionLevel> {
        self.running(|state, _| Ok(state.store.committed().protection_level))
    }

    /// Level 2 is permanent: once committed it cannot be lowered.
    fn set_protection_level(&mut self, level: u8) -> HalResult<()> {
        let level = ProtectionLevel::try_from(level)?;
        self.running_mut(|state, _| {
            let committed = state.store.committed().protection_level;
            state.store.stage(|image| {
                if committed == ProtectionLevel::MAX && level != ProtectionLevel::MAX {
                    return Err(HalError::PermissionDenied);
                }
                image.protection_level = level;
                Ok(())
            })
        })
    }

    fn user_config(&self) -> HalResult<u8> {
        self.running(|state, _| Ok(state.store.committed().user_config))
    }

    fn set_user_config(&mut self, value: u8) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.store.stage(|image| {
                image.user_config = value;
                Ok(())
            })
        })
    }

    fn user_data(&self) -> HalResult<[u8; OPTION_USER_DATA_LEN]> {
        self.running(|state, _| Ok(state.store.committed().user_data))
    }

    fn write_user_data(&mut self, offset: usize, data: &[u8]) -> HalResult<()> {
        if data.is_empty() {
            return Err(HalError::NullArgument);
        }
        self.running_mut(|state, _| {
            state.store.stage(|image| {
                let end = offset.checked_add(data.len()).ok_or(HalError::NoMemory)?;
                let area = image.user_data.get_mut(offset..end).ok_or(HalError::NoMemory)?;
                area.copy_from_slice(data);
                Ok(())
            })
        })
    }

    fn apply(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            let dirty = state.store.has_pending();
            state.store.apply()?;
            if dirty {
                tracing::debug!(
                    level = state.store.committed().protection_level.as_u8(),
                    "option bytes committed"
                );
            }
            Ok(())
        })
    }

    fn has_pending_changes(&self) -> HalResult<bool> {
        self.running(|state, _| Ok(state.store.has_pending()))
    }

    fn discard(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| state.store.discard())
    }
}
