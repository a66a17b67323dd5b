//! Non-volatile option storage.
//!
//! Writes are staged: every `set_*` mutates a pending copy that only becomes
//! visible after [`OptionBytes::apply`]. Getters always return the committed
//! copy.

use crate::error::{HalError, HalResult};

/// Size of the user-data area in bytes.
pub const OPTION_USER_DATA_LEN: usize = 16;

/// Read-out protection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtectionLevel {
    /// No protection
    #[default]
    Level0,
    /// Debug read-out blocked
    Level1,
    /// Debug permanently disabled
    Level2,
}

impl ProtectionLevel {
    /// Highest defined level.
    pub const MAX: Self = Self::Level2;

    /// Raw register value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Level0 => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
        }
    }
}

impl TryFrom<u8> for ProtectionLevel {
    type Error = HalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Level0),
            1 => Ok(Self::Level1),
            2 => Ok(Self::Level2),
            _ => Err(HalError::InvalidArgument),
        }
    }
}

impl From<ProtectionLevel> for u8 {
    fn from(value: ProtectionLevel) -> Self {
        value.as_u8()
    }
}

/// Factory contents of the option area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OptionBytesConfig {
    /// Committed protection level after power-on
    pub protection_level: ProtectionLevel,
    /// Committed user-config byte after power-on
    pub user_config: u8,
    /// Committed user-data area after power-on
    pub user_data: [u8; OPTION_USER_DATA_LEN],
    /// Write protection after power-on
    pub write_protected: bool,
}

/// Option-byte storage role.
pub trait OptionBytes {
    /// Committed protection level.
    fn protection_level(&self) -> HalResult<ProtectionLevel>;

    /// Stage a protection level given as its raw value (0..=2).
    fn set_protection_level(&mut self, level: u8) -> HalResult<()>;

    /// Committed user-config byte.
    fn user_config(&self) -> HalResult<u8>;

    /// Stage a user-config byte.
    fn set_user_config(&mut self, value: u8) -> HalResult<()>;

    /// Committed user-data area.
    fn user_data(&self) -> HalResult<[u8; OPTION_USER_DATA_LEN]>;

    /// Stage `data` at `offset` in the user-data area. Writes that would run
    /// past the area are rejected with [`HalError::NoMemory`].
    fn write_user_data(&mut self, offset: usize, data: &[u8]) -> HalResult<()>;

    /// Commit all staged changes. A no-op without staged changes.
    fn apply(&mut self) -> HalResult<()>;

    /// `true` while staged changes exist.
    fn has_pending_changes(&self) -> HalResult<bool>;

    /// Drop staged changes.
    fn discard(&mut self) -> HalResult<()>;
}
