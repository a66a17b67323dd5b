//! Registry limits and simulation constants.

use serde::{Deserialize, Serialize};

/// Simulated clock ticks per second (1 tick = 1 ms).
pub const TICKS_PER_SECOND: u64 = 1000;

/// Environment variable naming a JSON board table for [`BoardTable::from_env`].
///
/// [`BoardTable::from_env`]: crate::board::BoardTable::from_env
pub const BOARD_ENV_VAR: &str = "HAL_NATIVE_BOARD";

/// Capacity limits enforced by the [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryLimits {
    /// Constructed instances allowed per device kind. Lookups past the limit
    /// resolve to `None`.
    pub max_per_kind: usize,
    /// Descriptors the registry accepts in total. Registration past the limit
    /// fails with `NoMemory`.
    pub max_devices: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_per_kind: 32,
            max_devices: 128,
        }
    }
}

impl RegistryLimits {
    /// Limits that accept everything the default board registers.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_per_kind: usize::MAX,
            max_devices: usize::MAX,
        }
    }
}
