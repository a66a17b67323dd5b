//! Status/error domain shared by every capability operation.
//!
//! Errors are values: every operation returns a [`HalResult`] and a rejected
//! call never partially applies state. The set is closed: drivers map their
//! own failure modes onto one of these variants.

use thiserror_no_std::Error;

/// Outcome of a failed capability operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// A required argument was absent (empty slice, missing callback target).
    #[error("required argument missing")]
    NullArgument,
    /// An argument was malformed or outside its valid range.
    #[error("invalid argument or parameter out of range")]
    InvalidArgument,
    /// The device has not been initialized.
    #[error("device not initialized")]
    NotInitialized,
    /// `init` was called on a device that is already initialized.
    #[error("device already initialized")]
    AlreadyInitialized,
    /// The call is not valid in the device's current lifecycle phase.
    #[error("invalid state for this operation")]
    InvalidState,
    /// The device is busy with another operation.
    #[error("device busy")]
    Busy,
    /// No device or target matched the request.
    #[error("not found")]
    NotFound,
    /// A fixed capacity was exceeded.
    #[error("out of memory or capacity exceeded")]
    NoMemory,
    /// The operation was rejected by write protection.
    #[error("permission denied")]
    PermissionDenied,
    /// The operation could not complete within its timeout.
    #[error("operation timed out")]
    Timeout,
    /// The device does not support the requested operation or mode.
    #[error("operation not supported")]
    NotSupported,
}

/// Result alias used by every capability trait.
pub type HalResult<T> = Result<T, HalError>;

impl HalError {
    /// Short, stable identifier for logs and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NullArgument => "null-argument",
            Self::InvalidArgument => "invalid-argument",
            Self::NotInitialized => "not-initialized",
            Self::AlreadyInitialized => "already-initialized",
            Self::InvalidState => "invalid-state",
            Self::Busy => "busy",
            Self::NotFound => "not-found",
            Self::NoMemory => "no-memory",
            Self::PermissionDenied => "permission-denied",
            Self::Timeout => "timeout",
            Self::NotSupported => "not-supported",
        }
    }

    /// `true` for lifecycle-contract violations (wrong phase for the call).
    #[must_use]
    pub const fn is_lifecycle_violation(self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::AlreadyInitialized | Self::InvalidState
        )
    }
}

// ── embedded-hal / embedded-io interop ───────────────────────────────────────

impl embedded_hal::digital::Error for HalError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::spi::Error for HalError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        match self {
            Self::NoMemory => embedded_hal::spi::ErrorKind::Overrun,
            _ => embedded_hal::spi::ErrorKind::Other,
        }
    }
}

impl embedded_hal::i2c::Error for HalError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            Self::NotFound => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::NoMemory => ErrorKind::Overrun,
            Self::Busy => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

impl embedded_io::Error for HalError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        match self {
            Self::NullArgument | Self::InvalidArgument => ErrorKind::InvalidInput,
            Self::NotFound => ErrorKind::NotFound,
            Self::NoMemory => ErrorKind::OutOfMemory,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Timeout => ErrorKind::TimedOut,
            Self::NotSupported => ErrorKind::Unsupported,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::InvalidState
            | Self::Busy => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::HalError;

    #[test]
    fn lifecycle_violations_are_classified() {
        assert!(HalError::NotInitialized.is_lifecycle_violation());
        assert!(HalError::AlreadyInitialized.is_lifecycle_violation());
        assert!(HalError::InvalidState.is_lifecycle_violation());
        assert!(!HalError::Timeout.is_lifecycle_violation());
        assert!(!HalError::PermissionDenied.is_lifecycle_violation());
    }

    #[test]
    fn display_is_human_readable() {
        let s = format!("{}", HalError::PermissionDenied);
        assert_eq!(s, "permission denied");
    }

    #[test]
    fn i2c_not_found_maps_to_address_nack() {
        use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource};
        assert_eq!(
            HalError::NotFound.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
    }

    #[test]
    fn io_timeout_maps_to_timed_out() {
        use embedded_io::{Error, ErrorKind};
        assert_eq!(HalError::Timeout.kind(), ErrorKind::TimedOut);
    }
}
