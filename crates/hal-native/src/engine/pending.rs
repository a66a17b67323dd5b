//! Staged-write store with a commit step and a write-protection gate.

use hal::{HalError, HalResult};

/// Committed and pending copies of `T`.
///
/// Readers only ever see the committed copy. While write protection is on,
/// every mutation (staging, commit, discard) fails with
/// [`HalError::PermissionDenied`] and leaves both copies untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStore<T> {
    committed: T,
    pending: T,
    dirty: bool,
    write_protected: bool,
}

impl<T: Clone> PendingStore<T> {
    /// Store whose committed and pending copies are both `initial`.
    pub fn new(initial: T, write_protected: bool) -> Self {
        Self {
            committed: initial.clone(),
            pending: initial,
            dirty: false,
            write_protected,
        }
    }

    /// Externally visible copy.
    pub fn committed(&self) -> &T {
        &self.committed
    }

    /// Staged copy (equal to the committed copy when nothing is staged).
    pub fn pending(&self) -> &T {
        &self.pending
    }

    /// `true` while staged changes exist.
    pub fn has_pending(&self) -> bool {
        self.dirty
    }

    /// Write-protection gate.
    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    /// Open or close the write-protection gate.
    pub fn set_write_protected(&mut self, on: bool) {
        self.write_protected = on;
    }

    fn ensure_writable(&self) -> HalResult<()> {
        if self.write_protected {
            return Err(HalError::PermissionDenied);
        }
        Ok(())
    }

    /// Mutate the staged copy. `edit` may reject the change, in which case
    /// the staged copy is left as it was.
    pub fn stage<F>(&mut self, edit: F) -> HalResult<()>
    where
        F: FnOnce(&mut T) -> HalResult<()>,
    {
        self.ensure_writable()?;
        let mut next = self.pending.clone();
        edit(&mut next)?;
        self.pending = next;
        self.dirty = true;
        Ok(())
    }

    /// Copy staged → committed. A no-op without staged changes.
    pub fn apply(&mut self) -> HalResult<()> {
        self.ensure_writable()?;
        if self.dirty {
            self.committed = self.pending.clone();
            self.dirty = false;
        }
        Ok(())
    }

    /// Throw staged changes away.
    pub fn discard(&mut self) -> HalResult<()> {
        self.ensure_writable()?;
        self.pending = self.committed.clone();
        self.dirty = false;
        Ok(())
    }

    /// Drop staged changes regardless of the gate (controller reset).
    pub fn abandon(&mut self) {
        self.pending = self.committed.clone();
        self.dirty = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn staged_value_invisible_until_apply() {
        let mut store = PendingStore::new(1u8, false);
        store
            .stage(|v| {
                *v = 2;
                Ok(())
            })
            .unwrap();
        assert_eq!(*store.committed(), 1);
        assert!(store.has_pending());
        store.apply().unwrap();
        assert_eq!(*store.committed(), 2);
        assert!(!store.has_pending());
    }

    #[test]
    fn apply_without_changes_is_noop() {
        let mut store = PendingStore::new(7u8, false);
        store.apply().unwrap();
        assert_eq!(*store.committed(), 7);
    }

    #[test]
    fn rejected_edit_leaves_pending_untouched() {
        let mut store = PendingStore::new(0u8, false);
        let err = store.stage(|v| {
            *v = 9;
            Err(HalError::InvalidArgument)
        });
        assert_eq!(err, Err(HalError::InvalidArgument));
        assert_eq!(*store.pending(), 0);
        assert!(!store.has_pending());
    }

    #[test]
    fn write_protection_gates_every_mutation() {
        let mut store = PendingStore::new(0u8, false);
        store
            .stage(|v| {
                *v = 1;
                Ok(())
            })
            .unwrap();
        store.set_write_protected(true);
        assert_eq!(store.stage(|_| Ok(())), Err(HalError::PermissionDenied));
        assert_eq!(store.apply(), Err(HalError::PermissionDenied));
        assert_eq!(store.discard(), Err(HalError::PermissionDenied));
        assert_eq!(*store.committed(), 0);
        store.set_write_protected(false);
        store.apply().unwrap();
        assert_eq!(*store.committed(), 1);
    }
}
