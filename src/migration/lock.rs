//! Advisory-lock guard for migration runs

use super::SchemaStateStore;
use crate::LifeError;

/// Lock guard that automatically releases the lock when dropped
///
/// Release happens on every exit path of a run, whatever happened to the transactions in
/// between. Release failures are logged and never raised.
pub struct MigrationLockGuard<'a, S: SchemaStateStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SchemaStateStore + ?Sized> MigrationLockGuard<'a, S> {
    /// Try to acquire the migration lock without waiting
    ///
    /// Returns `Ok(None)` when another session holds the lock.
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the lock query itself fails.
    pub fn try_acquire(store: &'a S) -> Result<Option<Self>, LifeError> {
        if store.try_lock()? {
            log::debug!("Acquired migration lock");
            Ok(Some(Self { store }))
        } else {
            Ok(None)
        }
    }
}

impl<S: SchemaStateStore + ?Sized> Drop for MigrationLockGuard<'_, S> {
    fn drop(&mut self) {
        match self.store.unlock() {
            Ok(()) => log::debug!("Released migration lock"),
            Err(e) => log::warn!("Failed to release migration lock: {e}"),
        }
    }
}
