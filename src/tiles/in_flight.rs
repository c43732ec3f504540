use crate::core::geo::TileKey;
use crate::prelude::{Arc, HashSet, Mutex};
use std::sync::{MutexGuard, PoisonError};

/// Tile keys with a fetch currently in flight.
///
/// Every operation goes through one mutex and holds it only for the set
/// mutation itself. `try_begin` is a single test-and-insert, so two callers
/// can never both observe a key as absent.
#[derive(Debug, Default)]
pub struct InFlightSet {
    keys: Mutex<HashSet<TileKey>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the fetch for `key`. Returns `false` if another fetch already owns it.
    pub fn try_begin(&self, key: &TileKey) -> bool {
        self.lock().insert(key.clone())
    }

    /// Release `key`. Idempotent.
    pub fn end(&self, key: &TileKey) {
        self.lock().remove(key);
    }

    /// Like [`try_begin`](Self::try_begin), but the claim is released when the
    /// returned guard drops, whichever way the fetch settles.
    pub fn begin(self: &Arc<Self>, key: TileKey) -> Option<InFlightGuard> {
        if self.try_begin(&key) {
            Some(InFlightGuard {
                set: Arc::clone(self),
                key,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic can't interrupt a HashSet insert/remove halfway, so the set is
    // consistent even when poisoned.
    fn lock(&self) -> MutexGuard<'_, HashSet<TileKey>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ownership of one in-flight fetch. Dropping it ends the fetch.
#[derive(Debug)]
pub struct InFlightGuard {
    set: Arc<InFlightSet>,
    key: TileKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &TileKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.end(&self.key);
    }
}
