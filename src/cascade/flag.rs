use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::form::FieldId;

/// Shared "a suggestion apply is in flight" marker.
///
/// Cloning yields another handle on the same flag, so edit detection can ask
/// [`ApplyingFlag::is_applying`] while a cascade owns the [`ApplyGuard`].
#[derive(Clone, Debug, Default)]
pub struct ApplyingFlag {
    inner: Arc<AtomicBool>,
}

impl ApplyingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applying(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Marks a cascade as running until the returned guard is dropped.
    /// Returns `None` when another cascade already holds the flag.
    pub fn acquire(&self) -> Option<ApplyGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ApplyGuard {
                flag: self.clone(),
            })
    }
}

#[derive(Debug)]
pub struct ApplyGuard {
    flag: ApplyingFlag,
}

impl Drop for ApplyGuard {
    fn drop(&mut self) {
        self.flag.inner.store(false, Ordering::SeqCst);
    }
}

/// Separates user edits from programmatic writes made during a cascade.
#[derive(Clone, Debug, Default)]
pub struct EditTracker {
    flag: ApplyingFlag,
    user_modified: Arc<Mutex<BTreeSet<FieldId>>>,
}

impl EditTracker {
    pub fn new(flag: ApplyingFlag) -> Self {
        Self {
            flag,
            user_modified: Arc::default(),
        }
    }

    pub fn flag(&self) -> &ApplyingFlag {
        &self.flag
    }

    /// Called from a field's change listener.
    pub fn record_change(&self, field: FieldId) {
        if self.flag.is_applying() {
            return;
        }
        if let Ok(mut modified) = self.user_modified.lock() {
            modified.insert(field);
        }
    }

    pub fn user_modified(&self) -> Vec<FieldId> {
        self.user_modified
            .lock()
            .map(|modified| modified.iter().copied().collect())
            .unwrap_or_default()
    }
}
