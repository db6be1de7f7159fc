use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::BillingScope;

type ScopeKey = (Uuid, String, u8);

/// Advisory per-`(site, year, term)` locks.
///
/// Generation and deletion over the same scope must not interleave; both
/// acquire the scope's lock for the duration of the batch. Verification is
/// read-only and never takes one.
pub struct ScopeLocks {
    inner: Mutex<HashMap<ScopeKey, Arc<Mutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, scope: &BillingScope) -> OwnedMutexGuard<()> {
        let key = (
            scope.school_site_id,
            scope.academic_year.clone(),
            scope.academic_term,
        );
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for ScopeLocks {
    fn default() -> Self {
        Self::new()
    }
}
