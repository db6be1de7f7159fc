use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{BillingScope, LedgerKey, StudentBilling};

/// Outcome of an idempotent create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A ledger already exists for the uniqueness key; nothing was written
    AlreadyExists,
}

/// Mutation applied atomically to one ledger under the store's write lock
pub type LedgerMutation = Box<dyn FnOnce(&mut StudentBilling) -> BillingResult<()> + Send>;

/// Storage seam for billing ledgers.
///
/// The store owns the uniqueness invariant: at most one ledger per
/// `(student, academic_year, academic_term, school_site)`. Deployments
/// implement this over their database; the in-memory backend below serves
/// tests and local runs.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert the ledger unless one already exists for its uniqueness key.
    /// Never resets an existing ledger.
    async fn create_if_absent(&self, ledger: StudentBilling) -> BillingResult<CreateOutcome>;

    /// Fetch a ledger by id
    async fn get(&self, id: Uuid) -> BillingResult<Option<StudentBilling>>;

    /// Fetch a ledger by its uniqueness key
    async fn find_by_key(&self, key: &LedgerKey) -> BillingResult<Option<StudentBilling>>;

    /// Whether a ledger exists for the key
    async fn exists_for(&self, key: &LedgerKey) -> BillingResult<bool>;

    /// All ledgers inside a scope
    async fn list_scope(&self, scope: &BillingScope) -> BillingResult<Vec<StudentBilling>>;

    /// Atomic read-modify-write on one ledger. Serializes concurrent charge
    /// and payment writers; no intermediate state is persisted.
    async fn mutate(&self, id: Uuid, f: LedgerMutation) -> BillingResult<StudentBilling>;

    /// Hard-delete a ledger. Returns false when it did not exist.
    async fn delete(&self, id: Uuid) -> BillingResult<bool>;
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, StudentBilling>,
    by_key: HashMap<LedgerKey, Uuid>,
}

/// In-memory ledger store for development/testing
pub struct InMemoryLedgerStore {
    // Single lock over both maps so the uniqueness index can never drift
    // from the ledger table.
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Number of stored ledgers (for testing)
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clear all ledgers (for testing)
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.by_id.clear();
        inner.by_key.clear();
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_if_absent(&self, ledger: StudentBilling) -> BillingResult<CreateOutcome> {
        let mut inner = self.inner.write().await;
        let key = ledger.key();
        if inner.by_key.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        inner.by_key.insert(key, ledger.id);
        inner.by_id.insert(ledger.id, ledger);
        Ok(CreateOutcome::Created)
    }

    async fn get(&self, id: Uuid) -> BillingResult<Option<StudentBilling>> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &LedgerKey) -> BillingResult<Option<StudentBilling>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_key
            .get(key)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn exists_for(&self, key: &LedgerKey) -> BillingResult<bool> {
        Ok(self.inner.read().await.by_key.contains_key(key))
    }

    async fn list_scope(&self, scope: &BillingScope) -> BillingResult<Vec<StudentBilling>> {
        let inner = self.inner.read().await;
        let mut ledgers: Vec<StudentBilling> = inner
            .by_id
            .values()
            .filter(|l| scope.matches(l))
            .cloned()
            .collect();
        ledgers.sort_by_key(|l| l.student_id);
        Ok(ledgers)
    }

    async fn mutate(&self, id: Uuid, f: LedgerMutation) -> BillingResult<StudentBilling> {
        let mut inner = self.inner.write().await;
        let ledger = inner
            .by_id
            .get_mut(&id)
            .ok_or(BillingError::NotFound { ledger_id: id })?;
        f(ledger)?;
        Ok(ledger.clone())
    }

    async fn delete(&self, id: Uuid) -> BillingResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.by_id.remove(&id) {
            Some(ledger) => {
                inner.by_key.remove(&ledger.key());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
