use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BillingResult;
use crate::locks::ScopeLocks;
use crate::models::BillingScope;
use crate::providers::PaymentsDirectory;
use crate::store::LedgerStore;

/// A ledger retained because payments are linked to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionWarning {
    pub ledger_id: Uuid,
    pub student_id: Uuid,
    pub linked_payments: usize,
    pub message: String,
}

/// Outcome of the post-deletion consistency repair pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairReport {
    /// Payments referencing ledgers that no longer exist
    pub orphaned_payments_found: usize,
    /// Dangling payment references removed from surviving ledgers
    pub broken_links_fixed: usize,
}

/// Aggregate outcome of one deletion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionResult {
    pub deleted: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<DeletionWarning>,
    pub optimization: RepairReport,
}

/// Removes a scope's ledgers with payment protection, then repairs
/// referential damage between the ledger store and the payments
/// collaborator.
///
/// Ledger deletion and payment linking are not transactional across the two
/// stores; the repair pass is the compensating mechanism and runs after
/// every deletion loop, forced or not.
pub struct BulkDeletionService {
    store: Arc<dyn LedgerStore>,
    payments: Arc<dyn PaymentsDirectory>,
    locks: Arc<ScopeLocks>,
}

impl BulkDeletionService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        payments: Arc<dyn PaymentsDirectory>,
        locks: Arc<ScopeLocks>,
    ) -> Self {
        Self {
            store,
            payments,
            locks,
        }
    }

    pub async fn delete(
        &self,
        scope: &BillingScope,
        deleted_by: Uuid,
        force: bool,
    ) -> BillingResult<DeletionResult> {
        scope.validate()?;

        // Mutually exclusive with generation over the same scope.
        let _guard = self.locks.acquire(scope).await;

        let ledgers = self.store.list_scope(scope).await?;
        info!(
            school_site_id = %scope.school_site_id,
            academic_year = %scope.academic_year,
            academic_term = scope.academic_term,
            candidates = ledgers.len(),
            force,
            deleted_by = %deleted_by,
            "bulk deletion started"
        );

        let mut result = DeletionResult {
            deleted: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            optimization: RepairReport::default(),
        };

        for ledger in ledgers {
            if !ledger.linked_payments.is_empty() && !force {
                warn!(
                    ledger_id = %ledger.id,
                    linked_payments = ledger.linked_payments.len(),
                    "ledger retained: payments linked"
                );
                result.warnings.push(DeletionWarning {
                    ledger_id: ledger.id,
                    student_id: ledger.student_id,
                    linked_payments: ledger.linked_payments.len(),
                    message: format!(
                        "ledger has {} linked payment(s); retained (use force to override)",
                        ledger.linked_payments.len()
                    ),
                });
                continue;
            }
            match self.store.delete(ledger.id).await {
                Ok(true) => result.deleted += 1,
                Ok(false) => {}
                Err(e) => result
                    .errors
                    .push(format!("failed to delete ledger {}: {e}", ledger.id)),
            }
        }

        result.optimization = self.repair(scope, deleted_by).await?;

        info!(
            deleted = result.deleted,
            warnings = result.warnings.len(),
            orphaned_payments = result.optimization.orphaned_payments_found,
            broken_links_fixed = result.optimization.broken_links_fixed,
            "bulk deletion finished"
        );
        Ok(result)
    }

    /// Count payments pointing at nonexistent ledgers and strip dangling
    /// payment references from surviving ledgers. Repairs remove references
    /// only; nothing is invented.
    async fn repair(&self, scope: &BillingScope, actor: Uuid) -> BillingResult<RepairReport> {
        let mut report = RepairReport::default();

        let payments = self.payments.payments_for_site(scope.school_site_id).await?;
        for payment in &payments {
            if self.store.get(payment.ledger_id).await?.is_none() {
                report.orphaned_payments_found += 1;
            }
        }

        for ledger in self.store.list_scope(scope).await? {
            let mut dangling = Vec::new();
            for payment_id in &ledger.linked_payments {
                if !self.payments.payment_exists(*payment_id).await? {
                    dangling.push(*payment_id);
                }
            }
            if dangling.is_empty() {
                continue;
            }
            let removed = dangling.len();
            self.store
                .mutate(
                    ledger.id,
                    Box::new(move |l| {
                        l.linked_payments.retain(|id| !dangling.contains(id));
                        l.audit(
                            "payment_link_removed",
                            format!("Removed {removed} dangling payment reference(s)"),
                            actor,
                        );
                        Ok(())
                    }),
                )
                .await?;
            report.broken_links_fixed += removed;
        }

        Ok(report)
    }
}
