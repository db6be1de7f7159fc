use billing_engine::{
    BillingReportingService, BulkDeletionService, BulkGenerationService, ChargeLedgerService,
    CoverageVerificationService, FeeScheduleProvider, InMemoryFeeSchedule, InMemoryLedgerStore,
    InMemoryPayments, InMemoryRoster, LedgerStore, PaymentsDirectory, RosterProvider, ScopeLocks,
};
use std::sync::Arc;

/// Shared application state: one instance of each billing service over a
/// common ledger store and collaborator set.
#[derive(Clone)]
pub struct EduLedgerServer {
    pub generation: Arc<BulkGenerationService>,
    pub verification: Arc<CoverageVerificationService>,
    pub charges: Arc<ChargeLedgerService>,
    pub deletion: Arc<BulkDeletionService>,
    pub reporting: Arc<BillingReportingService>,
}

impl EduLedgerServer {
    /// Wire the services over caller-supplied backends. Deployments
    /// implement the storage and collaborator traits against their own
    /// systems and hand them in here.
    pub fn with_backends(
        store: Arc<dyn LedgerStore>,
        roster: Arc<dyn RosterProvider>,
        fees: Arc<dyn FeeScheduleProvider>,
        payments: Arc<dyn PaymentsDirectory>,
    ) -> Self {
        let locks = Arc::new(ScopeLocks::new());
        Self {
            generation: Arc::new(BulkGenerationService::new(
                store.clone(),
                roster.clone(),
                fees.clone(),
                locks.clone(),
            )),
            verification: Arc::new(CoverageVerificationService::new(
                store.clone(),
                roster.clone(),
            )),
            charges: Arc::new(ChargeLedgerService::new(store.clone())),
            deletion: Arc::new(BulkDeletionService::new(store.clone(), payments, locks)),
            reporting: Arc::new(BillingReportingService::new(store)),
        }
    }

    /// In-memory backends for local runs and tests
    pub fn in_memory() -> Self {
        Self::with_backends(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryRoster::new()),
            Arc::new(InMemoryFeeSchedule::new()),
            Arc::new(InMemoryPayments::new()),
        )
    }
}
