#![allow(dead_code)]

use billing_engine::{
    BillingScope, BulkDeletionService, BulkGenerationService, ChargeLedgerService,
    CoverageVerificationService, BillingReportingService, FeeSchedule, FeeScheduleProvider,
    InMemoryFeeSchedule, InMemoryLedgerStore, InMemoryPayments, InMemoryRoster, LedgerStore,
    PaymentRecord, PaymentsDirectory, RosterProvider, ScopeLocks, StudentRecord,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

pub const YEAR: &str = "2024/2025";
pub const TERM: u8 = 1;

pub struct TestEnv {
    pub store: Arc<InMemoryLedgerStore>,
    pub roster: Arc<InMemoryRoster>,
    pub fees: Arc<InMemoryFeeSchedule>,
    pub payments: Arc<InMemoryPayments>,
    pub generation: BulkGenerationService,
    pub verification: CoverageVerificationService,
    pub charges: ChargeLedgerService,
    pub deletion: BulkDeletionService,
    pub reporting: BillingReportingService,
    pub site: Uuid,
    pub actor: Uuid,
}

impl TestEnv {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let roster = Arc::new(InMemoryRoster::new());
        let fees = Arc::new(InMemoryFeeSchedule::new());
        let payments = Arc::new(InMemoryPayments::new());
        let locks = Arc::new(ScopeLocks::new());

        let store_dyn: Arc<dyn LedgerStore> = store.clone();
        let roster_dyn: Arc<dyn RosterProvider> = roster.clone();
        let fees_dyn: Arc<dyn FeeScheduleProvider> = fees.clone();
        let payments_dyn: Arc<dyn PaymentsDirectory> = payments.clone();

        let site = Uuid::new_v4();
        roster.add_site(site).await;

        Self {
            generation: BulkGenerationService::new(
                store_dyn.clone(),
                roster_dyn.clone(),
                fees_dyn.clone(),
                locks.clone(),
            ),
            verification: CoverageVerificationService::new(store_dyn.clone(), roster_dyn.clone()),
            charges: ChargeLedgerService::new(store_dyn.clone()),
            deletion: BulkDeletionService::new(store_dyn.clone(), payments_dyn.clone(), locks),
            reporting: BillingReportingService::new(store_dyn),
            store,
            roster,
            fees,
            payments,
            site,
            actor: Uuid::new_v4(),
        }
    }

    pub fn scope(&self) -> BillingScope {
        BillingScope::new(self.site, YEAR, TERM)
    }

    /// Add a class with a configured fee and `n` enrolled students
    pub async fn seed_class(&self, name: &str, fee: Decimal, n: usize) -> (Uuid, Vec<Uuid>) {
        let class_id = Uuid::new_v4();
        self.roster.add_class(self.site, class_id, name).await;
        self.fees
            .set_fee(
                class_id,
                YEAR,
                TERM,
                FeeSchedule {
                    amount: fee,
                    currency: "GHS".to_string(),
                    payment_due_date: None,
                },
            )
            .await;
        let mut student_ids = Vec::with_capacity(n);
        for i in 0..n {
            let student_id = Uuid::new_v4();
            self.roster
                .enroll(
                    class_id,
                    StudentRecord {
                        student_id,
                        full_name: format!("Student {i} of {name}"),
                        identifier: format!("{name}-{i:03}"),
                        carried_balance: dec!(0),
                    },
                )
                .await;
            student_ids.push(student_id);
        }
        (class_id, student_ids)
    }

    /// Simulate the payments collaborator: capture a payment record and call
    /// back into the charge ledger service.
    pub async fn pay(&self, ledger_id: Uuid, amount: Decimal) -> Uuid {
        let payment_id = Uuid::new_v4();
        self.payments
            .record_payment(
                self.site,
                PaymentRecord {
                    payment_id,
                    ledger_id,
                    amount,
                },
            )
            .await;
        self.charges
            .apply_payment(ledger_id, payment_id, amount, self.actor)
            .await
            .unwrap();
        payment_id
    }
}
