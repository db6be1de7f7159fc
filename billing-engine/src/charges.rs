use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{AdditionalCharge, ChargeCategory, StudentBilling};
use crate::store::LedgerStore;

/// Charge input as submitted by a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCharge {
    pub category: ChargeCategory,
    pub particulars: String,
    pub amount: Decimal,
    /// Defaults to now when absent
    pub charged_date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Appends charges and payments to a single ledger and keeps its derived
/// totals and status consistent. Every mutation goes through the ledger's
/// shared recompute path and lands as one atomic store write.
pub struct ChargeLedgerService {
    store: Arc<dyn LedgerStore>,
}

impl ChargeLedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Append a charge to an unlocked ledger
    pub async fn add_charge(
        &self,
        ledger_id: Uuid,
        charge: NewCharge,
        actor: Uuid,
    ) -> BillingResult<StudentBilling> {
        if charge.amount <= Decimal::ZERO {
            return Err(BillingError::invalid_charge(format!(
                "charge amount must be positive, got {}",
                charge.amount
            )));
        }
        if charge.particulars.trim().is_empty() {
            return Err(BillingError::invalid_charge("particulars must not be empty"));
        }

        let updated = self
            .store
            .mutate(
                ledger_id,
                Box::new(move |ledger| {
                    if ledger.is_locked {
                        return Err(BillingError::Locked {
                            ledger_id: ledger.id,
                        });
                    }
                    let entry = AdditionalCharge {
                        category: charge.category,
                        particulars: charge.particulars.clone(),
                        amount: charge.amount,
                        charged_date: charge.charged_date.unwrap_or_else(Utc::now),
                        added_by: actor,
                        reference: charge.reference.clone(),
                        notes: charge.notes.clone(),
                    };
                    let details = format!(
                        "Charge added: {:?} / {} / {} {}",
                        entry.category, entry.particulars, ledger.currency, entry.amount
                    );
                    ledger.additional_charges.push(entry);
                    ledger.recompute();
                    ledger.audit("charge_added", details, actor);
                    Ok(())
                }),
            )
            .await?;

        info!(
            ledger_id = %updated.id,
            total_billed = %updated.total_billed,
            status = ?updated.status,
            "charge added"
        );
        Ok(updated)
    }

    /// Apply a payment reported by the payments collaborator.
    ///
    /// Same recompute path as charges, with `total_paid` incremented and the
    /// payment linked; payments land even on locked ledgers since locking
    /// only closes the ledger to new charges.
    pub async fn apply_payment(
        &self,
        ledger_id: Uuid,
        payment_id: Uuid,
        amount: Decimal,
        actor: Uuid,
    ) -> BillingResult<StudentBilling> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::invalid_charge(format!(
                "payment amount must be positive, got {amount}"
            )));
        }

        let updated = self
            .store
            .mutate(
                ledger_id,
                Box::new(move |ledger| {
                    ledger.total_paid += amount;
                    if !ledger.linked_payments.contains(&payment_id) {
                        ledger.linked_payments.push(payment_id);
                    }
                    ledger.recompute();
                    ledger.audit(
                        "payment_applied",
                        format!(
                            "Payment {} applied: {} {}",
                            payment_id, ledger.currency, amount
                        ),
                        actor,
                    );
                    Ok(())
                }),
            )
            .await?;

        info!(
            ledger_id = %updated.id,
            total_paid = %updated.total_paid,
            status = ?updated.status,
            "payment applied"
        );
        Ok(updated)
    }

    /// Close the ledger to further charges
    pub async fn lock(&self, ledger_id: Uuid, actor: Uuid) -> BillingResult<StudentBilling> {
        self.store
            .mutate(
                ledger_id,
                Box::new(move |ledger| {
                    ledger.is_locked = true;
                    ledger.audit("locked", "Ledger closed to new charges", actor);
                    Ok(())
                }),
            )
            .await
    }

    /// Reopen the ledger for charges
    pub async fn unlock(&self, ledger_id: Uuid, actor: Uuid) -> BillingResult<StudentBilling> {
        self.store
            .mutate(
                ledger_id,
                Box::new(move |ledger| {
                    ledger.is_locked = false;
                    ledger.audit("unlocked", "Ledger reopened for charges", actor);
                    Ok(())
                }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    async fn seeded_service() -> (ChargeLedgerService, Uuid, Uuid) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let ledger = StudentBilling::generate(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "2024/2025".to_string(),
            1,
            Decimal::ZERO,
            dec!(500),
            "GHS".to_string(),
            None,
            Uuid::new_v4(),
        );
        let id = ledger.id;
        store.create_if_absent(ledger).await.unwrap();
        (
            ChargeLedgerService::new(store),
            id,
            Uuid::new_v4(),
        )
    }

    fn charge(amount: Decimal) -> NewCharge {
        NewCharge {
            category: ChargeCategory::Examination,
            particulars: "End of term examination".to_string(),
            amount,
            charged_date: None,
            reference: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn charge_recomputes_totals_and_audits() {
        let (service, id, actor) = seeded_service().await;
        let updated = service.add_charge(id, charge(dec!(50)), actor).await.unwrap();
        assert_eq!(updated.added_charges_total, dec!(50));
        assert_eq!(updated.total_billed, dec!(550));
        assert_eq!(updated.current_balance, dec!(550));
        // One "generated" entry plus one "charge_added"
        assert_eq!(updated.audit_trail.len(), 2);
        assert_eq!(updated.audit_trail[1].action, "charge_added");
        assert_eq!(updated.audit_trail[1].performed_by, actor);
    }

    #[tokio::test]
    async fn invalid_charges_are_rejected() {
        let (service, id, actor) = seeded_service().await;
        assert!(matches!(
            service.add_charge(id, charge(Decimal::ZERO), actor).await,
            Err(BillingError::InvalidCharge { .. })
        ));
        assert!(matches!(
            service.add_charge(id, charge(dec!(-5)), actor).await,
            Err(BillingError::InvalidCharge { .. })
        ));
        let mut blank = charge(dec!(10));
        blank.particulars = "   ".to_string();
        assert!(matches!(
            service.add_charge(id, blank, actor).await,
            Err(BillingError::InvalidCharge { .. })
        ));
    }

    #[tokio::test]
    async fn locked_ledger_rejects_charges_but_takes_payments() {
        let (service, id, actor) = seeded_service().await;
        service.lock(id, actor).await.unwrap();
        assert!(matches!(
            service.add_charge(id, charge(dec!(10)), actor).await,
            Err(BillingError::Locked { .. })
        ));
        let updated = service
            .apply_payment(id, Uuid::new_v4(), dec!(500), actor)
            .await
            .unwrap();
        assert_eq!(updated.status, crate::models::BillingStatus::Clear);

        service.unlock(id, actor).await.unwrap();
        assert!(service.add_charge(id, charge(dec!(10)), actor).await.is_ok());
    }

    #[tokio::test]
    async fn payment_walkthrough_reaches_overpaid() {
        let (service, id, actor) = seeded_service().await;
        service.add_charge(id, charge(dec!(50)), actor).await.unwrap();

        let paid = service
            .apply_payment(id, Uuid::new_v4(), dec!(550), actor)
            .await
            .unwrap();
        assert_eq!(paid.current_balance, Decimal::ZERO);
        assert_eq!(paid.status, crate::models::BillingStatus::Clear);

        let overpaid = service
            .apply_payment(id, Uuid::new_v4(), dec!(20), actor)
            .await
            .unwrap();
        assert_eq!(overpaid.current_balance, dec!(-20));
        assert_eq!(overpaid.status, crate::models::BillingStatus::Overpaid);
        assert_eq!(overpaid.linked_payments.len(), 2);
    }

    #[tokio::test]
    async fn unknown_ledger_is_not_found() {
        let (service, _, actor) = seeded_service().await;
        assert!(matches!(
            service.add_charge(Uuid::new_v4(), charge(dec!(10)), actor).await,
            Err(BillingError::NotFound { .. })
        ));
    }
}
