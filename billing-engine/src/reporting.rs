use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::BillingResult;
use crate::models::{BillingScope, BillingStatus, StudentBilling};
use crate::store::LedgerStore;

/// Aggregate totals across a scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub owing_count: usize,
    pub clear_count: usize,
    pub overpaid_count: usize,
    pub ledger_count: usize,
}

/// Optional filters for ledger listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub status: Option<BillingStatus>,
    pub class_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
}

/// 1-based pagination
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    const MAX_PAGE_SIZE: usize = 200;

    fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }
}

/// One page of ledgers, ordered by student id for stable paging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPage {
    pub items: Vec<StudentBilling>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Read-only aggregate and listing queries over a scope's ledgers
pub struct BillingReportingService {
    store: Arc<dyn LedgerStore>,
}

impl BillingReportingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, scope: &BillingScope) -> BillingResult<BillingSummary> {
        scope.validate()?;
        let ledgers = self.store.list_scope(scope).await?;
        let mut summary = BillingSummary {
            total_billed: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_outstanding: Decimal::ZERO,
            owing_count: 0,
            clear_count: 0,
            overpaid_count: 0,
            ledger_count: ledgers.len(),
        };
        for ledger in &ledgers {
            summary.total_billed += ledger.total_billed;
            summary.total_paid += ledger.total_paid;
            summary.total_outstanding += ledger.current_balance;
            match ledger.status {
                BillingStatus::Owing => summary.owing_count += 1,
                BillingStatus::Clear => summary.clear_count += 1,
                BillingStatus::Overpaid => summary.overpaid_count += 1,
                BillingStatus::Pending => {}
            }
        }
        Ok(summary)
    }

    pub async fn list(
        &self,
        scope: &BillingScope,
        filter: &LedgerFilter,
        pagination: Pagination,
    ) -> BillingResult<LedgerPage> {
        scope.validate()?;
        let pagination = pagination.clamped();

        // list_scope returns student-id order already
        let matching: Vec<StudentBilling> = self
            .store
            .list_scope(scope)
            .await?
            .into_iter()
            .filter(|l| filter.status.map_or(true, |s| l.status == s))
            .filter(|l| filter.class_id.map_or(true, |c| l.class_id == c))
            .filter(|l| filter.student_id.map_or(true, |s| l.student_id == s))
            .collect();

        let total_count = matching.len();
        // Saturate so an out-of-range page yields an empty page, not a panic
        let offset = pagination
            .page
            .saturating_sub(1)
            .saturating_mul(pagination.page_size);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(pagination.page_size)
            .collect();

        Ok(LedgerPage {
            items,
            total_count,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }
}
