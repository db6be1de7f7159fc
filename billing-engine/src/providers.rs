use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::BillingResult;

/// Enrolled student as reported by the roster collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: Uuid,
    pub full_name: String,
    /// Human-facing student identifier (admission number)
    pub identifier: String,
    /// Debt carried over from prior periods; zero when none
    pub carried_balance: Decimal,
}

/// Class as reported by the roster collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class_id: Uuid,
    pub name: String,
}

/// Applicable bill from the fee-configuration collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub amount: Decimal,
    /// ISO currency code, fixed on the ledger at generation
    pub currency: String,
    pub payment_due_date: Option<DateTime<Utc>>,
}

/// Payment as reported by the payments collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub ledger_id: Uuid,
    pub amount: Decimal,
}

/// Roster collaborator: sites, classes and enrolled students
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn site_exists(&self, school_site_id: Uuid) -> BillingResult<bool>;
    async fn classes_for_site(&self, school_site_id: Uuid) -> BillingResult<Vec<ClassRecord>>;
    async fn class_roster(&self, class_id: Uuid) -> BillingResult<Vec<StudentRecord>>;
}

/// Fee-configuration collaborator
#[async_trait]
pub trait FeeScheduleProvider: Send + Sync {
    /// The applicable bill for a class/year/term, or None when not configured
    async fn fee_for(
        &self,
        class_id: Uuid,
        academic_year: &str,
        academic_term: u8,
    ) -> BillingResult<Option<FeeSchedule>>;
}

/// Payments collaborator, read side. Used by the deletion repair pass to
/// detect orphaned payments and broken links.
#[async_trait]
pub trait PaymentsDirectory: Send + Sync {
    async fn payments_for_site(&self, school_site_id: Uuid) -> BillingResult<Vec<PaymentRecord>>;
    async fn payment_exists(&self, payment_id: Uuid) -> BillingResult<bool>;
}

// ---------------------------------------------------------------------------
// In-memory collaborators for development/testing
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RosterInner {
    sites: HashMap<Uuid, Vec<Uuid>>,
    classes: HashMap<Uuid, ClassRecord>,
    rosters: HashMap<Uuid, Vec<StudentRecord>>,
}

/// In-memory roster provider seeded through builder-style helpers
pub struct InMemoryRoster {
    inner: Arc<RwLock<RosterInner>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RosterInner::default())),
        }
    }

    pub async fn add_site(&self, school_site_id: Uuid) {
        self.inner
            .write()
            .await
            .sites
            .entry(school_site_id)
            .or_default();
    }

    pub async fn add_class(&self, school_site_id: Uuid, class_id: Uuid, name: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner
            .sites
            .entry(school_site_id)
            .or_default()
            .push(class_id);
        inner.classes.insert(
            class_id,
            ClassRecord {
                class_id,
                name: name.into(),
            },
        );
        inner.rosters.entry(class_id).or_default();
    }

    pub async fn enroll(&self, class_id: Uuid, student: StudentRecord) {
        self.inner
            .write()
            .await
            .rosters
            .entry(class_id)
            .or_default()
            .push(student);
    }
}

impl Default for InMemoryRoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RosterProvider for InMemoryRoster {
    async fn site_exists(&self, school_site_id: Uuid) -> BillingResult<bool> {
        Ok(self.inner.read().await.sites.contains_key(&school_site_id))
    }

    async fn classes_for_site(&self, school_site_id: Uuid) -> BillingResult<Vec<ClassRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sites
            .get(&school_site_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.classes.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn class_roster(&self, class_id: Uuid) -> BillingResult<Vec<StudentRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .rosters
            .get(&class_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory fee configuration keyed by `(class, year, term)`
pub struct InMemoryFeeSchedule {
    fees: Arc<RwLock<HashMap<(Uuid, String, u8), FeeSchedule>>>,
}

impl InMemoryFeeSchedule {
    pub fn new() -> Self {
        Self {
            fees: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_fee(
        &self,
        class_id: Uuid,
        academic_year: impl Into<String>,
        academic_term: u8,
        fee: FeeSchedule,
    ) {
        self.fees
            .write()
            .await
            .insert((class_id, academic_year.into(), academic_term), fee);
    }
}

impl Default for InMemoryFeeSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeeScheduleProvider for InMemoryFeeSchedule {
    async fn fee_for(
        &self,
        class_id: Uuid,
        academic_year: &str,
        academic_term: u8,
    ) -> BillingResult<Option<FeeSchedule>> {
        Ok(self
            .fees
            .read()
            .await
            .get(&(class_id, academic_year.to_string(), academic_term))
            .cloned())
    }
}

#[derive(Default)]
struct PaymentsInner {
    by_id: HashMap<Uuid, PaymentRecord>,
    by_site: HashMap<Uuid, Vec<Uuid>>,
}

/// In-memory payments directory
pub struct InMemoryPayments {
    inner: Arc<RwLock<PaymentsInner>>,
}

impl InMemoryPayments {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(PaymentsInner::default())),
        }
    }

    pub async fn record_payment(&self, school_site_id: Uuid, payment: PaymentRecord) {
        let mut inner = self.inner.write().await;
        inner
            .by_site
            .entry(school_site_id)
            .or_default()
            .push(payment.payment_id);
        inner.by_id.insert(payment.payment_id, payment);
    }

    /// Drop a payment record (for exercising broken-link repair)
    pub async fn remove_payment(&self, payment_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.by_id.remove(&payment_id);
        for ids in inner.by_site.values_mut() {
            ids.retain(|id| *id != payment_id);
        }
    }
}

impl Default for InMemoryPayments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentsDirectory for InMemoryPayments {
    async fn payments_for_site(&self, school_site_id: Uuid) -> BillingResult<Vec<PaymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_site
            .get(&school_site_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_id.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn payment_exists(&self, payment_id: Uuid) -> BillingResult<bool> {
        Ok(self.inner.read().await.by_id.contains_key(&payment_id))
    }
}
