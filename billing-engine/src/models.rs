use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};

/// Billing status derived from billed vs. paid amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    /// No bill established yet. Generation always sets a bill, so the
    /// engine never produces this; it exists for wire compatibility.
    Pending,
    Owing,
    Clear,
    Overpaid,
}

impl BillingStatus {
    /// Derive status from the billed and paid totals.
    ///
    /// Single source of truth for status: every mutation path (generation,
    /// charge, payment) goes through this rather than re-deriving locally.
    pub fn for_amounts(total_billed: Decimal, total_paid: Decimal) -> Self {
        let balance = total_billed - total_paid;
        if balance > Decimal::ZERO {
            BillingStatus::Owing
        } else if balance < Decimal::ZERO {
            BillingStatus::Overpaid
        } else {
            BillingStatus::Clear
        }
    }
}

/// Category of an additional charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeCategory {
    Textbooks,
    Uniform,
    Transport,
    Feeding,
    Examination,
    Excursion,
    Other,
}

/// Charge appended to a ledger after generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCharge {
    pub category: ChargeCategory,
    pub particulars: String,
    pub amount: Decimal,
    pub charged_date: DateTime<Utc>,
    pub added_by: Uuid,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Audit trail entry; every mutating operation appends exactly one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,
    pub details: String,
    pub performed_by: Uuid,
    pub performed_at: DateTime<Utc>,
}

/// One student's billing ledger for an academic year/term at a school site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentBilling {
    pub id: Uuid,
    pub student_id: Uuid,
    /// Informational: a student may move classes after generation
    pub class_id: Uuid,
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,

    /// Debt carried from prior periods; immutable after generation
    pub balance_brought_forward: Decimal,
    /// Term/semester bill from fee configuration at generation time
    pub term_bill: Decimal,
    /// Sum of `additional_charges[].amount`
    pub added_charges_total: Decimal,
    /// Always `balance_brought_forward + term_bill + added_charges_total`
    pub total_billed: Decimal,
    /// Sum of linked payments' amounts
    pub total_paid: Decimal,
    /// Always `total_billed - total_paid`
    pub current_balance: Decimal,
    pub status: BillingStatus,

    pub additional_charges: Vec<AdditionalCharge>,
    /// References into the external payments collaborator
    pub linked_payments: Vec<Uuid>,
    pub audit_trail: Vec<AuditEntry>,

    /// Closed ledgers reject further charges
    pub is_locked: bool,
    pub currency: String,
    pub bill_generated_date: DateTime<Utc>,
    pub payment_due_date: Option<DateTime<Utc>>,
}

impl StudentBilling {
    /// Create a freshly generated ledger with derived totals established.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        student_id: Uuid,
        class_id: Uuid,
        school_site_id: Uuid,
        academic_year: String,
        academic_term: u8,
        balance_brought_forward: Decimal,
        term_bill: Decimal,
        currency: String,
        payment_due_date: Option<DateTime<Utc>>,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        let mut ledger = Self {
            id: Uuid::new_v4(),
            student_id,
            class_id,
            school_site_id,
            academic_year,
            academic_term,
            balance_brought_forward,
            term_bill,
            added_charges_total: Decimal::ZERO,
            total_billed: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            status: BillingStatus::Pending,
            additional_charges: Vec::new(),
            linked_payments: Vec::new(),
            audit_trail: Vec::new(),
            is_locked: false,
            currency,
            bill_generated_date: now,
            payment_due_date,
        };
        ledger.recompute();
        ledger.audit(
            "generated",
            format!(
                "Bill generated for term {} {}: {} {}",
                ledger.academic_term, ledger.academic_year, ledger.currency, ledger.total_billed
            ),
            created_by,
        );
        ledger
    }

    /// Recompute every derived field from its inputs.
    ///
    /// `total_billed`, `current_balance` and `status` are never written
    /// independently of this path.
    pub fn recompute(&mut self) {
        self.added_charges_total = self
            .additional_charges
            .iter()
            .map(|c| c.amount)
            .sum::<Decimal>();
        self.total_billed = self.balance_brought_forward + self.term_bill + self.added_charges_total;
        self.current_balance = self.total_billed - self.total_paid;
        self.status = BillingStatus::for_amounts(self.total_billed, self.total_paid);
    }

    /// Append an audit trail entry
    pub fn audit(&mut self, action: impl Into<String>, details: impl Into<String>, actor: Uuid) {
        self.audit_trail.push(AuditEntry {
            action: action.into(),
            details: details.into(),
            performed_by: actor,
            performed_at: Utc::now(),
        });
    }

    /// Uniqueness key for this ledger
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            student_id: self.student_id,
            academic_year: self.academic_year.clone(),
            academic_term: self.academic_term,
            school_site_id: self.school_site_id,
        }
    }
}

/// Uniqueness tuple: at most one ledger exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub student_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub school_site_id: Uuid,
}

/// Target of a batch operation: site, year, term and optionally a class subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingScope {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub class_ids: Option<Vec<Uuid>>,
}

impl BillingScope {
    pub fn new(school_site_id: Uuid, academic_year: impl Into<String>, academic_term: u8) -> Self {
        Self {
            school_site_id,
            academic_year: academic_year.into(),
            academic_term,
            class_ids: None,
        }
    }

    pub fn with_classes(mut self, class_ids: Vec<Uuid>) -> Self {
        self.class_ids = Some(class_ids);
        self
    }

    /// Validate the year/term shape before any write.
    ///
    /// Academic years are "YYYY/YYYY" with consecutive years; terms run 1-3.
    pub fn validate(&self) -> BillingResult<()> {
        if !(1..=3).contains(&self.academic_term) {
            return Err(BillingError::invalid_scope(format!(
                "academic term must be 1-3, got {}",
                self.academic_term
            )));
        }
        let parts: Vec<&str> = self.academic_year.split('/').collect();
        let valid = match parts.as_slice() {
            [first, second] => match (first.parse::<u32>(), second.parse::<u32>()) {
                (Ok(a), Ok(b)) => first.len() == 4 && second.len() == 4 && b == a + 1,
                _ => false,
            },
            _ => false,
        };
        if !valid {
            return Err(BillingError::invalid_scope(format!(
                "academic year must look like \"2024/2025\", got \"{}\"",
                self.academic_year
            )));
        }
        Ok(())
    }

    /// Whether a ledger falls inside this scope
    pub fn matches(&self, ledger: &StudentBilling) -> bool {
        if ledger.school_site_id != self.school_site_id
            || ledger.academic_year != self.academic_year
            || ledger.academic_term != self.academic_term
        {
            return false;
        }
        match &self.class_ids {
            Some(ids) => ids.contains(&ledger.class_id),
            None => true,
        }
    }
}
