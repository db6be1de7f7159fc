use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::locks::ScopeLocks;
use crate::models::{BillingScope, BillingStatus, StudentBilling};
use crate::providers::{ClassRecord, FeeScheduleProvider, RosterProvider};
use crate::store::{CreateOutcome, LedgerStore};

/// Created-ledger summaries included in the result, capped for reporting
pub const GENERATION_SAMPLE_LIMIT: usize = 10;

/// How a class fared during a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassOutcome {
    Processed,
    Skipped,
}

/// A per-student failure; never aborts the class or the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentGenerationError {
    pub student_name: String,
    pub class_id: Uuid,
    pub error: String,
}

/// Per-class generation breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGenerationReport {
    pub class_id: Uuid,
    pub class_name: String,
    pub status: ClassOutcome,
    pub students_found: usize,
    pub bills_generated: usize,
    pub bills_skipped: usize,
    pub errors: Vec<StudentGenerationError>,
    /// Present when the class was skipped wholesale
    pub reason: Option<String>,
}

/// Short form of a freshly created ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub ledger_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub class_id: Uuid,
    pub total_billed: Decimal,
    pub status: BillingStatus,
}

/// Aggregate outcome of one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub generated: usize,
    pub skipped: usize,
    pub errors: Vec<StudentGenerationError>,
    pub classes_processed: Vec<ClassGenerationReport>,
    pub sample: Vec<LedgerSummary>,
}

/// Creates missing ledgers for a scope's roster.
///
/// Fully idempotent: an existing ledger for the uniqueness tuple is skipped,
/// never reset, so re-running after fixing a fee-configuration gap only
/// fills the holes. Classes are processed independently; one class's failure
/// cannot abort the others.
pub struct BulkGenerationService {
    store: Arc<dyn LedgerStore>,
    roster: Arc<dyn RosterProvider>,
    fees: Arc<dyn FeeScheduleProvider>,
    locks: Arc<ScopeLocks>,
}

impl BulkGenerationService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        roster: Arc<dyn RosterProvider>,
        fees: Arc<dyn FeeScheduleProvider>,
        locks: Arc<ScopeLocks>,
    ) -> Self {
        Self {
            store,
            roster,
            fees,
            locks,
        }
    }

    pub async fn generate(
        &self,
        scope: &BillingScope,
        created_by: Uuid,
    ) -> BillingResult<GenerationResult> {
        scope.validate()?;
        if !self.roster.site_exists(scope.school_site_id).await? {
            return Err(BillingError::invalid_scope(format!(
                "unknown school site {}",
                scope.school_site_id
            )));
        }

        // Generation and deletion over the same scope must not interleave.
        let _guard = self.locks.acquire(scope).await;

        let (classes, unknown) = self.resolve_classes(scope).await?;
        info!(
            school_site_id = %scope.school_site_id,
            academic_year = %scope.academic_year,
            academic_term = scope.academic_term,
            classes = classes.len(),
            "bill generation started"
        );

        let mut result = GenerationResult {
            generated: 0,
            skipped: 0,
            errors: Vec::new(),
            classes_processed: Vec::new(),
            sample: Vec::new(),
        };

        for class_id in unknown {
            warn!(class_id = %class_id, "requested class not found under site");
            result.classes_processed.push(ClassGenerationReport {
                class_id,
                class_name: String::new(),
                status: ClassOutcome::Skipped,
                students_found: 0,
                bills_generated: 0,
                bills_skipped: 0,
                errors: Vec::new(),
                reason: Some("class not found under site".to_string()),
            });
        }

        for class in classes {
            let report = self.generate_for_class(scope, &class, created_by, &mut result).await;
            if let Some(reason) = &report.reason {
                warn!(class_id = %class.class_id, reason = %reason, "class skipped");
            }
            result.generated += report.bills_generated;
            result.skipped += report.bills_skipped;
            result.errors.extend(report.errors.iter().cloned());
            result.classes_processed.push(report);
        }

        info!(
            generated = result.generated,
            skipped = result.skipped,
            errors = result.errors.len(),
            "bill generation finished"
        );
        Ok(result)
    }

    /// Explicit class ids when given, else every class under the site.
    /// Requested ids unknown to the site are returned separately.
    async fn resolve_classes(
        &self,
        scope: &BillingScope,
    ) -> BillingResult<(Vec<ClassRecord>, Vec<Uuid>)> {
        let site_classes = self.roster.classes_for_site(scope.school_site_id).await?;
        match &scope.class_ids {
            None => Ok((site_classes, Vec::new())),
            Some(ids) => {
                let mut resolved = Vec::with_capacity(ids.len());
                let mut unknown = Vec::new();
                for id in ids {
                    match site_classes.iter().find(|c| c.class_id == *id) {
                        Some(class) => resolved.push(class.clone()),
                        None => unknown.push(*id),
                    }
                }
                Ok((resolved, unknown))
            }
        }
    }

    async fn generate_for_class(
        &self,
        scope: &BillingScope,
        class: &ClassRecord,
        created_by: Uuid,
        result: &mut GenerationResult,
    ) -> ClassGenerationReport {
        let mut report = ClassGenerationReport {
            class_id: class.class_id,
            class_name: class.name.clone(),
            status: ClassOutcome::Skipped,
            students_found: 0,
            bills_generated: 0,
            bills_skipped: 0,
            errors: Vec::new(),
            reason: None,
        };

        let fee = match self
            .fees
            .fee_for(class.class_id, &scope.academic_year, scope.academic_term)
            .await
        {
            Ok(Some(fee)) => fee,
            Ok(None) => {
                report.reason = Some("no fee configuration".to_string());
                return report;
            }
            Err(e) => {
                report.reason = Some(format!("fee configuration lookup failed: {e}"));
                return report;
            }
        };

        let students = match self.roster.class_roster(class.class_id).await {
            Ok(students) => students,
            Err(e) => {
                report.reason = Some(format!("roster unavailable: {e}"));
                return report;
            }
        };

        report.status = ClassOutcome::Processed;
        report.students_found = students.len();

        for student in students {
            if student.full_name.trim().is_empty() {
                report.errors.push(StudentGenerationError {
                    student_name: student.identifier.clone(),
                    class_id: class.class_id,
                    error: "missing student name".to_string(),
                });
                continue;
            }
            if student.carried_balance < Decimal::ZERO {
                report.errors.push(StudentGenerationError {
                    student_name: student.full_name.clone(),
                    class_id: class.class_id,
                    error: format!("negative carried balance {}", student.carried_balance),
                });
                continue;
            }

            let ledger = StudentBilling::generate(
                student.student_id,
                class.class_id,
                scope.school_site_id,
                scope.academic_year.clone(),
                scope.academic_term,
                student.carried_balance,
                fee.amount,
                fee.currency.clone(),
                fee.payment_due_date,
                created_by,
            );

            match self.store.create_if_absent(ledger.clone()).await {
                Ok(CreateOutcome::Created) => {
                    report.bills_generated += 1;
                    if result.sample.len() < GENERATION_SAMPLE_LIMIT {
                        result.sample.push(LedgerSummary {
                            ledger_id: ledger.id,
                            student_id: ledger.student_id,
                            student_name: student.full_name.clone(),
                            class_id: ledger.class_id,
                            total_billed: ledger.total_billed,
                            status: ledger.status,
                        });
                    }
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    report.bills_skipped += 1;
                }
                Err(e) => {
                    report.errors.push(StudentGenerationError {
                        student_name: student.full_name.clone(),
                        class_id: class.class_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
