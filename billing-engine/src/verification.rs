use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{BillingScope, LedgerKey};
use crate::providers::RosterProvider;
use crate::store::LedgerStore;

/// A rostered student with no ledger for the scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingStudent {
    pub student_id: Uuid,
    pub full_name: String,
    pub identifier: String,
    pub class_id: Uuid,
}

/// Per-class coverage breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCoverage {
    pub class_id: Uuid,
    pub class_name: String,
    pub students_found: usize,
    pub students_with_billing: usize,
    pub students_without_billing: usize,
    pub coverage_percentage: f64,
    /// Literal missing list so callers can act without a second round-trip
    pub missing: Vec<MissingStudent>,
}

/// Aggregate coverage report for a scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub total_students: usize,
    pub students_with_billing: usize,
    pub students_without_billing: usize,
    pub coverage_percentage: f64,
    pub classes: Vec<ClassCoverage>,
}

/// Coverage convention: an empty roster reports 100% so empty classes never
/// read as generation gaps.
fn coverage_percentage(with_billing: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (with_billing * 100) as f64 / total as f64
    }
}

/// Reports how much of a scope's roster has generated ledgers. Read-only;
/// safe to call at any time, any frequency.
pub struct CoverageVerificationService {
    store: Arc<dyn LedgerStore>,
    roster: Arc<dyn RosterProvider>,
}

impl CoverageVerificationService {
    pub fn new(store: Arc<dyn LedgerStore>, roster: Arc<dyn RosterProvider>) -> Self {
        Self { store, roster }
    }

    pub async fn verify(&self, scope: &BillingScope) -> BillingResult<VerificationReport> {
        scope.validate()?;
        if !self.roster.site_exists(scope.school_site_id).await? {
            return Err(BillingError::invalid_scope(format!(
                "unknown school site {}",
                scope.school_site_id
            )));
        }

        let site_classes = self.roster.classes_for_site(scope.school_site_id).await?;
        let classes: Vec<_> = match &scope.class_ids {
            None => site_classes,
            Some(ids) => site_classes
                .into_iter()
                .filter(|c| ids.contains(&c.class_id))
                .collect(),
        };

        let mut report = VerificationReport {
            school_site_id: scope.school_site_id,
            academic_year: scope.academic_year.clone(),
            academic_term: scope.academic_term,
            total_students: 0,
            students_with_billing: 0,
            students_without_billing: 0,
            coverage_percentage: 100.0,
            classes: Vec::new(),
        };

        for class in classes {
            let students = self.roster.class_roster(class.class_id).await?;
            let mut coverage = ClassCoverage {
                class_id: class.class_id,
                class_name: class.name.clone(),
                students_found: students.len(),
                students_with_billing: 0,
                students_without_billing: 0,
                coverage_percentage: 100.0,
                missing: Vec::new(),
            };

            for student in students {
                let key = LedgerKey {
                    student_id: student.student_id,
                    academic_year: scope.academic_year.clone(),
                    academic_term: scope.academic_term,
                    school_site_id: scope.school_site_id,
                };
                if self.store.exists_for(&key).await? {
                    coverage.students_with_billing += 1;
                } else {
                    coverage.missing.push(MissingStudent {
                        student_id: student.student_id,
                        full_name: student.full_name,
                        identifier: student.identifier,
                        class_id: class.class_id,
                    });
                }
            }

            coverage.students_without_billing = coverage.missing.len();
            coverage.coverage_percentage =
                coverage_percentage(coverage.students_with_billing, coverage.students_found);

            report.total_students += coverage.students_found;
            report.students_with_billing += coverage.students_with_billing;
            report.students_without_billing += coverage.students_without_billing;
            report.classes.push(coverage);
        }

        report.coverage_percentage =
            coverage_percentage(report.students_with_billing, report.total_students);

        info!(
            school_site_id = %scope.school_site_id,
            total_students = report.total_students,
            with_billing = report.students_with_billing,
            coverage = report.coverage_percentage,
            "coverage verified"
        );
        Ok(report)
    }
}
