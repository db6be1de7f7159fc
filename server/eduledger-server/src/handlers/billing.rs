use axum::{
    extract::{Path, Query, State},
    Json,
};
use billing_engine::{
    BillingScope, BillingStatus, BillingSummary, ChargeCategory, DeletionResult,
    GenerationResult, LedgerFilter, LedgerPage, NewCharge, Pagination, StudentBilling,
    VerificationReport,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::server::EduLedgerServer;

/// Bulk generation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub class_ids: Option<Vec<Uuid>>,
    pub created_by: Uuid,
}

/// Scope query parameters shared by the read endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct ScopeQuery {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    /// Restrict to one class
    pub class_id: Option<Uuid>,
}

impl ScopeQuery {
    fn scope(&self) -> BillingScope {
        let mut scope = BillingScope::new(
            self.school_site_id,
            self.academic_year.clone(),
            self.academic_term,
        );
        if let Some(class_id) = self.class_id {
            scope = scope.with_classes(vec![class_id]);
        }
        scope
    }
}

/// Ledger listing query: scope plus filters and pagination
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLedgersQuery {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub class_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    #[param(value_type = Option<String>, example = "owing")]
    pub status: Option<BillingStatus>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Charge capture request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddChargeRequest {
    #[schema(value_type = String, example = "examination")]
    pub category: ChargeCategory,
    pub particulars: String,
    pub amount: Decimal,
    pub charged_date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub added_by: Uuid,
}

/// Payment application request (payments collaborator callback)
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyPaymentRequest {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub applied_by: Uuid,
}

/// Bulk deletion request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteScopeRequest {
    pub school_site_id: Uuid,
    pub academic_year: String,
    pub academic_term: u8,
    pub class_ids: Option<Vec<Uuid>>,
    pub deleted_by: Uuid,
    #[serde(default)]
    pub force: bool,
}

/// Lock/unlock request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActorRequest {
    pub actor: Uuid,
}

/// Generate missing ledgers for a scope
pub async fn generate(
    State(server): State<EduLedgerServer>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<ApiResponse<GenerationResult>>> {
    let mut scope = BillingScope::new(req.school_site_id, req.academic_year, req.academic_term);
    scope.class_ids = req.class_ids;
    let result = server.generation.generate(&scope, req.created_by).await?;
    Ok(Json(api_success(result)))
}

/// Report billing coverage for a scope
pub async fn verify(
    State(server): State<EduLedgerServer>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<ApiResponse<VerificationReport>>> {
    let report = server.verification.verify(&query.scope()).await?;
    Ok(Json(api_success(report)))
}

/// Append a charge to a ledger
pub async fn add_charge(
    State(server): State<EduLedgerServer>,
    Path(ledger_id): Path<Uuid>,
    Json(req): Json<AddChargeRequest>,
) -> ApiResult<Json<ApiResponse<StudentBilling>>> {
    let charge = NewCharge {
        category: req.category,
        particulars: req.particulars,
        amount: req.amount,
        charged_date: req.charged_date,
        reference: req.reference,
        notes: req.notes,
    };
    let ledger = server.charges.add_charge(ledger_id, charge, req.added_by).await?;
    Ok(Json(api_success(ledger)))
}

/// Apply a captured payment to a ledger
pub async fn apply_payment(
    State(server): State<EduLedgerServer>,
    Path(ledger_id): Path<Uuid>,
    Json(req): Json<ApplyPaymentRequest>,
) -> ApiResult<Json<ApiResponse<StudentBilling>>> {
    let ledger = server
        .charges
        .apply_payment(ledger_id, req.payment_id, req.amount, req.applied_by)
        .await?;
    Ok(Json(api_success(ledger)))
}

/// Close a ledger to new charges
pub async fn lock_ledger(
    State(server): State<EduLedgerServer>,
    Path(ledger_id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Json<ApiResponse<StudentBilling>>> {
    let ledger = server.charges.lock(ledger_id, req.actor).await?;
    Ok(Json(api_success(ledger)))
}

/// Reopen a ledger for charges
pub async fn unlock_ledger(
    State(server): State<EduLedgerServer>,
    Path(ledger_id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Json<ApiResponse<StudentBilling>>> {
    let ledger = server.charges.unlock(ledger_id, req.actor).await?;
    Ok(Json(api_success(ledger)))
}

/// Delete a scope's ledgers, payment-protected unless forced
pub async fn delete_scope(
    State(server): State<EduLedgerServer>,
    Json(req): Json<DeleteScopeRequest>,
) -> ApiResult<Json<ApiResponse<DeletionResult>>> {
    let mut scope = BillingScope::new(req.school_site_id, req.academic_year, req.academic_term);
    scope.class_ids = req.class_ids;
    let result = server.deletion.delete(&scope, req.deleted_by, req.force).await?;
    Ok(Json(api_success(result)))
}

/// Aggregate totals across a scope
pub async fn summary(
    State(server): State<EduLedgerServer>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<ApiResponse<BillingSummary>>> {
    let summary = server.reporting.summary(&query.scope()).await?;
    Ok(Json(api_success(summary)))
}

/// Filtered, paginated ledger listing
pub async fn list_ledgers(
    State(server): State<EduLedgerServer>,
    Query(query): Query<ListLedgersQuery>,
) -> ApiResult<Json<ApiResponse<LedgerPage>>> {
    let mut scope = BillingScope::new(
        query.school_site_id,
        query.academic_year.clone(),
        query.academic_term,
    );
    if let Some(class_id) = query.class_id {
        scope = scope.with_classes(vec![class_id]);
    }
    let filter = LedgerFilter {
        status: query.status,
        class_id: query.class_id,
        student_id: query.student_id,
    };
    let mut pagination = Pagination::default();
    if let Some(page) = query.page {
        pagination.page = page;
    }
    if let Some(page_size) = query.page_size {
        pagination.page_size = page_size;
    }
    let page = server.reporting.list(&scope, &filter, pagination).await?;
    Ok(Json(api_success(page)))
}
