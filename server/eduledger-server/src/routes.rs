use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{billing, health};
use crate::server::EduLedgerServer;

/// Create health check routes
pub fn health_routes() -> Router<EduLedgerServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create billing engine routes
pub fn billing_routes() -> Router<EduLedgerServer> {
    Router::new()
        .route("/generate", post(billing::generate))
        .route("/verify", get(billing::verify))
        .route("/summary", get(billing::summary))
        .route("/ledgers", get(billing::list_ledgers))
        .route("/ledgers/:id/charges", post(billing::add_charge))
        .route("/ledgers/:id/payments", post(billing::apply_payment))
        .route("/ledgers/:id/lock", post(billing::lock_ledger))
        .route("/ledgers/:id/unlock", post(billing::unlock_ledger))
        .route("/", delete(billing::delete_scope))
}

/// Assemble the application router
pub fn create_app(server: EduLedgerServer) -> Router {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1/billing", billing_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(server)
}
