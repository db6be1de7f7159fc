use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    #[error("Billing ledger not found: {ledger_id}")]
    NotFound { ledger_id: Uuid },

    #[error("Billing ledger is locked: {ledger_id}")]
    Locked { ledger_id: Uuid },

    #[error("Invalid charge: {message}")]
    InvalidCharge { message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl BillingError {
    /// Create an invalid scope error
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Create an invalid charge error
    pub fn invalid_charge(message: impl Into<String>) -> Self {
        Self::InvalidCharge {
            message: message.into(),
        }
    }

    /// Create a not found error for a ledger id
    pub fn not_found(ledger_id: Uuid) -> Self {
        Self::NotFound { ledger_id }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
