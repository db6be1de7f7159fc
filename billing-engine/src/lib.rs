//! Student Billing Ledger & Generation Engine
//!
//! Provides the billing core for a school management platform:
//! - Per-student, per-term billing ledgers with derived totals and status
//! - Idempotent bulk bill generation across a site or class roster
//! - Coverage verification (which students are missing ledgers)
//! - Safe bulk reversal with payment protection and link repair
//! - Charge capture and payment application with a full audit trail

pub mod charges;
pub mod deletion;
pub mod error;
pub mod generation;
pub mod locks;
pub mod models;
pub mod providers;
pub mod reporting;
pub mod store;
pub mod verification;

pub use charges::*;
pub use deletion::*;
pub use error::*;
pub use generation::*;
pub use locks::*;
pub use models::*;
pub use providers::*;
pub use reporting::*;
pub use store::*;
pub use verification::*;
