//! EduLedger HTTP Server
//!
//! Exposes the billing engine's caller-facing operations over REST:
//! bulk bill generation, coverage verification, charge capture, payment
//! application, scope deletion, summaries and ledger listings.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::*;
pub use routes::create_app;
pub use server::EduLedgerServer;
