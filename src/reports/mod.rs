//! Read-only reporting over equipment, events, transactions and the audit trail.

pub mod handlers;

pub use handlers::*;
