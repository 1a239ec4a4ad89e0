//! Business logic spanning several tables.

pub mod audit;
pub mod reservation;
pub mod transaction;

pub use audit::AuditContext;
pub use reservation::{ReservationRequest, ReservationService};
pub use transaction::{MovementRequest, TransactionService};
