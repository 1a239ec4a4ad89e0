//! Domain enums shared by the database layer and the HTTP surface.

pub mod audit;
pub mod bag;
pub mod equipment;
pub mod event;
pub mod reservation;
pub mod role;
pub mod transaction;

pub use audit::*;
pub use bag::*;
pub use equipment::*;
pub use event::*;
pub use reservation::*;
pub use role::*;
pub use transaction::*;
