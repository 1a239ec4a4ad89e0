//! HTTP request handlers grouped by resource.

pub mod bags;
pub mod equipment;
pub mod events;
pub mod http;
pub mod reservations;
pub mod transactions;
pub mod users;

pub use http::*;
