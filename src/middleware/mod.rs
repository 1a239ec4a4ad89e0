//! Request extractors: bearer authentication and client address.

pub mod auth;
pub mod client_ip;

pub use auth::{AdminUser, AuthUser};
pub use client_ip::ClientIp;
