//! Authentication: credential verification, bearer tokens, register/login.

mod handlers;
mod jwt;
mod service;

pub use handlers::{login, register, LoginRequest, RegisterRequest, TokenResponse, TOKEN_TYPE};
pub use jwt::{Claims, TokenService};
pub use service::{ensure_bootstrap_admin, CredentialVerifier};
