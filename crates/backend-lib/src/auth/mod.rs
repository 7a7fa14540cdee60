// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication: password hashing, signed tokens, login throttling and
//! the request identity extractors.

pub mod identity;
pub mod password;
pub mod rate_limit;
pub mod token;
mod service;
mod service_impl;

pub use identity::{bearer_or_cookie, client_ip, ClientIp, CurrentUser, MaybeUser, ACCESS_COOKIE, REFRESH_COOKIE};
pub use password::{
    hash_password, password_problems, validate_password_strength, verify_password, PasswordRequirements,
    MIN_PASSWORD_LENGTH,
};
pub use rate_limit::AuthRateLimiter;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{Claims, TokenKind, TokenManager};
