use async_trait::async_trait;
use guitartab_common::Role;
use uuid::Uuid;

use super::{Claims, TokenKind};
use crate::error::AppError;

/// Credential and token operations used by the HTTP layer
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Hash off the async runtime; scrypt is deliberately slow
    async fn hash_password(&self, plain: &str) -> anyhow::Result<String>;
    async fn verify_password(&self, hash: &str, plain: &str) -> bool;
    /// Spend the same work as [`verify_password`](Self::verify_password) for
    /// a login name that does not exist. Always `false`.
    async fn verify_unknown_user(&self, plain: &str) -> bool;
    fn issue_token(&self, kind: TokenKind, user_id: Uuid, username: &str, role: Role) -> Result<String, AppError>;
    fn decode_token(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError>;
    fn revoke_token(&self, claims: &Claims);
    /// Forget revocations of tokens that have expired anyway
    fn purge_revoked(&self) -> usize;
    /// Lifetime of a fresh access token in seconds
    fn access_ttl_secs(&self) -> i64;
    fn refresh_ttl_secs(&self) -> i64;
}
