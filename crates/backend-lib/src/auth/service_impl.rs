use std::sync::{Arc, OnceLock};

use crate::auth::{password, AuthService, Claims, TokenKind, TokenManager};
use crate::config::AuthSettings;
use crate::error::AppError;
use async_trait::async_trait;
use guitartab_common::Role;
use uuid::Uuid;

pub struct DefaultAuth {
    tokens: TokenManager,
    scrypt_log_n: u8,
    /// Hash checked for unknown login names, built on first use
    decoy_hash: Arc<OnceLock<String>>,
}

impl DefaultAuth {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            tokens: TokenManager::new(settings),
            scrypt_log_n: settings.scrypt_log_n,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let mut plain = plain.to_string();
        let log_n = self.scrypt_log_n;
        tokio::task::spawn_blocking(move || password::hash_password_secure(&mut plain, log_n)).await?
    }

    async fn verify_password(&self, hash: &str, plain: &str) -> bool {
        let hash = hash.to_string();
        let plain = plain.to_string();
        tokio::task::spawn_blocking(move || password::verify_password(&hash, &plain))
            .await
            .unwrap_or(false)
    }

    async fn verify_unknown_user(&self, plain: &str) -> bool {
        let decoy = self.decoy_hash.clone();
        let log_n = self.scrypt_log_n;
        let plain = plain.to_string();
        let _ = tokio::task::spawn_blocking(move || {
            let hash = decoy.get_or_init(|| {
                password::hash_password(&Uuid::new_v4().to_string(), log_n).unwrap_or_default()
            });
            password::verify_password(hash, &plain)
        })
        .await;
        false
    }

    fn issue_token(&self, kind: TokenKind, user_id: Uuid, username: &str, role: Role) -> Result<String, AppError> {
        self.tokens.issue(kind, user_id, username, role)
    }

    fn decode_token(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        self.tokens.decode(token, kind)
    }

    fn revoke_token(&self, claims: &Claims) {
        self.tokens.revoke(claims);
    }

    fn purge_revoked(&self) -> usize {
        let purged = self.tokens.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "dropped expired token revocations");
        }
        purged
    }

    fn access_ttl_secs(&self) -> i64 {
        self.tokens.access_ttl_secs()
    }

    fn refresh_ttl_secs(&self) -> i64 {
        self.tokens.refresh_ttl_secs()
    }
}
