// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed access and refresh tokens.

use chrono::Utc;
use dashmap::DashMap;
use guitartab_common::Role;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::error::AppError;

/// Which of the two token kinds a token is
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub token_type: TokenKind,
    /// Unique token id, used for revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Parsed `sub`
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Authentication("Invalid token subject".to_string()))
    }
}

/// Issues and checks HS256 tokens and keeps the revocation list
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    /// Revoked token ids mapped to their expiry
    revoked: Arc<DashMap<String, i64>>,
}

impl TokenManager {
    /// Create a manager from the auth settings
    pub fn new(settings: &AuthSettings) -> Self {
        let secret = settings.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl_secs: i64::try_from(settings.access_token_ttl_secs).unwrap_or(i64::MAX),
            refresh_ttl_secs: i64::try_from(settings.refresh_token_ttl_secs).unwrap_or(i64::MAX),
            revoked: Arc::new(DashMap::new()),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Sign a new token for the given user
    pub fn issue(&self, kind: TokenKind, user_id: Uuid, username: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            token_type: kind,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Token(e.to_string()))
    }

    /// Check signature, expiry, kind and revocation
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "Token has expired",
                _ => "Invalid token",
            };
            AppError::Authentication(reason.to_string())
        })?;
        let claims = data.claims;

        if claims.token_type != expected {
            return Err(AppError::Authentication(format!(
                "Expected {} token",
                match expected {
                    TokenKind::Access => "an access",
                    TokenKind::Refresh => "a refresh",
                }
            )));
        }

        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::Authentication("Token has been revoked".to_string()));
        }

        Ok(claims)
    }

    /// Revoke a token until it would have expired anyway
    pub fn revoke(&self, claims: &Claims) {
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    /// Drop revocation entries of tokens that have expired
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp > now);
        before - self.revoked.len()
    }

    /// Number of tracked revocations
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}
