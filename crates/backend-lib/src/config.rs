// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::PasswordRequirements;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "GUITARTAB_";

/// Config file read when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Hard floor for `password_requirements.min_length`
const MIN_ALLOWED_PASSWORD_LENGTH: usize = 8;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// sqlx connection string, e.g. `sqlite://guitartab.db?mode=rwc`
    pub database_url: String,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
    /// Take the client address from `X-Real-IP` / `X-Forwarded-For`.
    /// Only enable behind a reverse proxy that sets these headers.
    pub trust_proxy_headers: bool,
    /// Token settings
    pub auth: AuthSettings,
    /// Password complexity requirements
    pub password_requirements: PasswordRequirements,
    /// Per-IP request limiter
    pub rate_limit: RateLimitSettings,
    /// Login brute-force limiter
    pub login_limit: LoginLimitSettings,
    /// Listing page sizes
    pub pagination: PaginationSettings,
}

/// Signed token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    /// Mark auth cookies `Secure`
    pub cookie_secure: bool,
    /// scrypt cost parameter (log2 of N)
    pub scrypt_log_n: u8,
}

/// Fixed-window request limiter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per window and client
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Login lockout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginLimitSettings {
    /// Failed logins before the client is locked out
    pub max_attempts: u32,
    /// Lockout length in seconds
    pub lockout_secs: u64,
}

/// Page size settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// Songs per page when none is requested
    pub default_per_page: u32,
    /// Users per page when none is requested
    pub default_users_per_page: u32,
    /// Upper bound for any requested page size
    pub max_per_page: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: "sqlite://guitartab.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            cors_origins: Vec::new(),
            trust_proxy_headers: false,
            auth: AuthSettings::default(),
            password_requirements: PasswordRequirements::default(),
            rate_limit: RateLimitSettings::default(),
            login_limit: LoginLimitSettings::default(),
            pagination: PaginationSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 60 * 60 * 24 * 30, // 30 days
            cookie_secure: false,
            scrypt_log_n: 15,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl Default for LoginLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_per_page: 25,
            default_users_per_page: 20,
            max_per_page: 100,
        }
    }
}

impl Settings {
    /// Load settings from the default config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load settings from `path` and the environment. A missing file is not
    /// an error; the built-in defaults are used instead.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Layered sources: defaults, then TOML file, then `GUITARTAB_*` variables
    /// (`__` separates nested keys, e.g. `GUITARTAB_AUTH__JWT_SECRET`)
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check values that deserialize fine but cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of {VALID_LOG_LEVELS:?}, got {}",
                self.log_level
            )));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }

        if self.auth.access_token_ttl_secs == 0 || self.auth.refresh_token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "token lifetimes must be greater than zero".to_string(),
            ));
        }

        if self.auth.scrypt_log_n == 0 || self.auth.scrypt_log_n > 20 {
            return Err(ConfigError::Invalid(
                "auth.scrypt_log_n must be between 1 and 20".to_string(),
            ));
        }

        let req = &self.password_requirements;
        if req.min_length < MIN_ALLOWED_PASSWORD_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "password_requirements.min_length must be at least {MIN_ALLOWED_PASSWORD_LENGTH}"
            )));
        }
        if req.max_length < req.min_length {
            return Err(ConfigError::Invalid(
                "password_requirements.max_length must not be below min_length".to_string(),
            ));
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit values must be greater than zero".to_string(),
            ));
        }

        if self.login_limit.max_attempts == 0 || self.login_limit.lockout_secs == 0 {
            return Err(ConfigError::Invalid(
                "login_limit values must be greater than zero".to_string(),
            ));
        }

        let pages = &self.pagination;
        if pages.default_per_page == 0
            || pages.default_users_per_page == 0
            || pages.default_per_page > pages.max_per_page
            || pages.default_users_per_page > pages.max_per_page
        {
            return Err(ConfigError::Invalid(
                "pagination defaults must be between 1 and max_per_page".to_string(),
            ));
        }

        Ok(())
    }
}
