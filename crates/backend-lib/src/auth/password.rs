// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Hash a password using scrypt with cost `2^log_n`
pub fn hash_password(plain: &str, log_n: u8) -> anyhow::Result<String> {
    let params = Params::new(log_n, Params::RECOMMENDED_R, Params::RECOMMENDED_P, Params::RECOMMENDED_LEN)
        .map_err(|e| anyhow::anyhow!("invalid scrypt parameters: {e}"))?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash. The cost parameters come from the hash.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Every complexity rule the password breaks, as user facing messages
pub fn password_problems(password: &str, requirements: &PasswordRequirements) -> Vec<String> {
    let mut problems = Vec::new();
    let len = password.chars().count();

    if len < requirements.min_length {
        problems.push(format!(
            "Password must be at least {} characters long",
            requirements.min_length
        ));
    }

    if len > requirements.max_length {
        problems.push(format!(
            "Password must be at most {} characters long",
            requirements.max_length
        ));
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        problems.push("Password must contain at least one uppercase letter".to_string());
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        problems.push("Password must contain at least one lowercase letter".to_string());
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain at least one digit".to_string());
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        problems.push("Password must contain at least one special character".to_string());
    }

    problems
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    password_problems(password, requirements).is_empty()
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String, log_n: u8) -> anyhow::Result<String> {
    let hash = hash_password(plain, log_n);
    plain.zeroize();
    hash
}
