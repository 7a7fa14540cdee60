//! Registration, login, token refresh and password changes.

use std::net::IpAddr;

use chrono::Utc;
use guitartab_common::user::{ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse, UserView};
use guitartab_common::Role;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{password_problems, Claims, TokenKind};
use crate::db::models::DbUser;
use crate::db::{self, is_unique_violation};
use crate::error::AppError;
use crate::validation::{self, normalize, ValidationError, ValidationErrors};
use crate::{metrics, AppState};

/// Access and refresh token of a successful login
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub response: TokenResponse,
    pub access_token: String,
    pub refresh_token: String,
}

fn invalid_credentials() -> AppError {
    AppError::Authentication("Invalid username/email or password".to_string())
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<UserView, AppError> {
    let req = RegisterRequest {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        first_name: normalize(req.first_name),
        last_name: normalize(req.last_name),
        ..req
    };
    validation::validate_registration(&req, &state.settings.password_requirements)?;

    if db::users::username_taken(&state.db, &req.username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if db::users::email_taken(&state.db, &req.email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state.auth.hash_password(&req.password).await?;
    let now = Utc::now();
    let user = DbUser {
        id: Uuid::new_v4(),
        username: req.username,
        email: req.email,
        password_hash,
        role: Role::User.as_str().to_string(),
        is_active: true,
        is_verified: false,
        first_name: req.first_name,
        last_name: req.last_name,
        bio: None,
        avatar_url: None,
        website_url: None,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    };

    // Lost a race against a concurrent registration
    db::users::insert(&state.db, &user).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username or email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    ::metrics::counter!(metrics::USER_REGISTERED).increment(1);
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user.to_view())
}

fn token_response(state: &AppState, access_token: String, refresh_token: Option<String>, user: &DbUser) -> TokenResponse {
    TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.access_ttl_secs(),
        user: Some(user.to_view()),
    }
}

/// Check credentials and issue a token pair. Failures count against `ip`.
pub async fn login(state: &AppState, ip: IpAddr, req: LoginRequest) -> Result<IssuedTokens, AppError> {
    if !state.login_limiter.check_rate_limit(ip) {
        ::metrics::counter!(metrics::LOGIN_LOCKED_OUT).increment(1);
        warn!(%ip, "login refused during lockout");
        return Err(AppError::AuthRateLimited);
    }

    let identifier = req.username_or_email.trim();
    let found = db::users::find_by_login(&state.db, identifier).await?;
    let verified = match &found {
        Some(user) => state.auth.verify_password(&user.password_hash, &req.password).await,
        None => state.auth.verify_unknown_user(&req.password).await,
    };
    let user = match found {
        Some(user) if verified => user,
        _ => {
            state.login_limiter.record_failed_attempt(ip);
            ::metrics::counter!(metrics::LOGIN_FAILED).increment(1);
            warn!(%ip, identifier, "failed login");
            return Err(invalid_credentials());
        },
    };
    if !user.is_active {
        warn!(user_id = %user.id, "login to deactivated account");
        return Err(AppError::Authentication("Account is deactivated".to_string()));
    }

    state.login_limiter.record_success(ip);
    let now = Utc::now();
    db::users::record_login(&state.db, user.id, now).await?;

    let role = user.role();
    let access_token = state.auth.issue_token(TokenKind::Access, user.id, &user.username, role)?;
    let refresh_token = state.auth.issue_token(TokenKind::Refresh, user.id, &user.username, role)?;
    let user = DbUser {
        last_login_at: Some(now),
        ..user
    };

    ::metrics::counter!(metrics::LOGIN_SUCCEEDED).increment(1);
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(IssuedTokens {
        response: token_response(state, access_token.clone(), Some(refresh_token.clone()), &user),
        access_token,
        refresh_token,
    })
}

/// New access token for a valid refresh token
pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<TokenResponse, AppError> {
    let claims = state.auth.decode_token(refresh_token, TokenKind::Refresh)?;
    let user = db::users::find_by_id(&state.db, claims.user_id()?)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Authentication("User not found or inactive".to_string()))?;

    let access_token = state
        .auth
        .issue_token(TokenKind::Access, user.id, &user.username, user.role())?;
    Ok(token_response(state, access_token, None, &user))
}

/// Revoke the presented access token
pub fn logout(state: &AppState, claims: &Claims) {
    state.auth.revoke_token(claims);
    info!(username = %claims.username, "user logged out");
}

pub async fn change_password(state: &AppState, user_id: Uuid, req: ChangePasswordRequest) -> Result<(), AppError> {
    let user = db::users::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    if !state.auth.verify_password(&user.password_hash, &req.current_password).await {
        warn!(%user_id, "password change with wrong current password");
        return Err(AppError::Authentication("Current password is incorrect".to_string()));
    }

    let mut problems: Vec<ValidationError> = password_problems(&req.new_password, &state.settings.password_requirements)
        .into_iter()
        .map(|p| ValidationError::invalid("new_password", p))
        .collect();
    if req.new_password == req.current_password {
        problems.push(ValidationError::invalid(
            "new_password",
            "New password must differ from the current password",
        ));
    }
    if !problems.is_empty() {
        return Err(ValidationErrors::from(problems).into());
    }

    let hash = state.auth.hash_password(&req.new_password).await?;
    db::users::update_password(&state.db, user_id, &hash).await?;
    info!(%user_id, "password changed");
    Ok(())
}
