//! `/api/auth` handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use guitartab_common::user::{
    ChangePasswordRequest, LoginRequest, ProfileChanges, RefreshRequest, RegisterRequest, TokenResponse, UserView,
};
use guitartab_common::ApiMessage;

use crate::auth::{bearer_or_cookie, ClientIp, CurrentUser, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::services::{accounts, users};
use crate::AppState;

fn cookie(state: &AppState, name: &str, value: &str, max_age: i64) -> String {
    let secure = if state.settings.auth.cookie_secure { "; Secure" } else { "" };
    format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax{secure}")
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiMessage<UserView>>), AppError> {
    let user = accounts::register(&state, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::with_data("User registered successfully", user)),
    ))
}

/// Token pair in the body and as HttpOnly cookies
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tokens = accounts::login(&state, ip, req).await?;
    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            cookie(&state, ACCESS_COOKIE, &tokens.access_token, state.auth.access_ttl_secs()),
        ),
        (
            SET_COOKIE,
            cookie(&state, REFRESH_COOKIE, &tokens.refresh_token, state.auth.refresh_ttl_secs()),
        ),
    ]);
    Ok((cookies, Json(tokens.response)))
}

/// Refresh token from bearer header, cookie or JSON body, in that order
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let token = match bearer_or_cookie(&headers, REFRESH_COOKIE) {
        Some(token) => token,
        None if !body.is_empty() => {
            serde_json::from_slice::<RefreshRequest>(&body)
                .map_err(|e| AppError::BadRequest(format!("Invalid refresh request: {e}")))?
                .refresh_token
        },
        None => return Err(AppError::Authentication("Refresh token required".to_string())),
    };

    let response: TokenResponse = accounts::refresh(&state, &token).await?;
    let cookie = AppendHeaders([(
        SET_COOKIE,
        cookie(&state, ACCESS_COOKIE, &response.access_token, state.auth.access_ttl_secs()),
    )]);
    Ok((cookie, Json(response)))
}

pub async fn logout(State(state): State<Arc<AppState>>, user: CurrentUser) -> impl IntoResponse {
    accounts::logout(&state, &user.claims);
    let cleared = AppendHeaders([
        (SET_COOKIE, cookie(&state, ACCESS_COOKIE, "", 0)),
        (SET_COOKIE, cookie(&state, REFRESH_COOKIE, "", 0)),
    ]);
    (cleared, Json(ApiMessage::text("Logged out successfully")))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiMessage<()>>, AppError> {
    accounts::change_password(&state, user.id, req).await?;
    Ok(Json(ApiMessage::text("Password changed successfully")))
}

pub async fn me(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<Json<UserView>, AppError> {
    Ok(Json(users::profile(&state, user.id).await?))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> Result<Json<ApiMessage<UserView>>, AppError> {
    let view = users::update_profile(&state, user.id, changes).await?;
    Ok(Json(ApiMessage::with_data("Profile updated successfully", view)))
}
