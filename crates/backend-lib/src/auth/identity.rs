//! Who is making the request.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap};
use guitartab_common::Role;
use uuid::Uuid;

use super::{Claims, TokenKind};
use crate::authz::Subject;
use crate::db;
use crate::error::AppError;
use crate::AppState;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Authenticated, active user. The role comes from the database so a
/// role change takes effect before old tokens expire.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn subject(&self) -> Subject {
        Subject::new(self.id, self.role)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(&parts.headers, ACCESS_COOKIE)
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;
        let claims = state.auth.decode_token(&token, TokenKind::Access)?;
        let id = claims.user_id()?;

        let user = db::users::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;
        if !user.is_active {
            return Err(AppError::Authentication("Account is deactivated".to_string()));
        }

        Ok(Self {
            id,
            role: user.role(),
            username: user.username,
            claims,
        })
    }
}

/// Optional authentication: any missing or bad credential yields `None`
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn subject(&self) -> Option<Subject> {
        self.0.as_ref().map(CurrentUser::subject)
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(Self(CurrentUser::from_request_parts(parts, state).await.ok()))
    }
}

/// Address of the calling client, see [`client_ip`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(
            &parts.headers,
            &parts.extensions,
            state.settings.trust_proxy_headers,
        )))
    }
}

/// Token from `Authorization: Bearer`, falling back to the named cookie
pub fn bearer_or_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Client address. The socket peer unless `trust_proxy` is set, in which
/// case `X-Real-IP` and then the last `X-Forwarded-For` hop win.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> IpAddr {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    if !trust_proxy {
        return peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-real-ip")
        .or_else(|| header_ip("x-forwarded-for"))
        .or(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
