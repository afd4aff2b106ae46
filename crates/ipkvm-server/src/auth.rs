//! Per-request auth gate for the protected route subset.
//!
//! Accepts either an explicit `X-KVMD-User`/`X-KVMD-Passwd` header pair or
//! a bearer token in the `auth_token` cookie. Neither present → 401; either
//! present but rejected → 403. The resolved identity is attached to the
//! request for audit logging, never for authorization beyond "known user".

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use ipkvm_core::errors::{ApiError, ApiResult};
use ipkvm_core::validators::{valid_auth_token, valid_passwd, valid_user};
use tracing::debug;

use crate::response::ApiFailure;
use crate::server::AppState;

/// Username header.
pub const HEADER_AUTH_USER: &str = "x-kvmd-user";
/// Password header.
pub const HEADER_AUTH_PASSWD: &str = "x-kvmd-passwd";
/// Token cookie name.
pub const COOKIE_AUTH_TOKEN: &str = "auth_token";

/// How a request authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Explicit header credential pair.
    Header,
    /// Cookie-carried token.
    Token,
}

impl AuthMethod {
    /// Short name used in audit log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "xhdr",
            Self::Token => "token",
        }
    }
}

/// Resolved identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    /// Validated username.
    pub user: String,
    /// Which credential form was used.
    pub method: AuthMethod,
}

/// Middleware guarding every `auth_required` operation.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), &jar).await {
        Ok(info) => {
            debug!(user = %info.user, method = info.method.as_str(), "authenticated");
            let _ = request.extensions_mut().insert(info);
            next.run(request).await
        }
        Err(err) => ApiFailure(err).into_response(),
    }
}

/// Resolve credentials to an identity, or fail 401/403.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> ApiResult<AuthInfo> {
    let header_user = headers
        .get(HEADER_AUTH_USER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let header_passwd = headers
        .get(HEADER_AUTH_PASSWD)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let cookie_token = jar.get(COOKIE_AUTH_TOKEN).map(|c| c.value()).unwrap_or("");

    if !header_user.is_empty() {
        let user = valid_user(header_user)?;
        let passwd = valid_passwd(header_passwd)?;
        if state.auth.authorize(&user, &passwd).await {
            Ok(AuthInfo {
                user,
                method: AuthMethod::Header,
            })
        } else {
            Err(ApiError::Forbidden)
        }
    } else if !cookie_token.is_empty() {
        let token = valid_auth_token(cookie_token)?;
        match state.auth.check(&token).await {
            Some(user) => Ok(AuthInfo {
                user,
                method: AuthMethod::Token,
            }),
            None => Err(ApiError::Forbidden),
        }
    } else {
        Err(ApiError::Unauthorized)
    }
}
