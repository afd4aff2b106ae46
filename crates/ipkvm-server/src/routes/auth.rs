//! Login, logout, and credential-check handlers.

use std::collections::HashMap;

use axum::Form;
use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use ipkvm_core::errors::ApiError;
use ipkvm_core::validators::{valid_auth_token, valid_passwd, valid_user};
use tracing::info;

use super::required_param;
use crate::auth::COOKIE_AUTH_TOKEN;
use crate::response::{ApiResponse, ok_empty};
use crate::server::AppState;

/// `POST /auth/login` — exchange form credentials for a token cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResponse {
    let user = valid_user(required_param(&form, "user")?)?;
    let passwd = valid_passwd(required_param(&form, "passwd")?)?;
    match state.auth.login(&user, &passwd).await {
        Some(token) => {
            info!(user = %user, "login ok");
            let cookie = Cookie::build((COOKIE_AUTH_TOKEN, token))
                .path("/")
                .http_only(true)
                .build();
            Ok((jar.add(cookie), ok_empty()).into_response())
        }
        None => {
            info!(user = %user, "login rejected");
            Err(ApiError::Forbidden.into())
        }
    }
}

/// `POST /auth/logout` — invalidate the cookie token and clear the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResponse {
    let token = jar
        .get(COOKIE_AUTH_TOKEN)
        .map(|c| c.value().to_owned())
        .unwrap_or_default();
    let token = valid_auth_token(&token)?;
    state.auth.logout(&token).await;
    let removal = Cookie::build((COOKIE_AUTH_TOKEN, "")).path("/").build();
    Ok((jar.remove(removal), ok_empty()).into_response())
}

/// `GET /auth/check` — reaching the handler at all means the gate passed.
pub async fn check() -> ApiResponse {
    Ok(ok_empty())
}
