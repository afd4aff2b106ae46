//! HTTP route table and handlers.

use std::collections::HashMap;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use ipkvm_core::errors::{ApiError, ApiResult};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::server::AppState;

pub mod atx;
pub mod auth;
pub mod hid;
pub mod info;
pub mod log;
pub mod msd;
pub mod streamer;
pub mod ws;

/// Assemble the full route table. Everything except `POST /auth/login`
/// sits behind the auth gate.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
        .route("/info", get(info::get_info))
        .route("/log", get(log::tail))
        .route("/ws", get(ws::attach))
        .route("/hid", get(hid::state))
        .route("/hid/reset", post(hid::reset))
        .route("/atx", get(atx::state))
        .route("/atx/power", post(atx::power))
        .route("/atx/click", post(atx::click))
        .route("/msd", get(msd::state))
        .route("/msd/connect", post(msd::connect))
        .route("/msd/disconnect", post(msd::disconnect))
        .route("/msd/select", post(msd::select))
        .route("/msd/remove", post(msd::remove))
        .route(
            "/msd/write",
            post(msd::write).layer(DefaultBodyLimit::disable()),
        )
        .route("/msd/reset", post(msd::reset))
        .route("/streamer", get(streamer::state))
        .route("/streamer/set_params", post(streamer::set_params))
        .route("/streamer/reset", post(streamer::reset))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fetch a required query/form parameter.
pub(crate) fn required_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> ApiResult<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ApiError::Validation(format!("missing parameter: {name}")))
}
