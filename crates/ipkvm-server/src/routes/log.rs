//! Plain-text log tail endpoint.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use futures::StreamExt;
use ipkvm_core::validators::{valid_bool, valid_log_seek};

use crate::response::{ApiFailure, ApiResponse};
use crate::server::AppState;

/// `GET /log?seek=<secs>&follow=<bool>` — stream formatted records.
pub async fn tail(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let seek = match query.get("seek") {
        Some(raw) => valid_log_seek(raw)?,
        None => 0,
    };
    let follow = match query.get("follow") {
        Some(raw) => valid_bool(raw)?,
        None => false,
    };

    let lines = state
        .log
        .poll_log(seek, follow)
        .map(|record| Ok::<_, Infallible>(record.to_line()));
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from_stream(lines))
        .map_err(|err| ApiFailure(ipkvm_core::errors::ApiError::Internal(err.to_string())))
}
