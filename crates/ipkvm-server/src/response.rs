//! JSON response envelope and the `ApiError` → HTTP mapping.
//!
//! Success: `{"ok": true, "result": {...}}`. Failure:
//! `{"ok": false, "error": <kind>, "error_msg": <text>}` with the status
//! from the fixed table in `ApiError::status`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ipkvm_core::ApiError;
use serde_json::{Value, json};
use tracing::error;

/// Handlers return this; `?` lifts any `ApiError` into the error envelope.
pub type ApiResponse = Result<Response, ApiFailure>;

/// Build a success envelope.
pub fn ok(result: Value) -> Response {
    Json(json!({"ok": true, "result": result})).into_response()
}

/// Build an empty success envelope.
pub fn ok_empty() -> Response {
    ok(json!({}))
}

/// `ApiError` carried into axum's response machinery.
#[derive(Debug)]
pub struct ApiFailure(pub ApiError);

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let err = self.0;
        // Auth failures are routine; everything else is worth a line.
        if !matches!(err, ApiError::Unauthorized | ApiError::Forbidden) {
            error!(kind = err.kind(), msg = %err, "API error");
        }
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "ok": false,
                "error": err.kind(),
                "error_msg": err.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn to_value(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope() {
        let response = ok(json!({"answer": 42}));
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_value(response).await;
        assert_eq!(body, json!({"ok": true, "result": {"answer": 42}}));
    }

    #[tokio::test]
    async fn busy_envelope_is_409() {
        let response = ApiFailure(ApiError::Busy("MSD is busy".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_value(response).await;
        assert_eq!(
            body,
            json!({"ok": false, "error": "Busy", "error_msg": "MSD is busy"})
        );
    }

    #[tokio::test]
    async fn unauthorized_envelope_is_401() {
        let response = ApiFailure(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_value(response).await;
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn validation_envelope_is_400() {
        let response =
            ApiFailure(ApiError::Validation("invalid quality".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_value(response).await;
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["error_msg"], "invalid quality");
    }
}
