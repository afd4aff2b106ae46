//! ATX power-control handlers.

use std::collections::HashMap;

use axum::extract::{Query, State};
use ipkvm_core::validators::{valid_atx_button, valid_atx_power_action};
use serde_json::json;
use tracing::info;

use super::required_param;
use crate::response::{ApiResponse, ok, ok_empty};
use crate::server::AppState;

/// `GET /atx`.
pub async fn state(State(state): State<AppState>) -> ApiResponse {
    Ok(ok(state.atx.get_state().await))
}

/// `POST /atx/power?action=on|off|off_hard|reset_hard`.
pub async fn power(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let action = valid_atx_power_action(required_param(&query, "action")?)?;
    info!(?action, "atx power");
    let processing = state.atx.power(action).await?;
    Ok(ok(json!({"processing": processing})))
}

/// `POST /atx/click?button=power|power_long|reset`.
pub async fn click(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let button = valid_atx_button(required_param(&query, "button")?)?;
    info!(?button, "atx click");
    state.atx.click(button).await?;
    Ok(ok_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::response::IntoResponse;
    use ipkvm_backends::memory::{
        MemoryAuth, MemoryHid, MemoryInfo, MemoryLog, MemoryMsd, MemoryStreamer,
    };
    use ipkvm_backends::{Atx, Msd, MsdHandle, StateStream};
    use ipkvm_core::errors::{ApiError, ApiResult};
    use ipkvm_core::types::{AtxButton, AtxPowerAction};
    use mockall::mock;
    use serde_json::Value;

    use crate::config::ServerConfig;
    use crate::server::Collaborators;

    mock! {
        PowerUnit {}

        #[async_trait]
        impl Atx for PowerUnit {
            async fn get_state(&self) -> Value;
            fn poll_state(&self) -> StateStream;
            async fn power(&self, action: AtxPowerAction) -> ApiResult<bool>;
            async fn click(&self, button: AtxButton) -> ApiResult<()>;
            async fn cleanup(&self) -> ApiResult<()>;
        }
    }

    fn state_with_atx(atx: MockPowerUnit) -> AppState {
        let msd: Arc<dyn Msd> = Arc::new(MemoryMsd::new());
        AppState::new(
            ServerConfig::default(),
            Collaborators {
                hid: Arc::new(MemoryHid::new()),
                atx: Arc::new(atx),
                msd: Arc::new(MsdHandle::new(msd)),
                streamer: Arc::new(MemoryStreamer::new(Duration::from_secs(2))),
                auth: Arc::new(MemoryAuth::single("admin", "admin")),
                log: Arc::new(MemoryLog::new()),
                info: Arc::new(MemoryInfo::new(serde_json::json!({}), serde_json::json!({}))),
            },
        )
    }

    #[tokio::test]
    async fn power_failure_surfaces_as_operation_error() {
        let mut atx = MockPowerUnit::new();
        let _ = atx
            .expect_power()
            .withf(|action| *action == AtxPowerAction::ResetHard)
            .returning(|_| Err(ApiError::Operation("unit jammed".into())));
        let state = state_with_atx(atx);

        let query: HashMap<String, String> =
            [("action".to_owned(), "reset_hard".to_owned())].into();
        let failure = power(State(state), Query(query)).await.unwrap_err();
        let status = failure.into_response().status();
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn click_forwards_the_parsed_button() {
        let mut atx = MockPowerUnit::new();
        let _ = atx
            .expect_click()
            .withf(|button| *button == AtxButton::PowerLong)
            .times(1)
            .returning(|_| Ok(()));
        let state = state_with_atx(atx);

        let query: HashMap<String, String> =
            [("button".to_owned(), "power_long".to_owned())].into();
        let _ = click(State(state), Query(query)).await.unwrap();
    }
}
