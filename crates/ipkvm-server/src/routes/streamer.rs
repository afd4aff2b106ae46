//! Streamer state and desired-parameter handlers.
//!
//! Mutations here only touch the desired state; the lifecycle controller
//! applies them on its next tick.

use std::collections::HashMap;

use axum::extract::{Query, State};
use ipkvm_core::validators::{valid_stream_fps, valid_stream_quality};
use tracing::info;

use crate::response::{ApiResponse, ok, ok_empty};
use crate::server::AppState;

/// `GET /streamer`.
pub async fn state(State(state): State<AppState>) -> ApiResponse {
    Ok(ok(state.streamer.get_state().await))
}

/// `POST /streamer/set_params?quality=&desired_fps=` — both optional,
/// omitted ones keep their current desired value.
pub async fn set_params(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let mut params = state.control.desired();
    if let Some(raw) = query.get("quality") {
        params.quality = valid_stream_quality(raw)?;
    }
    if let Some(raw) = query.get("desired_fps") {
        params.desired_fps = valid_stream_fps(raw)?;
    }
    info!(quality = params.quality, fps = params.desired_fps, "streamer params set");
    state.control.set_desired(params);
    Ok(ok_empty())
}

/// `POST /streamer/reset` — arm a forced restart.
pub async fn reset(State(state): State<AppState>) -> ApiResponse {
    info!("streamer reset requested");
    state.control.request_reset();
    Ok(ok_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipkvm_core::StreamerParams;

    #[tokio::test]
    async fn set_params_merges_with_current_desired() {
        let state = crate::server::test_helpers::make_test_state();
        state.control.set_desired(StreamerParams {
            quality: 70,
            desired_fps: 25,
        });
        let query: HashMap<String, String> = [("quality".to_owned(), "90".to_owned())].into();
        let _ = set_params(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(
            state.control.desired(),
            StreamerParams {
                quality: 90,
                desired_fps: 25,
            }
        );
    }

    #[tokio::test]
    async fn bad_quality_is_rejected() {
        let state = crate::server::test_helpers::make_test_state();
        let query: HashMap<String, String> = [("quality".to_owned(), "0".to_owned())].into();
        assert!(set_params(State(state), Query(query)).await.is_err());
    }

    #[tokio::test]
    async fn reset_arms_the_flag() {
        let state = crate::server::test_helpers::make_test_state();
        assert!(!state.control.reset_armed());
        let _ = reset(State(state.clone())).await.unwrap();
        assert!(state.control.reset_armed());
    }
}
