//! Mass-storage handlers, including the chunked image upload.

use std::collections::HashMap;

use axum::extract::{Multipart, Query, State};
use axum::extract::multipart::Field;
use bytes::BytesMut;
use ipkvm_backends::MsdClaim;
use ipkvm_core::errors::{ApiError, ApiResult};
use ipkvm_core::validators::valid_msd_image_name;
use serde_json::json;
use tracing::info;

use super::required_param;
use crate::response::{ApiResponse, ok, ok_empty};
use crate::server::AppState;

/// `GET /msd` — claim-free read path.
pub async fn state(State(state): State<AppState>) -> ApiResponse {
    Ok(ok(state.msd.device().get_state().await))
}

/// `POST /msd/connect`.
pub async fn connect(State(state): State<AppState>) -> ApiResponse {
    let claim = state.msd.claim()?;
    Ok(ok(claim.connect().await?))
}

/// `POST /msd/disconnect`.
pub async fn disconnect(State(state): State<AppState>) -> ApiResponse {
    let claim = state.msd.claim()?;
    Ok(ok(claim.disconnect().await?))
}

/// `POST /msd/select?image_name=`.
pub async fn select(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let name = valid_msd_image_name(required_param(&query, "image_name")?)?;
    let claim = state.msd.claim()?;
    Ok(ok(claim.select(&name).await?))
}

/// `POST /msd/remove?image_name=`.
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    let name = valid_msd_image_name(required_param(&query, "image_name")?)?;
    let claim = state.msd.claim()?;
    Ok(ok(claim.remove(&name).await?))
}

/// `POST /msd/reset`.
pub async fn reset(State(state): State<AppState>) -> ApiResponse {
    let claim = state.msd.claim()?;
    claim.reset().await?;
    Ok(ok_empty())
}

/// `POST /msd/write` — streamed multipart upload.
///
/// Field order is fixed: `image_name` first, then `image_data`. The claim
/// spans the whole transfer, so a concurrent storage operation gets `Busy`
/// until the upload finishes or fails. The transaction is only finalized
/// after the body has been fully forwarded; any earlier failure leaves it
/// open for the backend to discard, and the claim is still released.
pub async fn write(State(state): State<AppState>, mut multipart: Multipart) -> ApiResponse {
    let claim = state.msd.claim()?;

    let field = next_field(&mut multipart).await?;
    if field.name() != Some("image_name") {
        return Err(ApiError::Validation("expected field: image_name".into()).into());
    }
    let raw_name = field
        .text()
        .await
        .map_err(|err| ApiError::Validation(format!("bad image_name field: {err}")))?;
    let name = valid_msd_image_name(&raw_name)?;
    info!(image = %name, "msd upload started");

    claim.write_image_info(&name, false).await?;
    let written = forward_image_data(&claim, &mut multipart, state.config.sync_chunk_size).await?;
    claim.write_image_info(&name, true).await?;
    info!(image = %name, written, "msd upload finished");
    Ok(ok(json!({"image": {"name": name, "size": written}})))
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> ApiResult<Field<'a>> {
    multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Operation(format!("upload interrupted: {err}")))?
        .ok_or_else(|| ApiError::Validation("truncated multipart body".into()))
}

/// Forward the `image_data` field to the backend in `chunk_size`-sized
/// writes, regardless of how the transport fragments the body.
async fn forward_image_data(
    claim: &MsdClaim<'_>,
    multipart: &mut Multipart,
    chunk_size: usize,
) -> ApiResult<u64> {
    let mut field = next_field(multipart).await?;
    if field.name() != Some("image_data") {
        return Err(ApiError::Validation("expected field: image_data".into()));
    }

    let mut buf = BytesMut::new();
    let mut written = 0;
    loop {
        let piece = field
            .chunk()
            .await
            .map_err(|err| ApiError::Operation(format!("upload interrupted: {err}")))?;
        match piece {
            Some(piece) => {
                buf.extend_from_slice(&piece);
                while buf.len() >= chunk_size {
                    written = claim.write_image_chunk(&buf.split_to(chunk_size)).await?;
                }
            }
            None => break,
        }
    }
    if !buf.is_empty() {
        written = claim.write_image_chunk(&buf).await?;
    }
    Ok(written)
}
