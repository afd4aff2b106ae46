//! Mass-storage emulator contract and its exclusive claim.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use ipkvm_core::errors::{ApiError, ApiResult};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use crate::StateStream;

/// Mass-storage backend.
///
/// Mutating operations must only run under an [`MsdClaim`]; `get_state` and
/// `poll_state` are read paths and stay claim-free.
#[async_trait]
pub trait Msd: Send + Sync {
    /// Current state snapshot.
    async fn get_state(&self) -> Value;

    /// Live state sequence (infinite, not restartable).
    fn poll_state(&self) -> StateStream;

    /// Attach the currently selected image to the target machine.
    async fn connect(&self) -> ApiResult<Value>;

    /// Detach the drive from the target machine.
    async fn disconnect(&self) -> ApiResult<Value>;

    /// Select a stored image by name.
    async fn select(&self, image_name: &str) -> ApiResult<Value>;

    /// Remove a stored image by name.
    async fn remove(&self, image_name: &str) -> ApiResult<Value>;

    /// Reset the emulator.
    async fn reset(&self) -> ApiResult<()>;

    /// Open (`complete = false`) or finalize (`complete = true`) an image
    /// write transaction.
    async fn write_image_info(&self, image_name: &str, complete: bool) -> ApiResult<()>;

    /// Append one chunk to the open write transaction. Returns the running
    /// total of bytes written.
    async fn write_image_chunk(&self, chunk: &[u8]) -> ApiResult<u64>;

    /// Release backend resources at shutdown.
    async fn cleanup(&self) -> ApiResult<()>;
}

/// Serializes mutating access to the MSD.
///
/// A multi-step storage operation (upload, select, remove, connect) holds
/// the claim for its whole span; a concurrent attempt gets `Busy` rather
/// than queueing.
pub struct MsdHandle {
    msd: Arc<dyn Msd>,
    lock: Mutex<()>,
}

impl MsdHandle {
    /// Wrap a backend in an exclusive-claim handle.
    pub fn new(msd: Arc<dyn Msd>) -> Self {
        Self {
            msd,
            lock: Mutex::new(()),
        }
    }

    /// Claim-free access for read paths.
    pub fn device(&self) -> &Arc<dyn Msd> {
        &self.msd
    }

    /// Acquire the exclusive claim, failing `Busy` if another operation
    /// holds it. Released on drop.
    pub fn claim(&self) -> ApiResult<MsdClaim<'_>> {
        match self.lock.try_lock() {
            Ok(guard) => Ok(MsdClaim {
                _guard: guard,
                msd: &self.msd,
            }),
            Err(_) => Err(ApiError::Busy("MSD is busy".into())),
        }
    }
}

/// RAII guard over the MSD exclusive claim.
pub struct MsdClaim<'a> {
    _guard: MutexGuard<'a, ()>,
    msd: &'a Arc<dyn Msd>,
}

impl std::fmt::Debug for MsdClaim<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsdClaim").finish_non_exhaustive()
    }
}

impl Deref for MsdClaim<'_> {
    type Target = Arc<dyn Msd>;

    fn deref(&self) -> &Self::Target {
        self.msd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMsd;
    use assert_matches::assert_matches;

    fn make_handle() -> MsdHandle {
        MsdHandle::new(Arc::new(MemoryMsd::new()))
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let handle = make_handle();
        let claim = handle.claim().unwrap();
        assert_matches!(handle.claim(), Err(ApiError::Busy(_)));
        drop(claim);
        assert!(handle.claim().is_ok());
    }

    #[tokio::test]
    async fn claim_released_on_error_path() {
        let handle = make_handle();
        {
            let claim = handle.claim().unwrap();
            // A failing operation mid-claim must not leak the lock.
            let err = claim.select("nope.iso").await.unwrap_err();
            assert_matches!(err, ApiError::Operation(_));
        }
        assert!(handle.claim().is_ok());
    }

    #[tokio::test]
    async fn device_reads_bypass_the_claim() {
        let handle = make_handle();
        let _claim = handle.claim().unwrap();
        // State reads stay available while an operation is in flight.
        let state = handle.device().get_state().await;
        assert!(state.is_object());
    }
}
