//! In-memory mass-storage emulator.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ipkvm_core::errors::{ApiError, ApiResult};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::debug;

use super::StateCell;
use crate::{Msd, StateStream};

struct WriteTx {
    image_name: String,
    written: u64,
}

#[derive(Default)]
struct MsdInner {
    images: BTreeMap<String, u64>,
    current: Option<String>,
    connected: bool,
    write: Option<WriteTx>,
}

impl MsdInner {
    fn snapshot(&self) -> Value {
        json!({
            "online": true,
            "connected": self.connected,
            "current": self.current,
            "uploading": self.write.is_some(),
            "images": self.images.iter()
                .map(|(name, size)| (name.clone(), json!({"size": size})))
                .collect::<serde_json::Map<_, _>>(),
        })
    }
}

/// Loopback mass-storage emulator holding images as name → size entries.
pub struct MemoryMsd {
    inner: Mutex<MsdInner>,
    cell: StateCell,
    finalizes: AtomicU64,
}

impl MemoryMsd {
    /// Create an empty drive.
    pub fn new() -> Self {
        let inner = MsdInner::default();
        let cell = StateCell::new(inner.snapshot());
        Self {
            inner: Mutex::new(inner),
            cell,
            finalizes: AtomicU64::new(0),
        }
    }

    /// How many write transactions were finalized with `complete = true`.
    pub fn finalize_count(&self) -> u64 {
        self.finalizes.load(Ordering::Relaxed)
    }

    /// Stored size of an image, if present.
    pub fn image_size(&self, name: &str) -> Option<u64> {
        self.inner.lock().images.get(name).copied()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut MsdInner) -> ApiResult<T>) -> ApiResult<T> {
        let mut inner = self.inner.lock();
        let result = f(&mut inner);
        self.cell.set(inner.snapshot());
        result
    }
}

impl Default for MemoryMsd {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Msd for MemoryMsd {
    async fn get_state(&self) -> Value {
        self.cell.get()
    }

    fn poll_state(&self) -> StateStream {
        self.cell.stream()
    }

    async fn connect(&self) -> ApiResult<Value> {
        self.mutate(|inner| {
            if inner.current.is_none() {
                return Err(ApiError::Operation("no image selected".into()));
            }
            inner.connected = true;
            Ok(inner.snapshot())
        })
    }

    async fn disconnect(&self) -> ApiResult<Value> {
        self.mutate(|inner| {
            inner.connected = false;
            Ok(inner.snapshot())
        })
    }

    async fn select(&self, image_name: &str) -> ApiResult<Value> {
        self.mutate(|inner| {
            if inner.connected {
                return Err(ApiError::Operation("drive is connected to the server".into()));
            }
            if !inner.images.contains_key(image_name) {
                return Err(ApiError::Operation(format!("unknown image: {image_name:?}")));
            }
            inner.current = Some(image_name.to_owned());
            Ok(inner.snapshot())
        })
    }

    async fn remove(&self, image_name: &str) -> ApiResult<Value> {
        self.mutate(|inner| {
            if inner.connected && inner.current.as_deref() == Some(image_name) {
                return Err(ApiError::Operation("image is in use".into()));
            }
            if inner.images.remove(image_name).is_none() {
                return Err(ApiError::Operation(format!("unknown image: {image_name:?}")));
            }
            if inner.current.as_deref() == Some(image_name) {
                inner.current = None;
            }
            Ok(inner.snapshot())
        })
    }

    async fn reset(&self) -> ApiResult<()> {
        self.mutate(|inner| {
            inner.connected = false;
            inner.write = None;
            Ok(())
        })
    }

    async fn write_image_info(&self, image_name: &str, complete: bool) -> ApiResult<()> {
        debug!(image = image_name, complete, "write transaction");
        self.mutate(|inner| {
            if complete {
                if inner.write.take().is_none() {
                    return Err(ApiError::Operation("no write transaction".into()));
                }
                let _ = self.finalizes.fetch_add(1, Ordering::Relaxed);
            } else {
                inner.write = Some(WriteTx {
                    image_name: image_name.to_owned(),
                    written: 0,
                });
                let _ = inner.images.insert(image_name.to_owned(), 0);
            }
            Ok(())
        })
    }

    async fn write_image_chunk(&self, chunk: &[u8]) -> ApiResult<u64> {
        self.mutate(|inner| {
            let Some(tx) = inner.write.as_mut() else {
                return Err(ApiError::Operation("no write transaction".into()));
            };
            tx.written += chunk.len() as u64;
            let written = tx.written;
            let name = tx.image_name.clone();
            let _ = inner.images.insert(name, written);
            Ok(written)
        })
    }

    async fn cleanup(&self) -> ApiResult<()> {
        self.reset().await
    }
}
