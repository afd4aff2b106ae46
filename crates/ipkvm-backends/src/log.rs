//! Log tail backend contract.

use futures::stream::BoxStream;
use ipkvm_core::types::LogRecord;

/// Source of plain-text log records for `GET /log`.
pub trait LogSource: Send + Sync {
    /// Stream records starting `seek` seconds back; with `follow` the
    /// stream stays open and yields new records as they appear, otherwise
    /// it ends after the backlog.
    fn poll_log(&self, seek: u64, follow: bool) -> BoxStream<'static, LogRecord>;
}
