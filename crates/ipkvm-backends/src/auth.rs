//! Authentication backend contract.

use async_trait::async_trait;

/// Credential and token validation.
///
/// Tokens are opaque to the control plane; it only forwards them here for
/// resolution or invalidation. Credential storage and hashing are the
/// backend's concern.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Validate a username/secret pair.
    async fn authorize(&self, user: &str, passwd: &str) -> bool;

    /// Exchange credentials for a token, if valid.
    async fn login(&self, user: &str, passwd: &str) -> Option<String>;

    /// Resolve a token to its bound username, if known.
    async fn check(&self, token: &str) -> Option<String>;

    /// Invalidate a token.
    async fn logout(&self, token: &str);

    /// Release backend resources at shutdown.
    async fn cleanup(&self);
}
