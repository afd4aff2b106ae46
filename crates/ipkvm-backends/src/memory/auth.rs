//! In-memory auth backend with issued tokens.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::AuthBackend;

/// Static user table with in-process token issuance.
///
/// Tokens are stored as SHA-256 digests, so a dump of process memory
/// never reveals a usable token. Reference backend only: credentials are
/// held in plain text and tokens vanish on restart. A production
/// deployment plugs a real credential store in behind [`AuthBackend`].
pub struct MemoryAuth {
    users: BTreeMap<String, String>,
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryAuth {
    /// Create a backend from `(user, passwd)` pairs.
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Convenience single-user backend.
    pub fn single(user: &str, passwd: &str) -> Self {
        Self::new([(user.to_owned(), passwd.to_owned())])
    }

    fn generate_token() -> String {
        let mut buf = [0u8; 32];
        rand::rng().fill_bytes(&mut buf);
        buf.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn digest(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}

#[async_trait]
impl AuthBackend for MemoryAuth {
    async fn authorize(&self, user: &str, passwd: &str) -> bool {
        self.users.get(user).is_some_and(|stored| stored == passwd)
    }

    async fn login(&self, user: &str, passwd: &str) -> Option<String> {
        if !self.authorize(user, passwd).await {
            return None;
        }
        let token = Self::generate_token();
        let _ = self
            .tokens
            .lock()
            .insert(Self::digest(&token), user.to_owned());
        Some(token)
    }

    async fn check(&self, token: &str) -> Option<String> {
        self.tokens.lock().get(&Self::digest(token)).cloned()
    }

    async fn logout(&self, token: &str) {
        let _ = self.tokens.lock().remove(&Self::digest(token));
    }

    async fn cleanup(&self) {
        self.tokens.lock().clear();
    }
}
