//! Auth Token Storage
//!
//! The bearer token lives under a single fixed key so that the app handoff
//! survives reloads after it is stripped from the URL.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Result, SponsorError};

/// Storage key for the persisted bearer token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Persisted token storage (browser local storage, memory, ...)
pub trait TokenStore: Send + Sync {
    /// Load the stored token, if any
    fn load(&self) -> Option<String>;

    /// Persist a token, replacing any previous one
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token
    fn clear(&self) -> Result<()>;
}

/// In-memory token store (for tests and non-browser hosts)
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create with a token already stored
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.write() {
            entries.insert(AUTH_TOKEN_KEY.into(), token.into());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.entries.read().ok()?.get(AUTH_TOKEN_KEY).cloned()
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SponsorError::Storage("token store lock poisoned".into()))?;
        entries.insert(AUTH_TOKEN_KEY.into(), token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SponsorError::Storage("token store lock poisoned".into()))?;
        entries.remove(AUTH_TOKEN_KEY);
        Ok(())
    }
}

/// Shortened token for log output
pub fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(20).collect();
    if token.chars().count() > 20 {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load(), None);

        store.save("abc").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc"));

        store.save("def").unwrap();
        assert_eq!(store.load().as_deref(), Some("def"));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_token_preview_truncates() {
        assert_eq!(token_preview("short"), "short");
        assert_eq!(
            token_preview("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.payload"),
            "eyJhbGciOiJIUzI1NiIs..."
        );
    }
}
