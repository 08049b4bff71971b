//! In-memory admin session registry.
//!
//! Tokens are opaque, URL-safe and live until revoked or the process exits.
//! Nothing is persisted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

/// Lower bound on token entropy in bytes.
pub const MIN_TOKEN_BYTES: usize = 24;

/// Maps live admin tokens to admin user ids.
///
/// Cloning shares the same underlying map.
#[derive(Clone, Debug)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, i32>>,
    token_bytes: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(crate::app_config::SessionConfig::default().token_bytes)
    }
}

impl SessionRegistry {
    pub fn new(token_bytes: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            token_bytes: token_bytes.max(MIN_TOKEN_BYTES),
        }
    }

    fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Issue a new token for an admin. The token is unique among live sessions.
    pub fn create_session(&self, admin_user_id: i32) -> String {
        loop {
            let token = self.generate_token();
            match self.sessions.entry(token) {
                Entry::Vacant(slot) => {
                    let token = slot.key().clone();
                    slot.insert(admin_user_id);
                    log::debug!("Admin session created for user {}", admin_user_id);
                    return token;
                }
                Entry::Occupied(_) => {
                    log::warn!("Admin session token collision, regenerating");
                }
            }
        }
    }

    /// Admin user id for a live token. Blank or unknown tokens yield `None`.
    pub fn resolve(&self, token: &str) -> Option<i32> {
        if token.trim().is_empty() {
            return None;
        }
        self.sessions.get(token).map(|entry| *entry.value())
    }

    /// Drop a token. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        if let Some((_, admin_user_id)) = self.sessions.remove(token) {
            log::debug!("Admin session revoked for user {}", admin_user_id);
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_create_and_resolve() {
        let registry = SessionRegistry::default();
        let token = registry.create_session(7);
        assert_eq!(registry.resolve(&token), Some(7));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_token_is_url_safe_and_long_enough() {
        let registry = SessionRegistry::new(32);
        let token = registry.create_session(1);
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_minimum_entropy_is_enforced() {
        let registry = SessionRegistry::new(4);
        let token = registry.create_session(1);
        // 24 bytes -> 32 base64 characters
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_blank_and_unknown_tokens() {
        let registry = SessionRegistry::default();
        registry.create_session(1);
        assert_eq!(registry.resolve(""), None);
        assert_eq!(registry.resolve("   "), None);
        assert_eq!(registry.resolve("not-a-token"), None);
    }

    #[test]
    fn test_revoke() {
        let registry = SessionRegistry::default();
        let token = registry.create_session(3);
        registry.revoke(&token);
        assert_eq!(registry.resolve(&token), None);
        assert!(registry.is_empty());

        // Revoking again is a no-op
        registry.revoke(&token);
        registry.revoke("");
    }

    #[test]
    fn test_tokens_are_unique() {
        let registry = SessionRegistry::default();
        let tokens: HashSet<String> = (0..500).map(|_| registry.create_session(1)).collect();
        assert_eq!(tokens.len(), 500);
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn test_concurrent_access() {
        let registry = SessionRegistry::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let mut tokens = Vec::new();
                    for _ in 0..100 {
                        tokens.push(registry.create_session(i));
                    }
                    for token in &tokens[..50] {
                        registry.revoke(token);
                    }
                    for token in &tokens[50..] {
                        assert_eq!(registry.resolve(token), Some(i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8 * 50);
    }
}
