//! Credential lookup
//!
//! The token is an opaque bearer credential. It is looked up in local storage
//! under the keys the web client has used over time, then in the system
//! keyring.

use keyring::Entry;

use super::error::ApiError;
use crate::config::LocalStore;

/// Service name for keyring storage
const SERVICE_NAME: &str = "morais";
/// Entry name for the auth token
const TOKEN_ENTRY: &str = "auth-token";

/// Local storage keys that may hold a token, most preferred first
pub const TOKEN_KEYS: &[&str] = &["auth_token", "cwm_user_token", "token", "access_token"];

/// Resolves and stores the auth token
pub struct TokenStore;

impl TokenStore {
    /// Find a token in local storage, falling back to the keyring
    pub fn resolve(store: &LocalStore) -> Option<String> {
        if let Some(token) = Self::from_local(store) {
            return Some(token);
        }

        match Self::from_keyring() {
            Ok(token) => Some(token),
            Err(ApiError::Keyring(e)) => {
                tracing::debug!("Keyring unavailable: {}", e);
                None
            }
            Err(_) => None,
        }
    }

    /// First non-empty token found under a recognised local storage key
    pub fn from_local(store: &LocalStore) -> Option<String> {
        TOKEN_KEYS.iter().find_map(|key| {
            store.get_item(key).map(|raw| Self::clean(&raw)).filter(|token| !token.is_empty())
        })
    }

    /// Tokens are sometimes stored JSON-quoted or with a scheme prefix
    fn clean(raw: &str) -> String {
        let trimmed = raw.trim().trim_matches('"');
        trimmed.strip_prefix("Bearer ").unwrap_or(trimmed).trim().to_string()
    }

    /// Read the token from the system keyring
    pub fn from_keyring() -> Result<String, ApiError> {
        let entry =
            Entry::new(SERVICE_NAME, TOKEN_ENTRY).map_err(|e| ApiError::Keyring(e.to_string()))?;

        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => ApiError::Unauthorized { status: 401 },
            _ => ApiError::Keyring(e.to_string()),
        })
    }

    /// Store a token in local storage (primary key) and the keyring
    pub fn save(store: &LocalStore, token: &str) -> anyhow::Result<()> {
        store.set_item(TOKEN_KEYS[0], token)?;

        match Entry::new(SERVICE_NAME, TOKEN_ENTRY).and_then(|entry| entry.set_password(token)) {
            Ok(()) => {}
            Err(e) => tracing::warn!("Could not store token in keyring: {}", e),
        }
        Ok(())
    }

    /// Remove every stored copy of the token
    pub fn clear(store: &LocalStore) -> anyhow::Result<()> {
        for key in TOKEN_KEYS {
            store.remove_item(key)?;
        }
        if let Ok(entry) = Entry::new(SERVICE_NAME, TOKEN_ENTRY) {
            let _ = entry.delete_credential();
        }
        Ok(())
    }

    /// Mask a token for display (show first and last 4 chars)
    pub fn mask(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_lookup_follows_key_order() {
        let store = LocalStore::in_memory();
        store.set_item("access_token", "later").unwrap();
        store.set_item("cwm_user_token", "earlier").unwrap();

        assert_eq!(TokenStore::from_local(&store).as_deref(), Some("earlier"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let store = LocalStore::in_memory();
        store.set_item("auth_token", "  ").unwrap();
        store.set_item("token", "real").unwrap();

        assert_eq!(TokenStore::from_local(&store).as_deref(), Some("real"));
    }

    #[test]
    fn quoted_and_prefixed_tokens_are_cleaned() {
        assert_eq!(TokenStore::clean("\"abc\""), "abc");
        assert_eq!(TokenStore::clean("Bearer xyz"), "xyz");
    }

    #[test]
    fn mask_hides_the_middle() {
        let masked = TokenStore::mask("eyJhbGciOiJIUzI1NiJ9.payload.signature");
        assert!(masked.starts_with("eyJh"));
        assert!(masked.ends_with("ture"));
        assert!(masked.contains("..."));
        assert_eq!(TokenStore::mask("short"), "*****");
    }
}
