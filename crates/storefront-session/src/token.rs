//! Session token and its persistence.

use crate::{cache_key, Cache, CacheError};
use serde::{Deserialize, Serialize};

/// Opaque session token issued by the backend on login.
///
/// `Debug` never prints the value, so tokens can sit inside structs that
/// get logged.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw value, for the transport layer only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Persists the session token in a [`Cache`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    cache: Cache,
    key: String,
}

impl TokenStore {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            key: cache_key!("session", "token"),
        }
    }

    /// Load the stored token. Blank tokens are treated as absent.
    pub fn load(&self) -> Result<Option<SessionToken>, CacheError> {
        let token: Option<SessionToken> = self.cache.get(&self.key)?;
        Ok(token.filter(|t| !t.is_blank()))
    }

    pub fn save(&self, token: &SessionToken) -> Result<(), CacheError> {
        self.cache.set(&self.key, token)?;
        tracing::debug!(dir = %self.cache.dir().display(), "Session token saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.cache.delete(&self.key)?;
        tracing::debug!(dir = %self.cache.dir().display(), "Session token cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::new("secret-value");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("secret"));
        assert_eq!(token.expose(), "secret-value");
    }

    #[test]
    fn test_token_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Cache::open(dir.path()).unwrap());
        assert_eq!(store.load().unwrap(), None);
        store.save(&SessionToken::new("abc")).unwrap();

        let reopened = TokenStore::new(Cache::open(dir.path()).unwrap());
        assert_eq!(reopened.load().unwrap(), Some(SessionToken::new("abc")));

        reopened.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_blank_token_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Cache::open(dir.path()).unwrap());
        store.save(&SessionToken::new("  ")).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
