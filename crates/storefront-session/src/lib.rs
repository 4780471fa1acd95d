//! Session persistence for the storefront client.
//!
//! The session token is the only piece of client state that survives a
//! restart. Cart and wishlist are always rehydrated from the Order Gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_session::{Cache, SessionToken, TokenStore};
//!
//! let cache = Cache::open("/home/me/.local/state/shop")?;
//! let tokens = TokenStore::new(cache);
//!
//! tokens.save(&SessionToken::new("eyJhbGciOi..."))?;
//! let restored = tokens.load()?;
//! assert!(restored.is_some());
//!
//! tokens.clear()?;
//! # Ok::<(), storefront_session::CacheError>(())
//! ```

mod error;
mod kv;
mod token;

pub use error::CacheError;
pub use kv::Cache;
pub use token::{SessionToken, TokenStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, SessionToken, TokenStore};
}
