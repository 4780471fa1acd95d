//! Data access for the storefront client.
//!
//! This crate provides:
//! - `CatalogProvider` / `OrderGateway` - the two consumed interfaces
//! - `GatewayError` - transport and envelope failures
//! - `HttpGateway` - JSON-over-HTTP implementation for the store backend
//! - `MemoryGateway` - in-memory, scriptable implementation (feature `testkit`)

mod config;
mod error;
mod http;
mod ports;

#[cfg(any(test, feature = "testkit"))]
mod memory;

pub use config::*;
pub use error::*;
pub use http::*;
pub use ports::*;

#[cfg(any(test, feature = "testkit"))]
pub use memory::*;
