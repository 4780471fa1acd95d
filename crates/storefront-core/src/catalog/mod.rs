//! Product catalog module.
//!
//! Contains the product record and the Stock Index built from a catalog
//! snapshot.

mod product;
mod stock;

pub use product::Product;
pub use stock::StockIndex;
