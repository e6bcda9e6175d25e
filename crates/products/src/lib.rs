//! Product catalog module.
//!
//! Products are reference data owned by the remote API. This crate holds the
//! read-only snapshot an editing session works against and the contracts for
//! fetching and resolving products.

pub mod product;

pub use product::{Product, ProductCatalog, ProductLookup, ProductSource};
