//! Metadata consulted during resolution: the permanent catalog behind [`CatalogProvider`], the
//! builtin function library, document models and the scoped temp metadata store.

pub mod adapter;
pub mod document;
pub mod error;
pub mod function;
pub mod memory;
pub mod metadata;
pub mod provider;
pub mod temp;

pub use adapter::MetadataAdapter;
pub use error::{CatalogError, CatalogResult};
pub use provider::{CatalogProvider, CatalogRef};
