//! Client code for roost.
//!
//! This crate provides the HTTP implementations of the engine's remote collaborators:
//! the catalog search and record-fetch functions, and the listing image cache.

pub mod catalog;
pub mod images;

pub use catalog::{CatalogClient, CatalogConfig, ClientError};
pub use images::ImageStore;
