//! SQLite-backed search result cache.
//!
//! This module provides the persistent mapping from a normalized search term
//! to the identifiers the remote search returned for it, using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Case-insensitive keys via [`normalize`]
//! - Write-once entries (a second insert for the same key is rejected)
//! - A revision channel that fires on every insert or clear
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod key;
pub mod migrations;
pub mod search;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::{NormalizedKey, normalize};
pub use search::CacheEntry;
