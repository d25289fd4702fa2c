//! SQLite backend for the factgraph fact store.
//!
//! A single [`SqliteStore`] implements both the authoritative entity store
//! ([`FactStore`](factgraph_core::store::FactStore)) and the derived search
//! index ([`FactIndex`](factgraph_core::index::FactIndex)). All database
//! access runs on the [`tokio_rusqlite`] connection thread without blocking
//! the async runtime.

mod encode;
mod index;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
