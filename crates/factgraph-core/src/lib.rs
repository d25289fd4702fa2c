//! Core types, collaborator traits and services for the factgraph fact store.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage,
//! search index, security and event dispatch are reached only through the
//! traits defined here.

pub mod error;
pub mod event;
pub mod fact;
pub mod helpers;
pub mod index;
pub mod lookup;
pub mod provenance;
pub mod retract;
pub mod security;
pub mod store;

pub use error::{Error, Result};
