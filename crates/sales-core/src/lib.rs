//! Core types and trait definitions for the retail sales explorer.
//!
//! This crate is free of HTTP and database dependencies. The CSV ingestor,
//! the SQLite store and the API all depend on it.

// We use native `async fn` in traits; the store trait spells out `Send`
// bounds on its returned futures explicitly.
#![allow(async_fn_in_trait)]

pub mod analytics;
pub mod catalog;
pub mod error;
pub mod model;
pub mod sample;
pub mod store;
pub mod table;

pub use error::{Error, Result};
