//! Postgres-backed classification store and campaign directory.

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod rows;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use store::PgStore;
