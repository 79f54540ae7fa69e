//! Shared harness for the end-to-end tests: seeded in-memory stores behind
//! the real router, plus containers for the datastore adapter tests.

pub mod containers;
pub mod fixtures;
pub mod mocks;
pub mod setup;
