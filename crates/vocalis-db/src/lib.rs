//! Storage layer for Vocalis.
//!
//! A small SQLite database stands in for the document store: it holds user
//! accounts, the logic problem catalogue, and graded submissions. This crate
//! owns connection pooling (`r2d2`) and the embedded schema migrations;
//! domain crates issue their own queries against pooled connections.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_memory_pool, create_pool, DbPool, DbRuntimeSettings, PoolError};
