//! Pedidos Store - SQLite persistence for order aggregates
//!
//! Provides:
//! - Connection management with the required pragmas and a process-wide handle
//! - Embedded, checksummed schema bootstrap
//! - A generic row-grouping utility for one-to-many join results
//! - `SqliteOrderRepository`, the `OrderRepository` adapter

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use db::{SharedConnection, StoreConfig};
pub use errors::Result;
pub use repo::SqliteOrderRepository;
