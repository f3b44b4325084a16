//! Repository layer for persisting order aggregates to SQLite

pub mod grouping;
pub mod hydration;
pub mod sqlite_repo;

pub use grouping::{group_rows, group_rows_by, RowGrouping};
pub use sqlite_repo::SqliteOrderRepository;
