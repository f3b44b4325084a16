//! Schema bootstrap
//!
//! Applies the embedded "create tables if absent" scripts once per database,
//! recording each one with a checksum. This runs from process bootstrap
//! (`db::open_store`), never from the repository.

mod checksums;
mod embedded;
mod runner;

pub use runner::apply_migrations;
