//! Pedidos Core - order aggregate model and shared facilities
//!
//! This crate provides:
//! - The Order / LineItem aggregate model and its creation inputs
//! - The `OrderRepository` port implemented by storage adapters
//! - The canonical `ExError` error facility
//! - The structured logging facility and its `log_op_*` macros

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod repository;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, PedidoError, Result};
pub use model::{LineItem, NewLineItem, NewOrder, Order};
pub use repository::OrderRepository;
