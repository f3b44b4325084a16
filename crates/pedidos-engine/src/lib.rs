//! Pedidos Engine - Orchestration layer
//!
//! Exposes the domain-named order operations on top of any
//! `OrderRepository` and owns their boundary logging.

pub mod commands;

pub use commands::order_service::OrderService;
