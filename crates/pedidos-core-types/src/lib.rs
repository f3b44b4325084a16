//! Types shared by the Pedidos error and logging facilities
//!
//! - [`RequestId`]: correlation of a caller's service calls
//! - [`schema`]: canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RequestId;
