//! Command orchestration layer.

pub mod order_service;
