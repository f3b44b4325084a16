pub mod demo;
pub mod order;
