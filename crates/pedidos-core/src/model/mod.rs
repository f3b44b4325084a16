pub mod order;

pub use order::{LineItem, NewLineItem, NewOrder, Order};
