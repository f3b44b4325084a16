//! Order repository port
//!
//! This module defines the `OrderRepository` trait, the contract between the
//! order service and any storage adapter. The SQLite adapter lives in
//! `pedidos-store`.

use crate::errors::Result;
use crate::model::{NewOrder, Order};

/// Persistence contract for Order aggregates
///
/// Every write is atomic: either all header and line item rows are visible
/// afterwards or none are. Implementations perform no retries.
pub trait OrderRepository {
    /// Persist a new Order and its line items
    ///
    /// Mints one identity for the Order and one per line item.
    ///
    /// # Returns
    /// The stored aggregate, carrying the minted identities
    ///
    /// # Errors
    /// `ConstraintViolation` or `Persistence`; `InvalidInput` for a date
    /// outside years 0000-9999. Nothing is written on error.
    fn create(&self, data: NewOrder) -> Result<Order>;

    /// Load one aggregate by identity
    ///
    /// An order without line items is returned with an empty collection.
    ///
    /// # Returns
    /// * `Ok(Some(order))` - the header row exists
    /// * `Ok(None)` - no header row has this identity
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Serialization` on an unreadable stored date.
    fn find_by_id(&self, id: &str) -> Result<Option<Order>>;

    /// Load every aggregate, ordered by Order identity
    ///
    /// # Errors
    /// Same as [`OrderRepository::find_by_id`].
    fn find_all(&self) -> Result<Vec<Order>>;

    /// Replace the header fields and the entire line item collection
    ///
    /// Line item identities are taken from `order` as supplied; nothing is minted.
    ///
    /// # Errors
    /// `ConstraintViolation` when the Order does not exist or a line item
    /// identity collides, `InvalidInput` for a date outside years 0000-9999;
    /// the stored aggregate is left untouched.
    fn update(&self, order: &Order) -> Result<()>;

    /// Remove the Order; its line items go with it by cascade
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    fn delete(&self, id: &str) -> Result<()>;
}

impl<R: OrderRepository + ?Sized> OrderRepository for &R {
    fn create(&self, data: NewOrder) -> Result<Order> {
        (**self).create(data)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<Order>> {
        (**self).find_all()
    }

    fn update(&self, order: &Order) -> Result<()> {
        (**self).update(order)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}
