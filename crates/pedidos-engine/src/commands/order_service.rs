//! Order service with boundary logging.
//!
//! Each operation forwards verbatim to the repository. Results and errors
//! come back unchanged; no business rules are added here.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for order operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store only uses `tracing::debug!()` for internal details.

use pedidos_core::errors::Result;
use pedidos_core::model::{NewOrder, Order};
use pedidos_core::repository::OrderRepository;
use pedidos_core::{log_op_end, log_op_error, log_op_start};
use pedidos_core_types::RequestId;
use pedidos_store::db::{self, StoreConfig};
use pedidos_store::SqliteOrderRepository;
use std::time::Instant;

/// Domain-named entry point for order aggregates
pub struct OrderService<R> {
    repo: R,
    request_id: RequestId,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            request_id: RequestId::new(),
        }
    }

    /// Stamp boundary log events with a caller-supplied id instead of a minted one
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Create an order and its line items; identities are minted by the repository
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation`: a row was rejected, nothing was written
    /// - `InvalidInput`: the date is outside years 0000-9999
    /// - `Persistence`: database error
    pub fn create_order(&self, data: NewOrder) -> Result<Order> {
        log_op_start!(
            "create_order",
            order_code = %data.order_code,
            line_item_count = data.line_items.len(),
            request_id = %self.request_id
        );
        let start = Instant::now();

        let order = self.repo.create(data).map_err(|e| {
            log_op_error!(
                "create_order",
                &e,
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %self.request_id
            );
            e
        })?;

        log_op_end!(
            "create_order",
            duration_ms = start.elapsed().as_millis() as u64,
            order_id = %order.id,
            request_id = %self.request_id
        );

        Ok(order)
    }

    /// Get one order; `Ok(None)` when it does not exist
    ///
    /// # Errors
    ///
    /// - `Persistence`: database error
    /// - `Serialization`: the stored date is unreadable
    pub fn get_order(&self, id: &str) -> Result<Option<Order>> {
        log_op_start!("get_order", order_id = id, request_id = %self.request_id);
        let start = Instant::now();

        let order = self.repo.find_by_id(id).map_err(|e| {
            log_op_error!(
                "get_order",
                &e,
                duration_ms = start.elapsed().as_millis() as u64,
                order_id = id,
                request_id = %self.request_id
            );
            e
        })?;

        log_op_end!(
            "get_order",
            duration_ms = start.elapsed().as_millis() as u64,
            order_id = id,
            found = order.is_some(),
            request_id = %self.request_id
        );

        Ok(order)
    }

    /// List every order, ordered by identity
    ///
    /// # Errors
    ///
    /// Same as [`OrderService::get_order`].
    pub fn list_orders(&self) -> Result<Vec<Order>> {
        log_op_start!("list_orders", request_id = %self.request_id);
        let start = Instant::now();

        let orders = self.repo.find_all().map_err(|e| {
            log_op_error!(
                "list_orders",
                &e,
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %self.request_id
            );
            e
        })?;

        log_op_end!(
            "list_orders",
            duration_ms = start.elapsed().as_millis() as u64,
            order_count = orders.len(),
            request_id = %self.request_id
        );

        Ok(orders)
    }

    /// Replace an order's header fields and its whole line item collection
    ///
    /// Line item identities are used as supplied.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation`: unknown order or colliding line item identity; nothing changed
    /// - `InvalidInput`: the date is outside years 0000-9999; nothing changed
    /// - `Persistence`: database error
    pub fn update_order(&self, order: &Order) -> Result<()> {
        log_op_start!(
            "update_order",
            order_id = %order.id,
            line_item_count = order.line_items.len(),
            request_id = %self.request_id
        );
        let start = Instant::now();

        self.repo.update(order).map_err(|e| {
            log_op_error!(
                "update_order",
                &e,
                duration_ms = start.elapsed().as_millis() as u64,
                order_id = %order.id,
                request_id = %self.request_id
            );
            e
        })?;

        log_op_end!(
            "update_order",
            duration_ms = start.elapsed().as_millis() as u64,
            order_id = %order.id,
            request_id = %self.request_id
        );

        Ok(())
    }

    /// Delete an order; its line items are removed by cascade
    ///
    /// # Errors
    ///
    /// - `Persistence`: database error
    pub fn delete_order(&self, id: &str) -> Result<()> {
        log_op_start!("delete_order", order_id = id, request_id = %self.request_id);
        let start = Instant::now();

        self.repo.delete(id).map_err(|e| {
            log_op_error!(
                "delete_order",
                &e,
                duration_ms = start.elapsed().as_millis() as u64,
                order_id = id,
                request_id = %self.request_id
            );
            e
        })?;

        log_op_end!(
            "delete_order",
            duration_ms = start.elapsed().as_millis() as u64,
            order_id = id,
            request_id = %self.request_id
        );

        Ok(())
    }
}

impl OrderService<SqliteOrderRepository> {
    /// Service over the process-wide SQLite connection
    ///
    /// # Errors
    ///
    /// Any failure opening, configuring or bootstrapping the store.
    pub fn sqlite(config: &StoreConfig) -> Result<Self> {
        let conn = db::global(config)?;
        Ok(Self::new(SqliteOrderRepository::new(conn)))
    }
}
