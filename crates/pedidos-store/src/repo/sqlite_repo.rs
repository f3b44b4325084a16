//! SQLite repository implementation
//!
//! Persists Order aggregates to the `orders` and `line_items` tables. Every
//! multi-row write runs inside `db::with_transaction`.

use crate::db::{self, SharedConnection};
use crate::errors::{from_rusqlite, poisoned, Result};
use crate::repo::hydration::{check_storable_date, format_date, load_all_orders, load_order};
use pedidos_core::errors::{ExError, ExErrorKind};
use pedidos_core::model::{LineItem, NewOrder, Order};
use pedidos_core::repository::OrderRepository;
use rusqlite::{Connection, Transaction};
use std::sync::MutexGuard;
use uuid::Uuid;

/// SQLite repository for Order aggregates
#[derive(Clone)]
pub struct SqliteOrderRepository {
    conn: SharedConnection,
}

impl SqliteOrderRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Take ownership of a configured, migrated connection
    pub fn from_connection(conn: Connection) -> Self {
        Self::new(db::shared(conn))
    }

    /// The underlying shared connection
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| poisoned(op))
    }

    fn mint_id() -> String {
        Uuid::now_v7().to_string()
    }

    fn ensure_storable_date(order: &Order) -> Result<()> {
        check_storable_date(&order.id, &order.date)
            .map_err(|e| ExError::from(e).with_entity_id(order.id.clone()))
    }

    /// Insert an order header row within a transaction
    ///
    /// # Errors
    /// `InvalidInput` when the date cannot be stored readably.
    pub fn insert_order_tx(tx: &Transaction, order: &Order) -> Result<()> {
        Self::ensure_storable_date(order)?;
        tx.execute(
            "INSERT INTO orders (id, order_code, supplier_code, date, origin)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                order.id,
                order.order_code,
                order.supplier_code,
                format_date(&order.date),
                order.origin,
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Insert a line item row owned by `order_id` within a transaction
    ///
    /// The row's back-reference is always `order_id`, whatever the item carries.
    pub fn insert_line_item_tx(tx: &Transaction, order_id: &str, item: &LineItem) -> Result<()> {
        tx.execute(
            "INSERT INTO line_items (id, order_id, product_code, quantity, fiscal_regime)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                item.id,
                order_id,
                item.product_code,
                item.quantity,
                item.fiscal_regime,
            ],
        )
        .map_err(|e| from_rusqlite(e).with_entity_id(item.id.clone()))?;

        Ok(())
    }

    /// Overwrite the header's mutable fields; returns rows affected
    pub fn update_order_tx(tx: &Transaction, order: &Order) -> Result<usize> {
        Self::ensure_storable_date(order)?;
        tx.execute(
            "UPDATE orders
             SET order_code = ?1,
                 supplier_code = ?2,
                 date = ?3,
                 origin = ?4
             WHERE id = ?5",
            rusqlite::params![
                order.order_code,
                order.supplier_code,
                format_date(&order.date),
                order.origin,
                order.id,
            ],
        )
        .map_err(from_rusqlite)
    }

    /// Delete every line item owned by `order_id`; returns rows affected
    pub fn delete_line_items_tx(tx: &Transaction, order_id: &str) -> Result<usize> {
        tx.execute("DELETE FROM line_items WHERE order_id = ?1", [order_id])
            .map_err(from_rusqlite)
    }
}

impl OrderRepository for SqliteOrderRepository {
    fn create(&self, data: NewOrder) -> Result<Order> {
        let order_id = Self::mint_id();
        let line_item_ids: Vec<String> = data.line_items.iter().map(|_| Self::mint_id()).collect();
        let order = data.into_order(order_id, line_item_ids);

        let mut conn = self.lock("create_order")?;
        db::with_transaction(&mut conn, "create_order", |tx| {
            Self::insert_order_tx(tx, &order)?;
            for item in &order.line_items {
                Self::insert_line_item_tx(tx, &order.id, item)?;
            }
            Ok(())
        })
        .map_err(|e| e.with_op("create_order"))?;

        tracing::debug!(
            order_id = %order.id,
            line_item_count = order.line_items.len(),
            "order inserted"
        );

        Ok(order)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        let conn = self.lock("find_order")?;
        load_order(&conn, id).map_err(|e| e.with_op("find_order"))
    }

    fn find_all(&self) -> Result<Vec<Order>> {
        let conn = self.lock("list_orders")?;
        load_all_orders(&conn).map_err(|e| e.with_op("list_orders"))
    }

    fn update(&self, order: &Order) -> Result<()> {
        let mut conn = self.lock("update_order")?;
        let replaced = db::with_transaction(&mut conn, "update_order", |tx| {
            if Self::update_order_tx(tx, order)? == 0 {
                return Err(ExError::new(ExErrorKind::ConstraintViolation)
                    .with_message("order header does not exist"));
            }

            let removed = Self::delete_line_items_tx(tx, &order.id)?;
            for item in &order.line_items {
                Self::insert_line_item_tx(tx, &order.id, item)?;
            }
            Ok(removed)
        })
        .map_err(|e| e.with_op("update_order").with_entity_id(order.id.clone()))?;

        tracing::debug!(
            order_id = %order.id,
            removed = replaced,
            inserted = order.line_items.len(),
            "line items replaced"
        );

        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let conn = self.lock("delete_order")?;
        let removed = conn
            .execute("DELETE FROM orders WHERE id = ?1", [id])
            .map_err(|e| from_rusqlite(e).with_op("delete_order").with_entity_id(id))?;

        tracing::debug!(order_id = id, removed, "order deleted");

        Ok(())
    }
}
