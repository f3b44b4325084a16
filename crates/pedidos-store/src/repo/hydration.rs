//! Hydration layer - rebuilds Order aggregates from joined rows
//!
//! Reads run one `orders LEFT JOIN line_items` query and feed the flat rows
//! through the row-grouping utility. Rows come back ordered by order id, then
//! by line item insertion order, so hydration is deterministic.

use crate::errors::{from_rusqlite, Result};
use crate::repo::grouping::{group_rows, RowGrouping};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use pedidos_core::errors::PedidoError;
use pedidos_core::model::{LineItem, Order};
use rusqlite::{Connection, Params, Row};
use std::ops::RangeInclusive;

const SELECT_JOINED: &str = "SELECT
        o.id,
        o.order_code,
        o.supplier_code,
        o.date,
        o.origin,
        l.id,
        l.product_code,
        l.quantity,
        l.fiscal_regime
     FROM orders o
     LEFT JOIN line_items l ON l.order_id = o.id";

/// Format a date the way it is stored: RFC 3339, UTC, fixed nanoseconds
///
/// Always nine fractional digits, so the text round-trips exactly.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Years RFC 3339 writes with exactly four digits
pub const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

/// Reject dates whose stored text could not be read back
///
/// Outside [`STORABLE_YEARS`] chrono writes a signed, wider year
/// (`+10000-01-01T...`) that RFC 3339 parsing refuses and that no longer
/// sorts with the other rows.
pub fn check_storable_date(
    order_id: &str,
    date: &DateTime<Utc>,
) -> std::result::Result<(), PedidoError> {
    if STORABLE_YEARS.contains(&date.year()) {
        return Ok(());
    }
    Err(PedidoError::InvalidInput {
        reason: format!(
            "date {} of order {} is outside years {:04}-{:04}",
            date,
            order_id,
            STORABLE_YEARS.start(),
            STORABLE_YEARS.end()
        ),
    })
}

/// Parse a stored date; any RFC 3339 offset form is accepted
pub fn parse_date(order_id: &str, value: &str) -> std::result::Result<DateTime<Utc>, PedidoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| PedidoError::InvalidDate {
            order_id: order_id.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// One row of the header/line item join
///
/// The line item columns are all `None` when the order has no line items.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub order_id: String,
    pub order_code: String,
    pub supplier_code: String,
    pub date: DateTime<Utc>,
    pub origin: String,
    pub line_item_id: Option<String>,
    pub product_code: Option<String>,
    pub quantity: Option<u32>,
    pub fiscal_regime: Option<String>,
}

/// Column values before the stored date is parsed
struct RawJoinedRow {
    order_id: String,
    order_code: String,
    supplier_code: String,
    date: String,
    origin: String,
    line_item_id: Option<String>,
    product_code: Option<String>,
    quantity: Option<u32>,
    fiscal_regime: Option<String>,
}

impl RawJoinedRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_id: row.get(0)?,
            order_code: row.get(1)?,
            supplier_code: row.get(2)?,
            date: row.get(3)?,
            origin: row.get(4)?,
            line_item_id: row.get(5)?,
            product_code: row.get(6)?,
            quantity: row.get(7)?,
            fiscal_regime: row.get(8)?,
        })
    }
}

impl TryFrom<RawJoinedRow> for JoinedRow {
    type Error = PedidoError;

    fn try_from(raw: RawJoinedRow) -> std::result::Result<Self, Self::Error> {
        let date = parse_date(&raw.order_id, &raw.date)?;
        Ok(Self {
            order_id: raw.order_id,
            order_code: raw.order_code,
            supplier_code: raw.supplier_code,
            date,
            origin: raw.origin,
            line_item_id: raw.line_item_id,
            product_code: raw.product_code,
            quantity: raw.quantity,
            fiscal_regime: raw.fiscal_regime,
        })
    }
}

/// Orders as parents, line items as children, keyed by order id
pub struct OrderJoin;

impl RowGrouping<JoinedRow> for OrderJoin {
    type Key = String;
    type Parent = Order;
    type Child = LineItem;

    fn key(&self, row: &JoinedRow) -> String {
        row.order_id.clone()
    }

    fn parent(&self, row: &JoinedRow) -> Order {
        Order {
            id: row.order_id.clone(),
            order_code: row.order_code.clone(),
            supplier_code: row.supplier_code.clone(),
            date: row.date,
            origin: row.origin.clone(),
            line_items: Vec::new(),
        }
    }

    fn child(&self, row: &JoinedRow) -> Option<LineItem> {
        // NOT NULL columns: either all present or the join found no line item
        match (
            &row.line_item_id,
            &row.product_code,
            row.quantity,
            &row.fiscal_regime,
        ) {
            (Some(id), Some(product_code), Some(quantity), Some(fiscal_regime)) => Some(LineItem {
                id: id.clone(),
                order_id: row.order_id.clone(),
                product_code: product_code.clone(),
                quantity,
                fiscal_regime: fiscal_regime.clone(),
            }),
            _ => None,
        }
    }

    fn attach(&self, parent: &mut Order, child: LineItem) {
        parent.line_items.push(child);
    }
}

/// Run the join with an optional filter and return its rows
fn query_joined<P: Params>(conn: &Connection, filter: &str, params: P) -> Result<Vec<JoinedRow>> {
    let sql = format!("{} {} ORDER BY o.id, l.rowid", SELECT_JOINED, filter);
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;

    let raw_rows = stmt
        .query_map(params, RawJoinedRow::from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    let rows = raw_rows
        .into_iter()
        .map(JoinedRow::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Group joined rows into aggregates
pub fn hydrate_orders(rows: Vec<JoinedRow>) -> Vec<Order> {
    group_rows(rows, &OrderJoin)
}

/// Load one aggregate; `None` when no header row has this id
pub fn load_order(conn: &Connection, order_id: &str) -> Result<Option<Order>> {
    let rows = query_joined(conn, "WHERE o.id = ?1", [order_id])?;
    let row_count = rows.len();

    let order = hydrate_orders(rows).into_iter().next();

    tracing::debug!(
        order_id,
        row_count,
        found = order.is_some(),
        "order hydrated"
    );

    Ok(order)
}

/// Load every aggregate, ordered by order id
pub fn load_all_orders(conn: &Connection) -> Result<Vec<Order>> {
    let rows = query_joined(conn, "", [])?;
    let row_count = rows.len();

    let orders = hydrate_orders(rows);

    tracing::debug!(row_count, order_count = orders.len(), "orders hydrated");

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn joined(order_id: &str, line_item: Option<(&str, &str, u32)>) -> JoinedRow {
        JoinedRow {
            order_id: order_id.to_string(),
            order_code: format!("PED-{}", order_id),
            supplier_code: "309".to_string(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            origin: "API-B2B".to_string(),
            line_item_id: line_item.map(|(id, _, _)| id.to_string()),
            product_code: line_item.map(|(_, p, _)| p.to_string()),
            quantity: line_item.map(|(_, _, q)| q),
            fiscal_regime: line_item.map(|_| "N".to_string()),
        }
    }

    #[test]
    fn test_hydrate_orders_nests_line_items() {
        let orders = hydrate_orders(vec![
            joined("a", Some(("l1", "BG07", 10))),
            joined("a", Some(("l2", "BG08", 20))),
            joined("b", None),
        ]);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "a");
        assert_eq!(orders[0].line_items.len(), 2);
        assert!(orders[0].line_items.iter().all(|l| l.order_id == "a"));
        assert_eq!(orders[1].id, "b");
        assert!(orders[1].line_items.is_empty());
    }

    #[test]
    fn test_date_format_is_fixed_width_and_lossless() {
        let date = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 30, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::nanoseconds(123_456_789))
            .unwrap();

        let stored = format_date(&date);
        assert_eq!(stored, "2024-05-01T10:30:00.123456789Z");
        assert_eq!(parse_date("o1", &stored).unwrap(), date);

        let whole_second = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(format_date(&whole_second), "2024-05-01T10:30:00.000000000Z");
    }

    #[test]
    fn test_parse_date_accepts_millisecond_text() {
        let parsed = parse_date("o1", "2024-05-01T10:30:00.000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_storable_date_bounds() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(check_storable_date("o1", &last).is_ok());
        assert_eq!(parse_date("o1", &format_date(&last)).unwrap(), last);

        for year in [10000, -1] {
            let date = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
            let err = check_storable_date("o1", &date).unwrap_err();
            assert!(matches!(err, PedidoError::InvalidInput { .. }));
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("o1", "yesterday").unwrap_err();
        assert!(matches!(err, PedidoError::InvalidDate { ref order_id, .. } if order_id == "o1"));
    }
}
