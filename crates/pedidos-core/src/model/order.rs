use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order - the aggregate root
///
/// An Order owns its line items exclusively: they are written together,
/// replaced together on update and removed together on delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Identity minted by the repository on create (UUID v7)
    pub id: String,

    pub order_code: String,

    pub supplier_code: String,

    pub date: DateTime<Utc>,

    /// Channel the order came in through (e.g. "API-B2B")
    pub origin: String,

    /// Line items; their order carries no meaning
    pub line_items: Vec<LineItem>,
}

/// LineItem - child entity owned by exactly one Order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,

    /// Back-reference to the owning Order's identity
    pub order_id: String,

    pub product_code: String,

    pub quantity: u32,

    /// Free-form fiscal regime tag
    pub fiscal_regime: String,
}

/// Creation input for an Order
///
/// Identities are minted by the repository, so none can be supplied here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_code: String,
    pub supplier_code: String,
    pub date: DateTime<Utc>,
    pub origin: String,
    #[serde(default)]
    pub line_items: Vec<NewLineItem>,
}

impl NewOrder {
    /// Attach minted identities, producing the stored aggregate
    ///
    /// `line_item_ids` must yield one identity per line item, in order.
    pub fn into_order<I>(self, id: String, line_item_ids: I) -> Order
    where
        I: IntoIterator<Item = String>,
    {
        let line_items = self
            .line_items
            .into_iter()
            .zip(line_item_ids)
            .map(|(item, item_id)| item.into_line_item(item_id, id.clone()))
            .collect();

        Order {
            id,
            order_code: self.order_code,
            supplier_code: self.supplier_code,
            date: self.date,
            origin: self.origin,
            line_items,
        }
    }
}

/// Creation input for a LineItem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_code: String,
    pub quantity: u32,
    pub fiscal_regime: String,
}

impl NewLineItem {
    pub fn new(
        product_code: impl Into<String>,
        quantity: u32,
        fiscal_regime: impl Into<String>,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            fiscal_regime: fiscal_regime.into(),
        }
    }

    pub fn into_line_item(self, id: String, order_id: String) -> LineItem {
        LineItem {
            id,
            order_id,
            product_code: self.product_code,
            quantity: self.quantity,
            fiscal_regime: self.fiscal_regime,
        }
    }
}
