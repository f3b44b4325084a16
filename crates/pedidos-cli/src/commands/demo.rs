//! Demo command
//!
//! Usage: pedidos demo

use chrono::Utc;
use pedidos_core::model::{NewLineItem, NewOrder};
use pedidos_engine::OrderService;
use pedidos_store::StoreConfig;

/// The sample order created by `pedidos demo`
pub fn sample_order() -> NewOrder {
    NewOrder {
        order_code: "PED-003".to_string(),
        supplier_code: "309".to_string(),
        date: Utc::now(),
        origin: "API-B2B".to_string(),
        line_items: vec![NewLineItem::new("BG07", 15000, "N")],
    }
}

pub fn execute(config: &StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = OrderService::sqlite(config)?;
    let order = service.create_order(sample_order())?;

    println!("{}", serde_json::to_string_pretty(&order)?);

    Ok(())
}
