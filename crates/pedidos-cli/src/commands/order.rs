//! Order commands
//!
//! Usage:
//!   pedidos create --order-code <CODE> --supplier-code <CODE> --origin <TAG> [--date <RFC3339>] [--item PRODUCT:QTY:REGIME]...
//!   pedidos get <ID>
//!   pedidos list
//!   pedidos update <ID> [--order-code ..] [--supplier-code ..] [--origin ..] [--date ..] [--item ID:PRODUCT:QTY:REGIME]...
//!   pedidos delete <ID>

use chrono::{DateTime, Utc};
use clap::Args;
use pedidos_core::errors::PedidoError;
use pedidos_core::model::{LineItem, NewLineItem, NewOrder};
use pedidos_engine::OrderService;
use pedidos_store::StoreConfig;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub order_code: String,

    #[arg(long)]
    pub supplier_code: String,

    #[arg(long)]
    pub origin: String,

    /// Order date (RFC 3339); defaults to now
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    /// Line item as PRODUCT:QUANTITY:REGIME (repeatable)
    #[arg(long = "item", value_parser = parse_new_item)]
    pub items: Vec<NewLineItem>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Order identity
    pub id: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Order identity
    pub id: String,

    #[arg(long)]
    pub order_code: Option<String>,

    #[arg(long)]
    pub supplier_code: Option<String>,

    #[arg(long)]
    pub origin: Option<String>,

    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    /// Line item as ID:PRODUCT:QUANTITY:REGIME (repeatable). The stored line
    /// items are replaced by exactly this list: omitting --item removes them all
    #[arg(long = "item", value_parser = parse_line_item)]
    pub items: Vec<LineItem>,
}

fn parse_quantity(raw: &str) -> Result<u32, PedidoError> {
    raw.parse().map_err(|_| PedidoError::InvalidInput {
        reason: format!("quantity must be a non-negative integer, got '{}'", raw),
    })
}

/// Parse `PRODUCT:QUANTITY:REGIME`
pub fn parse_new_item(raw: &str) -> Result<NewLineItem, PedidoError> {
    match raw.split(':').collect::<Vec<_>>().as_slice() {
        [product, quantity, regime] if !product.is_empty() => {
            Ok(NewLineItem::new(*product, parse_quantity(quantity)?, *regime))
        }
        _ => Err(PedidoError::InvalidInput {
            reason: format!("expected PRODUCT:QUANTITY:REGIME, got '{}'", raw),
        }),
    }
}

/// Parse `ID:PRODUCT:QUANTITY:REGIME`
///
/// The back-reference is filled in by the repository on write.
pub fn parse_line_item(raw: &str) -> Result<LineItem, PedidoError> {
    match raw.split_once(':') {
        Some((id, rest)) if !id.is_empty() => {
            let item = parse_new_item(rest)?;
            Ok(item.into_line_item(id.to_string(), String::new()))
        }
        _ => Err(PedidoError::InvalidInput {
            reason: format!("expected ID:PRODUCT:QUANTITY:REGIME, got '{}'", raw),
        }),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(PedidoError::from)?
    );
    Ok(())
}

pub fn init(config: &StoreConfig) -> CliResult {
    OrderService::sqlite(config)?;
    if let Some(path) = &config.path {
        println!("Initialized {}", path.display());
    }
    Ok(())
}

pub fn create(config: &StoreConfig, args: CreateArgs) -> CliResult {
    let service = OrderService::sqlite(config)?;

    let order = service.create_order(NewOrder {
        order_code: args.order_code,
        supplier_code: args.supplier_code,
        date: args.date.unwrap_or_else(Utc::now),
        origin: args.origin,
        line_items: args.items,
    })?;

    print_json(&order)
}

pub fn get(config: &StoreConfig, args: IdArgs) -> CliResult {
    let service = OrderService::sqlite(config)?;

    let order = service
        .get_order(&args.id)?
        .ok_or(PedidoError::OrderNotFound { order_id: args.id })?;

    print_json(&order)
}

pub fn list(config: &StoreConfig) -> CliResult {
    let service = OrderService::sqlite(config)?;
    print_json(&service.list_orders()?)
}

pub fn update(config: &StoreConfig, args: UpdateArgs) -> CliResult {
    let service = OrderService::sqlite(config)?;

    let mut order = service
        .get_order(&args.id)?
        .ok_or_else(|| PedidoError::OrderNotFound {
            order_id: args.id.clone(),
        })?;

    if let Some(order_code) = args.order_code {
        order.order_code = order_code;
    }
    if let Some(supplier_code) = args.supplier_code {
        order.supplier_code = supplier_code;
    }
    if let Some(origin) = args.origin {
        order.origin = origin;
    }
    if let Some(date) = args.date {
        order.date = date;
    }
    order.line_items = args
        .items
        .into_iter()
        .map(|item| LineItem {
            order_id: order.id.clone(),
            ..item
        })
        .collect();

    service.update_order(&order)?;

    print_json(&order)
}

pub fn delete(config: &StoreConfig, args: IdArgs) -> CliResult {
    let service = OrderService::sqlite(config)?;
    service.delete_order(&args.id)?;
    println!("Deleted {}", args.id);
    Ok(())
}
