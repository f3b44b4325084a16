// Integration tests for write atomicity under induced failures
//
// Faults are injected with a SQLite trigger that aborts any line item insert
// whose product code is 'FAIL', i.e. after the header row has been written.

use chrono::{TimeZone, Utc};
use pedidos_core::model::{LineItem, NewLineItem, NewOrder};
use pedidos_core::repository::OrderRepository;
use pedidos_core::ExErrorKind;
use pedidos_store::db::{self, StoreConfig};
use pedidos_store::SqliteOrderRepository;

const FAULT_TRIGGER: &str = r#"
    CREATE TRIGGER fail_marked_line_item
    BEFORE INSERT ON line_items
    WHEN NEW.product_code = 'FAIL'
    BEGIN
        SELECT RAISE(ABORT, 'induced line item failure');
    END;
"#;

fn setup_repo_with_fault() -> SqliteOrderRepository {
    let conn = db::open_store(&StoreConfig::in_memory()).unwrap();
    conn.execute_batch(FAULT_TRIGGER).unwrap();
    SqliteOrderRepository::from_connection(conn)
}

fn new_order(items: Vec<NewLineItem>) -> NewOrder {
    NewOrder {
        order_code: "PED-ATOMIC".to_string(),
        supplier_code: "309".to_string(),
        date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        origin: "API-B2B".to_string(),
        line_items: items,
    }
}

fn row_counts(repo: &SqliteOrderRepository) -> (i64, i64) {
    let conn = repo.connection();
    let conn = conn.lock().unwrap();
    let orders = conn
        .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .unwrap();
    let items = conn
        .query_row("SELECT COUNT(*) FROM line_items", [], |row| row.get(0))
        .unwrap();
    (orders, items)
}

#[test]
fn test_create_failing_mid_children_leaves_nothing() {
    // Given: a create whose third line item insert will fail
    let repo = setup_repo_with_fault();
    let input = new_order(vec![
        NewLineItem::new("A", 1, "N"),
        NewLineItem::new("B", 2, "N"),
        NewLineItem::new("FAIL", 3, "N"),
    ]);

    // When: we create it
    let err = repo.create(input).unwrap_err();

    // Then: the failure is reported as a rolled-back constraint failure
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.op(), Some("create_order"));

    // And: neither the header nor any line item is visible
    assert!(repo.find_all().unwrap().is_empty());
    assert_eq!(row_counts(&repo), (0, 0));
}

#[test]
fn test_failed_create_does_not_disturb_existing_orders() {
    let repo = setup_repo_with_fault();
    let kept = repo
        .create(new_order(vec![NewLineItem::new("A", 1, "N")]))
        .unwrap();

    repo.create(new_order(vec![NewLineItem::new("FAIL", 1, "N")]))
        .unwrap_err();

    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![kept]);
}

#[test]
fn test_update_failing_mid_children_keeps_previous_aggregate() {
    // Given: a stored order with {A, B}
    let repo = setup_repo_with_fault();
    let stored = repo
        .create(new_order(vec![
            NewLineItem::new("A", 1, "N"),
            NewLineItem::new("B", 2, "N"),
        ]))
        .unwrap();

    // When: an update rewrites the header, deletes {A, B} and then fails on its second insert
    let mut changed = stored.clone();
    changed.order_code = "PED-CHANGED".to_string();
    changed.line_items = vec![
        LineItem {
            id: "li-c".to_string(),
            order_id: stored.id.clone(),
            product_code: "C".to_string(),
            quantity: 3,
            fiscal_regime: "N".to_string(),
        },
        LineItem {
            id: "li-fail".to_string(),
            order_id: stored.id.clone(),
            product_code: "FAIL".to_string(),
            quantity: 4,
            fiscal_regime: "N".to_string(),
        },
    ];
    let err = repo.update(&changed).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.entity_id(), Some(stored.id.as_str()));

    // Then: the aggregate is exactly what it was before
    let loaded = repo.find_by_id(&stored.id).unwrap().unwrap();
    assert_eq!(loaded, stored);
}

#[test]
fn test_update_with_duplicate_line_item_ids_rolls_back() {
    let repo = setup_repo_with_fault();
    let stored = repo
        .create(new_order(vec![NewLineItem::new("A", 1, "N")]))
        .unwrap();

    let mut changed = stored.clone();
    let duplicate = LineItem {
        id: "li-dup".to_string(),
        order_id: stored.id.clone(),
        product_code: "D".to_string(),
        quantity: 1,
        fiscal_regime: "N".to_string(),
    };
    changed.line_items = vec![duplicate.clone(), duplicate];

    let err = repo.update(&changed).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);

    assert_eq!(repo.find_by_id(&stored.id).unwrap().unwrap(), stored);
}

#[test]
fn test_update_of_deleted_order_is_constraint_violation() {
    let repo = setup_repo_with_fault();
    let stored = repo
        .create(new_order(vec![NewLineItem::new("A", 1, "N")]))
        .unwrap();
    repo.delete(&stored.id).unwrap();

    // With line items
    let err = repo.update(&stored).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);

    // And without
    let mut header_only = stored.clone();
    header_only.line_items.clear();
    let err = repo.update(&header_only).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.op(), Some("update_order"));

    // Nothing was resurrected
    assert!(repo.find_by_id(&stored.id).unwrap().is_none());
    assert_eq!(row_counts(&repo), (0, 0));
}

#[test]
fn test_update_colliding_with_other_orders_item_rolls_back() {
    let repo = setup_repo_with_fault();
    let first = repo
        .create(new_order(vec![NewLineItem::new("A", 1, "N")]))
        .unwrap();
    let second = repo
        .create(new_order(vec![NewLineItem::new("B", 2, "N")]))
        .unwrap();

    // Reuse an identity owned by the other order
    let mut changed = second.clone();
    changed.line_items[0].id = first.line_items[0].id.clone();

    let err = repo.update(&changed).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);

    assert_eq!(repo.find_by_id(&first.id).unwrap().unwrap(), first);
    assert_eq!(repo.find_by_id(&second.id).unwrap().unwrap(), second);
}
