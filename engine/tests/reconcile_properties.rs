//! Behavioural tests for the reconciler.
//!
//! These cover idempotence, key uniqueness, product grouping, child
//! preservation and per-record failure isolation.

use chrono::{DateTime, Utc};
use marketsync_engine::normalize::{self, OrderStatus};
use marketsync_engine::{
    ClaimItem, ClaimLineGroup, ClaimStatus, Claim, Entity, EntityStore, Error, Mapped,
    MemoryStore, NaturalKey, Order, OrderLine, PlatformId, ProductVariant, ProductVariantDetail,
    Product, Reconciler, WritePolicy,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};

const NOW: u64 = 1_706_745_600_000;

fn order_date() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_706_700_000_000).unwrap()
}

fn line(id: &str, quantity: i64) -> OrderLine {
    OrderLine {
        line_id: id.to_string(),
        product_name: format!("Product {id}"),
        barcode: Some(format!("869{id}")),
        merchant_sku: None,
        quantity,
        unit_price: Decimal::new(4990, 2),
        amount: Decimal::new(4990, 2) * Decimal::from(quantity),
        discount: Decimal::ZERO,
        color: None,
        size: None,
        status: OrderStatus::New,
    }
}

fn order(number: &str, status: OrderStatus, lines: Vec<OrderLine>) -> Order {
    Order {
        platform: PlatformId::trendyol(),
        order_number: number.to_string(),
        package_id: None,
        customer_name: "Grace Hopper".to_string(),
        customer_email: None,
        status,
        currency: "TRY".to_string(),
        gross_amount: Decimal::new(4990, 2),
        total_discount: Decimal::ZERO,
        total_price: Decimal::new(4990, 2),
        order_date: order_date(),
        last_modified: None,
        cargo_provider: None,
        cargo_tracking_number: None,
        shipping_city: None,
        lines,
    }
}

/// Map a minimal raw order the way a platform client does.
fn map_order(number: &str, raw_date: Value) -> Mapped<Order> {
    let order_date = normalize::timestamp_value("orderDate", &raw_date)
        .map_err(|e| Error::mapping(format!("order {number}"), e.to_string()))?;
    Ok(Order {
        order_date,
        ..order(number, OrderStatus::New, vec![line(&format!("{number}-1"), 1)])
    })
}

fn variant(main_id: &str, variant_id: &str, title: &str) -> ProductVariant {
    ProductVariant {
        platform: PlatformId::trendyol(),
        product_main_id: main_id.to_string(),
        title: title.to_string(),
        subtitle: None,
        description: None,
        brand: Some("Acme".to_string()),
        category: Some("Mugs".to_string()),
        detail: ProductVariantDetail {
            external_id: variant_id.to_string(),
            barcode: Some(format!("BC-{variant_id}")),
            stock_code: None,
            quantity: 3,
            list_price: Decimal::new(100, 0),
            sale_price: Decimal::new(90, 0),
            vat_rate: Decimal::new(20, 0),
            approved: true,
            archived: false,
            on_sale: true,
            images: vec![],
            attributes: vec![],
        },
    }
}

fn claim_item(id: &str, status: ClaimStatus) -> ClaimItem {
    ClaimItem {
        claim_item_id: id.to_string(),
        reason: Some("Damaged".to_string()),
        status,
        customer_note: None,
        resolved: false,
    }
}

fn claim(items: Vec<ClaimItem>) -> Claim {
    Claim {
        platform: PlatformId::trendyol(),
        claim_id: "C-1".to_string(),
        order_number: "1001".to_string(),
        customer_name: "Grace Hopper".to_string(),
        order_date: Some(order_date()),
        claim_date: order_date(),
        cargo_provider: None,
        cargo_tracking_number: None,
        line_groups: vec![ClaimLineGroup {
            order_line_id: "L-1".to_string(),
            product_name: "Mug".to_string(),
            barcode: None,
            merchant_sku: None,
            price: Decimal::new(4990, 2),
            items,
        }],
    }
}

fn key(value: &str) -> NaturalKey {
    NaturalKey::new(PlatformId::trendyol(), value)
}

/// Store that refuses to write one particular natural key value.
struct RefusingStore {
    inner: MemoryStore,
    refuse: String,
}

impl RefusingStore {
    fn check<E: Entity>(&self, entity: &E) -> marketsync_engine::error::Result<()> {
        if entity.key_value() == self.refuse {
            return Err(Error::Persistence {
                collection: E::COLLECTION.to_string(),
                key: entity.natural_key().to_string(),
                reason: "constraint violation".to_string(),
            });
        }
        Ok(())
    }
}

impl EntityStore for RefusingStore {
    fn lookup<E: Entity>(&self, key: &NaturalKey) -> marketsync_engine::error::Result<Option<E>> {
        self.inner.lookup(key)
    }

    fn insert<E: Entity>(
        &mut self,
        entity: &E,
        timestamp: u64,
    ) -> marketsync_engine::error::Result<()> {
        self.check(entity)?;
        self.inner.insert(entity, timestamp)
    }

    fn update<E: Entity>(
        &mut self,
        entity: &E,
        timestamp: u64,
    ) -> marketsync_engine::error::Result<()> {
        self.check(entity)?;
        self.inner.update(entity, timestamp)
    }
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn second_application_adds_nothing() {
    let batch = || {
        vec![
            Ok(order("1001", OrderStatus::New, vec![line("a", 1)])),
            Ok(order("1002", OrderStatus::Shipped, vec![line("b", 2), line("c", 1)])),
        ]
    };

    let mut store = MemoryStore::new();
    let reconciler = Reconciler::default();

    let first = reconciler.reconcile(&mut store, batch(), NOW);
    let state_after_first = store.entities::<Order>().unwrap();

    let second = reconciler.reconcile(&mut store, batch(), NOW + 60_000);
    let state_after_second = store.entities::<Order>().unwrap();

    assert_eq!((first.added, first.updated), (2, 0));
    assert_eq!((second.added, second.updated), (0, 2));
    assert_eq!(state_after_first, state_after_second);
}

#[test]
fn on_change_policy_makes_counters_idempotent_too() {
    let batch = || vec![Ok(order("1001", OrderStatus::New, vec![line("a", 1)]))];

    let mut store = MemoryStore::new();
    let reconciler = Reconciler::new(WritePolicy::OnChange);

    reconciler.reconcile(&mut store, batch(), NOW);
    let second = reconciler.reconcile(&mut store, batch(), NOW + 1);

    assert_eq!((second.added, second.updated, second.unchanged), (0, 0, 1));
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn three_variants_make_one_product_with_three_details() {
    let mut store = MemoryStore::new();
    let rows = vec![
        Ok(variant("P1", "v1", "Mug")),
        Ok(variant("P1", "v2", "Mug (blue)")),
        Ok(variant("P1", "v3", "Mug (red)")),
    ];

    let result = Reconciler::default().reconcile_products(&mut store, rows, NOW);

    assert_eq!(result.fetched, 3);
    assert_eq!(result.added, 1);
    assert_eq!(store.len("products"), 1);

    let product: Product = store.entity(&key("P1")).unwrap().unwrap();
    assert_eq!(product.title, "Mug");
    assert_eq!(product.details.len(), 3);
}

#[test]
fn regrouped_variants_merge_into_existing_details() {
    let mut store = MemoryStore::new();
    let reconciler = Reconciler::default();

    reconciler.reconcile_products(
        &mut store,
        vec![Ok(variant("P1", "v1", "Mug")), Ok(variant("P1", "v2", "Mug"))],
        NOW,
    );

    let mut changed = variant("P1", "v2", "Mug v2");
    changed.detail.quantity = 0;
    let result = reconciler.reconcile_products(
        &mut store,
        vec![Ok(changed), Ok(variant("P1", "v4", "Mug v2"))],
        NOW + 1,
    );

    assert_eq!((result.added, result.updated), (0, 1));
    assert_eq!((result.children_added, result.children_updated), (1, 1));

    let product: Product = store.entity(&key("P1")).unwrap().unwrap();
    assert_eq!(product.title, "Mug v2");
    let ids: Vec<_> = product.details.iter().map(|d| d.external_id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v4"]);
    assert_eq!(product.details[1].quantity, 0);
}

#[test]
fn product_persistence_failure_is_isolated() {
    let mut store = RefusingStore {
        inner: MemoryStore::new(),
        refuse: "P2".to_string(),
    };
    let rows = vec![
        Ok(variant("P1", "v1", "Mug")),
        Ok(variant("P2", "v2", "Plate")),
        Ok(variant("P3", "v3", "Bowl")),
    ];

    let result = Reconciler::default().reconcile_products(&mut store, rows, NOW);

    assert_eq!(result.added, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].key.as_deref(), Some("trendyol:P2"));
    assert!(result.errors[0].error.is_persistence());
    assert_eq!(store.inner.len("products"), 2);
}

// ============================================================================
// Children
// ============================================================================

#[test]
fn local_only_claim_items_survive() {
    let mut store = MemoryStore::new();
    let reconciler = Reconciler::default();

    reconciler.reconcile(
        &mut store,
        vec![Ok(claim(vec![
            claim_item("I-1", ClaimStatus::Created),
            claim_item("I-2", ClaimStatus::Created),
        ]))],
        NOW,
    );

    let result = reconciler.reconcile(
        &mut store,
        vec![Ok(claim(vec![
            claim_item("I-1", ClaimStatus::Accepted),
            claim_item("I-3", ClaimStatus::Created),
        ]))],
        NOW + 1,
    );

    assert_eq!(result.updated, 1);
    let stored: Claim = store.entity(&key("C-1")).unwrap().unwrap();
    assert_eq!(stored.line_groups.len(), 1);
    assert_eq!(stored.item_count(), 3);

    let items = &stored.line_groups[0].items;
    assert_eq!(items[0].claim_item_id, "I-1");
    assert_eq!(items[0].status, ClaimStatus::Accepted);
    assert_eq!(items[1].claim_item_id, "I-2");
    assert_eq!(items[1].status, ClaimStatus::Created);
    assert_eq!(items[2].claim_item_id, "I-3");
}

#[test]
fn claim_with_subset_of_items_keeps_both() {
    let mut store = MemoryStore::new();
    let reconciler = Reconciler::default();

    reconciler.reconcile(
        &mut store,
        vec![Ok(claim(vec![
            claim_item("I-1", ClaimStatus::Created),
            claim_item("I-2", ClaimStatus::Created),
        ]))],
        NOW,
    );
    reconciler.reconcile(
        &mut store,
        vec![Ok(claim(vec![claim_item("I-1", ClaimStatus::Created)]))],
        NOW + 1,
    );

    let stored: Claim = store.entity(&key("C-1")).unwrap().unwrap();
    assert_eq!(stored.item_count(), 2);
}

// ============================================================================
// Per-record isolation
// ============================================================================

#[test]
fn bad_timestamp_fails_only_its_record() {
    let ms = json!(1_706_700_000_000i64);
    let batch = vec![
        map_order("1", ms.clone()),
        map_order("2", ms.clone()),
        map_order("3", json!("31/01/2024")),
        map_order("4", ms.clone()),
        map_order("5", ms),
    ];

    let mut store = MemoryStore::new();
    let result = Reconciler::default().reconcile(&mut store, batch, NOW);

    assert_eq!(result.fetched, 5);
    assert_eq!(result.added, 4);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, 2);
    assert!(matches!(result.errors[0].error, Error::RecordMapping { .. }));

    for number in ["1", "2", "4", "5"] {
        assert!(store.get("orders", &key(number)).is_some(), "order {number} missing");
    }
    assert!(store.get("orders", &key("3")).is_none());
}

#[test]
fn update_failure_does_not_stop_batch() {
    let mut store = RefusingStore {
        inner: MemoryStore::new(),
        refuse: "none".to_string(),
    };
    let reconciler = Reconciler::default();
    reconciler.reconcile(
        &mut store,
        vec![
            Ok(order("1001", OrderStatus::New, vec![])),
            Ok(order("1002", OrderStatus::New, vec![])),
        ],
        NOW,
    );

    store.refuse = "1001".to_string();
    let result = reconciler.reconcile(
        &mut store,
        vec![
            Ok(order("1001", OrderStatus::Shipped, vec![])),
            Ok(order("1002", OrderStatus::Shipped, vec![])),
        ],
        NOW + 1,
    );

    assert_eq!(result.updated, 1);
    assert_eq!(result.errors.len(), 1);

    let untouched: Order = store.inner.entity(&key("1001")).unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::New);
    let shipped: Order = store.inner.entity(&key("1002")).unwrap().unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
}

// ============================================================================
// Properties
// ============================================================================

fn arb_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::New),
        Just(OrderStatus::Preparing),
        Just(OrderStatus::Shipped),
        Just(OrderStatus::Delivered),
        Just(OrderStatus::Cancelled),
    ]
}

fn arb_order() -> impl Strategy<Value = Order> {
    (
        0u32..12,
        arb_status(),
        prop::collection::btree_map(0u32..5, 1i64..4, 0..4),
    )
        .prop_map(|(number, status, lines)| {
            let lines = lines
                .into_iter()
                .map(|(id, qty)| line(&format!("L{id}"), qty))
                .collect();
            order(&format!("{}", 1000 + number), status, lines)
        })
}

proptest! {
    #[test]
    fn prop_applying_twice_equals_applying_once(
        batch in prop::collection::vec(arb_order(), 0..20)
    ) {
        let reconciler = Reconciler::default();

        let mut once = MemoryStore::new();
        reconciler.reconcile(&mut once, batch.iter().cloned().map(Ok).collect(), NOW);

        let mut twice = MemoryStore::new();
        reconciler.reconcile(&mut twice, batch.iter().cloned().map(Ok).collect(), NOW);
        let rerun =
            reconciler.reconcile(&mut twice, batch.iter().cloned().map(Ok).collect(), NOW + 1);

        prop_assert_eq!(rerun.added, 0);
        prop_assert_eq!(once.entities::<Order>().unwrap(), twice.entities::<Order>().unwrap());
    }

    #[test]
    fn prop_one_row_per_natural_key(batch in prop::collection::vec(arb_order(), 0..30)) {
        let mut store = MemoryStore::new();
        let mapped = batch.iter().cloned().map(Ok).collect();
        let result = Reconciler::default().reconcile(&mut store, mapped, NOW);

        let mut distinct: Vec<_> = batch.iter().map(|o| o.order_number.clone()).collect();
        distinct.sort();
        distinct.dedup();

        prop_assert_eq!(store.len("orders"), distinct.len());
        prop_assert_eq!(result.added, distinct.len());
        prop_assert_eq!(result.added + result.updated, batch.len());

        for stored in store.entities::<Order>().unwrap() {
            let mut ids: Vec<_> = stored.lines.iter().map(|l| l.line_id.clone()).collect();
            let before = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), before);
        }
    }
}
