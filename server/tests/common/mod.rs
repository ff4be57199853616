//! Shared fixtures: canonical records and an in-process platform client.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::DateTime;
use marketsync_engine::{
    normalize, Brand, Category, Claim, Error, Mapped, Order, OrderLine, OrderStatus, PlatformId,
    ProductVariant, ProductVariantDetail, Question, Transaction,
};
use marketsync_server::error::SyncError;
use marketsync_server::platform::{Fetched, PlatformClient};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn order(platform: &PlatformId, number: &str) -> Order {
    Order {
        platform: platform.clone(),
        order_number: number.to_string(),
        package_id: None,
        customer_name: "Grace Hopper".to_string(),
        customer_email: None,
        status: OrderStatus::New,
        currency: "TRY".to_string(),
        gross_amount: Decimal::new(4990, 2),
        total_discount: Decimal::ZERO,
        total_price: Decimal::new(4990, 2),
        order_date: DateTime::from_timestamp_millis(1_706_700_000_000).unwrap(),
        last_modified: None,
        cargo_provider: None,
        cargo_tracking_number: None,
        shipping_city: None,
        lines: vec![OrderLine {
            line_id: format!("{number}-1"),
            product_name: "Mug".to_string(),
            barcode: None,
            merchant_sku: None,
            quantity: 1,
            unit_price: Decimal::new(4990, 2),
            amount: Decimal::new(4990, 2),
            discount: Decimal::ZERO,
            color: None,
            size: None,
            status: OrderStatus::New,
        }],
    }
}

/// An order whose raw date could not be normalized.
pub fn unmappable_order(number: &str) -> Mapped<Order> {
    let err = normalize::timestamp_value("orderDate", &json!("not a date")).unwrap_err();
    Err(Error::mapping(format!("order {number}"), err.to_string()))
}

pub fn variant(platform: &PlatformId, main_id: &str, variant_id: &str) -> ProductVariant {
    ProductVariant {
        platform: platform.clone(),
        product_main_id: main_id.to_string(),
        title: format!("Product {main_id}"),
        subtitle: None,
        description: None,
        brand: None,
        category: None,
        detail: ProductVariantDetail {
            external_id: variant_id.to_string(),
            barcode: None,
            stock_code: None,
            quantity: 1,
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

/// Scripted [`PlatformClient`]: every fetch returns a copy of its script.
pub struct FakeClient {
    pub platform: PlatformId,
    pub orders: Fetched<Order>,
    pub products: Fetched<ProductVariant>,
    pub claims: Fetched<Claim>,
    pub transactions: Fetched<Transaction>,
    pub questions: Fetched<Question>,
    pub brands: Fetched<Brand>,
    pub categories: Fetched<Category>,
    /// Panic inside `fetch_orders`
    pub panic_on_orders: bool,
    /// Fetch calls received, across all sources
    pub calls: AtomicUsize,
    pub last_category: Mutex<Option<String>>,
}

impl FakeClient {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: PlatformId::new(platform),
            orders: Ok(Vec::new()),
            products: Ok(Vec::new()),
            claims: Ok(Vec::new()),
            transactions: Ok(Vec::new()),
            questions: Ok(Vec::new()),
            brands: Ok(Vec::new()),
            categories: Ok(Vec::new()),
            panic_on_orders: false,
            calls: AtomicUsize::new(0),
            last_category: Mutex::new(None),
        }
    }

    pub fn with_orders(mut self, orders: Fetched<Order>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_products(mut self, products: Fetched<ProductVariant>) -> Self {
        self.products = products;
        self
    }

    pub fn with_claims(mut self, claims: Fetched<Claim>) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_brands(mut self, brands: Fetched<Brand>) -> Self {
        self.brands = brands;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit<T: Clone>(&self, script: &Fetched<T>) -> Fetched<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        script.clone()
    }
}

#[async_trait]
impl PlatformClient for FakeClient {
    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    async fn fetch_orders(&self) -> Fetched<Order> {
        if self.panic_on_orders {
            panic!("order endpoint exploded");
        }
        self.hit(&self.orders)
    }

    async fn fetch_products(&self) -> Fetched<ProductVariant> {
        self.hit(&self.products)
    }

    async fn fetch_claims(&self) -> Fetched<Claim> {
        self.hit(&self.claims)
    }

    async fn fetch_transactions(&self) -> Fetched<Transaction> {
        self.hit(&self.transactions)
    }

    async fn fetch_questions(&self) -> Fetched<Question> {
        self.hit(&self.questions)
    }

    async fn fetch_brands(&self) -> Fetched<Brand> {
        self.hit(&self.brands)
    }

    async fn fetch_categories(&self) -> Fetched<Category> {
        self.hit(&self.categories)
    }

    async fn fetch_category_attributes(&self, category_id: &str) -> Fetched<Category> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_category.lock().unwrap() = Some(category_id.to_string());
        Ok(vec![Ok(Category {
            platform: self.platform.clone(),
            category_id: category_id.to_string(),
            name: "Mugs".to_string(),
            parent_id: None,
            attributes: vec![],
        })])
    }
}

pub fn unavailable<T>() -> Fetched<T> {
    Err(SyncError::SourceUnavailable("HTTP 503 Service Unavailable".to_string()))
}
