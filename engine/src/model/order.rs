use crate::entity::{merge_children, ChildEntity, ChildMerge, Entity};
use crate::normalize::OrderStatus;
use crate::PlatformId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order (shipment package) header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub platform: PlatformId,
    pub order_number: String,
    /// Source shipment package id, kept for reference only.
    pub package_id: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    pub currency: String,
    pub gross_amount: Decimal,
    pub total_discount: Decimal,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub cargo_provider: Option<String>,
    pub cargo_tracking_number: Option<String>,
    pub shipping_city: Option<String>,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub line_id: String,
    pub product_name: String,
    pub barcode: Option<String>,
    pub merchant_sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub discount: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
    pub status: OrderStatus,
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.order_number.clone()
    }

    fn merge_from(&mut self, mut incoming: Self) -> ChildMerge {
        let lines = std::mem::take(&mut incoming.lines);
        let kept = std::mem::take(&mut self.lines);
        *self = incoming;
        self.lines = kept;
        merge_children(&mut self.lines, lines)
    }
}

impl ChildEntity for OrderLine {
    fn child_key(&self) -> String {
        self.line_id.clone()
    }
}
