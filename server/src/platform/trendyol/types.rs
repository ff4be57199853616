//! Trendyol seller API payloads.
//!
//! Numbers, timestamps and identifiers are kept as raw JSON values: the API
//! sends them as numbers or strings depending on the endpoint, and the
//! normalizer decides per field.

use serde::Deserialize;
use serde_json::Value;

/// Paginated envelope shared by orders, products, claims, settlements and questions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub content: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BrandPage {
    pub brands: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryTree {
    pub categories: Vec<Value>,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOrder {
    pub order_number: Value,
    /// Shipment package id
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub customer_first_name: Option<String>,
    #[serde(default)]
    pub customer_last_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shipment_package_status: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub gross_amount: Value,
    #[serde(default)]
    pub total_discount: Value,
    #[serde(default)]
    pub total_price: Value,
    #[serde(default)]
    pub order_date: Value,
    #[serde(default)]
    pub last_modified_date: Value,
    #[serde(default)]
    pub cargo_provider_name: Option<String>,
    #[serde(default)]
    pub cargo_tracking_number: Value,
    #[serde(default)]
    pub shipment_address: Option<WireAddress>,
    #[serde(default)]
    pub lines: Vec<WireOrderLine>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAddress {
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOrderLine {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub merchant_sku: Option<String>,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub discount: Value,
    #[serde(default)]
    pub product_color: Option<String>,
    #[serde(default)]
    pub product_size: Option<String>,
    #[serde(default)]
    pub order_line_item_status_name: Option<String>,
}

// ============================================================================
// Products
// ============================================================================

/// One variant row; rows sharing `productMainId` belong to one product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProduct {
    #[serde(default)]
    pub id: Value,
    pub product_main_id: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub list_price: Value,
    #[serde(default)]
    pub sale_price: Value,
    #[serde(default)]
    pub vat_rate: Value,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub attributes: Vec<WireProductAttribute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProductAttribute {
    #[serde(default)]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub attribute_value: Value,
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireClaim {
    pub id: Value,
    #[serde(default)]
    pub order_number: Value,
    #[serde(default)]
    pub customer_first_name: Option<String>,
    #[serde(default)]
    pub customer_last_name: Option<String>,
    #[serde(default)]
    pub order_date: Value,
    #[serde(default)]
    pub claim_date: Value,
    #[serde(default)]
    pub cargo_provider_name: Option<String>,
    #[serde(default)]
    pub cargo_tracking_number: Value,
    #[serde(default)]
    pub items: Vec<WireClaimLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireClaimLine {
    pub order_line: WireClaimOrderLine,
    #[serde(default)]
    pub claim_items: Vec<WireClaimItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireClaimOrderLine {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub merchant_sku: Option<String>,
    #[serde(default)]
    pub price: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireClaimItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub customer_claim_item_reason: Option<WireNamed>,
    #[serde(default)]
    pub claim_item_status: Option<WireNamed>,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub resolved: bool,
}

/// `{id, name}` pairs: reasons, statuses, attributes and their values.
#[derive(Debug, Deserialize)]
pub(crate) struct WireNamed {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Settlements, questions, catalog
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSettlement {
    pub id: Value,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub transaction_date: Value,
    #[serde(default)]
    pub order_number: Value,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub debt: Value,
    #[serde(default)]
    pub credit: Value,
    #[serde(default)]
    pub commission_rate: Value,
    #[serde(default)]
    pub commission_amount: Value,
    #[serde(default)]
    pub seller_revenue: Value,
    #[serde(default)]
    pub payment_date: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireQuestion {
    pub id: Value,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_main_id: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creation_date: Value,
    #[serde(default)]
    pub answer: Option<WireAnswer>,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAnswer {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub creation_date: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCategory {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Value,
    #[serde(default)]
    pub sub_categories: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCategoryAttributes {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category_attributes: Vec<WireCategoryAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCategoryAttribute {
    pub attribute: WireNamed,
    #[serde(default)]
    pub attribute_values: Vec<WireNamed>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allow_custom: bool,
    #[serde(default)]
    pub varianter: bool,
}
