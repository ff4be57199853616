//! Wire payload to canonical entity mapping.
//!
//! Every function takes one raw `content[]` element and never fails the
//! batch: decoding and normalization problems come back as a
//! [`marketsync_engine::Error::RecordMapping`] for that element.

use super::types::*;
use marketsync_engine::normalize::{self, FieldError};
use marketsync_engine::{
    merge_children, AttributeValue, Brand, Category, CategoryAttribute, Claim, ClaimItem,
    ClaimLineGroup, Error, Mapped, Order, OrderLine, PlatformId, ProductAttribute, ProductVariant,
    ProductVariantDetail, Question, Transaction,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Human-readable record label used in mapping errors.
fn label(kind: &str, raw: &Value, id_field: &str) -> String {
    match raw.get(id_field).and_then(text) {
        Some(id) => format!("{kind} {id}"),
        None => format!("{kind} without {id_field}"),
    }
}

fn decode<T: DeserializeOwned>(label: &str, raw: Value) -> Mapped<T> {
    serde_json::from_value(raw).map_err(|e| Error::mapping(label, e.to_string()))
}

/// Optional free-text or numeric identifier as a trimmed string.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn full_name(first: Option<String>, last: Option<String>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn order(platform: &PlatformId, raw: Value) -> Mapped<Order> {
    let label = label("order", &raw, "orderNumber");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireOrder = decode(&label, raw)?;

    let lines = wire
        .lines
        .into_iter()
        .map(order_line)
        .collect::<Result<Vec<_>, _>>()
        .map_err(fail)?;

    let status = wire.status.or(wire.shipment_package_status).unwrap_or_default();

    Ok(Order {
        platform: platform.clone(),
        order_number: normalize::id_value("orderNumber", &wire.order_number).map_err(fail)?,
        package_id: text(&wire.id),
        customer_name: full_name(wire.customer_first_name, wire.customer_last_name),
        customer_email: wire.customer_email,
        status: normalize::order_status(&status),
        currency: wire.currency_code.unwrap_or_else(|| "TRY".to_string()),
        gross_amount: normalize::decimal_value("grossAmount", &wire.gross_amount).map_err(fail)?,
        total_discount: normalize::decimal_value("totalDiscount", &wire.total_discount)
            .map_err(fail)?,
        total_price: normalize::decimal_value("totalPrice", &wire.total_price).map_err(fail)?,
        order_date: normalize::timestamp_value("orderDate", &wire.order_date).map_err(fail)?,
        last_modified: normalize::optional_timestamp_value(
            "lastModifiedDate",
            &wire.last_modified_date,
        )
        .map_err(fail)?,
        cargo_provider: wire.cargo_provider_name,
        cargo_tracking_number: text(&wire.cargo_tracking_number),
        shipping_city: wire.shipment_address.and_then(|a| a.city),
        lines,
    })
}

fn order_line(line: WireOrderLine) -> Result<OrderLine, FieldError> {
    Ok(OrderLine {
        line_id: normalize::id_value("lines.id", &line.id)?,
        product_name: line.product_name.unwrap_or_default(),
        barcode: line.barcode,
        merchant_sku: line.merchant_sku,
        quantity: normalize::integer_value("lines.quantity", &line.quantity)?,
        unit_price: normalize::decimal_value("lines.price", &line.price)?,
        amount: normalize::decimal_value("lines.amount", &line.amount)?,
        discount: normalize::decimal_value("lines.discount", &line.discount)?,
        color: line.product_color,
        size: line.product_size,
        status: normalize::order_status(
            line.order_line_item_status_name
                .as_deref()
                .unwrap_or_default(),
        ),
    })
}

pub(crate) fn product_variant(platform: &PlatformId, raw: Value) -> Mapped<ProductVariant> {
    let label = label("product", &raw, "productMainId");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireProduct = decode(&label, raw)?;

    // Older payloads omit the variant id; the barcode is unique per variant.
    let external_id = match text(&wire.id) {
        Some(id) => id,
        None => normalize::non_empty("barcode", wire.barcode.as_deref().unwrap_or_default())
            .map_err(fail)?,
    };

    let detail = ProductVariantDetail {
        external_id,
        barcode: wire.barcode,
        stock_code: wire.stock_code,
        quantity: normalize::integer_value("quantity", &wire.quantity).map_err(fail)?,
        list_price: normalize::decimal_value("listPrice", &wire.list_price).map_err(fail)?,
        sale_price: normalize::decimal_value("salePrice", &wire.sale_price).map_err(fail)?,
        vat_rate: normalize::decimal_value("vatRate", &wire.vat_rate).map_err(fail)?,
        approved: wire.approved,
        archived: wire.archived,
        on_sale: wire.on_sale,
        images: wire.images.into_iter().map(|i| i.url).collect(),
        attributes: wire
            .attributes
            .into_iter()
            .filter_map(|a| {
                Some(ProductAttribute {
                    name: a.attribute_name?,
                    value: text(&a.attribute_value).unwrap_or_default(),
                })
            })
            .collect(),
    };

    Ok(ProductVariant {
        platform: platform.clone(),
        product_main_id: normalize::id_value("productMainId", &wire.product_main_id)
            .map_err(fail)?,
        title: wire.title.unwrap_or_default(),
        subtitle: None,
        description: wire.description,
        brand: wire.brand,
        category: wire.category_name,
        detail,
    })
}

pub(crate) fn claim(platform: &PlatformId, raw: Value) -> Mapped<Claim> {
    let label = label("claim", &raw, "id");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireClaim = decode(&label, raw)?;

    // A claim can list the same order line more than once; fold those together.
    let mut line_groups: Vec<ClaimLineGroup> = Vec::new();
    for line in wire.items {
        let group = claim_line(line).map_err(fail)?;
        merge_children(&mut line_groups, vec![group]);
    }

    Ok(Claim {
        platform: platform.clone(),
        claim_id: normalize::id_value("id", &wire.id).map_err(fail)?,
        order_number: normalize::id_value("orderNumber", &wire.order_number).map_err(fail)?,
        customer_name: full_name(wire.customer_first_name, wire.customer_last_name),
        order_date: normalize::optional_timestamp_value("orderDate", &wire.order_date)
            .map_err(fail)?,
        claim_date: normalize::timestamp_value("claimDate", &wire.claim_date).map_err(fail)?,
        cargo_provider: wire.cargo_provider_name,
        cargo_tracking_number: text(&wire.cargo_tracking_number),
        line_groups,
    })
}

fn claim_line(line: WireClaimLine) -> Result<ClaimLineGroup, FieldError> {
    let items = line
        .claim_items
        .into_iter()
        .map(|item| -> Result<ClaimItem, FieldError> {
            Ok(ClaimItem {
                claim_item_id: normalize::id_value("claimItems.id", &item.id)?,
                reason: item.customer_claim_item_reason.and_then(|r| r.name),
                status: normalize::claim_status(
                    item.claim_item_status
                        .and_then(|s| s.name)
                        .as_deref()
                        .unwrap_or_default(),
                ),
                customer_note: item.customer_note,
                resolved: item.resolved,
            })
        })
        .collect::<Result<Vec<_>, FieldError>>()?;

    Ok(ClaimLineGroup {
        order_line_id: normalize::id_value("orderLine.id", &line.order_line.id)?,
        product_name: line.order_line.product_name.unwrap_or_default(),
        barcode: line.order_line.barcode,
        merchant_sku: line.order_line.merchant_sku,
        price: normalize::decimal_value("orderLine.price", &line.order_line.price)?,
        items,
    })
}

pub(crate) fn transaction(platform: &PlatformId, raw: Value) -> Mapped<Transaction> {
    let label = label("settlement", &raw, "id");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireSettlement = decode(&label, raw)?;

    Ok(Transaction {
        platform: platform.clone(),
        transaction_id: normalize::id_value("id", &wire.id).map_err(fail)?,
        transaction_type: wire.transaction_type.unwrap_or_default(),
        transaction_date: normalize::timestamp_value("transactionDate", &wire.transaction_date)
            .map_err(fail)?,
        order_number: text(&wire.order_number),
        barcode: wire.barcode,
        description: wire.description,
        debt: normalize::decimal_value("debt", &wire.debt).map_err(fail)?,
        credit: normalize::decimal_value("credit", &wire.credit).map_err(fail)?,
        commission_rate: normalize::decimal_value("commissionRate", &wire.commission_rate)
            .map_err(fail)?,
        commission_amount: normalize::decimal_value("commissionAmount", &wire.commission_amount)
            .map_err(fail)?,
        seller_revenue: normalize::decimal_value("sellerRevenue", &wire.seller_revenue)
            .map_err(fail)?,
        payment_date: normalize::optional_timestamp_value("paymentDate", &wire.payment_date)
            .map_err(fail)?,
    })
}

pub(crate) fn question(platform: &PlatformId, raw: Value) -> Mapped<Question> {
    let label = label("question", &raw, "id");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireQuestion = decode(&label, raw)?;

    let (answer, answered_at) = match wire.answer {
        Some(answer) => (
            answer.text,
            normalize::optional_timestamp_value("answer.creationDate", &answer.creation_date)
                .map_err(fail)?,
        ),
        None => (None, None),
    };

    Ok(Question {
        platform: platform.clone(),
        question_id: normalize::id_value("id", &wire.id).map_err(fail)?,
        text: wire.text.unwrap_or_default(),
        customer_name: wire.user_name,
        product_name: wire.product_name,
        product_main_id: text(&wire.product_main_id),
        status: normalize::question_status(wire.status.as_deref().unwrap_or_default()),
        created_at: normalize::timestamp_value("creationDate", &wire.creation_date).map_err(fail)?,
        answer,
        answered_at,
        public: wire.public,
    })
}

pub(crate) fn brand(platform: &PlatformId, raw: Value) -> Mapped<Brand> {
    let label = label("brand", &raw, "id");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireNamed = decode(&label, raw)?;

    Ok(Brand {
        platform: platform.clone(),
        name: normalize::non_empty("name", wire.name.as_deref().unwrap_or_default())
            .map_err(fail)?,
        brand_id: text(&wire.id),
    })
}

/// Categories nested deeper than this are reported instead of visited.
const MAX_CATEGORY_DEPTH: usize = 32;

/// Flatten a category tree depth-first, parents before their children.
///
/// A node that cannot be decoded is reported once and its subtree is lost; a
/// node with a bad id is reported but its children are still visited. A node
/// without `parentId` takes the id of the node it is nested in.
pub(crate) fn category_tree(
    platform: &PlatformId,
    nodes: Vec<Value>,
    out: &mut Vec<Mapped<Category>>,
) {
    flatten_categories(platform, nodes, None, 0, out);
}

fn flatten_categories(
    platform: &PlatformId,
    nodes: Vec<Value>,
    parent: Option<&str>,
    depth: usize,
    out: &mut Vec<Mapped<Category>>,
) {
    for raw in nodes {
        let label = label("category", &raw, "id");
        if depth >= MAX_CATEGORY_DEPTH {
            out.push(Err(Error::mapping(
                label.as_str(),
                format!("nested deeper than {MAX_CATEGORY_DEPTH} levels"),
            )));
            continue;
        }

        let wire: WireCategory = match decode(&label, raw) {
            Ok(wire) => wire,
            Err(err) => {
                out.push(Err(err));
                continue;
            }
        };

        let category = normalize::id_value("id", &wire.id)
            .map(|category_id| Category {
                platform: platform.clone(),
                category_id,
                name: wire.name.unwrap_or_default(),
                parent_id: text(&wire.parent_id).or_else(|| parent.map(str::to_string)),
                attributes: Vec::new(),
            })
            .map_err(|e| Error::mapping(label.as_str(), e.to_string()));
        let id = category.as_ref().ok().map(|c| c.category_id.clone());
        out.push(category);

        flatten_categories(platform, wire.sub_categories, id.as_deref(), depth + 1, out);
    }
}

pub(crate) fn category_attributes(platform: &PlatformId, raw: Value) -> Mapped<Category> {
    let label = label("category", &raw, "id");
    let fail = |e: FieldError| Error::mapping(label.as_str(), e.to_string());
    let wire: WireCategoryAttributes = decode(&label, raw)?;

    let attributes = wire
        .category_attributes
        .into_iter()
        .map(|a| -> Result<CategoryAttribute, FieldError> {
            Ok(CategoryAttribute {
                attribute_id: normalize::id_value("attribute.id", &a.attribute.id)?,
                name: a.attribute.name.unwrap_or_default(),
                required: a.required,
                allow_custom: a.allow_custom,
                varianter: a.varianter,
                values: a
                    .attribute_values
                    .into_iter()
                    .filter_map(|v| {
                        Some(AttributeValue {
                            id: text(&v.id)?,
                            name: v.name.unwrap_or_default(),
                        })
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, FieldError>>()
        .map_err(fail)?;

    Ok(Category {
        platform: platform.clone(),
        category_id: normalize::id_value("id", &wire.id).map_err(fail)?,
        name: wire.display_name.or(wire.name).unwrap_or_default(),
        parent_id: None,
        attributes,
    })
}
