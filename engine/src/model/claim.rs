use crate::entity::{merge_children, ChildEntity, ChildMerge, Entity};
use crate::normalize::ClaimStatus;
use crate::PlatformId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A return/claim opened against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub platform: PlatformId,
    pub claim_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub order_date: Option<DateTime<Utc>>,
    pub claim_date: DateTime<Utc>,
    pub cargo_provider: Option<String>,
    pub cargo_tracking_number: Option<String>,
    pub line_groups: Vec<ClaimLineGroup>,
}

/// The claimed items of one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLineGroup {
    pub order_line_id: String,
    pub product_name: String,
    pub barcode: Option<String>,
    pub merchant_sku: Option<String>,
    pub price: Decimal,
    pub items: Vec<ClaimItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimItem {
    pub claim_item_id: String,
    pub reason: Option<String>,
    pub status: ClaimStatus,
    pub customer_note: Option<String>,
    pub resolved: bool,
}

impl Claim {
    /// Total number of claim items over all line groups.
    pub fn item_count(&self) -> usize {
        self.line_groups.iter().map(|g| g.items.len()).sum()
    }
}

impl Entity for Claim {
    const COLLECTION: &'static str = "claims";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.claim_id.clone()
    }

    fn merge_from(&mut self, mut incoming: Self) -> ChildMerge {
        let groups = std::mem::take(&mut incoming.line_groups);
        let kept = std::mem::take(&mut self.line_groups);
        *self = incoming;
        self.line_groups = kept;
        merge_children(&mut self.line_groups, groups)
    }
}

impl ChildEntity for ClaimLineGroup {
    fn child_key(&self) -> String {
        self.order_line_id.clone()
    }

    fn merge_from(&mut self, mut incoming: Self) -> ChildMerge {
        let items = std::mem::take(&mut incoming.items);
        let kept = std::mem::take(&mut self.items);
        *self = incoming;
        self.items = kept;
        merge_children(&mut self.items, items)
    }
}

impl ChildEntity for ClaimItem {
    fn child_key(&self) -> String {
        self.claim_item_id.clone()
    }
}
