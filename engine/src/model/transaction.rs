use crate::entity::{ChildMerge, Entity};
use crate::PlatformId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A settlement / financial transaction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub platform: PlatformId,
    pub transaction_id: String,
    pub transaction_type: String,
    pub transaction_date: DateTime<Utc>,
    pub order_number: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub debt: Decimal,
    pub credit: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub seller_revenue: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
}

impl Entity for Transaction {
    const COLLECTION: &'static str = "transactions";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.transaction_id.clone()
    }

    fn merge_from(&mut self, incoming: Self) -> ChildMerge {
        *self = incoming;
        ChildMerge::default()
    }
}
