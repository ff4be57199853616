use crate::entity::{ChildMerge, Entity};
use crate::normalize::QuestionStatus;
use crate::PlatformId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer question about a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub platform: PlatformId,
    pub question_id: String,
    pub text: String,
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
    pub product_main_id: Option<String>,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub public: bool,
}

impl Entity for Question {
    const COLLECTION: &'static str = "questions";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.question_id.clone()
    }

    fn merge_from(&mut self, incoming: Self) -> ChildMerge {
        *self = incoming;
        ChildMerge::default()
    }
}
