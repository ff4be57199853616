//! Catalog reference data: categories (with their attribute definitions) and brands.

use crate::entity::{merge_children, ChildEntity, ChildMerge, Entity};
use crate::PlatformId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub platform: PlatformId,
    pub category_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    /// Attribute definitions; empty when only the category tree was fetched.
    pub attributes: Vec<CategoryAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttribute {
    pub attribute_id: String,
    pub name: String,
    pub required: bool,
    pub allow_custom: bool,
    pub varianter: bool,
    pub values: Vec<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub id: String,
    pub name: String,
}

/// A brand, identified by its name within a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub platform: PlatformId,
    pub name: String,
    pub brand_id: Option<String>,
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.category_id.clone()
    }

    fn merge_from(&mut self, mut incoming: Self) -> ChildMerge {
        let attributes = std::mem::take(&mut incoming.attributes);
        let kept = std::mem::take(&mut self.attributes);
        // The attribute endpoint does not report the parent.
        if incoming.parent_id.is_none() {
            incoming.parent_id = self.parent_id.take();
        }
        *self = incoming;
        self.attributes = kept;
        merge_children(&mut self.attributes, attributes)
    }
}

impl ChildEntity for CategoryAttribute {
    fn child_key(&self) -> String {
        self.attribute_id.clone()
    }
}

impl Entity for Brand {
    const COLLECTION: &'static str = "brands";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.name.clone()
    }

    fn merge_from(&mut self, incoming: Self) -> ChildMerge {
        *self = incoming;
        ChildMerge::default()
    }
}
