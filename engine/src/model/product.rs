use crate::entity::{merge_children, ChildEntity, ChildMerge, Entity};
use crate::{Mapped, NaturalKey, PlatformId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One flat variant row as the marketplace lists it.
///
/// Variants sharing a `product_main_id` belong to the same [`Product`]; see
/// [`Product::group`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub platform: PlatformId,
    pub product_main_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub detail: ProductVariantDetail,
}

/// A product header assembled from its variant rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub platform: PlatformId,
    pub product_main_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub details: Vec<ProductVariantDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantDetail {
    /// Source id of the variant row.
    pub external_id: String,
    pub barcode: Option<String>,
    pub stock_code: Option<String>,
    pub quantity: i64,
    pub list_price: Decimal,
    pub sale_price: Decimal,
    pub vat_rate: Decimal,
    pub approved: bool,
    pub archived: bool,
    pub on_sale: bool,
    pub images: Vec<String>,
    pub attributes: Vec<ProductAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
}

impl Product {
    /// Start a product from its first variant row.
    fn from_first(row: ProductVariant) -> Self {
        Product {
            platform: row.platform,
            product_main_id: row.product_main_id,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            brand: row.brand,
            category: row.category,
            details: vec![row.detail],
        }
    }

    /// Group flat variant rows into products by `(platform, product_main_id)`.
    ///
    /// Products come out in order of first appearance. The first row of each
    /// group supplies the header fields and every row contributes one detail.
    /// Rows that failed to map stay in the output as errors at their own
    /// position and do not affect their group.
    pub fn group(rows: Vec<Mapped<ProductVariant>>) -> Vec<Mapped<Product>> {
        let mut out: Vec<Mapped<Product>> = Vec::new();
        let mut index: HashMap<NaturalKey, usize> = HashMap::new();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    out.push(Err(err));
                    continue;
                }
            };

            let key = NaturalKey::new(row.platform.clone(), row.product_main_id.clone());
            match index.get(&key) {
                Some(&pos) => {
                    if let Ok(product) = &mut out[pos] {
                        merge_children(&mut product.details, vec![row.detail]);
                    }
                }
                None => {
                    index.insert(key, out.len());
                    out.push(Ok(Product::from_first(row)));
                }
            }
        }

        out
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";

    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn key_value(&self) -> String {
        self.product_main_id.clone()
    }

    fn merge_from(&mut self, mut incoming: Self) -> ChildMerge {
        let details = std::mem::take(&mut incoming.details);
        let kept = std::mem::take(&mut self.details);
        *self = incoming;
        self.details = kept;
        merge_children(&mut self.details, details)
    }
}

impl ChildEntity for ProductVariantDetail {
    fn child_key(&self) -> String {
        self.external_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn row(main_id: &str, variant: &str, title: &str) -> ProductVariant {
        ProductVariant {
            platform: PlatformId::trendyol(),
            product_main_id: main_id.to_string(),
            title: title.to_string(),
            subtitle: None,
            description: Some(format!("{title} description")),
            brand: Some("Acme".to_string()),
            category: None,
            detail: ProductVariantDetail {
                external_id: variant.to_string(),
                barcode: Some(format!("BC-{variant}")),
                stock_code: None,
                quantity: 10,
                list_price: Decimal::new(200, 0),
                sale_price: Decimal::new(150, 0),
                vat_rate: Decimal::new(20, 0),
                approved: true,
                archived: false,
                on_sale: true,
                images: vec![],
                attributes: vec![],
            },
        }
    }

    #[test]
    fn groups_variants_under_first_header() {
        let grouped = Product::group(vec![
            Ok(row("P1", "v1", "First")),
            Ok(row("P2", "v9", "Other")),
            Ok(row("P1", "v2", "Second")),
            Ok(row("P1", "v3", "Third")),
        ]);

        assert_eq!(grouped.len(), 2);
        let p1 = grouped[0].as_ref().unwrap();
        assert_eq!(p1.product_main_id, "P1");
        assert_eq!(p1.title, "First");
        assert_eq!(p1.details.len(), 3);
        assert_eq!(grouped[1].as_ref().unwrap().product_main_id, "P2");
    }

    #[test]
    fn failed_rows_stay_in_place() {
        let grouped = Product::group(vec![
            Ok(row("P1", "v1", "First")),
            Err(Error::mapping("product row 2", "missing productMainId")),
            Ok(row("P1", "v2", "Second")),
        ]);

        assert_eq!(grouped.len(), 2);
        assert!(grouped[1].is_err());
        assert_eq!(grouped[0].as_ref().unwrap().details.len(), 2);
    }

    #[test]
    fn same_main_id_on_other_platform_is_another_product() {
        let mut other = row("P1", "v1", "Elsewhere");
        other.platform = PlatformId::new("hepsiburada");

        let grouped = Product::group(vec![Ok(row("P1", "v1", "Here")), Ok(other)]);
        assert_eq!(grouped.len(), 2);
    }
}
