//! Canonical records, independent of any marketplace wire format.

mod catalog;
mod claim;
mod order;
mod product;
mod question;
mod transaction;

pub use catalog::{AttributeValue, Brand, Category, CategoryAttribute};
pub use claim::{Claim, ClaimItem, ClaimLineGroup};
pub use order::{Order, OrderLine};
pub use product::{Product, ProductAttribute, ProductVariant, ProductVariantDetail};
pub use question::Question;
pub use transaction::Transaction;
