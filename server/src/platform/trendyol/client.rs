//! HTTP client for the Trendyol seller API.

use super::mapper;
use super::types::{BrandPage, CategoryTree, Page};
use crate::config::TrendyolConfig;
use crate::error::SyncError;
use crate::platform::{Fetched, PlatformClient};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeDelta, Utc};
use marketsync_engine::{
    Brand, Category, Claim, Order, PlatformId, ProductVariant, Question, Transaction,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Settlement transaction types fetched on every run.
const SETTLEMENT_TYPES: &[&str] = &["Sale", "Return", "Discount", "Coupon"];

/// Response bodies quoted in errors are cut to this many characters.
const ERROR_BODY_LIMIT: usize = 200;

/// Trendyol seller API client.
///
/// Credentials are turned into a Basic authorization header once, at
/// construction; they are never logged.
#[derive(Debug, Clone)]
pub struct TrendyolClient {
    platform: PlatformId,
    http: reqwest::Client,
    base_url: String,
    supplier_id: String,
    page_size: u32,
    max_pages: u32,
    settlement_lookback: TimeDelta,
}

impl TrendyolClient {
    pub fn new(config: &TrendyolConfig, timeout: Duration) -> Result<Self, SyncError> {
        let credentials = STANDARD.encode(format!("{}:{}", config.api_key, config.api_secret));
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| SyncError::Configuration(format!("trendyol credentials: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("{} - SelfIntegration", config.supplier_id))
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Configuration(format!("trendyol http client: {e}")))?;

        let settlement_lookback = TimeDelta::try_days(config.settlement_lookback_days)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or_else(|| {
                SyncError::Configuration(format!(
                    "settlement lookback of {} days is out of range",
                    config.settlement_lookback_days
                ))
            })?;

        Ok(Self {
            platform: PlatformId::trendyol(),
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            supplier_id: config.supplier_id.clone(),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages,
            settlement_lookback,
        })
    }

    fn seller_path(&self, area: &str, resource: &str) -> String {
        format!("/{area}/sellers/{}/{resource}", self.supplier_id)
    }

    /// GET one resource and decode its body.
    async fn get<T: DeserializeOwned>(
        &self,
        source: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::SourceUnavailable(format!("{source}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(SyncError::SourceUnavailable(format!(
                "{source}: HTTP {} {}",
                status.as_u16(),
                body
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::SourceUnavailable(format!("{source}: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| SyncError::MalformedResponse(format!("{source}: {e}")))
    }

    /// Walk `page = 0, 1, ...` until the last page, an empty page or the page
    /// limit, collecting every `content[]` element.
    async fn fetch_pages(
        &self,
        source: &'static str,
        path: &str,
        extra: &[(&'static str, String)],
    ) -> Result<Vec<Value>, SyncError> {
        let mut items = Vec::new();
        let mut page = 0u32;

        loop {
            if page >= self.max_pages {
                tracing::warn!(
                    platform = %self.platform,
                    source,
                    max_pages = self.max_pages,
                    "Page limit reached, remaining pages skipped"
                );
                break;
            }

            let mut query = vec![("page", page.to_string()), ("size", self.page_size.to_string())];
            query.extend(extra.iter().cloned());

            let envelope: Page = self.get(source, path, &query).await?;
            let received = envelope.content.len();
            tracing::debug!(
                platform = %self.platform,
                source,
                page = envelope.page,
                total_pages = envelope.total_pages,
                received,
                "Fetched page"
            );
            items.extend(envelope.content);

            if received == 0 || envelope.total_pages == 0 || page + 1 >= envelope.total_pages {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    fn map_all<T>(
        &self,
        items: Vec<Value>,
        map: fn(&PlatformId, Value) -> marketsync_engine::Mapped<T>,
    ) -> Vec<marketsync_engine::Mapped<T>> {
        items.into_iter().map(|raw| map(&self.platform, raw)).collect()
    }
}

#[async_trait]
impl PlatformClient for TrendyolClient {
    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    async fn fetch_orders(&self) -> Fetched<Order> {
        let path = self.seller_path("order", "orders");
        let order_by = [("orderByField", "PackageLastModifiedDate".to_string())];
        let items = self.fetch_pages("orders", &path, &order_by).await?;
        Ok(self.map_all(items, mapper::order))
    }

    async fn fetch_products(&self) -> Fetched<ProductVariant> {
        let path = self.seller_path("product", "products");
        let items = self.fetch_pages("products", &path, &[]).await?;
        Ok(self.map_all(items, mapper::product_variant))
    }

    async fn fetch_claims(&self) -> Fetched<Claim> {
        let path = self.seller_path("order", "claims");
        let items = self.fetch_pages("claims", &path, &[]).await?;
        Ok(self.map_all(items, mapper::claim))
    }

    async fn fetch_transactions(&self) -> Fetched<Transaction> {
        let path = self.seller_path("finance/che", "settlements");
        let end = Utc::now();
        let start = end - self.settlement_lookback;

        let mut items = Vec::new();
        for transaction_type in SETTLEMENT_TYPES {
            let extra = [
                ("transactionType", transaction_type.to_string()),
                ("startDate", start.timestamp_millis().to_string()),
                ("endDate", end.timestamp_millis().to_string()),
            ];
            items.extend(self.fetch_pages("settlements", &path, &extra).await?);
        }
        Ok(self.map_all(items, mapper::transaction))
    }

    async fn fetch_questions(&self) -> Fetched<Question> {
        let path = self.seller_path("qna", "questions/filter");
        let items = self.fetch_pages("questions", &path, &[]).await?;
        Ok(self.map_all(items, mapper::question))
    }

    /// Brands have no page count; pages are read until one comes back short.
    async fn fetch_brands(&self) -> Fetched<Brand> {
        let mut items = Vec::new();
        for page in 0..self.max_pages {
            let query = [("page", page.to_string()), ("size", self.page_size.to_string())];
            let body: BrandPage = self.get("brands", "/product/brands", &query).await?;
            let received = body.brands.len();
            items.extend(body.brands);
            if received < self.page_size as usize {
                break;
            }
        }
        Ok(self.map_all(items, mapper::brand))
    }

    async fn fetch_categories(&self) -> Fetched<Category> {
        let tree: CategoryTree = self
            .get("categories", "/product/product-categories", &[])
            .await?;
        let mut out = Vec::new();
        mapper::category_tree(&self.platform, tree.categories, &mut out);
        Ok(out)
    }

    async fn fetch_category_attributes(&self, category_id: &str) -> Fetched<Category> {
        let path = format!("/product/product-categories/{category_id}/attributes");
        let body: Value = self.get("category attributes", &path, &[]).await?;
        if !body.is_object() {
            return Err(SyncError::MalformedResponse(
                "category attributes: expected an object".to_string(),
            ));
        }
        Ok(vec![mapper::category_attributes(&self.platform, body)])
    }
}
