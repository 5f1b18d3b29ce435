//! HTTP client for the external product service that owns product identity
//! and inventory (generic product CRUD is out of scope for this service).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use trendrank_core::{CoreError, CoreResult};

use crate::product_cache::{CachedProductDetailV1, ListCacheKey, ProductStore};

pub struct HttpProductStore {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProductDetailResponse {
    product_id: i64,
    name: String,
    stock: i64,
}

#[derive(Debug, Deserialize)]
struct ProductListResponse {
    product_ids: Vec<i64>,
    total: i64,
}

impl HttpProductStore {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { endpoint, client }
    }
}

#[async_trait]
impl ProductStore for HttpProductStore {
    async fn fetch_detail(&self, product_id: i64) -> CoreResult<Option<CachedProductDetailV1>> {
        let url = format!("{}/products/{}", self.endpoint, product_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!("product service returned {}", response.status())));
        }

        let body: ProductDetailResponse =
            response.json().await.map_err(|e| CoreError::Upstream(e.to_string()))?;
        Ok(Some(CachedProductDetailV1 {
            product_id: body.product_id,
            name: body.name,
            stock: body.stock,
            rank: None,
        }))
    }

    async fn fetch_list_ids(&self, criteria: &ListCacheKey) -> CoreResult<(Vec<i64>, i64)> {
        let mut url = format!(
            "{}/products?page={}&size={}&sort={}",
            self.endpoint, criteria.page, criteria.size, criteria.sort
        );
        if let Some(brand_id) = criteria.brand_id {
            url.push_str(&format!("&brandId={}", brand_id));
        }

        let response = self.client.get(&url).send().await.map_err(|e| CoreError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!("product service returned {}", response.status())));
        }

        let body: ProductListResponse =
            response.json().await.map_err(|e| CoreError::Upstream(e.to_string()))?;
        Ok((body.product_ids, body.total))
    }
}
