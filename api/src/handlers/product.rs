use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::product_cache::{CachedProductDetailV1, ListCacheKey, ProductCacheComposer};
use crate::rank_reader::RankReader;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(rename = "productId")]
    pub product_id: i64,
    pub name: String,
    pub stock: i64,
    pub rank: Option<i64>,
}

impl From<CachedProductDetailV1> for ProductDetailResponse {
    fn from(d: CachedProductDetailV1) -> Self {
        Self { product_id: d.product_id, name: d.name, stock: d.stock, rank: d.rank }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductDetailQuery {
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// `GET /api/v1/products/:id` — findProductById from C11.
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Query(query): Query<ProductDetailQuery>,
) -> ApiResult<Json<ProductDetailResponse>> {
    let rank_source = RankReader::new(&state.db, state.redis.clone());
    let composer = ProductCacheComposer::new(&state.cache, state.product_store.as_ref(), &rank_source);

    let detail = composer
        .find_product_by_id(product_id, query.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("product {product_id} not found")))?;

    Ok(Json(detail.into()))
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub brand_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductDetailResponse>,
    pub total: i64,
}

fn sort_key(sort: Option<&str>) -> &'static str {
    match sort {
        Some("latest") => "latest",
        _ => "popular",
    }
}

/// `GET /api/v1/products` — findProducts from C11.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(20).max(1);
    let key = ListCacheKey { page, size, sort: sort_key(query.sort.as_deref()), brand_id: query.brand_id };

    let rank_source = RankReader::new(&state.db, state.redis.clone());
    let composer = ProductCacheComposer::new(&state.cache, state.product_store.as_ref(), &rank_source);

    let (items, total) = composer.find_products(key, page).await?;

    Ok(Json(ProductListResponse { products: items.into_iter().map(Into::into).collect(), total }))
}
