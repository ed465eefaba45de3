use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use super::dto::{BrandsResponse, HealthResponse, ProductsResponse};
use super::erp::Product;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(products))
        .route("/products/brands", get(brands))
        .route("/products/brand/:brand", get(products_by_brand))
        .route("/images/:item_code", get(item_image))
}

/// Serves from the cache while fresh; on upstream failure the last snapshot
/// is better than an empty storefront.
async fn cached_products(state: &AppState) -> Arc<Vec<Product>> {
    if let Some(snapshot) = state.catalog.fresh().await {
        return snapshot;
    }
    match state.erp.fetch_products().await {
        Ok(list) => state.catalog.store(list).await,
        Err(e) => {
            warn!(error = %e, "catalog refresh failed; serving stale snapshot");
            state.catalog.stale().await.unwrap_or_default()
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cached = state.catalog.stale().await.map(|p| p.len()).unwrap_or(0);
    Json(HealthResponse {
        status: "healthy",
        cached_products: cached,
        cache_age_secs: state.catalog.age().await.map(|a| a.as_secs()),
    })
}

#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Json<ProductsResponse> {
    let cached = state.catalog.fresh().await.is_some();
    let snapshot = cached_products(&state).await;
    Json(ProductsResponse {
        products: (*snapshot).clone(),
        count: snapshot.len(),
        cached,
    })
}

#[instrument(skip(state))]
pub async fn brands(State(state): State<AppState>) -> Json<BrandsResponse> {
    let snapshot = cached_products(&state).await;
    let brands: BTreeSet<String> = snapshot
        .iter()
        .filter(|p| !p.item_group.is_empty())
        .map(|p| p.item_group.clone())
        .collect();
    let brands: Vec<String> = brands.into_iter().collect();
    let count = brands.len();
    Json(BrandsResponse { brands, count })
}

#[instrument(skip(state))]
pub async fn products_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Json<ProductsResponse> {
    let cached = state.catalog.fresh().await.is_some();
    let snapshot = cached_products(&state).await;
    let needle = brand.to_lowercase();
    let products: Vec<Product> = snapshot
        .iter()
        .filter(|p| p.item_group.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    let count = products.len();
    Json(ProductsResponse {
        products,
        count,
        cached,
    })
}

#[instrument(skip(state))]
pub async fn item_image(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> Result<([(header::HeaderName, &'static str); 1], Bytes), (StatusCode, String)> {
    // item codes are plain SKUs; anything else would escape the image dir
    if item_code.is_empty()
        || !item_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err((StatusCode::NOT_FOUND, "image not found".into()));
    }

    let path: PathBuf = [state.config.image_dir.as_str(), &format!("{item_code}.jpg")]
        .iter()
        .collect();

    if let Ok(bytes) = tokio::fs::read(&path).await {
        debug!(%item_code, "image served from disk cache");
        return Ok(([(header::CONTENT_TYPE, "image/jpeg")], Bytes::from(bytes)));
    }

    let bytes = state.erp.fetch_image(&item_code).await.map_err(|e| {
        warn!(error = %e, %item_code, "image fetch failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "image fetch failed".into())
    })?;
    let Some(bytes) = bytes else {
        return Err((StatusCode::NOT_FOUND, "image not found".into()));
    };

    if let Err(e) = tokio::fs::create_dir_all(&state.config.image_dir).await {
        warn!(error = %e, "create image dir failed");
    } else if let Err(e) = tokio::fs::write(&path, &bytes).await {
        warn!(error = %e, %item_code, "image cache write failed");
    }

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
