use serde::Serialize;

use super::erp::Product;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cached_products: usize,
    pub cache_age_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub count: usize,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct BrandsResponse {
    pub brands: Vec<String>,
    pub count: usize,
}
