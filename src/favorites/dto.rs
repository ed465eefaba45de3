use serde::{Deserialize, Serialize};

/// Request body for saving a favorite. Name and price are a display snapshot
/// taken at save time, not kept in sync with the catalog.
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub product_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AddFavoriteResponse {
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveFavoriteResponse {
    pub removed: bool,
}
