use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{AddFavoriteRequest, AddFavoriteResponse, RemoveFavoriteResponse};
use super::repo::Favorite;
use crate::auth::extractors::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list).post(add))
        .route("/favorites/:product_id", delete(remove))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "favorites storage failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

#[instrument(skip(state, current), fields(user_id = current.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<Vec<Favorite>>, (StatusCode, String)> {
    let favorites = Favorite::list_by_user(&state.db, current.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(favorites))
}

#[instrument(skip(state, current, payload), fields(user_id = current.user_id))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<Json<AddFavoriteResponse>, (StatusCode, String)> {
    let added = Favorite::add(
        &state.db,
        current.user_id,
        &payload.product_id,
        payload.product_name.as_deref(),
        payload.product_price,
    )
    .await
    .map_err(internal)?;
    if added {
        info!(product_id = %payload.product_id, "favorite added");
    }
    Ok(Json(AddFavoriteResponse { added }))
}

#[instrument(skip(state, current), fields(user_id = current.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(product_id): Path<String>,
) -> Result<Json<RemoveFavoriteResponse>, (StatusCode, String)> {
    let removed = Favorite::remove(&state.db, current.user_id, &product_id)
        .await
        .map_err(internal)?;
    if removed {
        info!(product_id = %product_id, "favorite removed");
    }
    Ok(Json(RemoveFavoriteResponse { removed }))
}
