use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, VerifyResponse};
use super::extractors::AuthUser;
use super::jwt::JwtKeys;
use super::repo::User;
use super::service::{self, LoginError, RegisterError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    match service::register(
        &state.db,
        &keys,
        &payload.email,
        &payload.password,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
    )
    .await
    {
        Ok(s) => {
            info!(user_id = s.user.id, "user registered");
            Ok(Json(AuthResponse {
                token: s.token,
                user: s.user,
            }))
        }
        Err(e @ (RegisterError::InvalidEmail | RegisterError::WeakPassword)) => {
            warn!(error = %e, "register rejected");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ RegisterError::EmailTaken) => {
            warn!(error = %e, "register rejected");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(RegisterError::Internal(e)) => {
            error!(error = %e, "register failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "registration failed".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    match service::login(&state.db, &keys, &payload.email, &payload.password).await {
        Ok(s) => {
            info!(user_id = s.user.id, "user logged in");
            Ok(Json(AuthResponse {
                token: s.token,
                user: s.user,
            }))
        }
        Err(e @ LoginError::InvalidCredentials) => {
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
        Err(e @ LoginError::AccountDisabled) => Err((StatusCode::FORBIDDEN, e.to_string())),
        Err(LoginError::Internal(e)) => {
            error!(error = %e, "login failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "login failed".into()))
        }
    }
}

pub async fn verify(AuthUser(user): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse { valid: true, user })
}

#[instrument(skip(state, current), fields(user_id = current.user_id))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_active_by_id(&state.db, current.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "profile lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        })?;

    match user {
        Some(u) => Ok(Json(PublicUser::from(u))),
        None => Err((StatusCode::NOT_FOUND, "profile not found".into())),
    }
}
