use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{ApiJson, LinkTelegramRequest};
use crate::state::AppState;
use axum::{Json, extract::State};
use types::user::{ProfileUpdate, User};

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.get_profile(&user.wallet).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.update_profile(&user.wallet, update).await?))
}

pub async fn link_telegram(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(payload): ApiJson<LinkTelegramRequest>,
) -> Result<Json<User>, AppError> {
    let linked = state
        .service
        .link_telegram(&user.wallet, payload.telegram_id, payload.username)
        .await?;
    Ok(Json(linked))
}
