use crate::error::AppError;
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Pickup match reservation service is running" }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let matches = state.service.match_count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        matches,
    }))
}
