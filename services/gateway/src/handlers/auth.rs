use crate::error::AppError;
use crate::models::{ApiJson, TokenResponse, WalletAuthRequest};
use crate::state::AppState;
use axum::{Json, extract::State};

/// Exchange a signed wallet message for an access token.
pub async fn wallet_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<WalletAuthRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .service
        .authenticate_wallet(&payload.wallet_address, &payload.message, &payload.signature)
        .await?;

    let access_token = state.tokens.issue(&user.wallet_address)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.ttl().as_secs(),
    }))
}
