use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{ApiJson, JoinMatchRequest};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use reservation::{CreateMatchRequest, JoinOutcome, MatchView, ParticipantView};
use types::errors::ReservationError;
use types::ids::WalletAddress;

/// The body names a wallet; only its bearer may act for it.
fn ensure_caller(user: &AuthenticatedUser, claimed: &str) -> Result<(), AppError> {
    let claimed = WalletAddress::parse(claimed).map_err(ReservationError::from)?;
    if claimed != user.wallet {
        return Err(AppError::Unauthorized(
            "Cannot act on behalf of another wallet".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_match(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(payload): ApiJson<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchView>), AppError> {
    ensure_caller(&user, &payload.organizer)?;
    let view = state.service.create_match(payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Vec<MatchView>>, AppError> {
    Ok(Json(state.service.list_matches().await?))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(state.service.get_match(&match_id).await?))
}

pub async fn list_participants(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Vec<ParticipantView>>, AppError> {
    Ok(Json(state.service.participants(&match_id).await?))
}

/// Take a seat in a match.
///
/// `userId` is the joining wallet address and must match the bearer token.
/// MATCH_FULL and ALREADY_JOINED are final answers; clients should not
/// retry them.
pub async fn join_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    user: AuthenticatedUser,
    ApiJson(payload): ApiJson<JoinMatchRequest>,
) -> Result<Json<JoinOutcome>, AppError> {
    ensure_caller(&user, &payload.user_id)?;
    let outcome = state.service.join_match(&match_id, &payload.user_id).await?;
    Ok(Json(outcome))
}
