// src/handlers/participant.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::participant::{CreateParticipantRequest, ParticipantTokenResponse},
    store::QuizStore,
    utils::jwt::{Claims, sign_jwt},
};

/// Registers a participant, or identifies an existing one with the same name
/// and email.
///
/// Returns the participant and a Bearer token for the quiz routes.
pub async fn register(
    State(store): State<Arc<dyn QuizStore>>,
    State(config): State<Config>,
    Json(payload): Json<CreateParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = CreateParticipantRequest {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
    };
    payload.validate()?;

    let participant = store
        .upsert_participant(&payload.name, &payload.email)
        .await?;

    let token = sign_jwt(participant.id, &config.jwt_secret, config.jwt_expiration)?;

    tracing::debug!("Participant {} identified", participant.id);

    Ok(Json(ParticipantTokenResponse {
        participant,
        token,
        token_type: "Bearer",
    }))
}

/// Current participant, including the last persisted score and time taken.
pub async fn get_me(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = claims.participant_id()?;

    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or(AppError::NotFound("Participant not found".to_string()))?;

    Ok(Json(participant))
}
