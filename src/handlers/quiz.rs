// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::{QuizDefinition, QuizQuestion, QuizSession},
    error::AppError,
    lifecycle,
    models::{
        question::PublicQuestion,
        session::{
            RecordAnswerRequest, SessionStatusResponse, StartSessionResponse,
            SubmitSessionResponse,
        },
    },
    state::AppState,
    utils::jwt::Claims,
};

fn session_not_found() -> AppError {
    AppError::NotFound("Session not found".to_string())
}

/// Starts a quiz session for the current participant.
///
/// * Draws `question_count` random questions.
/// * Returns them without their answers, together with the session id.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = claims.participant_id()?;

    state
        .store
        .find_participant(participant_id)
        .await?
        .ok_or(AppError::NotFound("Participant not found".to_string()))?;

    let questions = state
        .store
        .sample_questions(state.config.question_count)
        .await?;

    if questions.is_empty() {
        return Err(AppError::BadRequest("No questions available".to_string()));
    }

    let quiz = Arc::new(QuizDefinition::new(
        questions.into_iter().map(QuizQuestion::from).collect(),
    ));
    let public_questions: Vec<PublicQuestion> =
        quiz.questions().iter().map(PublicQuestion::from).collect();

    let started_at = Utc::now();
    let mut session = QuizSession::new();
    session.start(participant_id, quiz, started_at)?;

    let session_id = state.sessions.insert(session).await;
    tracing::info!(
        "Participant {} started session {} with {} questions",
        participant_id,
        session_id,
        public_questions.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            started_at,
            time_limit_secs: state.config.session_time_limit,
            questions: public_questions,
        }),
    ))
}

/// Returns the state of one of the participant's live sessions.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = claims.participant_id()?;
    let time_limit = state.config.session_time_limit;

    let status = state
        .sessions
        .inspect(session_id, participant_id, |session| {
            SessionStatusResponse::new(session_id, session, time_limit)
        })
        .await
        .ok_or_else(session_not_found)?;

    Ok(Json(status))
}

/// Records (or replaces) the answer to one question.
///
/// A session that ran out of time is submitted at its deadline instead and the
/// answer is rejected.
pub async fn record_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let participant_id = claims.participant_id()?;
    let now = Utc::now();
    let time_limit = state.config.session_time_limit;

    let recorded = state
        .sessions
        .update(session_id, participant_id, |session| {
            if time_limit.is_some_and(|limit| session.is_expired(now, limit)) {
                None
            } else {
                Some(session.record_answer(req.question_id, req.answer, now))
            }
        })
        .await
        .ok_or_else(session_not_found)?;

    match recorded {
        Some(outcome) => outcome?,
        None => {
            lifecycle::submit(&state, session_id, participant_id, now).await?;
            return Err(AppError::Conflict(
                "Time limit exceeded; the session has been submitted".to_string(),
            ));
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Submits the session: computes the score and time taken, saves them on the
/// participant and returns the graded answers.
pub async fn submit_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = claims.participant_id()?;

    match lifecycle::submit(&state, session_id, participant_id, Utc::now()).await {
        Ok((result, graded)) => Ok(Json(SubmitSessionResponse::new(result, graded))),
        Err(e) => {
            tracing::warn!("Submitting session {} failed: {}", session_id, e);
            Err(e)
        }
    }
}
