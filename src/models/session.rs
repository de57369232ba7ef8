// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::{GradedAnswer, QuestionId, QuizResult, QuizSession, SessionState},
    models::question::PublicQuestion,
};

/// DTO returned when a session starts.
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub time_limit_secs: Option<u64>,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for recording one answer.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    pub question_id: QuestionId,
    #[validate(length(max = 500))]
    pub answer: String,
}

/// Snapshot of a live session.
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub state: SessionState,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    /// Question ids in the order they were last answered.
    pub answered: Vec<QuestionId>,
}

impl SessionStatusResponse {
    pub fn new(session_id: Uuid, session: &QuizSession, time_limit: Option<u64>) -> Self {
        Self {
            session_id,
            state: session.state(),
            started_at: session.started_at(),
            deadline: time_limit.and_then(|limit| session.deadline(limit)),
            answered: session.answers().iter().map(|a| a.question_id).collect(),
        }
    }
}

/// DTO returned after submitting a session.
#[derive(Debug, Serialize)]
pub struct SubmitSessionResponse {
    pub score: u32,
    pub max_score: u32,
    /// Seconds.
    pub time_taken: u32,
    pub answers: Vec<GradedAnswer>,
}

impl SubmitSessionResponse {
    pub fn new(result: QuizResult, answers: Vec<GradedAnswer>) -> Self {
        Self {
            score: result.score,
            max_score: result.max_score,
            time_taken: result.time_taken,
            answers,
        }
    }
}
