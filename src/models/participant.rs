// src/models/participant.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::engine::QuizResult;

/// Same rule the login form applies before letting a participant start.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9]+@[a-zA-Z0-9]+\.[A-Za-z]+$").expect("email pattern is valid")
});

/// Represents the 'participants' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub email: String,

    /// Points earned in the participant's latest finished session.
    pub score: i32,

    /// Seconds taken by the participant's latest finished session.
    pub time_taken: i32,
}

/// DTO for registering (or re-identifying) a participant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateParticipantRequest {
    #[validate(length(min = 1, max = 100, message = "This field is required."))]
    pub name: String,
    #[validate(custom(function = validate_email))]
    pub email: String,
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message("Email is not valid.".into()))
    }
}

/// DTO returned after registration.
#[derive(Debug, Serialize)]
pub struct ParticipantTokenResponse {
    pub participant: Participant,
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
}

/// Integer-typed row update written once a session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultRecord {
    pub participant_id: i64,
    pub score: i32,
    pub time_taken: i32,
}

impl TryFrom<&QuizResult> for ResultRecord {
    type Error = String;

    fn try_from(result: &QuizResult) -> Result<Self, Self::Error> {
        let score = i32::try_from(result.score)
            .map_err(|_| format!("score {} does not fit the score column", result.score))?;
        let time_taken = i32::try_from(result.time_taken).map_err(|_| {
            format!(
                "time taken {} does not fit the time_taken column",
                result.time_taken
            )
        })?;

        Ok(Self {
            participant_id: result.participant_id,
            score,
            time_taken,
        })
    }
}
