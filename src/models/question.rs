// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::engine::{QuizQuestion, quiz::DEFAULT_POINTS};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text content of the question.
    pub content: String,

    /// Optional illustration shown with the question.
    pub image_name: Option<String>,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The correct answer, compared case-insensitively.
    pub answer: String,

    /// Points awarded for a correct answer. Negative values are treated as 0.
    pub points: Option<i32>,
}

impl From<Question> for QuizQuestion {
    fn from(q: Question) -> Self {
        let points = match q.points {
            Some(p) => u32::try_from(p).unwrap_or(0),
            None => DEFAULT_POINTS,
        };

        QuizQuestion {
            id: q.id,
            prompt: q.content,
            options: q.options.0,
            image_name: q.image_name,
            answer: q.answer,
            points,
        }
    }
}

/// DTO for sending question to client (excludes answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub image_name: Option<String>,
    pub options: Vec<String>,
    pub points: u32,
}

impl From<&QuizQuestion> for PublicQuestion {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id,
            content: q.prompt.clone(),
            image_name: q.image_name.clone(),
            options: q.options.clone(),
            points: q.points,
        }
    }
}
