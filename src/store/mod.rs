// src/store/mod.rs

pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        participant::{Participant, ResultRecord},
        question::Question,
    },
};

pub use postgres::PgStore;

/// Persistence used by the HTTP layer.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Returns the participant with this name and email, creating it if needed.
    async fn upsert_participant(&self, name: &str, email: &str) -> Result<Participant, AppError>;

    async fn find_participant(&self, id: i64) -> Result<Option<Participant>, AppError>;

    /// Draws up to `limit` questions at random.
    async fn sample_questions(&self, limit: i64) -> Result<Vec<Question>, AppError>;

    /// Overwrites the participant's score and time taken.
    async fn save_result(&self, record: ResultRecord) -> Result<(), AppError>;
}
