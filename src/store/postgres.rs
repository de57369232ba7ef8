// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::QuizStore;
use crate::{
    error::AppError,
    models::{
        participant::{Participant, ResultRecord},
        question::Question,
    },
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn upsert_participant(&self, name: &str, email: &str) -> Result<Participant, AppError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO participants (name, email)
            VALUES ($1, $2)
            ON CONFLICT (name, email) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, email, score, time_taken
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert participant: {:?}", e);
            AppError::from(e)
        })
    }

    async fn find_participant(&self, id: i64) -> Result<Option<Participant>, AppError> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT id, name, email, score, time_taken FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn sample_questions(&self, limit: i64) -> Result<Vec<Question>, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, content, image_name, options, answer, points
            FROM questions
            ORDER BY RANDOM()
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })
    }

    async fn save_result(&self, record: ResultRecord) -> Result<(), AppError> {
        let updated = sqlx::query(
            "UPDATE participants SET score = $1, time_taken = $2 WHERE id = $3",
        )
        .bind(record.score)
        .bind(record.time_taken)
        .bind(record.participant_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save result: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Participant not found".to_string()));
        }

        Ok(())
    }
}
