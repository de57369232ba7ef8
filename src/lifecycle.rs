// src/lifecycle.rs

//! Closing sessions and handing their results to storage.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    engine::{GradedAnswer, ParticipantId, QuizResult, QuizSession, SessionState},
    error::AppError,
    models::participant::ResultRecord,
    registry::Checkout,
    state::AppState,
    store::QuizStore,
};

/// Instant a session should be closed at when submitted at `now`.
///
/// Past the time limit the session counts as closed at its deadline, so
/// `time_taken` never exceeds the limit.
pub fn close_instant(
    session: &QuizSession,
    now: DateTime<Utc>,
    time_limit: Option<u64>,
) -> DateTime<Utc> {
    time_limit
        .and_then(|limit| session.deadline(limit))
        .map_or(now, |deadline| now.min(deadline))
}

/// Closes the session at `at` unless it already finished, and returns its
/// result with the graded answers.
pub fn close(
    session: &mut QuizSession,
    at: DateTime<Utc>,
) -> Result<(QuizResult, Vec<GradedAnswer>), AppError> {
    if session.state() != SessionState::Finished {
        session.close(at)?;
    }

    Ok((session.result()?, session.graded_answers()))
}

/// Writes a finished session's result to the participant's row.
pub async fn persist(store: &dyn QuizStore, result: &QuizResult) -> Result<(), AppError> {
    let record = ResultRecord::try_from(result).map_err(AppError::InternalServerError)?;
    store.save_result(record).await?;

    tracing::info!(
        participant_id = result.participant_id,
        score = result.score,
        max_score = result.max_score,
        time_taken = result.time_taken,
        "Session finished"
    );

    Ok(())
}

/// Closes a live session in place and saves its result.
///
/// The session stays in the registry, marked as being saved, until the save
/// completes: it is removed on success and unmarked on failure so a later
/// submit or sweep can retry.
pub async fn submit(
    state: &AppState,
    id: Uuid,
    participant_id: ParticipantId,
    now: DateTime<Utc>,
) -> Result<(QuizResult, Vec<GradedAnswer>), AppError> {
    let time_limit = state.config.session_time_limit;

    let closed = state
        .sessions
        .checkout(id, participant_id, |session| {
            let at = close_instant(session, now, time_limit);
            close(session, at)
        })
        .await;

    let (result, graded) = match closed {
        Checkout::Missing => return Err(AppError::NotFound("Session not found".to_string())),
        Checkout::Busy => {
            return Err(AppError::Conflict(
                "Session is already being submitted".to_string(),
            ));
        }
        Checkout::Ready(closed) => closed?,
    };

    match persist(state.store.as_ref(), &result).await {
        Ok(()) => {
            state.sessions.remove(id, participant_id).await;
            Ok((result, graded))
        }
        Err(e) => {
            state.sessions.release(id).await;
            Err(e)
        }
    }
}

/// What one sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions closed (or already finished) whose result was saved.
    pub persisted: usize,
    /// Idle open sessions dropped without a result.
    pub abandoned: usize,
}

/// Saves every finished session still waiting for storage, closes and saves
/// sessions past the time limit, and drops sessions idle for longer than the
/// configured TTL.
///
/// Sessions whose result could not be saved stay in the registry so the next
/// pass retries them.
pub async fn close_expired(state: &AppState, now: DateTime<Utc>) -> SweepReport {
    let sweep = state
        .sessions
        .sweep(now, state.config.session_time_limit, state.config.session_idle_ttl)
        .await;

    let mut report = SweepReport {
        abandoned: sweep.abandoned,
        ..SweepReport::default()
    };

    for (id, participant_id) in sweep.due {
        match submit(state, id, participant_id, now).await {
            Ok(_) => report.persisted += 1,
            Err(e) => tracing::error!("Failed to finish session {}: {}", id, e),
        }
    }

    report
}

/// Runs `close_expired` every `period` until the runtime shuts down.
pub fn spawn_expiry_sweeper(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let report = close_expired(&state, Utc::now()).await;
            if report.persisted > 0 {
                tracing::info!("Closed {} expired session(s)", report.persisted);
            }
            if report.abandoned > 0 {
                tracing::info!("Dropped {} idle session(s)", report.abandoned);
            }
        }
    })
}
