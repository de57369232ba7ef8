// src/engine/timer.rs

use chrono::{DateTime, Utc};

use super::error::QuizError;

/// Elapsed session time in whole seconds.
pub type TimeTaken = u32;

/// Longest span the `participants.time_taken` INTEGER column can hold.
pub const MAX_TIME_TAKEN: TimeTaken = i32::MAX as u32;

/// Seconds between `start` and `end`, truncating any fractional second.
///
/// Fails with `InvalidTimeRange` when `end` lies before `start` or when the span
/// exceeds `MAX_TIME_TAKEN`.
pub fn elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeTaken, QuizError> {
    let invalid = || QuizError::InvalidTimeRange { start, end };

    if end < start {
        return Err(invalid());
    }

    TimeTaken::try_from((end - start).num_seconds())
        .ok()
        .filter(|secs| *secs <= MAX_TIME_TAKEN)
        .ok_or_else(invalid)
}

/// Start and end instants of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimer {
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl SessionTimer {
    pub fn start(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            ended_at: None,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Records the end instant and returns the elapsed time.
    ///
    /// The end instant is only stored when the range is valid, so a stored end
    /// is never before the start.
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<TimeTaken, QuizError> {
        let taken = elapsed(self.started_at, at)?;
        self.ended_at = Some(at);
        Ok(taken)
    }

    /// Instant at which a session with the given limit runs out of time.
    pub fn deadline(&self, limit_secs: u64) -> DateTime<Utc> {
        let limit = i64::try_from(limit_secs).unwrap_or(i64::MAX);
        chrono::TimeDelta::try_seconds(limit)
            .and_then(|delta| self.started_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
