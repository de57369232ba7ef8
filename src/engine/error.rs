// src/engine/error.rs

use std::fmt;

use chrono::{DateTime, Utc};

use super::session::SessionState;

/// Contract violations raised by the session state machine and the timer.
///
/// None of these are retried: each one needs the caller to change what it is
/// doing before the same call can succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// The operation is not allowed in the session's current state.
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// An answer arrived after the session stopped accepting answers.
    SessionClosed,

    /// The result was requested before the session finished.
    NotFinished(SessionState),

    /// The end of a time range lies before its start, or the span does not fit
    /// in the integer `time_taken` column.
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::InvalidState { operation, state } => {
                write!(f, "cannot {} a session in state {:?}", operation, state)
            }
            QuizError::SessionClosed => write!(f, "session is no longer accepting answers"),
            QuizError::NotFinished(state) => {
                write!(f, "session has not finished (state {:?})", state)
            }
            QuizError::InvalidTimeRange { start, end } => {
                write!(f, "invalid time range: {} .. {}", start, end)
            }
        }
    }
}

impl std::error::Error for QuizError {}
