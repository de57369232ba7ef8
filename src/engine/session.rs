// src/engine/session.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    error::QuizError,
    quiz::{ParticipantId, QuestionId, QuizDefinition},
    scoring::{self, GradedAnswer, Score},
    timer::{SessionTimer, TimeTaken},
};

/// Lifecycle of a quiz session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    /// Accepting answers.
    Open,
    /// Submit triggered; answers are frozen while the result is computed.
    Closing,
    /// Terminal. The result is fixed.
    Finished,
}

/// One submitted response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// Final outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub participant_id: ParticipantId,
    pub score: Score,
    pub max_score: Score,
    pub time_taken: TimeTaken,
}

/// Data that only exists once `start` has run.
#[derive(Debug, Clone)]
struct Attempt {
    participant_id: ParticipantId,
    quiz: Arc<QuizDefinition>,
    timer: SessionTimer,
}

/// A participant's run through a quiz.
///
/// Single owner, single writer: the session does no locking of its own.
#[derive(Debug, Clone)]
pub struct QuizSession {
    state: SessionState,
    attempt: Option<Attempt>,
    answers: Vec<AnswerRecord>,
    result: Option<QuizResult>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// Creates a handle in `NotStarted`.
    pub fn new() -> Self {
        Self {
            state: SessionState::NotStarted,
            attempt: None,
            answers: Vec::new(),
            result: None,
        }
    }

    /// Creates a session that is already `Open`.
    pub fn begin(
        participant_id: ParticipantId,
        quiz: Arc<QuizDefinition>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state: SessionState::Open,
            attempt: Some(Attempt {
                participant_id,
                quiz,
                timer: SessionTimer::start(now),
            }),
            answers: Vec::new(),
            result: None,
        }
    }

    /// Opens the session for `participant_id` with `now` as the start time.
    pub fn start(
        &mut self,
        participant_id: ParticipantId,
        quiz: Arc<QuizDefinition>,
        now: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        if self.state != SessionState::NotStarted {
            return Err(QuizError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        *self = Self::begin(participant_id, quiz, now);
        Ok(())
    }

    /// Records an answer. A second answer to the same question replaces the
    /// first and moves to the end of the answer order.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        answer: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        match self.state {
            SessionState::Open => {}
            SessionState::NotStarted => {
                return Err(QuizError::InvalidState {
                    operation: "record an answer in",
                    state: self.state,
                });
            }
            SessionState::Closing | SessionState::Finished => return Err(QuizError::SessionClosed),
        }

        self.answers.retain(|record| record.question_id != question_id);
        self.answers.push(AnswerRecord {
            question_id,
            answer: answer.into(),
            answered_at: now,
        });
        Ok(())
    }

    /// Closes the session at `now`, computing its score and time taken.
    ///
    /// If `now` is before the start the session stays `Open` and no result is
    /// recorded.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<QuizResult, QuizError> {
        let attempt = match (self.state, self.attempt.as_mut()) {
            (SessionState::Open, Some(attempt)) => attempt,
            _ => {
                return Err(QuizError::InvalidState {
                    operation: "close",
                    state: self.state,
                });
            }
        };

        self.state = SessionState::Closing;

        let time_taken = match attempt.timer.finish(now) {
            Ok(taken) => taken,
            Err(e) => {
                self.state = SessionState::Open;
                return Err(e);
            }
        };

        let key = attempt.quiz.answer_key();
        let result = QuizResult {
            participant_id: attempt.participant_id,
            score: scoring::score(&self.answers, key),
            max_score: key.max_score(),
            time_taken,
        };
        debug_assert!(result.score <= result.max_score);

        self.result = Some(result);
        self.state = SessionState::Finished;
        Ok(result)
    }

    /// The finished result. Stable across repeated calls.
    pub fn result(&self) -> Result<QuizResult, QuizError> {
        match (self.state, self.result) {
            (SessionState::Finished, Some(result)) => Ok(result),
            _ => Err(QuizError::NotFinished(self.state)),
        }
    }

    /// Per-question breakdown of the current answers against the quiz key.
    pub fn graded_answers(&self) -> Vec<GradedAnswer> {
        self.attempt
            .as_ref()
            .map(|attempt| scoring::grade(&self.answers, attempt.quiz.answer_key()))
            .unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Answers in the order they were (last) given.
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn participant_id(&self) -> Option<ParticipantId> {
        self.attempt.as_ref().map(|a| a.participant_id)
    }

    pub fn quiz(&self) -> Option<&QuizDefinition> {
        self.attempt.as_ref().map(|a| a.quiz.as_ref())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.attempt.as_ref().map(|a| a.timer.started_at())
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.attempt.as_ref().and_then(|a| a.timer.ended_at())
    }

    /// Instant at which the session runs out of time under `limit_secs`.
    pub fn deadline(&self, limit_secs: u64) -> Option<DateTime<Utc>> {
        self.attempt.as_ref().map(|a| a.timer.deadline(limit_secs))
    }

    /// Whether an open session has passed its deadline at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, limit_secs: u64) -> bool {
        self.state == SessionState::Open
            && self.deadline(limit_secs).is_some_and(|deadline| now > deadline)
    }

    /// Start time or the time of the latest answer, whichever is later.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let last_answer = self.answers.iter().map(|a| a.answered_at).max();
        self.started_at().max(last_answer)
    }

    /// Whether an open session has seen no activity for more than `ttl_secs`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        let ttl = chrono::TimeDelta::try_seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
            .unwrap_or(chrono::TimeDelta::MAX);

        self.state == SessionState::Open
            && self
                .last_activity()
                .and_then(|last| last.checked_add_signed(ttl))
                .is_some_and(|cutoff| now > cutoff)
    }
}
