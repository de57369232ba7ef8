// src/engine/mod.rs

//! Quiz session lifecycle and scoring.
//!
//! Nothing in here touches the network, the database or the wall clock: every
//! timestamp is passed in by the caller.

pub mod error;
pub mod quiz;
pub mod scoring;
pub mod session;
pub mod timer;

pub use error::QuizError;
pub use quiz::{AnswerKey, ParticipantId, QuestionId, QuizDefinition, QuizQuestion};
pub use scoring::{GradedAnswer, Score};
pub use session::{AnswerRecord, QuizResult, QuizSession, SessionState};
pub use timer::{SessionTimer, TimeTaken};
