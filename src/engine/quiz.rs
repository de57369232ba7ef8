// src/engine/quiz.rs

use std::collections::BTreeMap;

/// Identifier of a question, matching the `questions.id` column.
pub type QuestionId = i64;

/// Identifier of a participant, matching the `participants.id` column.
pub type ParticipantId = i64;

/// Points a question is worth when the question bank does not say otherwise.
pub const DEFAULT_POINTS: u32 = 1;

/// Largest score the `participants.score` INTEGER column can hold.
pub const MAX_SCORE: u32 = i32::MAX as u32;

/// One question as the session sees it: prompt, choices and the expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub image_name: Option<String>,
    pub answer: String,
    pub points: u32,
}

/// Correct answer and value of a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub answer: String,
    pub points: u32,
}

/// Mapping from question id to its correct answer and point value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    entries: BTreeMap<QuestionId, KeyEntry>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `id`.
    pub fn insert(&mut self, id: QuestionId, answer: impl Into<String>, points: u32) {
        self.entries.insert(
            id,
            KeyEntry {
                answer: answer.into(),
                points,
            },
        );
    }

    pub fn get(&self, id: QuestionId) -> Option<&KeyEntry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &KeyEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score attainable against this key, capped at `MAX_SCORE`.
    pub fn max_score(&self) -> u32 {
        self.entries
            .values()
            .fold(0u32, |total, entry| total.saturating_add(entry.points))
            .min(MAX_SCORE)
    }
}

impl<S: Into<String>> FromIterator<(QuestionId, S, u32)> for AnswerKey {
    fn from_iter<T: IntoIterator<Item = (QuestionId, S, u32)>>(iter: T) -> Self {
        let mut key = AnswerKey::new();
        for (id, answer, points) in iter {
            key.insert(id, answer, points);
        }
        key
    }
}

/// The questions drawn for one session, frozen for the session's lifetime.
///
/// Sessions share a definition through an `Arc`; nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    questions: Vec<QuizQuestion>,
    key: AnswerKey,
}

impl QuizDefinition {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let key = questions
            .iter()
            .map(|q| (q.id, q.answer.clone(), q.points))
            .collect();
        Self { questions, key }
    }

    /// Questions in presentation order.
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.key
    }

    pub fn max_score(&self) -> u32 {
        self.key.max_score()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
