// src/engine/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use super::{
    quiz::{AnswerKey, MAX_SCORE, QuestionId},
    session::AnswerRecord,
};

/// Points earned in one session.
pub type Score = u32;

/// Outcome for a single question of the answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradedAnswer {
    pub question_id: QuestionId,
    /// `None` when the participant never answered this question.
    pub submitted: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points_awarded: u32,
}

/// Canonical form used to compare text answers: surrounding whitespace is
/// dropped and case is ignored.
pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Later records for the same question replace earlier ones.
fn latest_answers(answers: &[AnswerRecord]) -> HashMap<QuestionId, &str> {
    answers
        .iter()
        .map(|record| (record.question_id, record.answer.as_str()))
        .collect()
}

/// Grades every question of `key` against the submitted answers.
///
/// The result follows the key's question order. Answers to questions that are
/// not part of the key are ignored.
pub fn grade(answers: &[AnswerRecord], key: &AnswerKey) -> Vec<GradedAnswer> {
    let submitted = latest_answers(answers);

    key.iter()
        .map(|(question_id, entry)| {
            let answer = submitted.get(&question_id).copied();
            let is_correct = answer.is_some_and(|a| normalize(a) == normalize(&entry.answer));

            GradedAnswer {
                question_id,
                submitted: answer.map(str::to_owned),
                correct_answer: entry.answer.clone(),
                is_correct,
                points_awarded: if is_correct { entry.points } else { 0 },
            }
        })
        .collect()
}

/// Computes the score of an answer set. Always within `0..=key.max_score()`.
pub fn score(answers: &[AnswerRecord], key: &AnswerKey) -> Score {
    grade(answers, key)
        .iter()
        .fold(0, |total: Score, graded| total.saturating_add(graded.points_awarded))
        .min(MAX_SCORE)
}
