use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every generated question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("correct answer index {0} is out of range")]
    InvalidCorrectAnswer(u8),
}

/// A single multiple-choice question.
///
/// Correctness is carried by `correct_answer` alone; nothing ties it to the
/// wording of the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: [String; OPTION_COUNT],
    correct_answer: u8,
    marks: u32,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank or `correct_answer` is not
    /// a valid option index.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_answer: u8,
        marks: u32,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if usize::from(correct_answer) >= OPTION_COUNT {
            return Err(QuestionError::InvalidCorrectAnswer(correct_answer));
        }
        Ok(Self {
            id,
            text,
            options,
            correct_answer,
            marks,
        })
    }

    /// Generator-side constructor; callers guarantee `correct_answer < OPTION_COUNT`.
    pub(crate) fn generated(
        id: QuestionId,
        text: String,
        options: [String; OPTION_COUNT],
        correct_answer: u8,
        marks: u32,
    ) -> Self {
        debug_assert!(usize::from(correct_answer) < OPTION_COUNT);
        Self {
            id,
            text,
            options,
            correct_answer,
            marks,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> u8 {
        self.correct_answer
    }

    #[must_use]
    pub fn marks(&self) -> u32 {
        self.marks
    }

    /// Returns true when `answer` selects the keyed option.
    #[must_use]
    pub fn is_correct(&self, answer: Option<u8>) -> bool {
        answer == Some(self.correct_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; OPTION_COUNT] {
        ["a", "b", "c", "d"].map(String::from)
    }

    #[test]
    fn rejects_out_of_range_key() {
        let err = Question::new(QuestionId::new(1), "Q", options(), 4, 5).unwrap_err();
        assert_eq!(err, QuestionError::InvalidCorrectAnswer(4));
    }

    #[test]
    fn rejects_blank_text() {
        let err = Question::new(QuestionId::new(1), "  ", options(), 0, 5).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn correctness_is_index_based() {
        let q = Question::new(QuestionId::new(1), "Q", options(), 2, 5).unwrap();
        assert!(q.is_correct(Some(2)));
        assert!(!q.is_correct(Some(1)));
        assert!(!q.is_correct(None));
    }
}
