use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Assessment, AssessmentResult, Question, ResultError, is_passing};
use crate::time::elapsed_secs;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("answers ({answers}) and questions ({questions}) differ in length")]
    LengthMismatch { questions: usize, answers: usize },

    #[error("too many questions to score: {0}")]
    TooManyQuestions(usize),

    #[error(transparent)]
    Result(#[from] ResultError),
}

/// Raw marks for a set of answers, before timing is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub earned: u32,
    pub total_marks: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub passed: bool,
}

/// Scores submitted answers against the generated keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultCalculator;

impl ResultCalculator {
    /// `round(earned / total * 100)`, rounding halves up. Zero when `total` is zero.
    #[must_use]
    pub fn percentage(earned: u32, total: u32) -> u32 {
        if total == 0 {
            return 0;
        }
        let ratio = f64::from(earned) / f64::from(total) * 100.0;
        // Bounded by 100 as long as earned <= total.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = (ratio + 0.5).floor() as u32;
        rounded
    }

    /// Sum marks of correctly answered questions.
    ///
    /// The total is the sum of the questions' own marks, so it reflects any
    /// marks dropped during generation.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::LengthMismatch` if the slices differ in length.
    pub fn score(
        questions: &[Question],
        answers: &[Option<u8>],
    ) -> Result<ScoreBreakdown, ScoringError> {
        if questions.len() != answers.len() {
            return Err(ScoringError::LengthMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }
        let total_questions = u32::try_from(questions.len())
            .map_err(|_| ScoringError::TooManyQuestions(questions.len()))?;

        let mut earned = 0_u32;
        let mut total_marks = 0_u32;
        let mut correct_count = 0_u32;
        for (question, answer) in questions.iter().zip(answers) {
            total_marks = total_marks.saturating_add(question.marks());
            if question.is_correct(*answer) {
                earned = earned.saturating_add(question.marks());
                correct_count += 1;
            }
        }

        let percentage = Self::percentage(earned, total_marks);
        Ok(ScoreBreakdown {
            earned,
            total_marks,
            correct_count,
            total_questions,
            percentage,
            passed: is_passing(percentage),
        })
    }

    /// Build the immutable result for a submitted session.
    ///
    /// Time taken is measured from `started_at` and clamped to the allotted
    /// duration.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError` if answers and questions disagree in length.
    pub fn calculate(
        assessment: &Assessment,
        questions: &[Question],
        answers: &[Option<u8>],
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        time_expired: bool,
    ) -> Result<AssessmentResult, ScoringError> {
        let breakdown = Self::score(questions, answers)?;
        let time_taken_secs =
            elapsed_secs(started_at, submitted_at).min(assessment.duration_secs());

        let result = AssessmentResult::from_persisted(
            assessment.id(),
            assessment.title(),
            assessment.kind(),
            breakdown.earned,
            breakdown.total_marks,
            breakdown.percentage,
            breakdown.correct_count,
            breakdown.total_questions,
            breakdown.passed,
            time_taken_secs,
            time_expired,
            submitted_at,
        )?;

        debug_assert_eq!(result.total_marks(), breakdown.total_marks);
        debug_assert_eq!(result.total_questions() as usize, questions.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::QuestionGenerator;
    use crate::model::{AssessmentId, AssessmentKind};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn quiz() -> Assessment {
        Assessment::new(
            AssessmentId::new(1),
            "Algebra Quiz",
            "Mathematics",
            AssessmentKind::Quiz,
            10,
            100,
        )
        .unwrap()
    }

    fn answers_with_correct(questions: &[Question], correct: usize) -> Vec<Option<u8>> {
        questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i < correct {
                    Some(q.correct_answer())
                } else {
                    Some((q.correct_answer() + 1) % 4)
                }
            })
            .collect()
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let answers = answers_with_correct(&questions, 20);
        let result = ResultCalculator::calculate(
            &a,
            &questions,
            &answers,
            fixed_now(),
            fixed_now() + Duration::seconds(125),
            false,
        )
        .unwrap();
        assert_eq!(result.score(), 100);
        assert_eq!(result.percentage(), 100);
        assert_eq!(result.correct_count(), 20);
        assert!(result.passed());
        assert_eq!(result.time_taken_display(), "2:05");
    }

    #[test]
    fn exactly_forty_percent_passes() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let b = ResultCalculator::score(&questions, &answers_with_correct(&questions, 8)).unwrap();
        assert_eq!(b.earned, 40);
        assert_eq!(b.percentage, 40);
        assert!(b.passed);
    }

    #[test]
    fn thirty_five_percent_fails() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let b = ResultCalculator::score(&questions, &answers_with_correct(&questions, 7)).unwrap();
        assert_eq!(b.percentage, 35);
        assert!(!b.passed);
    }

    #[test]
    fn unanswered_questions_earn_nothing() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let answers = vec![None; questions.len()];
        let b = ResultCalculator::score(&questions, &answers).unwrap();
        assert_eq!(b.earned, 0);
        assert_eq!(b.correct_count, 0);
        assert_eq!(b.total_questions, 20);
    }

    #[test]
    fn totals_reflect_truncated_marks() {
        let a = Assessment::new(
            AssessmentId::new(2),
            "Essay",
            "English",
            AssessmentKind::Assignment,
            30,
            97,
        )
        .unwrap();
        let questions = QuestionGenerator::new().generate(&a);
        let answers: Vec<_> = questions.iter().map(|q| Some(q.correct_answer())).collect();
        let b = ResultCalculator::score(&questions, &answers).unwrap();
        assert_eq!(b.total_marks, 90);
        assert_eq!(b.earned, 90);
    }

    #[test]
    fn earned_equals_sum_of_correct_marks() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let answers: Vec<Option<u8>> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (i % 3 == 0).then_some(q.correct_answer()))
            .collect();
        let expected: u32 = questions
            .iter()
            .zip(&answers)
            .filter(|(q, a)| q.is_correct(**a))
            .map(|(q, _)| q.marks())
            .sum();
        let b = ResultCalculator::score(&questions, &answers).unwrap();
        assert_eq!(b.earned, expected);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(ResultCalculator::percentage(1, 8), 13);
        assert_eq!(ResultCalculator::percentage(1, 3), 33);
        assert_eq!(ResultCalculator::percentage(2, 3), 67);
        assert_eq!(ResultCalculator::percentage(0, 0), 0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let err = ResultCalculator::score(&questions, &[None]).unwrap_err();
        assert!(matches!(err, ScoringError::LengthMismatch { .. }));
    }

    #[test]
    fn time_taken_is_capped_at_duration() {
        let a = quiz();
        let questions = QuestionGenerator::new().generate(&a);
        let answers = vec![None; questions.len()];
        let result = ResultCalculator::calculate(
            &a,
            &questions,
            &answers,
            fixed_now(),
            fixed_now() + Duration::minutes(45),
            true,
        )
        .unwrap();
        assert_eq!(result.time_taken_secs(), 600);
        assert!(result.time_expired());
    }
}
