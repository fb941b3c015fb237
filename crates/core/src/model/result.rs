use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AssessmentId, AssessmentKind};

/// Minimum percentage required to pass.
pub const PASS_PERCENTAGE: u32 = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score ({score}) exceeds total marks ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("correct count ({correct}) exceeds question count ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("percentage out of range: {0}")]
    InvalidPercentage(u32),

    #[error("pass flag does not match percentage {percentage}")]
    PassMismatch { percentage: u32 },
}

/// Formats elapsed seconds as `m:ss`.
#[must_use]
pub fn format_time_taken(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Returns true when `percentage` meets the pass threshold.
#[must_use]
pub fn is_passing(percentage: u32) -> bool {
    percentage >= PASS_PERCENTAGE
}

/// Scored outcome of one submitted assessment session.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    assessment_id: AssessmentId,
    assessment_title: String,
    kind: AssessmentKind,
    score: u32,
    total_marks: u32,
    percentage: u32,
    correct_count: u32,
    total_questions: u32,
    passed: bool,
    time_taken_secs: u64,
    time_expired: bool,
    submitted_at: DateTime<Utc>,
}

impl AssessmentResult {
    /// Rehydrate (or assemble) a result, checking that its figures agree.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the score, counts, percentage or pass flag are
    /// inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        assessment_id: AssessmentId,
        assessment_title: impl Into<String>,
        kind: AssessmentKind,
        score: u32,
        total_marks: u32,
        percentage: u32,
        correct_count: u32,
        total_questions: u32,
        passed: bool,
        time_taken_secs: u64,
        time_expired: bool,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if score > total_marks {
            return Err(ResultError::ScoreExceedsTotal {
                score,
                total: total_marks,
            });
        }
        if correct_count > total_questions {
            return Err(ResultError::CorrectExceedsTotal {
                correct: correct_count,
                total: total_questions,
            });
        }
        if percentage > 100 {
            return Err(ResultError::InvalidPercentage(percentage));
        }
        if passed != is_passing(percentage) {
            return Err(ResultError::PassMismatch { percentage });
        }

        Ok(Self {
            assessment_id,
            assessment_title: assessment_title.into(),
            kind,
            score,
            total_marks,
            percentage,
            correct_count,
            total_questions,
            passed,
            time_taken_secs,
            time_expired,
            submitted_at,
        })
    }

    #[must_use]
    pub fn assessment_id(&self) -> AssessmentId {
        self.assessment_id
    }

    #[must_use]
    pub fn assessment_title(&self) -> &str {
        &self.assessment_title
    }

    #[must_use]
    pub fn kind(&self) -> AssessmentKind {
        self.kind
    }

    /// Earned marks.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_marks(&self) -> u32 {
        self.total_marks
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u64 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn time_taken_display(&self) -> String {
        format_time_taken(self.time_taken_secs)
    }

    /// True when the session was auto-submitted because time ran out.
    #[must_use]
    pub fn time_expired(&self) -> bool {
        self.time_expired
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn time_taken_pads_seconds() {
        assert_eq!(format_time_taken(0), "0:00");
        assert_eq!(format_time_taken(7), "0:07");
        assert_eq!(format_time_taken(427), "7:07");
        assert_eq!(format_time_taken(3600), "60:00");
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        assert!(is_passing(40));
        assert!(!is_passing(39));
    }

    #[test]
    fn from_persisted_rejects_inconsistent_pass_flag() {
        let err = AssessmentResult::from_persisted(
            AssessmentId::new(1),
            "Quiz",
            AssessmentKind::Quiz,
            35,
            100,
            35,
            7,
            20,
            true,
            60,
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::PassMismatch { percentage: 35 });
    }

    #[test]
    fn from_persisted_rejects_score_above_total() {
        let err = AssessmentResult::from_persisted(
            AssessmentId::new(1),
            "Quiz",
            AssessmentKind::Quiz,
            105,
            100,
            100,
            20,
            20,
            true,
            60,
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::ScoreExceedsTotal { .. }));
    }
}
