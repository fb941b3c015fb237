use thiserror::Error;

use crate::model::{AssessmentError, QuestionError, ResultError, StudentError};
use crate::scoring::ScoringError;

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assessment, AssessmentId, AssessmentKind};

    fn build(duration: u32) -> Result<Assessment, Error> {
        Ok(Assessment::new(
            AssessmentId::new(1),
            "Cells",
            "Biology",
            AssessmentKind::Quiz,
            duration,
            100,
        )?)
    }

    #[test]
    fn domain_errors_lift_into_umbrella() {
        let err = build(0).unwrap_err();
        assert!(matches!(err, Error::Assessment(AssessmentError::InvalidDuration)));
        assert!(build(10).is_ok());
    }
}
