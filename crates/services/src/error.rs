//! Shared error types for the services crate.

use thiserror::Error;

use brainwave_core::ScoringError;
use brainwave_core::model::{AssessmentId, AssessmentKind};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("assessment {id} ({kind}) not found")]
    AssessmentNotFound { id: AssessmentId, kind: AssessmentKind },
    #[error("session is not active")]
    NotActive,
    #[error("session has not been submitted")]
    NotSubmitted,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
