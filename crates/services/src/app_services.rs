use std::sync::Arc;

use brainwave_core::model::StudentId;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::reports::ReportService;
use crate::result_store::ResultStore;
use crate::sessions::AssessmentLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    current_student: Option<StudentId>,
    assessment_loop: Arc<AssessmentLoopService>,
    reports: Arc<ReportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        current_student: Option<StudentId>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, current_student))
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        current_student: Option<StudentId>,
    ) -> Self {
        let results = ResultStore::new(
            Arc::clone(&storage.results),
            Arc::clone(&storage.students),
            current_student,
        );
        let assessment_loop = Arc::new(AssessmentLoopService::new(
            clock,
            Arc::clone(&storage.assessments),
            results,
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&storage.assessments),
            Arc::clone(&storage.results),
        ));

        Self {
            current_student,
            assessment_loop,
            reports,
        }
    }

    #[must_use]
    pub fn current_student(&self) -> Option<StudentId> {
        self.current_student
    }

    #[must_use]
    pub fn assessment_loop(&self) -> Arc<AssessmentLoopService> {
        Arc::clone(&self.assessment_loop)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }
}
