use std::sync::Arc;

use brainwave_core::model::{AssessmentResult, Student, StudentId};
use storage::repository::{ResultRepository, StorageError, StudentRepository};

/// Appends submitted results for the student using this install.
///
/// The store knows at most one current student. Without one, results are
/// dropped with a warning rather than failing the submission.
#[derive(Clone)]
pub struct ResultStore {
    results: Arc<dyn ResultRepository>,
    students: Arc<dyn StudentRepository>,
    current_student: Option<StudentId>,
}

impl ResultStore {
    #[must_use]
    pub fn new(
        results: Arc<dyn ResultRepository>,
        students: Arc<dyn StudentRepository>,
        current_student: Option<StudentId>,
    ) -> Self {
        Self {
            results,
            students,
            current_student,
        }
    }

    #[must_use]
    pub fn current_student_id(&self) -> Option<StudentId> {
        self.current_student
    }

    /// Resolve the current student.
    ///
    /// An id with no stored student counts as no student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures other than not-found.
    pub async fn current_student(&self) -> Result<Option<Student>, StorageError> {
        let Some(id) = self.current_student else {
            return Ok(None);
        };
        match self.students.get_student(id).await {
            Ok(student) => Ok(Some(student)),
            Err(StorageError::NotFound) => {
                tracing::debug!(student = %id, "configured student is not stored");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Append `result` for the current student.
    ///
    /// Returns the storage id, or `None` when there is no current student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student lookup or the append fails.
    pub async fn append_result(
        &self,
        result: &AssessmentResult,
    ) -> Result<Option<i64>, StorageError> {
        let Some(student) = self.current_student().await? else {
            tracing::warn!(
                assessment = %result.assessment_id(),
                "no current student, result not stored"
            );
            return Ok(None);
        };

        let id = self.results.append_result(&student, result).await?;
        tracing::info!(
            result_id = id,
            student = %student.id(),
            assessment = %result.assessment_id(),
            "result stored"
        );
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::model::{AssessmentId, AssessmentKind, AssessmentLocator};
    use brainwave_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result() -> AssessmentResult {
        AssessmentResult::from_persisted(
            AssessmentId::new(1),
            "Algebra Basics",
            AssessmentKind::Quiz,
            40,
            100,
            40,
            8,
            20,
            true,
            300,
            false,
            fixed_now(),
        )
        .unwrap()
    }

    fn store(repo: &InMemoryRepository, student: Option<StudentId>) -> ResultStore {
        ResultStore::new(Arc::new(repo.clone()), Arc::new(repo.clone()), student)
    }

    #[tokio::test]
    async fn appends_for_current_student() {
        let repo = InMemoryRepository::new();
        let student = Student::new(StudentId::new(1), "BW-001", "Ada").unwrap();
        repo.upsert_student(&student).await.unwrap();

        let id = store(&repo, Some(student.id()))
            .append_result(&result())
            .await
            .unwrap()
            .unwrap();
        let record = repo.get_result(id).await.unwrap();
        assert_eq!(record.student, student);
        assert_eq!(record.result, result());
    }

    #[tokio::test]
    async fn drops_result_without_student() {
        let repo = InMemoryRepository::new();
        assert_eq!(store(&repo, None).append_result(&result()).await.unwrap(), None);

        // Configured but never seeded.
        let missing = store(&repo, Some(StudentId::new(9)));
        assert!(missing.current_student().await.unwrap().is_none());
        assert_eq!(missing.append_result(&result()).await.unwrap(), None);

        let stored = repo
            .list_results_for_assessment(AssessmentLocator::new(
                AssessmentId::new(1),
                AssessmentKind::Quiz,
            ))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
