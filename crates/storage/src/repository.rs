use async_trait::async_trait;
use brainwave_core::model::{
    Assessment, AssessmentCollection, AssessmentId, AssessmentLocator, AssessmentResult, Student,
    StudentId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a submitted result: the scored outcome plus the
/// student it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub id: i64,
    pub student: Student,
    pub result: AssessmentResult,
}

impl ResultRecord {
    #[must_use]
    pub fn new(id: i64, student: Student, result: AssessmentResult) -> Self {
        Self {
            id,
            student,
            result,
        }
    }
}

/// Repository contract for assessment definitions.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Persist or update an assessment, keyed by its collection and id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the assessment cannot be stored.
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError>;

    /// Look an assessment up by id inside the collection its kind belongs to.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no assessment in that collection
    /// has the id, or other storage errors.
    async fn find_assessment(&self, locator: AssessmentLocator)
    -> Result<Assessment, StorageError>;

    /// List every stored assessment ordered by collection, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Persist or update a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError>;

    /// Fetch a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError>;
}

/// Append-only results collection.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result for `student`, returning its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        student: &Student,
        result: &AssessmentResult,
    ) -> Result<i64, StorageError>;

    /// Fetch a single stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<ResultRecord, StorageError>;

    /// Newest-first results for a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRecord>, StorageError>;

    /// Every stored result for the assessment `locator` resolves to, newest
    /// first. Results of the same id in the other collection are excluded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results_for_assessment(
        &self,
        locator: AssessmentLocator,
    ) -> Result<Vec<ResultRecord>, StorageError>;
}

fn newest_first(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| {
        b.result
            .submitted_at()
            .cmp(&a.result.submitted_at())
            .then(b.id.cmp(&a.id))
    });
}

type AssessmentKey = (AssessmentCollection, AssessmentId);

fn assessment_key(assessment: &Assessment) -> AssessmentKey {
    (assessment.kind().collection(), assessment.id())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    assessments: Arc<Mutex<HashMap<AssessmentKey, Assessment>>>,
    students: Arc<Mutex<HashMap<StudentId, Student>>>,
    results: Arc<Mutex<Vec<ResultRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError> {
        let mut guard = self
            .assessments
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(assessment_key(assessment), assessment.clone());
        Ok(())
    }

    async fn find_assessment(
        &self,
        locator: AssessmentLocator,
    ) -> Result<Assessment, StorageError> {
        let guard = self
            .assessments
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(locator.collection(), locator.id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError> {
        let guard = self
            .assessments
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut all: Vec<Assessment> = guard.values().cloned().collect();
        all.sort_by_key(assessment_key);
        Ok(all)
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        let mut guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(student.id(), student.clone());
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError> {
        let guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        student: &Student,
        result: &AssessmentResult,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?;
        guard.push(ResultRecord::new(id, student.clone(), result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<ResultRecord, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<ResultRecord> = guard
            .iter()
            .filter(|r| r.student.id() == student_id)
            .cloned()
            .collect();
        newest_first(&mut out);
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn list_results_for_assessment(
        &self,
        locator: AssessmentLocator,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<ResultRecord> = guard
            .iter()
            .filter(|r| {
                r.result.assessment_id() == locator.id
                    && r.result.kind().collection() == locator.collection()
            })
            .cloned()
            .collect();
        newest_first(&mut out);
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub assessments: Arc<dyn AssessmentRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let assessments: Arc<dyn AssessmentRepository> = Arc::new(repo.clone());
        let students: Arc<dyn StudentRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            assessments,
            students,
            results,
        }
    }
}
