//! JSON import of assessment and student collections.
//!
//! The file shape matches the collections the admin console exports:
//!
//! ```json
//! {
//!   "assessments": [
//!     { "id": 1, "title": "Algebra", "subject": "Mathematics",
//!       "type": "quiz", "duration": 10, "totalMarks": 100 }
//!   ],
//!   "students": [ { "id": 1, "code": "BW-001", "name": "Ada" } ]
//! }
//! ```

use brainwave_core::model::{
    Assessment, AssessmentError, AssessmentId, AssessmentKind, Student, StudentError, StudentId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("assessment {id}: {source}")]
    Assessment {
        id: u64,
        #[source]
        source: AssessmentError,
    },

    #[error("student {id}: {source}")]
    Student {
        id: u64,
        #[source]
        source: StudentError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentEntry {
    pub id: u64,
    pub title: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: AssessmentKind,
    /// Minutes.
    pub duration: u32,
    pub total_marks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEntry {
    pub id: u64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub assessments: Vec<AssessmentEntry>,
    #[serde(default)]
    pub students: Vec<StudentEntry>,
}

/// Counts of imported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub assessments: usize,
    pub students: usize,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns `CatalogError::Json` if the text is not a valid catalog.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(text)?)
    }

    /// A small built-in catalog used when no file is given.
    #[must_use]
    pub fn sample() -> Self {
        let assessment = |id, title: &str, subject: &str, kind, duration, total_marks| {
            AssessmentEntry {
                id,
                title: title.to_string(),
                subject: subject.to_string(),
                kind,
                duration,
                total_marks,
            }
        };
        Self {
            assessments: vec![
                assessment(1, "Algebra Basics", "Mathematics", AssessmentKind::Quiz, 10, 100),
                assessment(2, "Motion and Forces", "Physics", AssessmentKind::Assignment, 30, 97),
                assessment(1, "Mid-term Exam", "Chemistry", AssessmentKind::Exam, 60, 200),
                assessment(2, "Practice Mock", "Biology", AssessmentKind::Mock, 45, 160),
            ],
            students: vec![StudentEntry {
                id: 1,
                code: "BW-001".to_string(),
                name: "Demo Student".to_string(),
            }],
        }
    }

    /// Validate entries into domain values.
    ///
    /// # Errors
    ///
    /// Returns the first entry that fails domain validation.
    pub fn into_domain(self) -> Result<(Vec<Assessment>, Vec<Student>), CatalogError> {
        let assessments = self
            .assessments
            .into_iter()
            .map(|e| {
                Assessment::new(
                    AssessmentId::new(e.id),
                    e.title,
                    e.subject,
                    e.kind,
                    e.duration,
                    e.total_marks,
                )
                .map_err(|source| CatalogError::Assessment { id: e.id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let students = self
            .students
            .into_iter()
            .map(|e| {
                Student::new(StudentId::new(e.id), e.code, e.name)
                    .map_err(|source| CatalogError::Student { id: e.id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((assessments, students))
    }

    /// Validate and upsert every entry into `storage`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on validation or storage failures.
    pub async fn import(self, storage: &Storage) -> Result<ImportSummary, CatalogError> {
        let (assessments, students) = self.into_domain()?;
        for assessment in &assessments {
            storage.assessments.upsert_assessment(assessment).await?;
        }
        for student in &students {
            storage.students.upsert_student(student).await?;
        }
        tracing::info!(
            assessments = assessments.len(),
            students = students.len(),
            "catalog imported"
        );
        Ok(ImportSummary {
            assessments: assessments.len(),
            students: students.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::model::AssessmentLocator;

    #[test]
    fn parses_console_export_shape() {
        let json = r#"{
            "assessments": [
                { "id": 9, "title": "Cells", "subject": "Biology",
                  "type": "mock", "duration": 45, "totalMarks": 80 }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.assessments[0].kind, AssessmentKind::Mock);
        assert_eq!(catalog.assessments[0].total_marks, 80);
        assert!(catalog.students.is_empty());
    }

    #[test]
    fn invalid_entries_name_their_id() {
        let json = r#"{ "assessments": [
            { "id": 5, "title": "X", "subject": "Y", "type": "quiz", "duration": 0, "totalMarks": 10 }
        ] }"#;
        let err = Catalog::from_json(json).unwrap().into_domain().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Assessment {
                id: 5,
                source: AssessmentError::InvalidDuration
            }
        ));
    }

    #[tokio::test]
    async fn sample_imports_into_memory() {
        let storage = Storage::in_memory();
        let summary = Catalog::sample().import(&storage).await.unwrap();
        assert_eq!(summary.assessments, 4);
        assert_eq!(summary.students, 1);

        let found = storage
            .assessments
            .find_assessment(AssessmentLocator::new(AssessmentId::new(1), AssessmentKind::Mock))
            .await
            .unwrap();
        assert_eq!(found.title(), "Mid-term Exam");

        let found = storage
            .assessments
            .find_assessment(AssessmentLocator::new(AssessmentId::new(1), AssessmentKind::Quiz))
            .await
            .unwrap();
        assert_eq!(found.title(), "Algebra Basics");
    }
}
