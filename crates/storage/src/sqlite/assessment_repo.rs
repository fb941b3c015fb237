use brainwave_core::model::{Assessment, AssessmentLocator};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{assessment_id_from_i64, id_i64, parse_kind, ser, u32_from_i64};
use crate::repository::{AssessmentRepository, StorageError};

fn map_assessment_row(row: &SqliteRow) -> Result<Assessment, StorageError> {
    let id = assessment_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let subject: String = row.try_get("subject").map_err(ser)?;
    let kind = parse_kind(&row.try_get::<String, _>("kind").map_err(ser)?)?;
    let duration = u32_from_i64(
        "duration_minutes",
        row.try_get::<i64, _>("duration_minutes").map_err(ser)?,
    )?;
    let total_marks = u32_from_i64(
        "total_marks",
        row.try_get::<i64, _>("total_marks").map_err(ser)?,
    )?;

    Assessment::new(id, title, subject, kind, duration, total_marks).map_err(ser)
}

#[async_trait::async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError> {
        let id = id_i64("assessment_id", assessment.id().value())?;

        sqlx::query(
            r"
            INSERT INTO assessments
                (collection, id, title, subject, kind, duration_minutes, total_marks)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(collection, id) DO UPDATE SET
                title = excluded.title,
                subject = excluded.subject,
                kind = excluded.kind,
                duration_minutes = excluded.duration_minutes,
                total_marks = excluded.total_marks
            ",
        )
        .bind(assessment.kind().collection().as_str())
        .bind(id)
        .bind(assessment.title())
        .bind(assessment.subject())
        .bind(assessment.kind().as_str())
        .bind(i64::from(assessment.duration_minutes()))
        .bind(i64::from(assessment.total_marks()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn find_assessment(
        &self,
        locator: AssessmentLocator,
    ) -> Result<Assessment, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, title, subject, kind, duration_minutes, total_marks
                FROM assessments
                WHERE collection = ?1 AND id = ?2
            ",
        )
        .bind(locator.collection().as_str())
        .bind(id_i64("assessment_id", locator.id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_assessment_row(&row)
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, subject, kind, duration_minutes, total_marks
                FROM assessments
                ORDER BY collection ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_assessment_row).collect()
    }
}
