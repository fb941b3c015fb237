use brainwave_core::model::{AssessmentLocator, AssessmentResult, Student, StudentId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    assessment_id_from_i64, bool_from_i64, id_i64, parse_kind, ser, student_id_from_i64,
    u32_from_i64, u64_from_i64,
};
use crate::repository::{ResultRecord, ResultRepository, StorageError};

const RESULT_COLUMNS: &str = r"
    id, student_id, student_code, student_name,
    assessment_id, assessment_title, kind,
    score, total_marks, percentage, correct_count, total_questions,
    passed, time_taken_secs, time_expired, submitted_at
";

fn u32_col(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn bool_col(row: &SqliteRow, field: &'static str) -> Result<bool, StorageError> {
    bool_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn map_result_row(row: &SqliteRow) -> Result<ResultRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;

    let student = Student::new(
        student_id_from_i64(row.try_get::<i64, _>("student_id").map_err(ser)?)?,
        row.try_get::<String, _>("student_code").map_err(ser)?,
        row.try_get::<String, _>("student_name").map_err(ser)?,
    )
    .map_err(ser)?;

    let result = AssessmentResult::from_persisted(
        assessment_id_from_i64(row.try_get::<i64, _>("assessment_id").map_err(ser)?)?,
        row.try_get::<String, _>("assessment_title").map_err(ser)?,
        parse_kind(&row.try_get::<String, _>("kind").map_err(ser)?)?,
        u32_col(row, "score")?,
        u32_col(row, "total_marks")?,
        u32_col(row, "percentage")?,
        u32_col(row, "correct_count")?,
        u32_col(row, "total_questions")?,
        bool_col(row, "passed")?,
        u64_from_i64(
            "time_taken_secs",
            row.try_get::<i64, _>("time_taken_secs").map_err(ser)?,
        )?,
        bool_col(row, "time_expired")?,
        row.try_get("submitted_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(ResultRecord::new(id, student, result))
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        student: &Student,
        result: &AssessmentResult,
    ) -> Result<i64, StorageError> {
        let time_taken = i64::try_from(result.time_taken_secs())
            .map_err(|_| StorageError::Serialization("time_taken_secs overflow".into()))?;

        let res = sqlx::query(
            r"
                INSERT INTO results (
                    student_id, student_code, student_name,
                    collection, assessment_id, assessment_title, kind,
                    score, total_marks, percentage, correct_count, total_questions,
                    passed, time_taken_secs, time_expired, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ",
        )
        .bind(id_i64("student_id", student.id().value())?)
        .bind(student.code())
        .bind(student.name())
        .bind(result.kind().collection().as_str())
        .bind(id_i64("assessment_id", result.assessment_id().value())?)
        .bind(result.assessment_title())
        .bind(result.kind().as_str())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_marks()))
        .bind(i64::from(result.percentage()))
        .bind(i64::from(result.correct_count()))
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.passed()))
        .bind(time_taken)
        .bind(i64::from(result.time_expired()))
        .bind(result.submitted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<ResultRecord, StorageError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE student_id = ?1 \
             ORDER BY submitted_at DESC, id DESC LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("student_id", student_id.value())?)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_result_row).collect()
    }

    async fn list_results_for_assessment(
        &self,
        locator: AssessmentLocator,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE collection = ?1 AND assessment_id = ?2 \
             ORDER BY submitted_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(locator.collection().as_str())
            .bind(id_i64("assessment_id", locator.id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_result_row).collect()
    }
}
