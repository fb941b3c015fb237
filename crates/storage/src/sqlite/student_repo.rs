use brainwave_core::model::{Student, StudentId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_i64, ser, student_id_from_i64};
use crate::repository::{StorageError, StudentRepository};

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO students (id, code, name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                name = excluded.name
            ",
        )
        .bind(id_i64("student_id", student.id().value())?)
        .bind(student.code())
        .bind(student.name())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError> {
        let row = sqlx::query("SELECT id, code, name FROM students WHERE id = ?1")
            .bind(id_i64("student_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        let id = student_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
        let code: String = row.try_get("code").map_err(ser)?;
        let name: String = row.try_get("name").map_err(ser)?;
        Student::new(id, code, name).map_err(ser)
    }
}
