use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the consolidated migration for the current schema.
///
/// Creates assessments, students and the append-only results table.
/// Assessments are keyed by `(collection, id)`; results carry the collection
/// so per-assessment queries stay inside it.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        tracing::info!("applying schema migration v1");
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS assessments (
                    collection TEXT NOT NULL CHECK (collection IN ('coursework', 'examinations')),
                    id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    kind TEXT NOT NULL CHECK (kind IN ('quiz', 'assignment', 'exam', 'mock')),
                    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                    total_marks INTEGER NOT NULL CHECK (total_marks > 0),
                    PRIMARY KEY (collection, id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY,
                    code TEXT NOT NULL,
                    name TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Student and assessment fields are copied onto each row so reports
        // survive later edits or deletions in the admin console.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS results (
                    id INTEGER PRIMARY KEY,
                    student_id INTEGER NOT NULL,
                    student_code TEXT NOT NULL,
                    student_name TEXT NOT NULL,
                    collection TEXT NOT NULL,
                    assessment_id INTEGER NOT NULL,
                    assessment_title TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_marks INTEGER NOT NULL CHECK (total_marks >= 0),
                    percentage INTEGER NOT NULL CHECK (percentage BETWEEN 0 AND 100),
                    correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
                    time_taken_secs INTEGER NOT NULL CHECK (time_taken_secs >= 0),
                    time_expired INTEGER NOT NULL CHECK (time_expired IN (0, 1)),
                    submitted_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_results_student_submitted
                    ON results (student_id, submitted_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_results_assessment_submitted
                    ON results (collection, assessment_id, submitted_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
