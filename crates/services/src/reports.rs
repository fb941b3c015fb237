//! Read-only aggregation over stored results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use brainwave_core::ResultCalculator;
use brainwave_core::model::{
    Assessment, AssessmentCollection, AssessmentId, AssessmentKind, AssessmentLocator, StudentId,
};
use storage::repository::{AssessmentRepository, ResultRecord, ResultRepository};

use crate::error::ReportError;

/// One stored result as listed on a student's history.
///
/// Values stay raw; formatting is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultListItem {
    pub id: i64,
    pub assessment_id: AssessmentId,
    pub title: String,
    pub kind: AssessmentKind,
    pub score: u32,
    pub total_marks: u32,
    pub percentage: u32,
    pub passed: bool,
    pub time_taken_secs: u64,
    pub time_expired: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ResultListItem {
    #[must_use]
    pub fn from_record(record: &ResultRecord) -> Self {
        let r = &record.result;
        Self {
            id: record.id,
            assessment_id: r.assessment_id(),
            title: r.assessment_title().to_string(),
            kind: r.kind(),
            score: r.score(),
            total_marks: r.total_marks(),
            percentage: r.percentage(),
            passed: r.passed(),
            time_taken_secs: r.time_taken_secs(),
            time_expired: r.time_expired(),
            submitted_at: r.submitted_at(),
        }
    }
}

/// Attempt statistics for one assessment across all students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentReport {
    pub collection: AssessmentCollection,
    pub assessment_id: AssessmentId,
    pub attempts: u32,
    /// Mean percentage, rounded half up.
    pub average_percentage: u32,
    /// Share of attempts that passed, as a percentage.
    pub pass_rate: u32,
    pub best_score: u32,
    pub best_percentage: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl AssessmentReport {
    #[must_use]
    pub fn from_records(locator: AssessmentLocator, records: &[ResultRecord]) -> Self {
        let collection = locator.collection();
        let assessment_id = locator.id;
        let attempts = u32::try_from(records.len()).unwrap_or(u32::MAX);
        if attempts == 0 {
            return Self {
                collection,
                assessment_id,
                attempts: 0,
                average_percentage: 0,
                pass_rate: 0,
                best_score: 0,
                best_percentage: 0,
                last_attempt_at: None,
            };
        }

        let results = records.iter().map(|r| &r.result);
        let percentage_sum: u64 = results.clone().map(|r| u64::from(r.percentage())).sum();
        let passed = u32::try_from(results.clone().filter(|r| r.passed()).count()).unwrap_or(attempts);
        let average = (percentage_sum + u64::from(attempts) / 2) / u64::from(attempts);

        Self {
            collection,
            assessment_id,
            attempts,
            average_percentage: u32::try_from(average).unwrap_or(100),
            pass_rate: ResultCalculator::percentage(passed, attempts),
            best_score: results.clone().map(|r| r.score()).max().unwrap_or(0),
            best_percentage: results.clone().map(|r| r.percentage()).max().unwrap_or(0),
            last_attempt_at: results.map(|r| r.submitted_at()).max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentOverview {
    pub assessment: Assessment,
    pub report: AssessmentReport,
}

/// Application-facing service for result history and reports.
#[derive(Clone)]
pub struct ReportService {
    assessments: Arc<dyn AssessmentRepository>,
    results: Arc<dyn ResultRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        assessments: Arc<dyn AssessmentRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            assessments,
            results,
        }
    }

    /// Most recent results for a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on repository failures.
    pub async fn recent_results(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, ReportError> {
        let records = self
            .results
            .list_results_for_student(student_id, limit)
            .await?;
        Ok(records.iter().map(ResultListItem::from_record).collect())
    }

    /// Report for the assessment `locator` resolves to. Attempts at the
    /// same id in the other collection are not counted.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on repository failures.
    pub async fn assessment_report(
        &self,
        locator: AssessmentLocator,
    ) -> Result<AssessmentReport, ReportError> {
        let records = self.results.list_results_for_assessment(locator).await?;
        Ok(AssessmentReport::from_records(locator, &records))
    }

    /// Reports for every stored assessment, ordered by collection, then id.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on repository failures.
    pub async fn overview(&self) -> Result<Vec<AssessmentOverview>, ReportError> {
        let assessments = self.assessments.list_assessments().await?;
        let mut out = Vec::with_capacity(assessments.len());
        for assessment in assessments {
            let report = self.assessment_report(assessment.locator()).await?;
            out.push(AssessmentOverview { assessment, report });
        }
        Ok(out)
    }
}
