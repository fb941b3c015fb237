use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use brainwave_core::QuestionGenerator;
use brainwave_core::model::AssessmentLocator;
use storage::repository::{AssessmentRepository, StorageError};

use super::service::{AssessmentSession, SubmitOutcome, TickOutcome};
use crate::Clock;
use crate::error::SessionError;
use crate::result_store::ResultStore;

/// Orchestrates session start, timed ticks and persisted submission.
#[derive(Clone)]
pub struct AssessmentLoopService {
    clock: Clock,
    assessments: Arc<dyn AssessmentRepository>,
    results: ResultStore,
    generator: QuestionGenerator,
    question_seed: Option<u64>,
}

impl AssessmentLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        assessments: Arc<dyn AssessmentRepository>,
        results: ResultStore,
    ) -> Self {
        Self {
            clock,
            assessments,
            results,
            generator: QuestionGenerator::new(),
            question_seed: None,
        }
    }

    /// Generate questions from a seeded source instead of the thread RNG.
    #[must_use]
    pub fn with_question_seed(mut self, seed: u64) -> Self {
        self.question_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn result_store(&self) -> &ResultStore {
        &self.results
    }

    /// Look up the assessment and start a session over fresh questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AssessmentNotFound` if no assessment with the
    /// locator's id exists in its kind's collection, or `SessionError::Storage`
    /// for other storage failures.
    pub async fn start_session(
        &self,
        locator: AssessmentLocator,
    ) -> Result<AssessmentSession, SessionError> {
        let assessment = match self.assessments.find_assessment(locator).await {
            Ok(assessment) => assessment,
            Err(StorageError::NotFound) => {
                tracing::warn!(id = %locator.id, kind = %locator.kind, "assessment not found");
                return Err(SessionError::AssessmentNotFound {
                    id: locator.id,
                    kind: locator.kind,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let questions = match self.question_seed {
            Some(seed) => self
                .generator
                .generate_with_rng(&assessment, &mut StdRng::seed_from_u64(seed)),
            None => self.generator.generate(&assessment),
        };
        AssessmentSession::initialize(assessment, questions, self.clock.now())
    }

    /// Deliver one timer tick, persisting the result if time ran out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if scoring or persistence fails. On a storage
    /// failure the session is still submitted; call `finalize_result` to retry.
    pub async fn tick(&self, session: &mut AssessmentSession) -> Result<TickOutcome, SessionError> {
        let outcome = session.tick(self.clock.now())?;
        if outcome == TickOutcome::Expired {
            self.finalize_result(session).await?;
        }
        Ok(outcome)
    }

    /// Submit the session, persisting the result once it is submitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session was already submitted,
    /// or `SessionError` for scoring and persistence failures.
    pub async fn submit(
        &self,
        session: &mut AssessmentSession,
        force_confirmed: bool,
    ) -> Result<SubmitOutcome, SessionError> {
        let outcome = session.submit(force_confirmed, self.clock.now())?;
        if outcome == SubmitOutcome::Submitted {
            self.finalize_result(session).await?;
        }
        Ok(outcome)
    }

    /// Hand the submitted result to the result store if not done yet.
    ///
    /// Safe to call repeatedly; a result is stored at most once. Useful when
    /// the append after submission failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` if the session has no result.
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn finalize_result(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<Option<i64>, SessionError> {
        if session.is_stored() {
            return Ok(session.result_id());
        }
        let Some(result) = session.result() else {
            return Err(SessionError::NotSubmitted);
        };

        let id = self.results.append_result(result).await?;
        session.mark_stored(id);
        Ok(id)
    }
}
