use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use brainwave_core::ResultCalculator;
use brainwave_core::model::{
    Assessment, AssessmentResult, OPTION_COUNT, Question, SessionId,
};
use brainwave_core::time::elapsed_secs;

use super::progress::SessionProgress;
use super::timer::{TickReceiver, TimerHandle};
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a session once it has been initialized.
///
/// Only `Active` lets the clock run and answers change. `Reviewing` keeps
/// navigation available over frozen answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Submitted,
    Reviewing,
}

/// Outcome of a submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Unanswered questions remain; ask the student and resubmit with
    /// `force_confirmed = true`.
    NeedsConfirmation { unanswered: usize },
    /// The session is now submitted and its result is available.
    Submitted,
}

/// Outcome of a one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u64 },
    /// Time ran out on this tick and the session was auto-submitted.
    Expired,
    /// The session is not running; the tick was ignored.
    Idle,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One student's attempt at an assessment.
///
/// Owned by whichever controller drives it and discarded when the student
/// leaves. Dropping the session drops its timer handle, which stops the tick
/// task.
pub struct AssessmentSession {
    id: SessionId,
    assessment: Assessment,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Option<u8>>,
    time_remaining_secs: u64,
    started_at: DateTime<Utc>,
    state: SessionState,
    result: Option<AssessmentResult>,
    result_id: Option<i64>,
    stored: bool,
    timer: Option<TimerHandle>,
}

impl AssessmentSession {
    /// Start a session over a generated question set.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn initialize(
        assessment: Assessment,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let answers = vec![None; questions.len()];
        let time_remaining_secs = assessment.duration_secs();
        let id = SessionId::random();
        tracing::info!(
            session = %id,
            assessment = %assessment.id(),
            kind = %assessment.kind(),
            questions = questions.len(),
            time_limit_secs = time_remaining_secs,
            "assessment session started"
        );

        Ok(Self {
            id,
            assessment,
            questions,
            current: 0,
            answers,
            time_remaining_secs,
            started_at,
            state: SessionState::Active,
            result: None,
            result_id: None,
            stored: false,
            timer: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<u8>] {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<u8> {
        self.answers[self.current]
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u64 {
        self.time_remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    /// The scored result, once submitted.
    #[must_use]
    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// Storage id of the persisted result, if it was stored.
    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.total_questions() - self.answered_count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.answered_count(),
            unanswered: self.unanswered_count(),
            current: self.current + 1,
        }
    }

    // ─── Timer ownership ──────────────────────────────────────────────────────

    /// Hand the running tick timer to the session.
    ///
    /// The timer is cancelled on submission and when the session is dropped.
    /// A timer attached after submission is cancelled immediately.
    pub fn attach_timer(&mut self, mut timer: TimerHandle) {
        if self.is_active() {
            if let Some(mut previous) = self.timer.replace(timer) {
                previous.cancel();
            }
        } else {
            timer.cancel();
        }
    }

    /// Spawn a countdown timer, attach it, and return its tick channel.
    ///
    /// Feed each received tick to `tick` (or `AssessmentLoopService::tick`).
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_timer(&mut self, period: Duration) -> TickReceiver {
        let (handle, ticks) = TimerHandle::start(period);
        self.attach_timer(handle);
        ticks
    }

    /// True while a timer is attached and not cancelled.
    #[must_use]
    pub fn has_running_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }

    // ─── Answering and navigation ─────────────────────────────────────────────

    /// Record `option` as the answer to the current question.
    ///
    /// Returns `false` (and changes nothing) outside `Active` or when
    /// `option` is not a valid option index.
    pub fn select_answer(&mut self, option: u8) -> bool {
        if !self.is_active() {
            return false;
        }
        if usize::from(option) >= OPTION_COUNT {
            tracing::warn!(session = %self.id, option, "ignoring out-of-range option");
            return false;
        }
        self.answers[self.current] = Some(option);
        true
    }

    /// Jump to question `index` (0-based).
    ///
    /// Ignored when submitted but not reviewing, or when `index` is out of
    /// range. Returns whether the current question changed.
    pub fn go_to_question(&mut self, index: usize) -> bool {
        if self.state == SessionState::Submitted {
            return false;
        }
        if index >= self.questions.len() {
            tracing::debug!(session = %self.id, index, "ignoring out-of-range navigation");
            return false;
        }
        let changed = self.current != index;
        self.current = index;
        changed
    }

    /// Move to the next question; no-op on the last one.
    pub fn next(&mut self) -> bool {
        let target = (self.current + 1).min(self.questions.len() - 1);
        self.go_to_question(target)
    }

    /// Move to the previous question; no-op on the first one.
    pub fn previous(&mut self) -> bool {
        self.go_to_question(self.current.saturating_sub(1))
    }

    // ─── Time ─────────────────────────────────────────────────────────────────

    /// Time left according to the wall clock alone.
    #[must_use]
    pub fn wall_clock_remaining(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = elapsed_secs(self.started_at, now);
        self.assessment.duration_secs().saturating_sub(elapsed)
    }

    /// Clamp the tick-driven countdown to the wall clock so that a host
    /// that stopped delivering ticks never gains time.
    fn reconcile(&mut self, now: DateTime<Utc>) {
        let allowed = self.wall_clock_remaining(now);
        if allowed < self.time_remaining_secs {
            tracing::debug!(
                session = %self.id,
                counted = self.time_remaining_secs,
                allowed,
                "countdown reconciled with wall clock"
            );
            self.time_remaining_secs = allowed;
        }
    }

    /// Advance the countdown by one second.
    ///
    /// When the countdown reaches zero the session is submitted with the
    /// time-expired flag, skipping the unanswered-questions confirmation.
    /// Further ticks return `TickOutcome::Idle`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Scoring` if the result cannot be computed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, SessionError> {
        if !self.is_active() {
            return Ok(TickOutcome::Idle);
        }

        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        self.reconcile(now);

        if self.time_remaining_secs == 0 {
            tracing::info!(session = %self.id, "time expired, auto-submitting");
            self.finish(now, true)?;
            return Ok(TickOutcome::Expired);
        }

        Ok(TickOutcome::Running {
            remaining_secs: self.time_remaining_secs,
        })
    }

    // ─── Submission ───────────────────────────────────────────────────────────

    /// Submit the session.
    ///
    /// With unanswered questions and `force_confirmed == false` nothing
    /// changes and `SubmitOutcome::NeedsConfirmation` is returned. If the wall
    /// clock shows the time already ran out, the submission proceeds as a
    /// timeout regardless of `force_confirmed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session was already
    /// submitted, or `SessionError::Scoring` if scoring fails.
    pub fn submit(
        &mut self,
        force_confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }

        self.reconcile(now);
        if self.time_remaining_secs == 0 {
            self.finish(now, true)?;
            return Ok(SubmitOutcome::Submitted);
        }

        let unanswered = self.unanswered_count();
        if unanswered > 0 && !force_confirmed {
            tracing::debug!(session = %self.id, unanswered, "submission needs confirmation");
            return Ok(SubmitOutcome::NeedsConfirmation { unanswered });
        }

        self.finish(now, false)?;
        Ok(SubmitOutcome::Submitted)
    }

    fn finish(&mut self, now: DateTime<Utc>, time_expired: bool) -> Result<(), SessionError> {
        let result = ResultCalculator::calculate(
            &self.assessment,
            &self.questions,
            &self.answers,
            self.started_at,
            now,
            time_expired,
        )?;
        debug_assert_eq!(result.total_questions() as usize, self.questions.len());

        self.stop_timer();
        if time_expired {
            self.time_remaining_secs = 0;
        }
        self.state = SessionState::Submitted;
        tracing::info!(
            session = %self.id,
            score = result.score(),
            total = result.total_marks(),
            percentage = result.percentage(),
            passed = result.passed(),
            time_expired,
            "assessment submitted"
        );
        self.result = Some(result);
        Ok(())
    }

    /// Switch a submitted session into review mode.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` unless the session is in
    /// `Submitted`.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Submitted {
            return Err(SessionError::NotSubmitted);
        }
        self.state = SessionState::Reviewing;
        self.current = 0;
        Ok(())
    }

    /// True once the result has been handed to the result store, whether or
    /// not it was kept.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub(crate) fn mark_stored(&mut self, id: Option<i64>) {
        self.stored = true;
        self.result_id = id;
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("id", &self.id)
            .field("assessment_id", &self.assessment.id())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("time_remaining_secs", &self.time_remaining_secs)
            .field("state", &self.state)
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::QuestionGenerator;
    use brainwave_core::model::{AssessmentId, AssessmentKind};
    use brainwave_core::time::fixed_now;
    use chrono::Duration;

    fn quiz() -> Assessment {
        Assessment::new(
            AssessmentId::new(1),
            "Algebra Basics",
            "Mathematics",
            AssessmentKind::Quiz,
            10,
            100,
        )
        .unwrap()
    }

    fn start(assessment: Assessment) -> AssessmentSession {
        let questions = QuestionGenerator::new().generate(&assessment);
        AssessmentSession::initialize(assessment, questions, fixed_now()).unwrap()
    }

    fn answer_all(session: &mut AssessmentSession, correct: usize) {
        for i in 0..session.total_questions() {
            session.go_to_question(i);
            let key = session.current_question().correct_answer();
            let pick = if i < correct { key } else { (key + 1) % 4 };
            assert!(session.select_answer(pick));
        }
    }

    #[test]
    fn initialize_sets_clock_and_blank_answers() {
        let session = start(quiz());
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.total_questions(), 20);
        assert_eq!(session.answers().len(), 20);
        assert!(session.answers().iter().all(Option::is_none));
        assert_eq!(session.time_remaining_secs(), 600);
        assert_eq!(session.started_at(), fixed_now());
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = AssessmentSession::initialize(quiz(), Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn select_answer_ignores_invalid_option() {
        let mut session = start(quiz());
        assert!(!session.select_answer(4));
        assert_eq!(session.current_answer(), None);
        assert!(session.select_answer(3));
        assert_eq!(session.current_answer(), Some(3));
    }

    #[test]
    fn navigation_is_clamped_and_idempotent() {
        let mut session = start(quiz());
        assert!(!session.previous());
        assert_eq!(session.current_index(), 0);

        assert!(!session.go_to_question(0));
        assert!(!session.go_to_question(20));
        assert_eq!(session.current_index(), 0);

        assert!(session.go_to_question(19));
        assert!(!session.next());
        assert_eq!(session.current_index(), 19);

        assert!(session.previous());
        assert_eq!(session.current_index(), 18);
        assert!(session.next());
        assert_eq!(session.current_index(), 19);
    }

    #[test]
    fn full_marks_when_all_correct() {
        let mut session = start(quiz());
        answer_all(&mut session, 20);
        let outcome = session.submit(false, fixed_now() + Duration::seconds(90)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted);

        let result = session.result().unwrap();
        assert_eq!(result.score(), 100);
        assert_eq!(result.percentage(), 100);
        assert!(result.passed());
        assert!(!result.time_expired());
        assert_eq!(result.time_taken_display(), "1:30");
    }

    #[test]
    fn eight_correct_passes_at_threshold() {
        let mut session = start(quiz());
        answer_all(&mut session, 8);
        session.submit(false, fixed_now()).unwrap();
        let result = session.result().unwrap();
        assert_eq!(result.score(), 40);
        assert_eq!(result.percentage(), 40);
        assert!(result.passed());
    }

    #[test]
    fn seven_correct_fails() {
        let mut session = start(quiz());
        answer_all(&mut session, 7);
        session.submit(false, fixed_now()).unwrap();
        let result = session.result().unwrap();
        assert_eq!(result.percentage(), 35);
        assert!(!result.passed());
    }

    #[test]
    fn unanswered_questions_gate_submission() {
        let mut session = start(quiz());
        answer_all(&mut session, 20);
        for i in [2, 9, 15] {
            session.answers[i] = None;
        }

        let outcome = session.submit(false, fixed_now()).unwrap();
        assert_eq!(outcome, SubmitOutcome::NeedsConfirmation { unanswered: 3 });
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.result().is_none());

        let outcome = session.submit(true, fixed_now()).unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert_eq!(session.result().unwrap().correct_count(), 17);
    }

    #[test]
    fn second_submit_is_rejected() {
        let mut session = start(quiz());
        session.submit(true, fixed_now()).unwrap();
        let err = session.submit(true, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NotActive));
    }

    #[test]
    fn countdown_expires_once() {
        let mut session = start(quiz());
        let mut expired = 0;
        for second in 1..=700_i64 {
            let outcome = session
                .tick(fixed_now() + Duration::seconds(second))
                .unwrap();
            if outcome == TickOutcome::Expired {
                expired += 1;
                assert_eq!(second, 600);
            }
        }
        assert_eq!(expired, 1);
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.time_remaining_secs(), 0);
        let result = session.result().unwrap();
        assert!(result.time_expired());
        assert_eq!(result.time_taken_display(), "10:00");
    }

    #[test]
    fn timeout_skips_confirmation_gate() {
        let mut session = start(quiz());
        for _ in 0..599 {
            session.tick(fixed_now()).unwrap();
        }
        assert_eq!(session.time_remaining_secs(), 1);
        assert_eq!(session.tick(fixed_now()).unwrap(), TickOutcome::Expired);
        assert_eq!(session.result().unwrap().correct_count(), 0);
    }

    #[test]
    fn suspended_host_does_not_gain_time() {
        let mut session = start(quiz());
        // Only one tick delivered, but four minutes of wall clock passed.
        let outcome = session
            .tick(fixed_now() + Duration::minutes(4))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Running { remaining_secs: 360 });
    }

    #[test]
    fn late_submit_counts_as_timeout() {
        let mut session = start(quiz());
        let outcome = session
            .submit(false, fixed_now() + Duration::minutes(30))
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted);
        let result = session.result().unwrap();
        assert!(result.time_expired());
        assert_eq!(result.time_taken_secs(), 600);
    }

    #[test]
    fn review_freezes_answers_but_allows_navigation() {
        let mut session = start(quiz());
        session.select_answer(1);
        session.submit(true, fixed_now()).unwrap();

        assert!(!session.go_to_question(3));
        session.enter_review().unwrap();
        assert_eq!(session.state(), SessionState::Reviewing);

        assert!(session.go_to_question(3));
        assert!(!session.select_answer(2));
        assert_eq!(session.answers()[3], None);
        assert_eq!(session.tick(fixed_now()).unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn review_requires_submission() {
        let mut session = start(quiz());
        assert!(matches!(
            session.enter_review(),
            Err(SessionError::NotSubmitted)
        ));
        session.submit(true, fixed_now()).unwrap();
        session.enter_review().unwrap();
        assert!(matches!(
            session.enter_review(),
            Err(SessionError::NotSubmitted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_stops_the_timer() {
        let mut session = start(quiz());
        let mut ticks = session.start_timer(crate::sessions::TICK_PERIOD);
        ticks.recv().await.unwrap();
        session.tick(fixed_now()).unwrap();
        assert!(session.has_running_timer());

        session.submit(true, fixed_now()).unwrap();
        assert!(!session.has_running_timer());
        while ticks.recv().await.is_some() {}

        // A timer attached after submission never runs.
        let _ticks = session.start_timer(crate::sessions::TICK_PERIOD);
        assert!(!session.has_running_timer());
    }

    #[test]
    fn result_totals_match_session() {
        let assessment = Assessment::new(
            AssessmentId::new(2),
            "Essay",
            "English",
            AssessmentKind::Assignment,
            30,
            97,
        )
        .unwrap();
        let mut session = start(assessment);
        answer_all(&mut session, 10);
        session.submit(false, fixed_now()).unwrap();
        let result = session.result().unwrap();
        assert_eq!(result.total_questions(), 10);
        assert_eq!(result.total_marks(), 90);
        assert_eq!(result.score(), 90);
        assert_eq!(result.percentage(), 100);
    }
}
