//! Render snapshots of a session.
//!
//! A `SessionView` is rebuilt from the session after every change; it owns
//! its data so a renderer never borrows the session across an await.

use serde::Serialize;

use brainwave_core::model::{AssessmentResult, OPTION_COUNT};

use super::progress::SessionProgress;
use super::service::{AssessmentSession, SessionState};

/// How a single option should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMark {
    Plain,
    Selected,
    /// Review only: the keyed option.
    Correct,
    /// Review only: the student's pick, which was not the keyed option.
    SelectedWrong,
}

impl OptionMark {
    fn for_option(state: SessionState, index: u8, selected: Option<u8>, correct: u8) -> Self {
        let is_selected = selected == Some(index);
        match state {
            SessionState::Reviewing if index == correct => Self::Correct,
            SessionState::Reviewing if is_selected => Self::SelectedWrong,
            _ if is_selected => Self::Selected,
            _ => Self::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub index: u8,
    /// `A` through `D`.
    pub label: char,
    pub text: String,
    pub mark: OptionMark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub marks: u32,
    pub selected: Option<u8>,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigatorItem {
    pub number: usize,
    pub answered: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub percentage: u32,
    /// `earned/total` marks.
    pub score: String,
    /// `correct/total` questions.
    pub correct: String,
    /// `m:ss`.
    pub time_taken: String,
    pub passed: bool,
    pub time_expired: bool,
}

impl ResultView {
    #[must_use]
    pub fn from_result(result: &AssessmentResult) -> Self {
        Self {
            percentage: result.percentage(),
            score: format!("{}/{}", result.score(), result.total_marks()),
            correct: format!("{}/{}", result.correct_count(), result.total_questions()),
            time_taken: result.time_taken_display(),
            passed: result.passed(),
            time_expired: result.time_expired(),
        }
    }

    #[must_use]
    pub fn verdict(&self) -> &'static str {
        if self.passed { "Passed" } else { "Not passed" }
    }
}

/// Full snapshot of what a session screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub title: String,
    pub subject: String,
    pub state: SessionState,
    pub question: QuestionView,
    pub progress: SessionProgress,
    pub navigator: Vec<NavigatorItem>,
    /// `MM:SS`.
    pub time_remaining: String,
    pub result: Option<ResultView>,
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &AssessmentSession) -> Self {
        let state = session.state();
        let current = session.current_index();
        let question = session.current_question();
        let selected = session.current_answer();

        let options = question
            .options()
            .iter()
            .zip(0_u8..)
            .map(|(text, index)| OptionView {
                index,
                label: char::from(b'A' + index),
                text: text.clone(),
                mark: OptionMark::for_option(state, index, selected, question.correct_answer()),
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(options.len(), OPTION_COUNT);

        let navigator = session
            .answers()
            .iter()
            .enumerate()
            .map(|(i, answer)| NavigatorItem {
                number: i + 1,
                answered: answer.is_some(),
                current: i == current,
            })
            .collect();

        Self {
            title: session.assessment().title().to_string(),
            subject: session.assessment().subject().to_string(),
            state,
            question: QuestionView {
                number: current + 1,
                total: session.total_questions(),
                text: question.text().to_string(),
                marks: question.marks(),
                selected,
                options,
            },
            progress: session.progress(),
            navigator,
            time_remaining: format_countdown(session.time_remaining_secs()),
            result: session.result().map(ResultView::from_result),
        }
    }
}

/// Format seconds as a zero-padded `MM:SS` countdown.
#[must_use]
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
