//! Terminal controller for taking an assessment.
//!
//! Ticks from the session timer and lines from stdin are interleaved with
//! `tokio::select!`; each handler runs to completion before the next event.

use std::error::Error;
use std::fmt;

use brainwave_core::model::{AssessmentLocator, OPTION_COUNT};
use services::sessions::{SessionView, TICK_PERIOD};
use services::{AppServices, AssessmentSession, SessionError, SubmitOutcome, TickOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    /// 0-based question index.
    GoTo(usize),
    /// 0-based option index.
    Answer(u8),
    Submit,
    Review,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Unknown(String),
    BadQuestion(String),
    BadOption(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Unknown(raw) => write!(f, "unknown command: {raw} (h for help)"),
            InputError::BadQuestion(raw) => write!(f, "not a question number: {raw}"),
            InputError::BadOption(raw) => write!(f, "choose an option from 1 to {OPTION_COUNT}: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

impl Input {
    /// Parse one line of user input. Numbers are 1-based on the wire.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();
        match (command.as_str(), arg) {
            ("n", None) => Ok(Self::Next),
            ("p", None) => Ok(Self::Previous),
            ("s", None) => Ok(Self::Submit),
            ("r", None) => Ok(Self::Review),
            ("h" | "?", None) => Ok(Self::Help),
            ("q", None) => Ok(Self::Quit),
            ("g", Some(raw)) => raw
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map(Self::GoTo)
                .ok_or_else(|| InputError::BadQuestion(raw.to_string())),
            ("a", Some(raw)) => raw
                .parse::<u8>()
                .ok()
                .filter(|n| (1..=OPTION_COUNT).contains(&usize::from(*n)))
                .map(|n| Self::Answer(n - 1))
                .ok_or_else(|| InputError::BadOption(raw.to_string())),
            _ => Err(InputError::Unknown(line.trim().to_string())),
        }
    }
}

fn print_help(reviewing: bool) {
    if reviewing {
        println!("n next · p previous · g <k> go to question k · q quit");
    } else {
        println!(
            "n next · p previous · g <k> go to question k · a <1-4> answer · s submit · q leave"
        );
    }
}

fn show(session: &AssessmentSession) {
    print!("{}", render::session(&SessionView::from_session(session)));
}

fn show_result(session: &AssessmentSession) {
    let view = SessionView::from_session(session);
    if let Some(result) = &view.result {
        print!("{}", render::result(&view.title, result));
    }
}

/// A failed append leaves the session submitted; report it and keep going so
/// the result is still shown and `finalize_result` can retry.
fn stored_anyway<T>(outcome: Result<T, SessionError>) -> Result<Option<T>, SessionError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(SessionError::Storage(err)) => {
            tracing::error!(error = %err, "storing the result failed");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Run one assessment end to end on the terminal.
///
/// A locator that matches nothing prints an alert and returns normally.
///
/// # Errors
///
/// Returns an error for storage, scoring or stdin failures.
pub async fn run(
    services: &AppServices,
    locator: AssessmentLocator,
    review_after: bool,
) -> Result<(), Box<dyn Error>> {
    let loop_svc = services.assessment_loop();
    let mut session = match loop_svc.start_session(locator).await {
        Ok(session) => session,
        Err(SessionError::AssessmentNotFound { id, kind }) => {
            eprintln!("Assessment not found: no {kind} with id {id}.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    if services.current_student().is_none() {
        println!("No student configured; this attempt will not be saved.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticks = session.start_timer(TICK_PERIOD);
    let mut confirm_pending = false;
    show(&session);
    print_help(false);

    while session.is_active() {
        tokio::select! {
            tick = ticks.recv() => {
                if tick.is_none() {
                    break;
                }
                match stored_anyway(loop_svc.tick(&mut session).await)? {
                    Some(TickOutcome::Expired) => println!("\nTime is up."),
                    Some(TickOutcome::Running { remaining_secs })
                        if remaining_secs % 60 == 0 || remaining_secs == 30 || remaining_secs <= 10 =>
                    {
                        println!("⏱ {} left", services::sessions::format_countdown(remaining_secs));
                    }
                    _ => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!(session = %session.id(), "stdin closed, leaving session");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                let input = match Input::parse(&line) {
                    Ok(input) => input,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };

                let confirming = std::mem::take(&mut confirm_pending);
                match input {
                    Input::Next => { session.next(); show(&session); }
                    Input::Previous => { session.previous(); show(&session); }
                    Input::GoTo(index) => {
                        if !session.go_to_question(index) && index >= session.total_questions() {
                            println!("There are only {} questions.", session.total_questions());
                        }
                        show(&session);
                    }
                    Input::Answer(option) => { session.select_answer(option); show(&session); }
                    Input::Submit => {
                        let outcome = stored_anyway(loop_svc.submit(&mut session, confirming).await)?;
                        if let Some(SubmitOutcome::NeedsConfirmation { unanswered }) = outcome {
                            println!("{unanswered} question(s) unanswered. Press s again to submit anyway.");
                            confirm_pending = true;
                        }
                    }
                    Input::Review => println!("Review is available after submitting."),
                    Input::Help => print_help(false),
                    Input::Quit => {
                        tracing::info!(session = %session.id(), "session abandoned");
                        println!("Left the assessment; nothing was submitted.");
                        return Ok(());
                    }
                }
            }
        }
    }
    drop(ticks);

    show_result(&session);
    if session.is_submitted() && !session.is_stored() {
        if let Err(err) = loop_svc.finalize_result(&mut session).await {
            tracing::error!(error = %err, "result could not be stored");
        }
    }

    if review_after {
        review(&mut session, &mut lines).await?;
    } else {
        println!("Press r to review answers, or q to quit.");
        while let Some(line) = lines.next_line().await? {
            match Input::parse(&line) {
                Ok(Input::Review) => {
                    review(&mut session, &mut lines).await?;
                    break;
                }
                Ok(Input::Quit) => break,
                _ => println!("r review · q quit"),
            }
        }
    }
    Ok(())
}

async fn review<R>(
    session: &mut AssessmentSession,
    lines: &mut tokio::io::Lines<R>,
) -> Result<(), Box<dyn Error>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    session.enter_review()?;
    show(session);
    print_help(true);
    while let Some(line) = lines.next_line().await? {
        let moved = match Input::parse(&line) {
            Ok(Input::Next) => session.next(),
            Ok(Input::Previous) => session.previous(),
            Ok(Input::GoTo(index)) => session.go_to_question(index),
            Ok(Input::Quit) => break,
            Ok(Input::Help) => {
                print_help(true);
                false
            }
            Ok(_) => {
                println!("Answers are locked during review.");
                false
            }
            Err(err) => {
                println!("{err}");
                false
            }
        };
        if moved {
            show(session);
        }
    }
    Ok(())
}
