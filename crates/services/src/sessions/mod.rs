mod progress;
mod service;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{AssessmentSession, SessionState, SubmitOutcome, TickOutcome};
pub use timer::{TICK_PERIOD, TickReceiver, TimerHandle};
pub use view::{
    NavigatorItem, OptionMark, OptionView, QuestionView, ResultView, SessionView,
    format_countdown,
};
pub use workflow::AssessmentLoopService;
