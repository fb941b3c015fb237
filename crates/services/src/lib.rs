#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod reports;
pub mod result_store;
pub mod sessions;

pub use brainwave_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ReportError, SessionError};
pub use reports::{AssessmentOverview, AssessmentReport, ReportService, ResultListItem};
pub use result_store::ResultStore;

pub use sessions::{
    AssessmentLoopService, AssessmentSession, SessionProgress, SessionState, SubmitOutcome,
    TickOutcome, TimerHandle,
};
