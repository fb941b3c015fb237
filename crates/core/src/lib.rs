#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod model;
pub mod scoring;
pub mod time;

pub use error::Error;
pub use generator::QuestionGenerator;
pub use scoring::{ResultCalculator, ScoreBreakdown, ScoringError};
pub use time::Clock;
