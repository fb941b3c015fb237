mod assessment;
mod ids;
mod question;
mod result;
mod student;

pub use ids::{AssessmentId, ParseIdError, QuestionId, SessionId, StudentId};

pub use assessment::{
    Assessment, AssessmentCollection, AssessmentError, AssessmentKind, AssessmentLocator,
};
pub use question::{OPTION_COUNT, Question, QuestionError};
pub use result::{AssessmentResult, PASS_PERCENTAGE, ResultError, format_time_taken, is_passing};
pub use student::{Student, StudentError};
