use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    /// 1-based number of the question on screen.
    pub current: usize,
}

impl SessionProgress {
    #[must_use]
    pub fn is_fully_answered(&self) -> bool {
        self.unanswered == 0
    }
}
