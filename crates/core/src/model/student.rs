use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::StudentId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student code cannot be empty")]
    EmptyCode,

    #[error("student name cannot be empty")]
    EmptyName,
}

/// A student as identified on stored results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    code: String,
    name: String,
}

impl Student {
    /// # Errors
    ///
    /// Returns `StudentError` if the code or name is blank.
    pub fn new(
        id: StudentId,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, StudentError> {
        let code = code.into().trim().to_owned();
        let name = name.into().trim().to_owned();
        if code.is_empty() {
            return Err(StudentError::EmptyCode);
        }
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        Ok(Self { id, code, name })
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_validates() {
        let s = Student::new(StudentId::new(1), " BW-001 ", "Ada").unwrap();
        assert_eq!(s.code(), "BW-001");
        assert_eq!(
            Student::new(StudentId::new(1), "", "Ada").unwrap_err(),
            StudentError::EmptyCode
        );
    }
}
