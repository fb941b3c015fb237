use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::AssessmentId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("assessment title cannot be empty")]
    EmptyTitle,

    #[error("assessment subject cannot be empty")]
    EmptySubject,

    #[error("assessment duration must be > 0 minutes")]
    InvalidDuration,

    #[error("assessment total marks must be > 0")]
    InvalidTotalMarks,

    #[error("unknown assessment type: {0}")]
    UnknownKind(String),

    #[error("assessment link is missing the `{0}` parameter")]
    MissingParameter(&'static str),

    #[error("invalid assessment id in link: {0}")]
    InvalidId(String),

    #[error("invalid assessment link: {0}")]
    InvalidLink(String),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// The kind of an assessment, as carried by the `type` link parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Quiz,
    Assignment,
    Exam,
    Mock,
}

/// Storage collection group an assessment lives in.
///
/// Quizzes and assignments are stored together, as are exams and mocks.
/// Ids are unique within a collection only, so quiz 1 and exam 1 are
/// different assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentCollection {
    Coursework,
    Examinations,
}

impl AssessmentCollection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentCollection::Coursework => "coursework",
            AssessmentCollection::Examinations => "examinations",
        }
    }

    /// Kinds stored in this collection.
    #[must_use]
    pub fn kinds(self) -> &'static [AssessmentKind] {
        match self {
            AssessmentCollection::Coursework => &[AssessmentKind::Quiz, AssessmentKind::Assignment],
            AssessmentCollection::Examinations => &[AssessmentKind::Exam, AssessmentKind::Mock],
        }
    }
}

impl AssessmentKind {
    /// Number of generated questions for this kind.
    #[must_use]
    pub fn question_count(self) -> u32 {
        match self {
            AssessmentKind::Exam | AssessmentKind::Mock => 40,
            AssessmentKind::Assignment => 10,
            AssessmentKind::Quiz => 20,
        }
    }

    #[must_use]
    pub fn collection(self) -> AssessmentCollection {
        match self {
            AssessmentKind::Quiz | AssessmentKind::Assignment => AssessmentCollection::Coursework,
            AssessmentKind::Exam | AssessmentKind::Mock => AssessmentCollection::Examinations,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::Assignment => "assignment",
            AssessmentKind::Exam => "exam",
            AssessmentKind::Mock => "mock",
        }
    }
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentKind {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiz" => Ok(AssessmentKind::Quiz),
            "assignment" => Ok(AssessmentKind::Assignment),
            "exam" => Ok(AssessmentKind::Exam),
            "mock" => Ok(AssessmentKind::Mock),
            other => Err(AssessmentError::UnknownKind(other.to_string())),
        }
    }
}

//
// ─── ASSESSMENT ────────────────────────────────────────────────────────────────
//

/// An assessment definition as managed by the admin console.
///
/// Immutable once loaded; a session only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    id: AssessmentId,
    title: String,
    subject: String,
    kind: AssessmentKind,
    duration_minutes: u32,
    total_marks: u32,
}

impl Assessment {
    /// Creates a validated assessment.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError` if the title or subject is blank, or if the
    /// duration or total marks are zero.
    pub fn new(
        id: AssessmentId,
        title: impl Into<String>,
        subject: impl Into<String>,
        kind: AssessmentKind,
        duration_minutes: u32,
        total_marks: u32,
    ) -> Result<Self, AssessmentError> {
        let title = title.into().trim().to_owned();
        let subject = subject.into().trim().to_owned();
        if title.is_empty() {
            return Err(AssessmentError::EmptyTitle);
        }
        if subject.is_empty() {
            return Err(AssessmentError::EmptySubject);
        }
        if duration_minutes == 0 {
            return Err(AssessmentError::InvalidDuration);
        }
        if total_marks == 0 {
            return Err(AssessmentError::InvalidTotalMarks);
        }

        Ok(Self {
            id,
            title,
            subject,
            kind,
            duration_minutes,
            total_marks,
        })
    }

    #[must_use]
    pub fn id(&self) -> AssessmentId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn kind(&self) -> AssessmentKind {
        self.kind
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Full allotted time in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    #[must_use]
    pub fn total_marks(&self) -> u32 {
        self.total_marks
    }

    /// The `(id, type)` pair that opens this assessment.
    #[must_use]
    pub fn locator(&self) -> AssessmentLocator {
        AssessmentLocator::new(self.id, self.kind)
    }
}

//
// ─── LOCATOR ───────────────────────────────────────────────────────────────────
//

/// The `(id, type)` pair used to look an assessment up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssessmentLocator {
    pub id: AssessmentId,
    pub kind: AssessmentKind,
}

impl AssessmentLocator {
    #[must_use]
    pub fn new(id: AssessmentId, kind: AssessmentKind) -> Self {
        Self { id, kind }
    }

    /// Collection searched for this locator's id.
    #[must_use]
    pub fn collection(&self) -> AssessmentCollection {
        self.kind.collection()
    }

    /// Parse a locator from a take-assessment link such as
    /// `https://host/take-assessment.html?id=12&type=quiz`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError` if the link does not parse or a parameter is
    /// missing or malformed.
    pub fn from_link(link: &str) -> Result<Self, AssessmentError> {
        let url = Url::parse(link)
            .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(link)))
            .map_err(|e| AssessmentError::InvalidLink(e.to_string()))?;
        Self::from_url(&url)
    }

    /// Parse a locator from the query parameters of `url`.
    ///
    /// # Errors
    ///
    /// See [`AssessmentLocator::from_link`].
    pub fn from_url(url: &Url) -> Result<Self, AssessmentError> {
        let mut id = None;
        let mut kind = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "id" => id = Some(value.into_owned()),
                "type" => kind = Some(value.into_owned()),
                _ => {}
            }
        }

        let raw_id = id.ok_or(AssessmentError::MissingParameter("id"))?;
        let raw_kind = kind.ok_or(AssessmentError::MissingParameter("type"))?;
        let id = raw_id
            .parse::<AssessmentId>()
            .map_err(|_| AssessmentError::InvalidId(raw_id.clone()))?;
        let kind = raw_kind.parse::<AssessmentKind>()?;
        Ok(Self { id, kind })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
