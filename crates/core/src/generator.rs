//! Procedural multiple-choice question generation.
//!
//! Questions are built from small per-subject template sets. The keyed option
//! is drawn at random and is unrelated to what the option text says; scoring
//! only ever compares indices.

use rand::Rng;

use crate::model::{Assessment, AssessmentKind, OPTION_COUNT, Question, QuestionId};

const MATHEMATICS: &[&str] = &[
    "What is {a} + {b}?",
    "Solve for x: {a}x = {c}",
    "What is the area of a rectangle measuring {a} by {b}?",
    "Which of these numbers is a factor of {c}?",
    "What is {b} squared minus {a}?",
];

const PHYSICS: &[&str] = &[
    "A body moves {c} metres in {a} seconds. What is its average speed?",
    "What happens to the kinetic energy of a {a} kg mass when its velocity doubles?",
    "A force of {b} N acts on a {a} kg mass. What is the acceleration?",
    "Which quantity is conserved in an elastic collision of {a} bodies?",
];

const CHEMISTRY: &[&str] = &[
    "How many electrons can the shell n = {a} hold?",
    "What is the pH change after diluting an acid {b} times?",
    "Which statement about element number {b} is correct?",
    "How many moles are contained in {c} g of a substance with molar mass {b}?",
];

const BIOLOGY: &[&str] = &[
    "Which organelle is described in statement {n}?",
    "A population doubles every {a} hours. What happens after {b} hours?",
    "Which process is illustrated in diagram {n}?",
    "How many chromosome pairs are described in case {a}?",
];

const ENGLISH: &[&str] = &[
    "Choose the correct form of the verb in sentence {n}.",
    "Which word is a synonym of the highlighted word in passage {a}?",
    "Identify the figure of speech used in line {b}.",
    "Which punctuation mark completes sentence {n}?",
];

const COMPUTER_SCIENCE: &[&str] = &[
    "How many bits are needed to represent {c} distinct values?",
    "What is the time complexity of the algorithm in listing {n}?",
    "What does the loop in snippet {a} print after {b} iterations?",
    "Which data structure best fits scenario {n}?",
];

const GENERIC: &[&str] = &[
    "Question {n}: which statement about {subject} is correct?",
    "Question {n}: identify the key concept in {subject} illustrated by case {a}.",
    "Question {n}: what is the best approach to problem {b} in {subject}?",
];

const OPTION_SETS: [[&str; OPTION_COUNT]; 5] = [
    ["True", "False", "Not enough information", "None of the above"],
    ["Increases", "Decreases", "Stays the same", "Cannot be determined"],
    [
        "Only statement I",
        "Only statement II",
        "Both I and II",
        "Neither I nor II",
    ],
    ["Always", "Sometimes", "Never", "It depends on the context"],
    ["Option A", "Option B", "Option C", "Option D"],
];

fn templates_for(subject: &str) -> &'static [&'static str] {
    match subject.trim().to_ascii_lowercase().as_str() {
        "mathematics" | "math" | "maths" => MATHEMATICS,
        "physics" => PHYSICS,
        "chemistry" => CHEMISTRY,
        "biology" => BIOLOGY,
        "english" => ENGLISH,
        "computer science" | "computing" => COMPUTER_SCIENCE,
        _ => GENERIC,
    }
}

fn render(template: &str, ordinal: u32, subject: &str) -> String {
    let n = u64::from(ordinal);
    let a = n + 1;
    let b = 2 * n + 3;
    let c = a * b;
    template
        .replace("{n}", &n.to_string())
        .replace("{a}", &a.to_string())
        .replace("{b}", &b.to_string())
        .replace("{c}", &c.to_string())
        .replace("{subject}", subject)
}

/// Builds the question set for an assessment.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionGenerator;

impl QuestionGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Number of questions generated for `kind`.
    #[must_use]
    pub fn question_count(kind: AssessmentKind) -> u32 {
        kind.question_count()
    }

    /// Marks awarded per question: `floor(total_marks / count)`.
    ///
    /// The remainder is dropped, so the assignable total can fall short of
    /// the assessment's declared total marks.
    #[must_use]
    pub fn marks_per_question(assessment: &Assessment) -> u32 {
        assessment.total_marks() / Self::question_count(assessment.kind())
    }

    /// Generate questions using the thread-local random source.
    #[must_use]
    pub fn generate(&self, assessment: &Assessment) -> Vec<Question> {
        self.generate_with_rng(assessment, &mut rand::rng())
    }

    /// Generate questions drawing options and keys from `rng`.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        assessment: &Assessment,
        rng: &mut R,
    ) -> Vec<Question> {
        let count = Self::question_count(assessment.kind());
        let marks = Self::marks_per_question(assessment);
        let templates = templates_for(assessment.subject());

        (1..=count)
            .map(|ordinal| {
                let index = usize::try_from(ordinal - 1).unwrap_or(0) % templates.len();
                let text = render(templates[index], ordinal, assessment.subject());
                let set = OPTION_SETS[rng.random_range(0..OPTION_SETS.len())];
                let options = set.map(String::from);
                let correct = rng.random_range(0..OPTION_COUNT as u8);
                Question::generated(QuestionId::new(ordinal), text, options, correct, marks)
            })
            .collect()
    }
}
