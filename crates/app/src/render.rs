//! Plain-text rendering of session snapshots.

use std::fmt::Write as _;

use services::sessions::{OptionMark, ResultView, SessionView};
use services::{AssessmentOverview, ResultListItem};

fn option_prefix(mark: OptionMark) -> &'static str {
    match mark {
        OptionMark::Plain => "   ",
        OptionMark::Selected => "(*)",
        OptionMark::Correct => "[+]",
        OptionMark::SelectedWrong => "[x]",
    }
}

/// Navigator strip: `[3]` marks the current question, `*` an answered one.
fn navigator(view: &SessionView) -> String {
    view.navigator
        .iter()
        .map(|item| {
            let answered = if item.answered { "*" } else { "" };
            if item.current {
                format!("[{}{answered}]", item.number)
            } else {
                format!("{}{answered}", item.number)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn session(view: &SessionView) -> String {
    let mut out = String::new();
    let q = &view.question;
    let _ = writeln!(out, "{} · {}   ⏱ {}", view.title, view.subject, view.time_remaining);
    let _ = writeln!(
        out,
        "Question {}/{} ({} marks)   answered {}/{}",
        q.number, q.total, q.marks, view.progress.answered, view.progress.total
    );
    let _ = writeln!(out, "{}", q.text);
    for option in &q.options {
        let _ = writeln!(
            out,
            "  {} {}. {}",
            option_prefix(option.mark),
            option.label,
            option.text
        );
    }
    let _ = writeln!(out, "{}", navigator(view));
    out
}

#[must_use]
pub fn result(title: &str, result: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── {title} ──");
    if result.time_expired {
        let _ = writeln!(out, "Time expired; answers were submitted automatically.");
    }
    let _ = writeln!(out, "Score:      {} ({}%)", result.score, result.percentage);
    let _ = writeln!(out, "Correct:    {}", result.correct);
    let _ = writeln!(out, "Time taken: {}", result.time_taken);
    let _ = writeln!(out, "Result:     {}", result.verdict());
    out
}

#[must_use]
pub fn history(items: &[ResultListItem]) -> String {
    if items.is_empty() {
        return "No results yet.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "#{:<4} {:<28} {:<10} {:>3}/{:<3} {:>3}%  {}  {}",
            item.id,
            item.title,
            item.kind,
            item.score,
            item.total_marks,
            item.percentage,
            if item.passed { "pass" } else { "fail" },
            item.submitted_at.format("%Y-%m-%d %H:%M"),
        );
    }
    out
}

#[must_use]
pub fn overview(rows: &[AssessmentOverview]) -> String {
    let mut out = String::new();
    for row in rows {
        let r = &row.report;
        let _ = writeln!(
            out,
            "{:>4} {:<28} {:<10} attempts {:>3}  avg {:>3}%  pass rate {:>3}%  best {}",
            row.assessment.id(),
            row.assessment.title(),
            row.assessment.kind(),
            r.attempts,
            r.average_percentage,
            r.pass_rate,
            r.best_score,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::QuestionGenerator;
    use brainwave_core::model::{Assessment, AssessmentId, AssessmentKind};
    use brainwave_core::time::fixed_now;
    use services::AssessmentSession;

    fn view() -> SessionView {
        let assessment = Assessment::new(
            AssessmentId::new(1),
            "Algebra Basics",
            "Mathematics",
            AssessmentKind::Quiz,
            10,
            100,
        )
        .unwrap();
        let questions = QuestionGenerator::new().generate(&assessment);
        let mut session = AssessmentSession::initialize(assessment, questions, fixed_now()).unwrap();
        session.select_answer(2);
        session.next();
        SessionView::from_session(&session)
    }

    #[test]
    fn session_screen_shows_question_and_clock() {
        let text = session(&view());
        assert!(text.contains("10:00"));
        assert!(text.contains("Question 2/20 (5 marks)"));
        assert!(text.contains("answered 1/20"));
        assert!(text.contains("1* [2] 3"));
    }

    #[test]
    fn result_screen_reports_verdict() {
        let rv = ResultView {
            percentage: 40,
            score: "40/100".into(),
            correct: "8/20".into(),
            time_taken: "4:05".into(),
            passed: true,
            time_expired: true,
        };
        let text = result("Algebra Basics", &rv);
        assert!(text.contains("40/100 (40%)"));
        assert!(text.contains("Passed"));
        assert!(text.contains("Time expired"));
    }

    #[test]
    fn empty_history_says_so() {
        assert_eq!(history(&[]), "No results yet.\n");
    }
}
