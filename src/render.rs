//! Plain-text rendering of questions, feedback and scores for chat messages.

use crate::error::QuizError;
use crate::quiz::session::{Outcome, QuizSession, Score};
use crate::quiz::{Difficulty, Label, Question};

pub const CALLBACK_SEPARATOR: char = ':';

pub fn question_text(index: usize, question: &Question) -> String {
    let mut text = format!("Q{}. {}\n", index, question.text());
    for (label, option) in Label::ALL.iter().zip(question.options()) {
        text.push_str(&format!("\n{}. {}", label, option));
    }
    text
}

/// Callback payload of an answer button: `round:index:label`, e.g. `"2:3:B"`.
pub fn callback_data(round: u32, index: usize, label: Label) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        round,
        index,
        label,
        sep = CALLBACK_SEPARATOR
    )
}

/// Splits an answer button payload into round, question index and raw label.
pub fn parse_callback_data(data: &str) -> Option<(u32, usize, &str)> {
    let mut parts = data.splitn(3, CALLBACK_SEPARATOR);
    let round = parts.next()?.parse().ok()?;
    let index = parts.next()?.parse().ok()?;
    let label = parts.next()?;
    Some((round, index, label))
}

pub fn feedback(outcome: Outcome, correct: Label) -> String {
    match outcome {
        Outcome::Correct => format!("Correct! ✅ The answer is {}.", correct),
        Outcome::Incorrect { correct, .. } => {
            format!("Incorrect ❌. The correct answer is {}.", correct)
        }
        Outcome::Unanswered => "Please select an option to check your answer.".to_string(),
    }
}

/// Chat text for a failed generation request. Provider details stay in the log.
pub fn generation_error(err: &QuizError) -> String {
    match err {
        QuizError::EmptyResponse => "No response generated. Please try again.".to_string(),
        QuizError::InvalidInput(_) => "Please enter a topic first!".to_string(),
        _ => "Error generating MCQs. Please check your API key and internet connection.".to_string(),
    }
}

pub fn score_line(score: Score) -> String {
    let mut line = format!("Your Score: {} / {}", score.correct, score.total);
    let pending = score.total - score.answered;
    if pending > 0 {
        line.push_str(&format!(" ({} not yet answered)", pending));
    }
    line
}

pub fn scoreboard(session: &QuizSession) -> String {
    let mut lines = Vec::with_capacity(session.len() + 1);
    for (i, outcome) in session.outcomes().into_iter().enumerate() {
        let status = match outcome {
            Outcome::Correct => "✅".to_string(),
            Outcome::Incorrect { chosen, correct } => {
                format!("❌ you chose {}, correct is {}", chosen, correct)
            }
            Outcome::Unanswered => "not yet answered".to_string(),
        };
        lines.push(format!("Q{}: {}", i + 1, status));
    }
    lines.push(String::new());
    lines.push(score_line(session.score()));
    lines.join("\n")
}

pub fn quiz_header(topic: &str, difficulty: Option<Difficulty>, count: usize) -> String {
    let level = difficulty.map_or("Mixed", Difficulty::name);
    format!("Generated {} {} MCQs about {}", count, level, topic.trim())
}
