use crate::error::{QuizError, Result};
use crate::quiz::Difficulty;

/// Number of questions requested per generation call.
pub const QUESTION_COUNT: usize = 10;

/// The literal per-question format the parser understands.
pub const GRAMMAR_TEMPLATE: &str = "Q1) [Question text]
A) [Option 1]
B) [Option 2]
C) [Option 3]
D) [Option 4]
Answer: [Letter]";

/// Builds the instruction sent to the model. `None` asks for a mix of levels.
pub fn build_prompt(topic: &str, difficulty: Option<Difficulty>) -> Result<String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(QuizError::InvalidInput("topic must not be empty".to_string()));
    }

    let level = match difficulty {
        Some(d) => format!("at {} difficulty level", d),
        None => "with a balanced mix of difficulty levels".to_string(),
    };

    let mut prompt = format!(
        "Generate {count} high-quality multiple choice questions about {topic} {level}.
Follow these rules STRICTLY:
1. Format each question EXACTLY like this, numbering them Q1) to Q{count}):
{template}

2. Difficulty levels:
    - Easy: Basic concepts, straightforward answers.
    - Medium: Requires analysis or application of concepts.
    - Hard: Focus on theories, statements, and identifying the correct theorist.
",
        count = QUESTION_COUNT,
        template = GRAMMAR_TEMPLATE,
    );

    if difficulty == Some(Difficulty::Hard) {
        prompt.push_str(
            "   Every question MUST be attribution-style: quote a statement or describe a theory \
and ask which theory or theorist it belongs to.
",
        );
    }

    prompt.push_str(&format!(
        "
3. Questions should cover different aspects of {topic}.
4. Options must be plausible but only one correct answer.
5. Avoid repeating question patterns.
6. Include both conceptual and practical questions.
7. Do not add any text between the option lines and the Answer line.",
    ));

    if let Some(d) = difficulty {
        prompt.push_str(&format!(
            "\n8. Adjust question complexity strictly based on {} level.",
            d
        ));
    }

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_difficulty_requests_ten_questions_in_grammar() {
        let levels = [
            None,
            Some(Difficulty::Easy),
            Some(Difficulty::Medium),
            Some(Difficulty::Hard),
        ];
        for level in levels {
            let prompt = build_prompt("Political Theory", level).unwrap();
            assert!(prompt.contains(GRAMMAR_TEMPLATE), "{:?}", level);
            assert!(prompt.contains("Generate 10 "), "{:?}", level);
            assert!(prompt.contains("Political Theory"));
            assert!(prompt.contains("Avoid repeating question patterns"));
        }
    }

    #[test]
    fn hard_prompt_requires_attribution_questions() {
        let hard = build_prompt("Liberalism", Some(Difficulty::Hard)).unwrap();
        assert!(hard.contains("attribution-style"));

        let easy = build_prompt("Liberalism", Some(Difficulty::Easy)).unwrap();
        assert!(!easy.contains("attribution-style"));
    }

    #[test]
    fn difficulty_agnostic_prompt_has_no_level() {
        let prompt = build_prompt("Rust", None).unwrap();
        assert!(prompt.contains("balanced mix"));
        assert!(!prompt.contains("strictly based on"));
    }

    #[test]
    fn blank_topic_is_rejected() {
        assert!(matches!(
            build_prompt("   \n", Some(Difficulty::Easy)),
            Err(QuizError::InvalidInput(_))
        ));
        assert!(build_prompt("", None).is_err());
    }

    #[test]
    fn topic_is_trimmed() {
        let prompt = build_prompt("  Marxism  ", None).unwrap();
        assert!(prompt.contains("about Marxism with"));
    }
}
