use crate::error::{QuizError, Result};
use crate::quiz::model_client::{GenerateText, GenerationConfig};
use crate::quiz::{parser, prompt, Difficulty, Question};

/// Turns a (topic, difficulty) request into parsed questions with one model call.
pub struct QuizHelper<C> {
    client: C,
    config: GenerationConfig,
}

impl<C: GenerateText> QuizHelper<C> {
    pub fn new(client: C, config: GenerationConfig) -> Self {
        Self { client, config }
    }

    /// May return an empty list when the model text holds no usable block.
    pub async fn generate_questions(
        &self,
        topic: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>> {
        let prompt = prompt::build_prompt(topic, difficulty)?;
        log::info!(
            "Generating questions about {:?} ({})",
            topic.trim(),
            difficulty.map_or("any difficulty", Difficulty::name)
        );

        let text = self.client.generate(&prompt, &self.config).await?;
        if text.trim().is_empty() {
            return Err(QuizError::EmptyResponse);
        }
        log::debug!("Completion: {:?}", text);

        let questions = parser::parse_questions(&text);
        log::info!("Model response yielded {} questions", questions.len());
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Label;
    use std::sync::Mutex;

    struct FakeClient {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn replying(reply: Result<String>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl GenerateText for FakeClient {
        async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    const TWO_QUESTIONS: &str = "Here you go:
Q1) Who wrote Leviathan?
A) Locke
B) Hobbes
C) Hume
D) Burke
Answer: B

Q2) Who wrote The Prince?
A) Machiavelli
B) More
C) Bodin
D) Grotius
Answer: A";

    #[tokio::test]
    async fn parses_model_reply_into_questions() {
        let helper = QuizHelper::new(
            FakeClient::replying(Ok(TWO_QUESTIONS.to_string())),
            GenerationConfig::default(),
        );

        let questions = helper
            .generate_questions("Political Theory", Some(Difficulty::Hard))
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].option(Label::B), "Hobbes");
        assert_eq!(questions[1].correct_label(), Label::A);

        let prompts = helper.client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Political Theory"));
        assert!(prompts[0].contains("attribution-style"));
    }

    #[tokio::test]
    async fn blank_topic_issues_no_request() {
        let helper = QuizHelper::new(
            FakeClient::replying(Ok(TWO_QUESTIONS.to_string())),
            GenerationConfig::default(),
        );

        let result = helper.generate_questions("  ", None).await;

        assert!(matches!(result, Err(QuizError::InvalidInput(_))));
        assert_eq!(helper.client.calls(), 0);
    }

    #[tokio::test]
    async fn blank_reply_is_empty_response() {
        let helper = QuizHelper::new(
            FakeClient::replying(Ok(" \n".to_string())),
            GenerationConfig::default(),
        );

        let result = helper.generate_questions("Rust", None).await;
        assert_eq!(result, Err(QuizError::EmptyResponse));
    }

    #[tokio::test]
    async fn provider_failure_is_passed_through_after_one_attempt() {
        let helper = QuizHelper::new(
            FakeClient::replying(Err(QuizError::ModelRequest("503".to_string()))),
            GenerationConfig::default(),
        );

        let result = helper.generate_questions("Rust", Some(Difficulty::Easy)).await;

        assert_eq!(result, Err(QuizError::ModelRequest("503".to_string())));
        assert_eq!(helper.client.calls(), 1);
    }

    #[tokio::test]
    async fn prose_only_reply_gives_no_questions() {
        let helper = QuizHelper::new(
            FakeClient::replying(Ok("I cannot produce questions on that.".to_string())),
            GenerationConfig::default(),
        );

        let questions = helper.generate_questions("Rust", None).await.unwrap();
        assert!(questions.is_empty());
    }
}
