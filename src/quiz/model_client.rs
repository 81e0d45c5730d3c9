use std::future::Future;
use std::time::Duration;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

/// Sampling parameters passed along with every prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// Anything that turns a prompt into model text.
pub trait GenerateText {
    fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<String>> + Send;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate; empty when there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuizError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            model,
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }
}

impl GenerateText for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        log::debug!("Sending {} byte prompt to {}", prompt.len(), self.model);

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .http
            .post(self.url())
            .header(GEMINI_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(QuizError::ModelRequest(format!(
                "{} returned {}: {}",
                self.model,
                status,
                detail.trim()
            )));
        }

        let parsed: GeminiResponse = response.json().await?;
        Ok(parsed.text())
    }
}

pub struct ChatGptClient {
    chat_gpt: ChatGPT,
}

impl ChatGptClient {
    pub fn new(api_key: String, model: &str, timeout: Duration, config: &GenerationConfig) -> Result<Self> {
        let mut chat_gpt = ChatGPT::new(api_key)?;

        chat_gpt.config.engine = match model {
            "gpt-4" => ChatGPTEngine::Gpt4,
            "gpt-3.5-turbo" => ChatGPTEngine::Gpt35Turbo,
            other => {
                log::warn!("Unknown ChatGPT model {:?}, falling back to gpt-3.5-turbo", other);
                ChatGPTEngine::Gpt35Turbo
            }
        };
        chat_gpt.config.timeout = timeout;
        chat_gpt.config.temperature = config.temperature;
        chat_gpt.config.top_p = config.top_p;

        Ok(Self { chat_gpt })
    }
}

impl GenerateText for ChatGptClient {
    // Sampling settings are fixed on the client at construction.
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
        let response = self.chat_gpt.send_message(prompt).await?;
        Ok(response.message().clone().content)
    }
}

/// The provider chosen at start-up.
pub enum ModelBackend {
    Gemini(GeminiClient),
    ChatGpt(ChatGptClient),
}

impl GenerateText for ModelBackend {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        match self {
            ModelBackend::Gemini(client) => client.generate(prompt, config).await,
            ModelBackend::ChatGpt(client) => client.generate(prompt, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generation_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.max_output_tokens, 8192);
        assert_eq!(config.response_mime_type, "text/plain");
    }

    #[test]
    fn request_body_uses_api_field_names() {
        let config = GenerationConfig::default();
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "hi" }],
            }],
            generation_config: &config,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(json["generationConfig"]["responseMimeType"], "text/plain");
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Q1) one"}, {"text": " more"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Q1) one more");
    }

    #[test]
    fn blocked_response_has_no_text() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "");

        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[tokio::test]
    async fn transport_failure_does_not_expose_the_key() {
        let client = GeminiClient::new(
            "SECRET_KEY_123".to_string(),
            "m".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_endpoint("http://127.0.0.1:1/v1beta/models");

        let err = client
            .generate("prompt", &GenerationConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::ModelRequest(_)));
        assert!(!err.to_string().contains("SECRET_KEY_123"), "{}", err);
    }

    #[test]
    fn gemini_url_includes_model() {
        let client = GeminiClient::new(
            "key".to_string(),
            "gemini-1.5-pro".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
        assert!(!client.url().contains("key"));
    }
}
