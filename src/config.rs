use std::time::Duration;

use crate::error::{QuizError, Result};
use crate::quiz::model_client::{ChatGptClient, GeminiClient, GenerationConfig, ModelBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    ChatGpt,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub db_path: Option<String>,
    pub generation: GenerationConfig,
}

impl Config {
    /// Reads the process environment (after `.env`, if any, was loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let bot_token = non_blank("TELOXIDE_TOKEN")
            .ok_or_else(|| QuizError::Configuration("TELOXIDE_TOKEN is not set".to_string()))?;

        let provider = match non_blank("QUIZ_PROVIDER").as_deref().map(str::trim) {
            None | Some("gemini") => Provider::Gemini,
            Some("chatgpt") => Provider::ChatGpt,
            Some(other) => {
                return Err(QuizError::Configuration(format!(
                    "unknown QUIZ_PROVIDER {:?} (expected \"gemini\" or \"chatgpt\")",
                    other
                )))
            }
        };

        let (key_var, default_model) = match provider {
            Provider::Gemini => ("GEMINI_API_KEY", "gemini-1.5-pro"),
            Provider::ChatGpt => ("CHATGPT_API_KEY", "gpt-3.5-turbo"),
        };
        let api_key = non_blank(key_var)
            .ok_or_else(|| QuizError::Configuration(format!("{} is not set", key_var)))?;

        let model = non_blank("QUIZ_MODEL").unwrap_or_else(|| default_model.to_string());

        let timeout_secs = match non_blank("QUIZ_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                QuizError::Configuration(format!("QUIZ_TIMEOUT_SECS is not a number: {:?}", raw))
            })?,
            None => 60,
        };

        Ok(Self {
            bot_token,
            provider,
            api_key: api_key.trim().to_string(),
            model: model.trim().to_string(),
            timeout: Duration::from_secs(timeout_secs),
            db_path: non_blank("QUIZ_DB_PATH"),
            generation: GenerationConfig::default(),
        })
    }

    pub fn build_backend(&self) -> Result<ModelBackend> {
        match self.provider {
            Provider::Gemini => Ok(ModelBackend::Gemini(GeminiClient::new(
                self.api_key.clone(),
                self.model.clone(),
                self.timeout,
            )?)),
            Provider::ChatGpt => Ok(ModelBackend::ChatGpt(ChatGptClient::new(
                self.api_key.clone(),
                &self.model,
                self.timeout,
                &self.generation,
            )?)),
        }
    }
}
