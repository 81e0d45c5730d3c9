use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model request failed: {0}")]
    ModelRequest(String),

    #[error("the model returned an empty response")]
    EmptyResponse,

    #[error("invalid selection: question {index}, label {label:?}")]
    InvalidSelection { index: usize, label: String },
}

impl From<reqwest::Error> for QuizError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs never reach the message.
        let err = err.without_url();
        if err.is_timeout() {
            return QuizError::ModelRequest(format!("request timed out: {}", err));
        }
        QuizError::ModelRequest(err.to_string())
    }
}

impl From<chatgpt::err::Error> for QuizError {
    fn from(err: chatgpt::err::Error) -> Self {
        QuizError::ModelRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
