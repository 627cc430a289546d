use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecallChatError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl RecallChatError {
    /// Upstream body trimmed for log lines.
    pub fn log_detail(&self) -> String {
        match self {
            Self::Status { status, body } => {
                format!("status {status}: {}", crate::services::truncate_chars(body, 200))
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for RecallChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RecallChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub use crate::Result;
