//! Backend abstraction.
//!
//! A text backend takes a model identifier and a prompt and returns the text
//! fragments it produced, in the order the backend reported them.

use async_trait::async_trait;

/// Failure of a single backend call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Vec<String>, BackendError>;
}
