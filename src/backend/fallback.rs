//! Priority-ordered model fallback.
//!
//! # States
//! - Trying(i): candidate `i` is being attempted
//! - Succeeded(i): candidate `i` produced text
//! - Exhausted: every candidate failed
//!
//! # State Transitions
//! ```text
//! Trying(i) → Succeeded(i): attempt produced non-empty text
//! Trying(i) → Trying(i+1): attempt failed and another candidate remains
//! Trying(i) → Exhausted: attempt failed on the last candidate
//! ```
//!
//! A failed attempt is an error, a timeout, or a response without any
//! non-empty text. All three advance to the next candidate the same way.
//! There are no retries within a candidate and the order is never changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::backend::client::{BackendError, TextBackend};
use crate::config::BackendConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Trying(usize),
    Succeeded(usize),
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Produced,
    Failed,
}

impl FallbackState {
    /// Initial state for a list of `candidates` entries.
    pub fn start(candidates: usize) -> Self {
        if candidates == 0 {
            FallbackState::Exhausted
        } else {
            FallbackState::Trying(0)
        }
    }

    /// Pure transition function. Terminal states absorb every result.
    pub fn next(self, result: AttemptResult, candidates: usize) -> Self {
        match (self, result) {
            (FallbackState::Trying(i), AttemptResult::Produced) => FallbackState::Succeeded(i),
            (FallbackState::Trying(i), AttemptResult::Failed) if i + 1 < candidates => {
                FallbackState::Trying(i + 1)
            }
            (FallbackState::Trying(_), AttemptResult::Failed) => FallbackState::Exhausted,
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, FallbackState::Trying(_))
    }
}

/// Text produced by the first successful candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("failed to generate content with any of {attempted} configured models")]
    Exhausted { attempted: usize },
    #[error("generation cancelled")]
    Cancelled,
}

/// Why a single candidate did not help. Never leaves the dispatcher.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("no text in response")]
    Empty,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl AttemptError {
    fn outcome(&self) -> &'static str {
        match self {
            AttemptError::Backend(_) => "error",
            AttemptError::Empty => "empty",
            AttemptError::TimedOut(_) => "timeout",
        }
    }
}

pub struct FallbackDispatcher {
    backend: Arc<dyn TextBackend>,
    candidates: Vec<String>,
    candidate_timeout: Duration,
}

impl FallbackDispatcher {
    pub fn new(backend: Arc<dyn TextBackend>, candidates: Vec<String>, candidate_timeout: Duration) -> Self {
        Self {
            backend,
            candidates,
            candidate_timeout,
        }
    }

    pub fn from_config(backend: Arc<dyn TextBackend>, config: &BackendConfig) -> Self {
        Self::new(backend, config.models.clone(), config.candidate_timeout())
    }


    /// Try each candidate in order until one produces text.
    ///
    /// Returns [`DispatchError::Cancelled`] as soon as `cancel` fires, dropping
    /// the in-flight backend call.
    pub async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<Generation, DispatchError> {
        if prompt.trim().is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }

        let total = self.candidates.len();
        let mut state = FallbackState::start(total);
        let mut produced = None;

        while let FallbackState::Trying(index) = state {
            let model = &self.candidates[index];

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(model = %model, "Generation cancelled mid-attempt");
                    return Err(DispatchError::Cancelled);
                }
                outcome = self.attempt(model, prompt) => outcome,
            };

            let result = match outcome {
                Ok(text) => {
                    metrics::record_backend_attempt(model, "success");
                    produced = Some(text);
                    AttemptResult::Produced
                }
                Err(e) => {
                    metrics::record_backend_attempt(model, e.outcome());
                    tracing::warn!(
                        model = %model,
                        attempt = index + 1,
                        of = total,
                        error = %e,
                        "Model attempt failed, falling back"
                    );
                    AttemptResult::Failed
                }
            };
            state = state.next(result, total);
        }

        match (state, produced) {
            (FallbackState::Succeeded(index), Some(text)) => {
                tracing::debug!(model = %self.candidates[index], attempt = index + 1, "Model produced content");
                Ok(Generation {
                    text,
                    model: self.candidates[index].clone(),
                })
            }
            _ => {
                tracing::error!(attempted = total, "All models failed");
                Err(DispatchError::Exhausted { attempted: total })
            }
        }
    }

    async fn attempt(&self, model: &str, prompt: &str) -> Result<String, AttemptError> {
        let fragments = time::timeout(self.candidate_timeout, self.backend.generate(model, prompt))
            .await
            .map_err(|_| AttemptError::TimedOut(self.candidate_timeout))??;
        join_fragments(fragments).ok_or(AttemptError::Empty)
    }
}

/// Join fragments with line breaks, or `None` if none of them carries text.
fn join_fragments(fragments: Vec<String>) -> Option<String> {
    if fragments.iter().all(|f| f.is_empty()) {
        return None;
    }
    Some(fragments.join("\n"))
}
