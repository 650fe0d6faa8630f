//! Generative backend subsystem.
//!
//! # Data Flow
//! ```text
//! Prompt
//!     → fallback.rs (walk the ordered model list)
//!         → client.rs TextBackend::generate(model, prompt)
//!             → gemini.rs (HTTP call to the Generative Language API)
//!         → success: join text fragments, stop
//!         → failure/empty/timeout: next model
//!     → Generation { text, model } or DispatchError::Exhausted
//! ```
//!
//! # Design Decisions
//! - Model order is a preference and is preserved exactly
//! - Every attempt has a deadline and observes cancellation
//! - Per-model failures are logged and counted, never returned

pub mod client;
pub mod fallback;
pub mod gemini;

pub use client::{BackendError, TextBackend};
pub use fallback::{DispatchError, FallbackDispatcher, FallbackState, Generation};
pub use gemini::GeminiBackend;
