//! Content subsystem: request shape, prompt templating, and persistence.

pub mod prompt;
pub mod request;
pub mod storage;

pub use prompt::build_prompt;
pub use request::GenerationRequest;
pub use storage::{ContentStore, FileStore, StorageError};
