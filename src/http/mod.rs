//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID)
//!     → security (CORS, admission control)
//!     → handlers.rs (validate body, build prompt, dispatch, persist)
//!     → error.rs (map failures to status codes)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use handlers::GenerateResponse;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
