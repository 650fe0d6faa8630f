//! Content generation gateway library.
//!
//! Admission control and model fallback in front of a generative text API.

pub mod backend;
pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
