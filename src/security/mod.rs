//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (answer OPTIONS, stamp CORS headers)
//!     → client_ip.rs (resolve client identity)
//!     → rate_limit.rs (sliding-window admission per identity)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: over-quota requests never reach the backend
//! - No trust in client-supplied forwarding headers unless configured
//! - Limiter state is bounded by sweeping and a capacity cap

pub mod client_ip;
pub mod cors;
pub mod rate_limit;

pub use rate_limit::{AdmissionController, AdmissionDenied, RateLimitPolicy};
