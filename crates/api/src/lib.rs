//! HTTP API layer for world-priority.
//!
//! - **Endpoints**: sign-in, submissions, votes, stats and the moderation console
//! - **Extractors**: session and admin authentication
//! - **Middleware**: bearer-token session lookup
//! - **Streaming**: Server-Sent Events feed of the live ranking
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use sse::SseEvent;
