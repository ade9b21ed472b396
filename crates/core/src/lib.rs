//! Core business logic for world-priority.
//!
//! The vote-integrity protocol lives in [`services::vote`], the moderation
//! state machine in [`services::moderation`] and the ranked read model in
//! [`services::ranking`].

pub mod services;

pub use services::*;
