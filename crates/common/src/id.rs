//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for store-assigned identifiers and session tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID, lowercased.
    ///
    /// Priority ids sort roughly by creation time, which keeps
    /// the `created_at` index and the primary key in step.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component: tokens must not be guessable from sign-in time
        Uuid::new_v4().simple().to_string()
    }
}
