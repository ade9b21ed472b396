//! Database entities.

#![allow(missing_docs)]

pub mod priority;
pub mod user;
pub mod vote;

pub use priority::{Entity as Priority, PriorityStatus};
pub use user::Entity as User;
pub use vote::Entity as Vote;
