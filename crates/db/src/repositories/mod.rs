//! Database repositories.

mod priority;
mod user;
mod vote;

pub use priority::PriorityRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
