//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod event_publisher;
pub mod identity;
pub mod moderation;
pub mod priority;
pub mod ranking;
pub mod session;
pub mod stats;
pub mod view;
pub mod vote;

pub use auth::AuthService;
pub use event_publisher::{
    EventPublisher, EventPublisherService, PriorityEvent, PriorityFeed,
};
pub use identity::{
    AdminAllowList, AdminIdentity, Identity, IdentityProvider, IdentityProviderService,
    JwtIdentityProvider,
};
pub use moderation::{
    DEFAULT_REJECTION_REASON, ModerationAction, ModerationService, Transition, allowed_actions,
    transition,
};
pub use priority::{PriorityService, SubmitPriorityInput};
pub use ranking::{RankedPriority, RankingService, RankingWatch};
pub use session::{Session, SessionStore};
pub use stats::{AdminStats, PublicStats, StatsService};
pub use view::{ListFilter, PriorityCard, SubmissionCard, SubmissionList};
pub use vote::{VoteService, vote_id};
