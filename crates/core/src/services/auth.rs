//! Sign-in, sign-out and session restoration.

use crate::services::identity::{
    AdminAllowList, AdminIdentity, Identity, IdentityProviderService,
};
use crate::services::session::{Session, SessionStore};
use crate::services::vote::VoteService;
use priority_common::{AppError, AppResult, IdGenerator};
use priority_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;

/// Auth service for business logic.
#[derive(Clone)]
pub struct AuthService {
    provider: IdentityProviderService,
    user_repo: UserRepository,
    vote_service: VoteService,
    sessions: SessionStore,
    allow_list: AdminAllowList,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(
        provider: IdentityProviderService,
        user_repo: UserRepository,
        vote_service: VoteService,
        sessions: SessionStore,
        allow_list: AdminAllowList,
    ) -> Self {
        Self {
            provider,
            user_repo,
            vote_service,
            sessions,
            allow_list,
            id_gen: IdGenerator::new(),
        }
    }

    /// Verify a credential, refresh the user's profile and open a session.
    ///
    /// The session's vote cache is seeded from the store.
    pub async fn sign_in(&self, credential: &str) -> AppResult<Session> {
        let identity = self.provider.verify(credential).await?;
        self.open_session(identity).await
    }

    /// Sign in to the moderation console.
    ///
    /// An identity not on the allow-list gets no session.
    pub async fn admin_sign_in(&self, credential: &str) -> AppResult<(Session, AdminIdentity)> {
        let identity = self.provider.verify(credential).await?;
        let admin = self.allow_list.authorize(&identity).inspect_err(|_| {
            tracing::warn!(email = %identity.email, "Admin sign-in denied");
        })?;

        let session = self.open_session(identity).await?;
        tracing::info!(admin = %admin.email(), "Admin signed in");
        Ok((session, admin))
    }

    /// Close a session. Returns whether it existed.
    pub async fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).await;
        if removed {
            tracing::debug!("Session closed");
        }
        removed
    }

    /// Look up the session for a bearer token.
    pub async fn restore(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).await
    }

    /// Look up a session and re-check it against the allow-list.
    ///
    /// A session whose identity is no longer listed is revoked.
    pub async fn restore_admin(&self, token: &str) -> AppResult<(Session, AdminIdentity)> {
        let session = self.restore(token).await.ok_or(AppError::Unauthorized)?;
        match self.allow_list.authorize(session.identity()) {
            Ok(admin) => Ok((session, admin)),
            Err(e) => {
                self.sessions.remove(token).await;
                tracing::warn!(email = %session.identity().email, "Admin access denied, session revoked");
                Err(e)
            }
        }
    }

    /// Whether the email is allowed to moderate.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.allow_list.contains(email)
    }

    async fn open_session(&self, identity: Identity) -> AppResult<Session> {
        let now = chrono::Utc::now();
        let profile = user::ActiveModel {
            id: Set(identity.uid.clone()),
            email: Set(identity.email.clone()),
            display_name: Set(Some(identity.name_or_email_prefix())),
            photo_url: Set(identity.photo_url.clone()),
            created_at: Set(now.into()),
            last_login: Set(now.into()),
        };
        self.user_repo.upsert(profile).await?;

        let voted = self.vote_service.load_user_votes(&identity.uid).await?;
        let session = Session::new(self.id_gen.generate_token(), identity, voted);
        self.sessions.insert(session.clone()).await;

        let votes = session.voted().await.len();
        tracing::info!(user_id = %session.user_id(), votes, "User signed in");
        Ok(session)
    }
}
