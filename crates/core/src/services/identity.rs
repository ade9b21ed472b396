//! Identity verification and the admin allow-list.
//!
//! Sign-in is delegated to an external identity provider. The provider hands
//! the client a signed ID token; [`IdentityProvider::verify`] turns that
//! credential into an [`Identity`]. Admin rights are never stored: every admin
//! operation re-checks the identity's email against [`AdminAllowList`].

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use priority_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A verified user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Provider-assigned uid.
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    /// Display name, falling back to the local part of the email.
    #[must_use]
    pub fn name_or_email_prefix(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Verifies sign-in credentials issued by an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a credential and return the identity it asserts.
    async fn verify(&self, credential: &str) -> AppResult<Identity>;
}

/// Wrapper for boxed IdentityProvider trait object.
pub type IdentityProviderService = Arc<dyn IdentityProvider>;

/// Claims read from a provider ID token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: usize,
}

/// Verifies HS256-signed ID tokens with a shared secret.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Create a provider for tokens signed with `secret`.
    ///
    /// `iss` and `aud` are checked only when configured. A configured claim
    /// is also required: a token that leaves it out is rejected.
    #[must_use]
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        let mut required = vec!["exp"];
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> AppResult<Identity> {
        let data = decode::<IdTokenClaims>(credential, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected ID token");
            AppError::Unauthorized
        })?;
        let claims = data.claims;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized);
        }
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Identity {
            uid: claims.sub,
            email,
            display_name: claims.name,
            photo_url: claims.picture,
        })
    }
}

/// An identity that passed the allow-list check.
///
/// Only [`AdminAllowList::authorize`] can produce one, so moderation
/// operations taking `&AdminIdentity` cannot be reached without the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    identity: Identity,
}

impl AdminIdentity {
    /// The admin's email, as recorded on moderation decisions.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.identity.email
    }
}

/// Emails allowed to moderate. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: Arc<HashSet<String>>,
}

impl AdminAllowList {
    /// Build the list from configured emails. Blank entries are ignored.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            emails: Arc::new(emails),
        }
    }

    /// Whether the email is on the list.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        let email = email.trim();
        !email.is_empty() && self.emails.contains(&email.to_lowercase())
    }

    /// Check an identity against the list.
    pub fn authorize(&self, identity: &Identity) -> AppResult<AdminIdentity> {
        if self.contains(&identity.email) {
            Ok(AdminIdentity {
                identity: identity.clone(),
            })
        } else {
            Err(AppError::AuthDenied(identity.email.clone()))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
