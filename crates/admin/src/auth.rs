//! Admin session.
//!
//! Admins sign in with a user id and password against
//! `POST /auth/admin/login`. A successful login installs `{token, user}`
//! (the profile may be absent until hydration from `/admin/me`); a
//! rejected login surfaces the server's message to the caller and leaves
//! the session untouched. Logout clears locally first and fires a
//! best-effort `POST /auth/admin/logout`.

use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;

use cityfashion_core::session::{AuthBackend, ProfileError, Session, SessionStore};
use cityfashion_core::storage::SharedStorage;

use crate::api::{AdminClient, AdminProfile, ApiError};

/// Storage key for the persisted admin session.
pub const ADMIN_SESSION_KEY: &str = "cityfashion_admin_auth_v1";

/// Authentication failures surfaced to the login form.
///
/// This is the one error family the stores propagate instead of absorbing;
/// it is never retried automatically.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The API rejected the credentials; carries the server's message.
    #[error("{0}")]
    Rejected(String),

    /// The login request never completed (network failure).
    #[error("login request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { message, .. } => Self::Rejected(message),
            ApiError::Http(err) => Self::Transport(err),
        }
    }
}

/// Auth backend over the admin API.
pub struct AdminAuthBackend {
    client: AdminClient,
}

impl AuthBackend for AdminAuthBackend {
    type Profile = AdminProfile;

    async fn fetch_profile(&self, token: &str) -> Result<AdminProfile, ProfileError> {
        self.client.me(token).await.map_err(profile_error)
    }

    async fn revoke(&self, token: &str) -> Result<(), ProfileError> {
        self.client.sign_out(token).await.map_err(profile_error)
    }
}

fn profile_error(err: ApiError) -> ProfileError {
    if err.is_unauthorized() {
        ProfileError::Unauthorized
    } else {
        ProfileError::Transient(err.to_string())
    }
}

/// The persisted admin session plus the credential login flow.
pub struct AdminSession {
    store: SessionStore<AdminAuthBackend>,
    client: AdminClient,
}

impl AdminSession {
    /// Build the admin session store. Call [`AdminSession::load`] on the
    /// result to pick up a persisted session.
    #[must_use]
    pub fn new(client: AdminClient, storage: SharedStorage) -> Self {
        let store = SessionStore::new(
            AdminAuthBackend {
                client: client.clone(),
            },
            storage,
            ADMIN_SESSION_KEY,
        );
        Self { store, client }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the session becomes `{token, user}` and is persisted;
    /// on failure the session is left unchanged.
    ///
    /// # Errors
    ///
    /// [`AuthError::Rejected`] with the server's message for a non-2xx
    /// login response; [`AuthError::Transport`] when the request itself
    /// failed.
    pub async fn login_with_credentials(
        &self,
        user_id: &str,
        password: &SecretString,
    ) -> Result<(), AuthError> {
        let response = self.client.login(user_id, password).await?;
        tracing::info!(user_id, "admin login succeeded");
        self.store.login(response.token, response.user);
        Ok(())
    }

    /// Read the persisted session at startup.
    pub fn load(&self) {
        self.store.load();
    }

    /// Fetch the profile when only a token is known. See
    /// [`SessionStore::hydrate`] for the fill-once and staleness rules.
    pub async fn hydrate(&self) {
        self.store.hydrate().await;
    }

    /// Whether a hydration attempt would do anything.
    #[must_use]
    pub fn needs_hydration(&self) -> bool {
        self.store.needs_hydration()
    }

    /// Clear the session locally, then best-effort server-side logout.
    pub async fn logout(&self) {
        self.store.logout().await;
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session<AdminProfile>> {
        self.store.session()
    }

    /// The current bearer token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// The administrator profile, if hydrated.
    #[must_use]
    pub fn user(&self) -> Option<AdminProfile> {
        self.store.user()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Watch channel bumped on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }
}
