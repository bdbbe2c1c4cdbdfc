//! Generic persisted auth session with lazy profile hydration.
//!
//! A [`SessionStore`] holds at most one authenticated identity of a given
//! kind, persists it under a dedicated storage key, and fills in the
//! profile lazily once only a bearer token is known. The storefront and
//! admin crates each instantiate it with their own [`AuthBackend`] and key.
//!
//! # Hydration
//!
//! The store never fetches on its own. Callers watch [`SessionStore::subscribe`]
//! and invoke [`SessionStore::hydrate`] whenever
//! [`SessionStore::needs_hydration`] reports a token without a profile.
//! Hydration is fill-once: a profile that is already present is never
//! overwritten by a fetch, and a response that lands after the session
//! changed in any way is discarded, so a stale response can never
//! resurrect a logged-out session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::watch;

use crate::storage::SharedStorage;

/// A persisted authenticated identity.
///
/// Presence of a non-empty `token` is the sole authentication signal. A
/// fully logged-out state is the absence of the whole record, never an
/// empty-string token, and a session without a token never carries a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: serde::de::DeserializeOwned"))]
pub struct Session<P> {
    /// Opaque bearer credential.
    pub token: String,
    /// Attached profile; `None` until hydration completes.
    #[serde(default)]
    pub user: Option<P>,
}

/// Failure modes of a profile fetch or token revocation.
#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    /// The API rejected the token (401/403). The session must be cleared.
    #[error("token rejected by the api")]
    Unauthorized,

    /// Network failure, 5xx, or a malformed body. Safe to retry on the
    /// next natural trigger.
    #[error("profile request failed: {0}")]
    Transient(String),
}

/// The API surface a session store needs from its backing service.
///
/// Implemented by the storefront client (`GET /profile`) and the admin
/// client (`GET /admin/me`); tests use scripted stubs.
pub trait AuthBackend: Send + Sync {
    /// Profile payload attached to a session of this kind.
    type Profile: Clone + Serialize + DeserializeOwned + Send + Sync;

    /// Fetch the profile belonging to `token`.
    fn fetch_profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Self::Profile, ProfileError>> + Send;

    /// Server-side sign-out for `token`. Best-effort; callers log and
    /// swallow failures.
    fn revoke(&self, token: &str) -> impl Future<Output = Result<(), ProfileError>> + Send;
}

/// Forwarding impl so a shared handle (`Arc<B>`) can be handed to a store
/// while the caller keeps a clone of the backend.
impl<B: AuthBackend + ?Sized> AuthBackend for Arc<B> {
    type Profile = B::Profile;

    fn fetch_profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Self::Profile, ProfileError>> + Send {
        (**self).fetch_profile(token)
    }

    fn revoke(&self, token: &str) -> impl Future<Output = Result<(), ProfileError>> + Send {
        (**self).revoke(token)
    }
}

struct State<P> {
    session: Option<Session<P>>,
    /// Bumped on every state change; hydration responses carry the version
    /// they were started under and are discarded on mismatch.
    version: u64,
}

/// Persisted session store, generic over the auth backend.
pub struct SessionStore<B: AuthBackend> {
    backend: B,
    storage: SharedStorage,
    key: String,
    state: Mutex<State<B::Profile>>,
    changed: watch::Sender<u64>,
}

impl<B: AuthBackend> SessionStore<B> {
    /// Create an empty store persisting under `key`.
    ///
    /// Call [`SessionStore::load`] afterwards to pick up a persisted
    /// session.
    pub fn new(backend: B, storage: SharedStorage, key: impl Into<String>) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            backend,
            storage,
            key: key.into(),
            state: Mutex::new(State {
                session: None,
                version: 0,
            }),
            changed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<B::Profile>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the persisted session, if any.
    ///
    /// Missing, unparsable, or tokenless payloads are logged and treated as
    /// "no session"; this never fails.
    pub fn load(&self) {
        let session = match self.storage.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Session<B::Profile>>(&raw) {
                Ok(session) if !session.token.is_empty() => Some(session),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(key = %self.key, error = %err, "failed to parse persisted session");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to load persisted session");
                None
            }
        };

        let mut state = self.lock();
        state.session = session;
        self.touch(&mut state);
    }

    /// Install a new session. This is the login entry point: the shopper
    /// flow passes the token from the OAuth callback (user still `None`),
    /// the admin flow passes the credential-login response.
    pub fn login(&self, token: impl Into<String>, user: Option<B::Profile>) {
        let token = token.into();
        if token.is_empty() {
            tracing::warn!(key = %self.key, "refusing to install a session with an empty token");
            return;
        }

        let mut state = self.lock();
        state.session = Some(Session { token, user });
        self.persist(&state);
        self.touch(&mut state);
    }

    /// Replace the profile of the current session in place. No-op when
    /// logged out.
    pub fn update_user(&self, user: B::Profile) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        session.user = Some(user);
        self.persist(&state);
        self.touch(&mut state);
    }

    /// Whether a hydration attempt would do anything: token present,
    /// profile absent.
    pub fn needs_hydration(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|s| s.user.is_none())
    }

    /// Fetch and attach the profile for the current token.
    ///
    /// Fill-once: does nothing when the profile is already present. An
    /// `Unauthorized` response forces a local logout; transient failures
    /// are logged and left for the next trigger. A response that arrives
    /// after any intervening session change is discarded.
    pub async fn hydrate(&self) {
        let started = {
            let state = self.lock();
            match state.session.as_ref() {
                Some(session) if session.user.is_none() => {
                    Some((session.token.clone(), state.version))
                }
                _ => None,
            }
        };
        let Some((token, seen)) = started else {
            return;
        };

        match self.backend.fetch_profile(&token).await {
            Ok(profile) => {
                let mut state = self.lock();
                if state.version != seen {
                    tracing::debug!(key = %self.key, "discarding stale profile response");
                    return;
                }
                if let Some(session) = state.session.as_mut()
                    && session.user.is_none()
                {
                    session.user = Some(profile);
                    self.persist(&state);
                    self.touch(&mut state);
                }
            }
            Err(ProfileError::Unauthorized) => {
                let mut state = self.lock();
                if state.version != seen {
                    return;
                }
                tracing::info!(key = %self.key, "token rejected during hydration; clearing session");
                state.session = None;
                self.persist(&state);
                self.touch(&mut state);
            }
            Err(ProfileError::Transient(reason)) => {
                tracing::warn!(key = %self.key, %reason, "profile hydration failed; will retry");
            }
        }
    }

    /// Clear the session locally and immediately, then fire a best-effort
    /// server-side revocation whose failure is logged and swallowed.
    pub async fn logout(&self) {
        let token = {
            let mut state = self.lock();
            let token = state.session.take().map(|s| s.token);
            self.persist(&state);
            self.touch(&mut state);
            token
        };

        if let Some(token) = token {
            if let Err(err) = self.backend.revoke(&token).await {
                tracing::warn!(key = %self.key, error = %err, "best-effort sign-out failed");
            }
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Option<Session<B::Profile>> {
        self.lock().session.clone()
    }

    /// The current bearer token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.token.clone())
    }

    /// The attached profile, if hydrated.
    pub fn user(&self) -> Option<B::Profile> {
        self.lock().session.as_ref().and_then(|s| s.user.clone())
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Watch channel carrying a monotonically increasing state version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    /// Write-through, serialized with the state change by running under
    /// the same lock. Failures are logged and swallowed: the in-memory
    /// session stays authoritative.
    fn persist(&self, state: &State<B::Profile>) {
        let result = match &state.session {
            Some(session) => match serde_json::to_string(session) {
                Ok(raw) => self.storage.set(&self.key, &raw),
                Err(err) => {
                    tracing::warn!(key = %self.key, error = %err, "failed to encode session");
                    return;
                }
            },
            None => self.storage.remove(&self.key),
        };
        if let Err(err) = result {
            tracing::warn!(key = %self.key, error = %err, "failed to persist session");
        }
    }

    fn touch(&self, state: &mut State<B::Profile>) {
        state.version += 1;
        self.changed.send_replace(state.version);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::storage::{MemoryStorage, SharedStorage, Storage};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    /// Scripted backend: pops one canned response per fetch. With a gate,
    /// every fetch suspends until the test hands it a permit, so tests can
    /// interleave session changes with an in-flight response.
    struct StubBackend {
        responses: Mutex<Vec<Result<Profile, ProfileError>>>,
        gate: Option<tokio::sync::Notify>,
        fetches: AtomicUsize,
        revokes: AtomicUsize,
        fail_revoke: bool,
    }

    impl StubBackend {
        fn new(responses: Vec<Result<Profile, ProfileError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                gate: None,
                fetches: AtomicUsize::new(0),
                revokes: AtomicUsize::new(0),
                fail_revoke: false,
            }
        }

        fn gated(responses: Vec<Result<Profile, ProfileError>>) -> Self {
            let mut stub = Self::new(responses);
            stub.gate = Some(tokio::sync::Notify::new());
            stub
        }
    }

    impl AuthBackend for StubBackend {
        type Profile = Profile;

        async fn fetch_profile(&self, _token: &str) -> Result<Profile, ProfileError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(ProfileError::Transient("no scripted response".into()));
            }
            responses.remove(0)
        }

        async fn revoke(&self, _token: &str) -> Result<(), ProfileError> {
            self.revokes.fetch_add(1, Ordering::SeqCst);
            if self.fail_revoke {
                return Err(ProfileError::Transient("revoke endpoint down".into()));
            }
            Ok(())
        }
    }

    fn profile(name: &str) -> Profile {
        Profile { name: name.into() }
    }

    fn store_with(
        responses: Vec<Result<Profile, ProfileError>>,
    ) -> (SessionStore<StubBackend>, SharedStorage) {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(
            StubBackend::new(responses),
            Arc::clone(&storage),
            "test_session",
        );
        (store, storage)
    }

    #[test]
    fn test_load_empty_storage_is_logged_out() {
        let (store, _storage) = store_with(vec![]);
        store.load();
        assert!(!store.is_authenticated());
        assert!(store.session().is_none());
    }

    #[test]
    fn test_load_garbage_is_logged_out() {
        let (store, storage) = store_with(vec![]);
        storage.set("test_session", "{not json").unwrap();
        store.load();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_load_empty_token_is_logged_out() {
        let (store, storage) = store_with(vec![]);
        storage
            .set("test_session", r#"{"token":"","user":null}"#)
            .unwrap();
        store.load();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_login_persists() {
        let (store, storage) = store_with(vec![]);
        store.load();
        store.login("tok-1", None);

        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok-1"));

        let raw = storage.get("test_session").unwrap().unwrap();
        let parsed: Session<Profile> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.token, "tok-1");
        assert!(parsed.user.is_none());
    }

    #[test]
    fn test_empty_token_rejected() {
        let (store, _storage) = store_with(vec![]);
        store.login("", Some(profile("x")));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_hydrate_fills_empty_profile() {
        let (store, _storage) = store_with(vec![Ok(profile("Asha"))]);
        store.login("tok-1", None);
        assert!(store.needs_hydration());

        store.hydrate().await;

        assert!(!store.needs_hydration());
        assert_eq!(store.user(), Some(profile("Asha")));
    }

    #[tokio::test]
    async fn test_hydrate_is_fill_once() {
        let (store, _storage) = store_with(vec![Ok(profile("old")), Ok(profile("newer"))]);
        store.login("tok-1", None);
        store.hydrate().await;
        assert_eq!(store.user(), Some(profile("old")));

        // A second attempt with a profile already attached never fetches.
        store.hydrate().await;
        assert_eq!(store.user(), Some(profile("old")));
        assert_eq!(store.backend.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout_and_clears_storage() {
        let (store, storage) = store_with(vec![Err(ProfileError::Unauthorized)]);
        store.login("tok-expired", None);

        store.hydrate().await;

        assert!(!store.is_authenticated());
        assert_eq!(storage.get("test_session").unwrap(), None);
    }

    #[tokio::test]
    async fn test_transient_failure_leaves_session() {
        let (store, _storage) = store_with(vec![Err(ProfileError::Transient("offline".into()))]);
        store.login("tok-1", None);

        store.hydrate().await;

        assert!(store.is_authenticated());
        // Still hydratable on the next trigger.
        assert!(store.needs_hydration());
    }

    /// Poll a future exactly once with a no-op waker.
    fn poll_once<F: Future>(future: std::pin::Pin<&mut F>) -> std::task::Poll<F::Output> {
        let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
        future.poll(&mut cx)
    }

    #[tokio::test]
    async fn test_stale_hydration_discarded_after_logout() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(
            StubBackend::gated(vec![Ok(profile("ghost"))]),
            storage,
            "test_session",
        );
        store.login("tok-1", None);

        // Start the fetch, then log out while the response is in flight.
        let mut hydration = Box::pin(store.hydrate());
        assert!(poll_once(hydration.as_mut()).is_pending());
        store.logout().await;

        if let Some(gate) = &store.backend.gate {
            gate.notify_one();
        }
        hydration.await;

        // The late response must not resurrect the session.
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_stale_hydration_discarded_after_relogin() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(
            StubBackend::gated(vec![Ok(profile("first")), Ok(profile("second"))]),
            storage,
            "test_session",
        );
        store.login("tok-1", None);

        let mut hydration = Box::pin(store.hydrate());
        assert!(poll_once(hydration.as_mut()).is_pending());
        // Session replaced while the first fetch is in flight.
        store.login("tok-2", None);

        if let Some(gate) = &store.backend.gate {
            gate.notify_one();
        }
        hydration.await;

        // The first response must not attach to the second session.
        assert!(store.user().is_none());

        if let Some(gate) = &store.backend.gate {
            gate.notify_one();
        }
        store.hydrate().await;
        assert_eq!(store.user(), Some(profile("second")));
    }

    #[tokio::test]
    async fn test_logout_revokes_best_effort() {
        let (store, storage) = store_with(vec![]);
        store.login("tok-1", None);

        store.logout().await;

        assert!(!store.is_authenticated());
        assert_eq!(storage.get("test_session").unwrap(), None);
        assert_eq!(store.backend.revokes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_survives_revoke_failure() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut backend = StubBackend::new(vec![]);
        backend.fail_revoke = true;
        let store = SessionStore::new(backend, Arc::clone(&storage), "test_session");
        store.login("tok-1", None);

        store.logout().await;

        assert!(!store.is_authenticated());
        assert_eq!(storage.get("test_session").unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_revoke() {
        let (store, _storage) = store_with(vec![]);
        store.logout().await;
        assert_eq!(store.backend.revokes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_update_user_requires_session() {
        let (store, _storage) = store_with(vec![]);
        store.update_user(profile("nobody"));
        assert!(store.user().is_none());

        store.login("tok-1", None);
        store.update_user(profile("somebody"));
        assert_eq!(store.user(), Some(profile("somebody")));
    }

    #[test]
    fn test_subscribe_sees_changes() {
        let (store, _storage) = store_with(vec![]);
        let rx = store.subscribe();
        let before = *rx.borrow();

        store.login("tok-1", None);

        assert!(*rx.borrow() > before);
    }

    #[test]
    fn test_reload_round_trip() {
        let (store, storage) = store_with(vec![]);
        store.login("tok-1", Some(profile("Asha")));

        let reloaded = SessionStore::new(StubBackend::new(vec![]), storage, "test_session");
        reloaded.load();
        assert_eq!(reloaded.token().as_deref(), Some("tok-1"));
        assert_eq!(reloaded.user(), Some(profile("Asha")));
    }
}
