//! Explicit authentication session.
//!
//! A [`SessionContext`] owns the current [`SessionState`] and mirrors it into a
//! [`SessionStore`] with two scopes: `Remembered` (survives restarts) and
//! `SessionOnly`. A token lives in at most one scope at a time. Every
//! transition is broadcast on a `tokio::sync::watch` channel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::{Role, UserProfile};

/// Opaque API token, sent as `Authorization: Token <token>`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl core::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Storage scope of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persistence {
    Remembered,
    SessionOnly,
}

impl Persistence {
    pub fn other(self) -> Self {
        match self {
            Persistence::Remembered => Persistence::SessionOnly,
            Persistence::SessionOnly => Persistence::Remembered,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<AuthToken>,
    pub profile: Option<UserProfile>,
    pub persistence: Option<Persistence>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Role {
        Role::of(self.profile.as_ref())
    }
}

/// What a store keeps per scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: AuthToken,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl SessionError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Backing storage for the two token scopes.
pub trait SessionStore: Send + Sync {
    fn load(&self, scope: Persistence) -> Result<Option<StoredSession>, SessionError>;
    fn save(&self, scope: Persistence, session: &StoredSession) -> Result<(), SessionError>;
    fn clear(&self, scope: Persistence) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    scopes: RwLock<HashMap<Persistence, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(scope: Persistence, session: StoredSession) -> Self {
        let store = Self::new();
        if let Ok(mut scopes) = store.scopes.write() {
            scopes.insert(scope, session);
        }
        store
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, scope: Persistence) -> Result<Option<StoredSession>, SessionError> {
        let scopes = self
            .scopes
            .read()
            .map_err(|_| SessionError::storage("session store lock poisoned"))?;
        Ok(scopes.get(&scope).cloned())
    }

    fn save(&self, scope: Persistence, session: &StoredSession) -> Result<(), SessionError> {
        let mut scopes = self
            .scopes
            .write()
            .map_err(|_| SessionError::storage("session store lock poisoned"))?;
        scopes.insert(scope, session.clone());
        Ok(())
    }

    fn clear(&self, scope: Persistence) -> Result<(), SessionError> {
        let mut scopes = self
            .scopes
            .write()
            .map_err(|_| SessionError::storage("session store lock poisoned"))?;
        scopes.remove(&scope);
        Ok(())
    }
}

/// Shared handle to the session. Clones observe the same state.
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<SessionState>>,
    store: Arc<dyn SessionStore>,
}

impl core::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Logged-out context over `store`. Call [`SessionContext::hydrate`] to
    /// pick up a stored token.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(state),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    /// Context already holding `token` in the session-only scope.
    pub fn with_token(token: AuthToken) -> Result<Self, SessionError> {
        let ctx = Self::in_memory();
        ctx.login(token, Persistence::SessionOnly)?;
        Ok(ctx)
    }

    /// Load the stored session, preferring the remembered scope.
    pub fn hydrate(&self) -> Result<SessionState, SessionError> {
        let found = match self.store.load(Persistence::Remembered)? {
            Some(stored) => Some((Persistence::Remembered, stored)),
            None => self
                .store
                .load(Persistence::SessionOnly)?
                .map(|stored| (Persistence::SessionOnly, stored)),
        };

        let next = match found {
            Some((scope, stored)) => {
                tracing::info!(scope = ?scope, "session hydrated");
                SessionState {
                    token: Some(stored.token),
                    profile: stored.profile,
                    persistence: Some(scope),
                }
            }
            None => {
                tracing::debug!("no stored session");
                SessionState::default()
            }
        };

        self.state.send_replace(next.clone());
        Ok(next)
    }

    /// Store `token` in `persistence` only and drop any profile from a
    /// previous session.
    pub fn login(&self, token: AuthToken, persistence: Persistence) -> Result<(), SessionError> {
        self.store.save(
            persistence,
            &StoredSession {
                token: token.clone(),
                profile: None,
            },
        )?;
        self.store.clear(persistence.other())?;

        self.state.send_replace(SessionState {
            token: Some(token),
            profile: None,
            persistence: Some(persistence),
        });
        tracing::info!(scope = ?persistence, "logged in");
        Ok(())
    }

    /// Record the profile of the current session.
    pub fn set_profile(&self, profile: UserProfile) -> Result<(), SessionError> {
        let current = self.snapshot();
        if let (Some(token), Some(scope)) = (current.token.clone(), current.persistence) {
            self.store.save(
                scope,
                &StoredSession {
                    token,
                    profile: Some(profile.clone()),
                },
            )?;
        }

        tracing::debug!(username = %profile.username, role = %profile.role(), "profile loaded");
        self.state.send_modify(|state| state.profile = Some(profile));
        Ok(())
    }

    /// Clear both scopes and the profile. Dependents are notified even when
    /// the store fails; the first store error is returned.
    pub fn logout(&self) -> Result<(), SessionError> {
        let remembered = self.store.clear(Persistence::Remembered);
        let session_only = self.store.clear(Persistence::SessionOnly);

        self.state.send_replace(SessionState::default());
        tracing::info!("logged out");

        remembered.and(session_only)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
