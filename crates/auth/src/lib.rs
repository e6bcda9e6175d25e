//! `tradetrack-auth` — client-side session state and route guarding.
//!
//! The session is explicit state owned by a [`SessionContext`]; nothing here
//! talks to the network.

pub mod guard;
pub mod profile;
pub mod session;

pub use guard::{GuardRejection, HOME_ROUTE, LOGIN_ROUTE, RouteRequirement, guard};
pub use profile::{Role, UserProfile};
pub use session::{
    AuthToken, InMemorySessionStore, Persistence, SessionContext, SessionError, SessionState,
    SessionStore, StoredSession,
};
