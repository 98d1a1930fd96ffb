//! Client session: the persisted identity, the authorization predicate, and
//! the route guard consulted before rendering role-restricted views.
//!
//! The identity lives under two string keys in an injectable
//! [`SessionStore`]. There is no expiry on this side; the server checks the
//! bearer token's expiry and role on every request.

mod guard;
mod store;

pub use guard::{Gate, GuardState, Redirect, RouteGuard, LOGIN_PATH, UNAUTHORIZED_PATH};
pub use store::{FileStore, MemoryStore, SessionStore};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::Role;

pub const ROLE_KEY: &str = "userRole";
pub const EMAIL_KEY: &str = "userEmail";

/// Roles allowed onto the dashboard and analytics views.
pub const ANALYST_ROLES: &[Role] = &[Role::Official, Role::Admin];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub email: String,
    pub role: Option<Role>,
}

impl SessionIdentity {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self { email: email.into(), role: Some(role) }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.role.is_some() && !self.email.is_empty()
    }
}

/// True when the route is public (`required` empty) or the identity holds
/// one of the required roles.
pub fn authorize(identity: &SessionIdentity, required: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }
    match identity.role {
        Some(role) => required.contains(&role),
        None => false,
    }
}

pub struct Session<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the persisted identity. Missing email, missing role, or a role
    /// string that is not a known role all yield the absent identity.
    pub fn current_identity(&self) -> SessionIdentity {
        let email = self.store.get(EMAIL_KEY).filter(|e| !e.is_empty());
        let role = self.store.get(ROLE_KEY).and_then(|r| r.parse::<Role>().ok());
        match (email, role) {
            (Some(email), Some(role)) => SessionIdentity::new(email, role),
            _ => SessionIdentity::absent(),
        }
    }

    pub fn login(&mut self, email: &str, role: Role) -> Result<SessionIdentity> {
        self.store.set_all(&[(ROLE_KEY, role.as_str()), (EMAIL_KEY, email)])?;
        log(
            Level::Info,
            Domain::Auth,
            "session_login",
            obj(&[("email", v_str(email)), ("role", v_str(role.as_str()))]),
        );
        Ok(SessionIdentity::new(email, role))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(ROLE_KEY)?;
        self.store.remove(EMAIL_KEY)?;
        log(Level::Info, Domain::Auth, "session_logout", obj(&[]));
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_matrix() {
        let citizen = SessionIdentity::new("c@x.org", Role::Citizen);
        let official = SessionIdentity::new("o@x.org", Role::Official);
        let nobody = SessionIdentity::absent();

        assert!(!authorize(&citizen, ANALYST_ROLES));
        assert!(authorize(&official, ANALYST_ROLES));
        assert!(authorize(&nobody, &[]));
        assert!(!authorize(&nobody, ANALYST_ROLES));
    }

    #[test]
    fn test_identity_requires_both_keys() {
        let mut store = MemoryStore::new();
        store.set(ROLE_KEY, "official").unwrap();
        let session = Session::new(store);
        assert_eq!(session.current_identity(), SessionIdentity::absent());

        let mut store = session.into_store();
        store.remove(ROLE_KEY).unwrap();
        store.set(EMAIL_KEY, "o@x.org").unwrap();
        let session = Session::new(store);
        assert!(!session.current_identity().is_present());
    }

    #[test]
    fn test_unknown_role_is_absent() {
        let mut store = MemoryStore::new();
        store.set(ROLE_KEY, "").unwrap();
        store.set(EMAIL_KEY, "o@x.org").unwrap();
        assert!(!Session::new(store).current_identity().is_present());
    }

    #[test]
    fn test_login_logout() {
        let mut session = Session::new(MemoryStore::new());
        session.login("o@x.org", Role::Official).unwrap();
        let identity = session.current_identity();
        assert_eq!(identity.role, Some(Role::Official));
        assert_eq!(identity.email, "o@x.org");
        assert_eq!(session.store().get(ROLE_KEY).as_deref(), Some("official"));

        session.logout().unwrap();
        assert_eq!(session.current_identity(), SessionIdentity::absent());
    }

    #[test]
    fn test_failed_login_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing").join("session.json")).unwrap();
        let mut session = Session::new(store);
        assert!(session.login("o@x.org", Role::Official).is_err());
        assert!(session.store().get(ROLE_KEY).is_none());
        assert!(session.store().get(EMAIL_KEY).is_none());
        assert!(!session.current_identity().is_present());
    }
}
