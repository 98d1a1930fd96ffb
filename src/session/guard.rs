use crate::model::Role;

use super::{authorize, SessionIdentity, ANALYST_ROLES};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Login(String),
    Unauthorized,
}

impl Redirect {
    pub fn path(&self) -> &str {
        match self {
            Redirect::Login(path) => path,
            Redirect::Unauthorized => UNAUTHORIZED_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Identity not resolved yet; render a placeholder.
    Loading,
    Authorized,
    Denied(Redirect),
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuardState::Loading)
    }
}

/// Page-level protection: a logged-in identity is always required, and
/// `required` further narrows the allowed roles when non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    required: Vec<Role>,
    redirect_to: String,
}

impl RouteGuard {
    pub fn new(required: &[Role]) -> Self {
        Self { required: required.to_vec(), redirect_to: LOGIN_PATH.to_string() }
    }

    /// Any logged-in role may pass.
    pub fn logged_in() -> Self {
        Self::new(&[])
    }

    pub fn with_redirect(mut self, path: &str) -> Self {
        self.redirect_to = path.to_string();
        self
    }

    pub fn required(&self) -> &[Role] {
        &self.required
    }

    /// Guard for a known page path; `None` for public pages.
    pub fn for_path(path: &str) -> Option<Self> {
        match path {
            "/dashboard" | "/analytics" => Some(Self::new(ANALYST_ROLES)),
            _ => None,
        }
    }

    /// `None` means the identity has not been read yet.
    pub fn evaluate(&self, identity: Option<&SessionIdentity>) -> GuardState {
        let Some(identity) = identity else {
            return GuardState::Loading;
        };
        if !identity.is_present() {
            return GuardState::Denied(Redirect::Login(self.redirect_to.clone()));
        }
        if authorize(identity, &self.required) {
            GuardState::Authorized
        } else {
            GuardState::Denied(Redirect::Unauthorized)
        }
    }
}

/// One page mount: starts in `Loading` and settles once.
#[derive(Debug, Clone)]
pub struct Gate {
    guard: RouteGuard,
    state: GuardState,
}

impl Gate {
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard, state: GuardState::Loading }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Settles the gate with the resolved identity. Later calls are ignored
    /// once a terminal state is reached.
    pub fn resolve(&mut self, identity: &SessionIdentity) -> &GuardState {
        if !self.state.is_terminal() {
            self.state = self.guard.evaluate(Some(identity));
        }
        &self.state
    }
}
