//! Bearer-token authentication and role checks for handlers.

use axum::http::{header, HeaderMap};
use chrono::Utc;

use super::{ApiError, AppState};
use crate::auth::Claims;
use crate::logging::log_auth_rejected;
use crate::model::Role;
use crate::session::{authorize, SessionIdentity};

fn bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies the request's bearer token and returns its claims.
pub fn authenticate(state: &AppState, headers: &HeaderMap, path: &str) -> Result<Claims, ApiError> {
    let Some(token) = bearer(headers) else {
        log_auth_rejected("missing_token", path);
        return Err(ApiError::Unauthorized("No token, authorization denied".to_string()));
    };
    state.signer.verify(token, Utc::now().timestamp()).map_err(|err| {
        log_auth_rejected(&err.to_string(), path);
        ApiError::Unauthorized("Token is not valid".to_string())
    })
}

/// Authenticates and additionally requires one of `roles`.
pub fn require_role(state: &AppState, headers: &HeaderMap, path: &str, roles: &[Role]) -> Result<Claims, ApiError> {
    let claims = authenticate(state, headers, path)?;
    let identity = SessionIdentity::new(claims.email.clone(), claims.role);
    if !authorize(&identity, roles) {
        log_auth_rejected("insufficient_role", path);
        return Err(ApiError::Forbidden("Insufficient role".to_string()));
    }
    Ok(claims)
}
