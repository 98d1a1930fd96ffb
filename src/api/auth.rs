use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::auth::{hash_password, verify_password};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{Role, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: Role,
}

/// Roles a caller may claim at registration.
fn self_assignable(raw: Option<&str>) -> Result<Role, ApiError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::Citizen),
        Some(raw) => match raw.parse::<Role>() {
            Ok(role @ (Role::Citizen | Role::Official)) => Ok(role),
            Ok(Role::Admin) => Err(ApiError::BadRequest("admin accounts cannot be self-registered".to_string())),
            Err(_) => Err(ApiError::BadRequest(format!("unknown role {:?}", raw))),
        },
    }
}

pub async fn register(
    State(state): State<AppState>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(req) = req?;
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("name and a valid email are required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest("password must be at least 6 characters".to_string()));
    }
    let role = self_assignable(req.role.as_deref())?;

    let hash = hash_password(&req.password).map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    let user = state
        .store()?
        .create_user(name, &email, role, &hash, Utc::now())?
        .ok_or_else(|| ApiError::Conflict("User already exists".to_string()))?;

    log(
        Level::Info,
        Domain::Auth,
        "registered",
        obj(&[("user_id", serde_json::json!(user.id)), ("role", v_str(role.as_str()))]),
    );
    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = req?;
    let email = req.email.trim().to_lowercase();
    let record = state.store()?.find_user_by_email(&email)?;

    let Some(record) = record.filter(|r| verify_password(&req.password, &r.password_hash)) else {
        log(Level::Warn, Domain::Auth, "login_failed", obj(&[("email", v_str(&email))]));
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    };

    let user = record.user;
    let token = state
        .signer
        .issue(user.id, &user.email, user.role, Utc::now().timestamp())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    log(
        Level::Info,
        Domain::Auth,
        "login",
        obj(&[("user_id", serde_json::json!(user.id)), ("role", v_str(user.role.as_str()))]),
    );
    Ok(Json(LoginResponse { token, email: user.email, role: user.role }))
}
