use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::access::authenticate;
use super::{ApiError, AppState};
use crate::model::{Query, QueryResult};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
}

pub async fn create_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Query>, ApiError> {
    let claims = authenticate(&state, &headers, "/query")?;
    let Json(req) = req?;
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }
    let query = state.store()?.insert_query(claims.sub, text, Utc::now())?;
    Ok(Json(query))
}

pub async fn results_for_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(query_id): Path<String>,
) -> Result<Json<Vec<QueryResult>>, ApiError> {
    authenticate(&state, &headers, "/results")?;
    // An id that cannot name a query has no results either.
    let results = match query_id.parse::<i64>() {
        Ok(id) => state.store()?.results_for_query(id)?,
        Err(_) => Vec::new(),
    };
    if results.is_empty() {
        return Err(ApiError::NotFound("No results found".to_string()));
    }
    Ok(Json(results))
}
