use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::access::require_role;
use super::reports::{filter_state, FilterParams};
use super::{ApiError, AppState};
use crate::filter::filter;
use crate::model::SocialPost;
use crate::session::ANALYST_ROLES;
use crate::stats::{aggregate, PostStats};

async fn filtered_posts(state: &AppState, params: FilterParams) -> Result<Vec<SocialPost>, ApiError> {
    let (filters, search) = filter_state(params)?;
    let snapshot = state.feed.read().await.snapshot();
    Ok(filter(&snapshot, &filters, &search).into_iter().cloned().collect())
}

pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: FilterParams,
) -> Result<Json<Vec<SocialPost>>, ApiError> {
    require_role(&state, &headers, "/posts", ANALYST_ROLES)?;
    let posts = filtered_posts(&state, params).await?;
    Ok(Json(posts))
}

pub async fn post_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: FilterParams,
) -> Result<Json<PostStats>, ApiError> {
    require_role(&state, &headers, "/posts/stats", ANALYST_ROLES)?;
    let posts = filtered_posts(&state, params).await?;
    Ok(Json(aggregate(&posts)))
}
