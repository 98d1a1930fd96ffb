use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use rand::RngCore;

use super::access::{authenticate, require_role};
use super::{ApiError, AppState};
use crate::filter::{filter, FilterState};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{HazardReport, NewReport};
use crate::session::ANALYST_ROLES;
use crate::stats::{aggregate, ReportStats};

pub type FilterParams = Result<Query<Vec<(String, String)>>, QueryRejection>;

pub(super) fn filter_state(params: FilterParams) -> Result<(FilterState, String), ApiError> {
    let Query(pairs) = params?;
    Ok(FilterState::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
}

fn filtered_reports(state: &AppState, params: FilterParams) -> Result<Vec<HazardReport>, ApiError> {
    let (filters, search) = filter_state(params)?;
    let reports = state.store()?.list_reports()?;
    Ok(filter(&reports, &filters, &search).into_iter().cloned().collect())
}

/// `GET /reports?severity=..&source=..&status=..&location=..&type=..&q=..`.
/// The hazard type may also be given as `hazard_type` or `hazardType`.
pub async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: FilterParams,
) -> Result<Json<Vec<HazardReport>>, ApiError> {
    require_role(&state, &headers, "/reports", ANALYST_ROLES)?;
    let reports = filtered_reports(&state, params)?;
    Ok(Json(reports))
}

pub async fn report_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: FilterParams,
) -> Result<Json<ReportStats>, ApiError> {
    require_role(&state, &headers, "/reports/stats", ANALYST_ROLES)?;
    let reports = filtered_reports(&state, params)?;
    Ok(Json(aggregate(&reports)))
}

pub async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Result<Json<NewReport>, JsonRejection>,
) -> Result<(StatusCode, Json<HazardReport>), ApiError> {
    let claims = authenticate(&state, &headers, "/reports")?;
    let Json(new) = req?;
    new.validate().map_err(ApiError::BadRequest)?;

    let mut id = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut id);
    let report = new.into_report(hex::encode(id), claims.email.clone(), claims.role, Utc::now());
    state.store()?.insert_report(&report)?;

    log(
        Level::Info,
        Domain::Api,
        "report_created",
        obj(&[
            ("report_id", v_str(&report.id)),
            ("severity", v_str(report.severity.as_str())),
            ("source", v_str(report.source.as_str())),
        ]),
    );
    Ok((StatusCode::CREATED, Json(report)))
}
