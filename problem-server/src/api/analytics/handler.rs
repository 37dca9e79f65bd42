//! Analytics API Handlers
//!
//! Each endpoint normalizes the same filter set as the list API, pulls the
//! filtered records through the capped bulk fetch and runs one engine
//! aggregation over them. A truncated fetch is reported in the envelope
//! message instead of being silently dropped.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;

use crate::analytics::engine;
use crate::analytics::types::*;
use crate::analytics::Granularity;
use crate::api::params::{RawParams, first_param, parse_usize_param};
use crate::core::ServerState;
use crate::db::models::BulkResult;
use crate::db::repository::problem as problem_repo;
use crate::db::repository::problem::ANALYTICS_FETCH_CAP;
use crate::filters;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

async fn fetch_filtered(state: &ServerState, params: &RawParams) -> AppResult<BulkResult> {
    let filters = filters::normalize(params)?;
    Ok(problem_repo::find_all_problems(state.pool(), &filters, None).await?)
}

fn respond<T: Serialize>(truncated: bool, data: T) -> Json<AppResponse<T>> {
    if truncated {
        ok_with_message(
            data,
            format!("Computed over the first {ANALYTICS_FETCH_CAP} matching problems"),
        )
    } else {
        ok(data)
    }
}

fn granularity(params: &RawParams) -> AppResult<Granularity> {
    match first_param(params, "granularity") {
        None => Ok(Granularity::Day),
        Some(raw) => Granularity::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unsupported granularity '{raw}'"))),
    }
}

/// GET /api/analytics/kpis
pub async fn kpis(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Kpis>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(bulk.truncated, engine::kpis(&bulk.problems)))
}

/// GET /api/analytics/time-series?granularity=day|week|month
pub async fn time_series(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<TimeSeriesPoint>>>> {
    let granularity = granularity(&params)?;
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::time_series(&bulk.problems, granularity),
    ))
}

/// GET /api/analytics/impact-severity-matrix
pub async fn impact_severity_matrix(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<ImpactSeverityRow>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::impact_severity_matrix(&bulk.problems),
    ))
}

/// GET /api/analytics/top-entities?limit=N
pub async fn top_entities(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<TopEntity>>>> {
    let limit = parse_usize_param(&params, "limit", engine::DEFAULT_TOP_ENTITIES)?;
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::top_entities(&bulk.problems, limit),
    ))
}

/// GET /api/analytics/management-zones
pub async fn management_zones(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<ManagementZoneStat>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::management_zones(&bulk.problems),
    ))
}

/// GET /api/analytics/remediation-funnel
pub async fn remediation_funnel(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<FunnelStage>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::remediation_funnel(&bulk.problems),
    ))
}

/// GET /api/analytics/duration-distribution
pub async fn duration_distribution(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<DurationBucket>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::duration_distribution(&bulk.problems),
    ))
}

/// GET /api/analytics/evidence-types
pub async fn evidence_types(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<EvidenceTypeNode>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(bulk.truncated, engine::evidence_types(&bulk.problems)))
}

/// GET /api/analytics/root-cause-analysis
pub async fn root_cause_analysis(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<NamedValue>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::root_cause_analysis(&bulk.problems),
    ))
}

/// GET /api/analytics/severity-distribution
pub async fn severity_distribution(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<NamedValue>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::severity_distribution(&bulk.problems),
    ))
}

/// GET /api/analytics/impact-distribution
pub async fn impact_distribution(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<NamedValue>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::impact_distribution(&bulk.problems),
    ))
}

/// GET /api/analytics/root-cause-distribution
pub async fn root_cause_distribution(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<NamedValue>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::has_root_cause_distribution(&bulk.problems),
    ))
}

/// GET /api/analytics/autoremediado-distribution
pub async fn autoremediado_distribution(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<NamedValue>>>> {
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::autoremediado_distribution(&bulk.problems),
    ))
}

/// GET /api/analytics/autoremediado-time-series?granularity=day|week|month
pub async fn autoremediado_time_series(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<AutoremediationPoint>>>> {
    let granularity = granularity(&params)?;
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::autoremediado_time_series(&bulk.problems, granularity),
    ))
}

/// GET /api/analytics/avg-resolution-time-series?granularity=day|week|month
pub async fn avg_resolution_time_series(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<Vec<ResolutionTimePoint>>>> {
    let granularity = granularity(&params)?;
    let bulk = fetch_filtered(&state, &params).await?;
    Ok(respond(
        bulk.truncated,
        engine::avg_resolution_time_series(&bulk.problems, granularity),
    ))
}
