//! Problem API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::params::{RawParams, first_param, parse_i64_param};
use crate::core::ServerState;
use crate::db::models::{FilterOptions, Problem, ProblemPage, ProblemStatus};
use crate::db::repository::problem as problem_repo;
use crate::filters;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

const DEFAULT_PAGE_SIZE: i64 = 20;

/// GET /api/problems - paginated, filtered listing
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<RawParams>,
) -> AppResult<Json<AppResponse<ProblemPage>>> {
    let filters = filters::normalize(&params)?;
    let page = parse_i64_param(&params, "page", 1)?;
    let limit = parse_i64_param(&params, "limit", DEFAULT_PAGE_SIZE)?;
    let sort_field = first_param(&params, "sortField").unwrap_or("startTime");
    let sort_order = first_param(&params, "sortOrder").unwrap_or("desc");

    let result = problem_repo::find_all(state.pool(), &filters, page, limit, sort_field, sort_order)
        .await?;
    Ok(ok(result))
}

/// GET /api/problems/filter-options - distinct values per filter dimension
pub async fn filter_options(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<FilterOptions>>> {
    let options = problem_repo::get_filter_options(state.pool()).await?;
    Ok(ok(options))
}

/// GET /api/problems/{id} - single record
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Problem>>> {
    let problem = problem_repo::find_by_id(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Problem {id} not found")))?;
    Ok(ok(problem))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ProblemStatus,
}

/// PATCH /api/problems/{id}/status - OPEN/CLOSED transition
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Problem>>> {
    let problem = problem_repo::update_status(state.pool(), &id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Problem {id} not found")))?;

    tracing::debug!(problem_id = %id, status = payload.status.as_str(), "Problem status updated");
    Ok(ok_with_message(problem, "Status updated"))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
    pub author: Option<String>,
}

/// POST /api/problems/{id}/comments - append a comment
pub async fn add_comment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<AppResponse<Problem>>> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Comment content must not be empty".into()));
    }
    let author = payload.author.as_deref().unwrap_or("Anonymous");

    let problem = problem_repo::add_comment(state.pool(), &id, &payload.content, author)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Problem {id} not found")))?;
    Ok(ok_with_message(problem, "Comment added"))
}
