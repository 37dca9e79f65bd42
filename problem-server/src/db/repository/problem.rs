//! Problem Repository
//!
//! Paginated and bulk retrieval plus the two narrow mutations (status
//! transition, comment append). All reads run the predicate produced by
//! [`crate::db::query::build_where`], so the list and analytics paths share
//! identical filter semantics.

use sqlx::Sqlite;
use sqlx::query::QueryScalar;
use sqlx::sqlite::{SqliteArguments, SqlitePool};

use super::{RepoError, RepoResult};
use crate::db::models::{BulkResult, Comment, FilterOptions, Problem, ProblemPage, ProblemStatus};
use crate::db::query::{SqlParam, build_where};
use crate::filters::ProblemFilters;

/// Upper bound on a single page; a caller-supplied limit is clamped to this
pub const MAX_PAGE_SIZE: i64 = 500;

/// Ceiling on the bulk fetch backing the analytics endpoints. Analytics over
/// more matching problems than this is computed on the first
/// `ANALYTICS_FETCH_CAP` records and reported as truncated.
pub const ANALYTICS_FETCH_CAP: i64 = 10_000;

fn bind_params<'q, O>(
    mut query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    params: &'q [SqlParam],
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Real(f) => query.bind(*f),
        };
    }
    query
}

fn parse_docs(docs: Vec<String>) -> RepoResult<Vec<Problem>> {
    docs.iter()
        .map(|doc| serde_json::from_str(doc))
        .collect::<Result<Vec<Problem>, _>>()
        .map_err(|e| RepoError::Database(format!("Corrupt problem document: {e}")))
}

/// Map a camelCase sort field to its column; unknown fields are rejected
fn sort_column(sort_field: &str) -> RepoResult<&'static str> {
    Ok(match sort_field {
        "startTime" => "start_time",
        "endTime" => "end_time",
        "duration" => "duration",
        "status" => "status",
        "severityLevel" => "severity_level",
        "impactLevel" => "impact_level",
        "problemId" => "problem_id",
        other => {
            return Err(RepoError::Validation(format!(
                "Unsupported sort field '{other}'"
            )));
        }
    })
}

/// Paginated retrieval.
///
/// Page fetch and uncapped match count run concurrently; they read the same
/// predicate but are not a transactional snapshot of each other.
pub async fn find_all(
    pool: &SqlitePool,
    filters: &ProblemFilters,
    page: i64,
    limit: i64,
    sort_field: &str,
    sort_order: &str,
) -> RepoResult<ProblemPage> {
    let predicate = build_where(filters).map_err(|e| RepoError::Validation(e.to_string()))?;

    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    // saturate: a parseable but absurd page must not overflow the offset
    let offset = (page - 1).saturating_mul(limit);
    let column = sort_column(sort_field)?;
    let order = if sort_order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    };

    let fetch_sql = format!(
        "SELECT doc FROM problem{} ORDER BY {} {} LIMIT {} OFFSET {}",
        predicate.where_sql(),
        column,
        order,
        limit,
        offset
    );
    let count_sql = format!("SELECT COUNT(*) FROM problem{}", predicate.where_sql());

    let fetch = bind_params(
        sqlx::query_scalar::<_, String>(&fetch_sql),
        &predicate.params,
    )
    .fetch_all(pool);
    let count = bind_params(sqlx::query_scalar::<_, i64>(&count_sql), &predicate.params)
        .fetch_one(pool);
    let (docs, total) = tokio::try_join!(fetch, count)?;

    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    Ok(ProblemPage {
        problems: parse_docs(docs)?,
        total,
        page,
        limit,
        total_pages,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Problem>> {
    let doc: Option<String> =
        sqlx::query_scalar("SELECT doc FROM problem WHERE problem_id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    match doc {
        Some(doc) => Ok(Some(
            serde_json::from_str(&doc)
                .map_err(|e| RepoError::Database(format!("Corrupt problem document: {e}")))?,
        )),
        None => Ok(None),
    }
}

/// Bulk retrieval for the analytics engine, capped at
/// [`ANALYTICS_FETCH_CAP`] unless the caller overrides the limit.
pub async fn find_all_problems(
    pool: &SqlitePool,
    filters: &ProblemFilters,
    limit: Option<i64>,
) -> RepoResult<BulkResult> {
    let predicate = build_where(filters).map_err(|e| RepoError::Validation(e.to_string()))?;
    let cap = limit.unwrap_or(ANALYTICS_FETCH_CAP).max(1);

    let fetch_sql = format!(
        "SELECT doc FROM problem{} ORDER BY start_time DESC LIMIT {}",
        predicate.where_sql(),
        cap
    );
    let count_sql = format!("SELECT COUNT(*) FROM problem{}", predicate.where_sql());

    let fetch = bind_params(
        sqlx::query_scalar::<_, String>(&fetch_sql),
        &predicate.params,
    )
    .fetch_all(pool);
    let count = bind_params(sqlx::query_scalar::<_, i64>(&count_sql), &predicate.params)
        .fetch_one(pool);
    let (docs, total) = tokio::try_join!(fetch, count)?;

    let truncated = total > docs.len() as i64;
    if truncated {
        tracing::warn!(total, cap, "Analytics fetch truncated");
    }

    Ok(BulkResult {
        problems: parse_docs(docs)?,
        truncated,
    })
}

/// Uncapped count over the same predicate the fetches use
pub async fn count_matching(pool: &SqlitePool, filters: &ProblemFilters) -> RepoResult<i64> {
    let predicate = build_where(filters).map_err(|e| RepoError::Validation(e.to_string()))?;
    let count_sql = format!("SELECT COUNT(*) FROM problem{}", predicate.where_sql());
    let count = bind_params(sqlx::query_scalar::<_, i64>(&count_sql), &predicate.params)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Status transition on exact `problem_id` match. Returns `None` when no
/// record matched; the handler maps that to a not-found error by kind.
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: ProblemStatus,
) -> RepoResult<Option<Problem>> {
    let result = sqlx::query(
        "UPDATE problem SET doc = json_set(doc, '$.status', ?) WHERE problem_id = ?",
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Append a comment and bump `totalCount` in one atomic update so the
/// count/list invariant holds under concurrent appends to the same record.
pub async fn add_comment(
    pool: &SqlitePool,
    id: &str,
    content: &str,
    author: &str,
) -> RepoResult<Option<Problem>> {
    let comment = Comment {
        content: content.to_string(),
        author: author.to_string(),
    };
    let comment_json = serde_json::to_string(&comment)
        .map_err(|e| RepoError::Database(format!("Failed to encode comment: {e}")))?;

    let result = sqlx::query(
        "UPDATE problem SET doc = json_set(\
            json_insert(doc, '$.recentComments.comments[#]', json(?)), \
            '$.recentComments.totalCount', \
            json_extract(doc, '$.recentComments.totalCount') + 1\
         ) WHERE problem_id = ?",
    )
    .bind(&comment_json)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

async fn distinct_strings(pool: &SqlitePool, sql: &str) -> RepoResult<Vec<String>> {
    Ok(sqlx::query_scalar::<_, String>(sql).fetch_all(pool).await?)
}

/// Distinct observed values for every filterable dimension. Recomputed on
/// each call; all-empty vectors on an empty table.
pub async fn get_filter_options(pool: &SqlitePool) -> RepoResult<FilterOptions> {
    let impact_levels = distinct_strings(
        pool,
        "SELECT DISTINCT impact_level FROM problem \
         WHERE impact_level IS NOT NULL ORDER BY impact_level",
    )
    .await?;
    let severity_levels = distinct_strings(
        pool,
        "SELECT DISTINCT severity_level FROM problem \
         WHERE severity_level IS NOT NULL ORDER BY severity_level",
    )
    .await?;
    let statuses = distinct_strings(
        pool,
        "SELECT DISTINCT status FROM problem WHERE status IS NOT NULL ORDER BY status",
    )
    .await?;
    let management_zones = distinct_strings(
        pool,
        "SELECT DISTINCT json_extract(e.value, '$.name') \
         FROM problem, json_each(problem.doc, '$.managementZones') AS e \
         WHERE json_extract(e.value, '$.name') IS NOT NULL ORDER BY 1",
    )
    .await?;
    let affected_entity_types = distinct_strings(
        pool,
        "SELECT DISTINCT json_extract(e.value, '$.entityId.type') \
         FROM problem, json_each(problem.doc, '$.affectedEntities') AS e \
         WHERE json_extract(e.value, '$.entityId.type') IS NOT NULL ORDER BY 1",
    )
    .await?;
    let evidence_types = distinct_strings(
        pool,
        "SELECT DISTINCT json_extract(e.value, '$.evidenceType') \
         FROM problem, json_each(problem.doc, '$.evidenceDetails.details') AS e \
         WHERE json_extract(e.value, '$.evidenceType') IS NOT NULL ORDER BY 1",
    )
    .await?;
    let entity_tags = distinct_strings(
        pool,
        "SELECT DISTINCT json_extract(e.value, '$.stringRepresentation') \
         FROM problem, json_each(problem.doc, '$.entityTags') AS e \
         WHERE json_extract(e.value, '$.stringRepresentation') IS NOT NULL ORDER BY 1",
    )
    .await?;

    Ok(FilterOptions {
        impact_levels,
        severity_levels,
        statuses,
        management_zones,
        affected_entity_types,
        evidence_types,
        entity_tags,
    })
}

/// Ingestion proper happens upstream; this write path exists for seeding
/// and tests.
pub async fn insert(pool: &SqlitePool, problem: &Problem) -> RepoResult<()> {
    let doc = serde_json::to_string(problem)
        .map_err(|e| RepoError::Database(format!("Failed to encode problem: {e}")))?;
    sqlx::query("INSERT INTO problem (problem_id, doc) VALUES (?, ?)")
        .bind(&problem.problem_id)
        .bind(doc)
        .execute(pool)
        .await?;
    Ok(())
}
