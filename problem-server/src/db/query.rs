//! Filter-to-SQL translation
//!
//! Pure mapping from a canonical [`ProblemFilters`] value to a SQL predicate
//! over the `problem` table. Every present filter contributes one independent
//! clause and the clauses are ANDed. This module is the single source of
//! truth for filter semantics: the paginated list path and the analytics bulk
//! path both run the predicate produced here, so "problems shown" and
//! "problems counted" can never diverge for the same filter set.

use chrono::{DateTime, NaiveDate};

use crate::filters::{FilterError, ProblemFilters, TriState};

/// One positional bind value for the built predicate
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Real(f64),
}

/// A WHERE fragment (without the `WHERE` keyword) plus its ordered binds
#[derive(Debug, Clone, Default)]
pub struct SqlPredicate {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

impl SqlPredicate {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// `" WHERE <clause>"` or an empty string when no filter is present
    pub fn where_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Membership clause on a generated scalar column
fn column_in(clauses: &mut Vec<String>, params: &mut Vec<SqlParam>, column: &str, values: &[String]) {
    clauses.push(format!("{} IN ({})", column, placeholders(values.len())));
    params.extend(values.iter().cloned().map(SqlParam::Text));
}

/// Membership clause over a nested JSON array, e.g. management zones by name
fn json_array_in(
    clauses: &mut Vec<String>,
    params: &mut Vec<SqlParam>,
    array_path: &str,
    value_path: &str,
    values: &[String],
) {
    clauses.push(format!(
        "EXISTS (SELECT 1 FROM json_each(problem.doc, '{}') AS e \
         WHERE json_extract(e.value, '{}') IN ({}))",
        array_path,
        value_path,
        placeholders(values.len())
    ));
    params.extend(values.iter().cloned().map(SqlParam::Text));
}

/// Parse a date bound supplied as `YYYY-MM-DD` or RFC3339 into epoch millis
fn parse_date_bound(field: &str, raw: &str) -> Result<i64, FilterError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc().timestamp_millis())
        .map_err(|_| FilterError::InvalidDate {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Build the WHERE predicate for a filter set.
///
/// Pure — no I/O; errors only on malformed date bounds.
pub fn build_where(filters: &ProblemFilters) -> Result<SqlPredicate, FilterError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    if let Some(values) = &filters.impact_level {
        column_in(&mut clauses, &mut params, "impact_level", values);
    }
    if let Some(values) = &filters.severity_level {
        column_in(&mut clauses, &mut params, "severity_level", values);
    }
    if let Some(values) = &filters.status {
        column_in(&mut clauses, &mut params, "status", values);
    }
    if let Some(values) = &filters.management_zones {
        json_array_in(&mut clauses, &mut params, "$.managementZones", "$.name", values);
    }
    if let Some(values) = &filters.affected_entity_types {
        json_array_in(
            &mut clauses,
            &mut params,
            "$.affectedEntities",
            "$.entityId.type",
            values,
        );
    }
    if let Some(values) = &filters.entity_tags {
        json_array_in(
            &mut clauses,
            &mut params,
            "$.entityTags",
            "$.stringRepresentation",
            values,
        );
    }
    if let Some(values) = &filters.evidence_type {
        json_array_in(
            &mut clauses,
            &mut params,
            "$.evidenceDetails.details",
            "$.evidenceType",
            values,
        );
    }

    if let Some(raw) = &filters.date_from {
        clauses.push("start_time >= ?".to_string());
        params.push(SqlParam::Int(parse_date_bound("dateFrom", raw)?));
    }
    if let Some(raw) = &filters.date_to {
        clauses.push("start_time <= ?".to_string());
        params.push(SqlParam::Int(parse_date_bound("dateTo", raw)?));
    }

    match filters.has_comments {
        Some(true) => clauses.push("comment_count > 0".to_string()),
        // Exact zero, not "not greater than"
        Some(false) => clauses.push("comment_count = 0".to_string()),
        None => {}
    }

    // Only an explicit true ever emits this clause
    if filters.has_github_actions == Some(true) {
        clauses.push(
            "EXISTS (SELECT 1 FROM json_each(problem.doc, '$.recentComments.comments') AS c \
             WHERE instr(lower(json_extract(c.value, '$.content')), 'github actions') > 0)"
                .to_string(),
        );
    }

    // json_type is NULL for an absent key and 'null' for an explicit null
    match filters.has_root_cause {
        Some(TriState::True) => {
            clauses.push("(root_cause_type IS NOT NULL AND root_cause_type != 'null')".to_string());
        }
        Some(TriState::False) => {
            clauses.push("(root_cause_type IS NULL OR root_cause_type = 'null')".to_string());
        }
        Some(TriState::Unset) | None => {}
    }

    if let Some(min) = filters.duration_min {
        clauses.push("duration >= ?".to_string());
        params.push(SqlParam::Real(min));
    }
    if let Some(max) = filters.duration_max {
        clauses.push("duration <= ?".to_string());
        params.push(SqlParam::Real(max));
    }

    if let Some(value) = filters.autoremediado.and_then(|t| t.as_bool()) {
        clauses.push("autoremediado = ?".to_string());
        params.push(SqlParam::Int(value as i64));
    }
    if let Some(value) = filters.funciono_auto_remediacion.and_then(|t| t.as_bool()) {
        clauses.push("funciono_auto_remediacion = ?".to_string());
        params.push(SqlParam::Int(value as i64));
    }

    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        clauses.push(
            "(instr(lower(title), ?) > 0 OR instr(lower(display_id), ?) > 0 \
             OR instr(lower(problem_id), ?) > 0)"
                .to_string(),
        );
        params.push(SqlParam::Text(needle.clone()));
        params.push(SqlParam::Text(needle.clone()));
        params.push(SqlParam::Text(needle));
    }

    Ok(SqlPredicate {
        clause: clauses.join(" AND "),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> ProblemFilters {
        ProblemFilters::default()
    }

    #[test]
    fn empty_filters_build_empty_predicate() {
        let predicate = build_where(&filters()).unwrap();
        assert!(predicate.is_empty());
        assert_eq!(predicate.where_sql(), "");
        assert!(predicate.params.is_empty());
    }

    #[test]
    fn categorical_sets_use_in_clauses() {
        let mut f = filters();
        f.severity_level = Some(vec!["ERROR".into(), "AVAILABILITY".into()]);
        f.status = Some(vec!["OPEN".into()]);
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("severity_level IN (?, ?)"));
        assert!(predicate.clause.contains("status IN (?)"));
        assert_eq!(predicate.params.len(), 3);
    }

    #[test]
    fn nested_array_filters_scan_json_paths() {
        let mut f = filters();
        f.management_zones = Some(vec!["prod".into()]);
        f.affected_entity_types = Some(vec!["HOST".into(), "SERVICE".into()]);
        f.entity_tags = Some(vec!["team:payments".into()]);
        f.evidence_type = Some(vec!["EVENT".into()]);
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("'$.managementZones'"));
        assert!(predicate.clause.contains("'$.name'"));
        assert!(predicate.clause.contains("'$.entityId.type'"));
        assert!(predicate.clause.contains("'$.stringRepresentation'"));
        assert!(predicate.clause.contains("'$.evidenceDetails.details'"));
        assert_eq!(predicate.params.len(), 5);
    }

    #[test]
    fn date_bounds_are_inclusive_and_independent() {
        let mut f = filters();
        f.date_from = Some("2025-01-01".into());
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("start_time >= ?"));
        assert!(!predicate.clause.contains("start_time <= ?"));
        assert_eq!(predicate.params, vec![SqlParam::Int(1_735_689_600_000)]);

        let mut f = filters();
        f.date_to = Some("2025-01-02T12:30:00Z".into());
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("start_time <= ?"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut f = filters();
        f.date_from = Some("yesterday".into());
        assert!(matches!(
            build_where(&f).unwrap_err(),
            FilterError::InvalidDate { .. }
        ));
    }

    #[test]
    fn has_comments_false_emits_exact_zero() {
        let mut f = filters();
        f.has_comments = Some(false);
        let predicate = build_where(&f).unwrap();
        assert_eq!(predicate.clause, "comment_count = 0");

        f.has_comments = Some(true);
        let predicate = build_where(&f).unwrap();
        assert_eq!(predicate.clause, "comment_count > 0");
    }

    #[test]
    fn root_cause_false_differs_from_absent() {
        let mut f = filters();
        f.has_root_cause = Some(TriState::False);
        let explicit = build_where(&f).unwrap();
        assert!(explicit.clause.contains("root_cause_type IS NULL OR root_cause_type = 'null'"));

        f.has_root_cause = None;
        let absent = build_where(&f).unwrap();
        assert!(absent.is_empty());

        f.has_root_cause = Some(TriState::Unset);
        let unset = build_where(&f).unwrap();
        assert!(unset.is_empty());
    }

    #[test]
    fn github_actions_only_emitted_when_true() {
        let mut f = filters();
        f.has_github_actions = Some(true);
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("github actions"));

        f.has_github_actions = None;
        assert!(build_where(&f).unwrap().is_empty());
    }

    #[test]
    fn remediation_flags_bind_equality() {
        let mut f = filters();
        f.autoremediado = Some(TriState::True);
        f.funciono_auto_remediacion = Some(TriState::Unset);
        let predicate = build_where(&f).unwrap();
        assert_eq!(predicate.clause, "autoremediado = ?");
        assert_eq!(predicate.params, vec![SqlParam::Int(1)]);
    }

    #[test]
    fn duration_range_binds_reals() {
        let mut f = filters();
        f.duration_min = Some(5.0);
        f.duration_max = Some(30.0);
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("duration >= ?"));
        assert!(predicate.clause.contains("duration <= ?"));
        assert_eq!(
            predicate.params,
            vec![SqlParam::Real(5.0), SqlParam::Real(30.0)]
        );
    }

    #[test]
    fn search_covers_text_columns_case_insensitively() {
        let mut f = filters();
        f.search = Some("Payment".into());
        let predicate = build_where(&f).unwrap();
        assert!(predicate.clause.contains("lower(title)"));
        assert!(predicate.clause.contains("lower(display_id)"));
        assert!(predicate.clause.contains("lower(problem_id)"));
        assert_eq!(
            predicate.params,
            vec![
                SqlParam::Text("payment".into()),
                SqlParam::Text("payment".into()),
                SqlParam::Text("payment".into())
            ]
        );
    }

    #[test]
    fn all_filters_combine_with_and() {
        let mut f = filters();
        f.severity_level = Some(vec!["ERROR".into()]);
        f.has_comments = Some(true);
        f.duration_min = Some(1.0);
        let predicate = build_where(&f).unwrap();
        assert_eq!(predicate.clause.matches(" AND ").count(), 2);
    }
}
