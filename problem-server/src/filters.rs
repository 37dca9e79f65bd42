//! Filter normalization
//!
//! Turns the loosely-typed query-string parameters of a request into a
//! canonical [`ProblemFilters`] value. Repeated keys form arrays, so
//! `severityLevel=ERROR&severityLevel=AVAILABILITY` and `severityLevel=ERROR`
//! both normalize to a vector. Malformed numbers are rejected here instead of
//! leaking NaN into range predicates downstream.

use thiserror::Error;

/// Error raised while normalizing raw request parameters
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid number for '{field}': '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("invalid date for '{field}': '{value}'")]
    InvalidDate { field: String, value: String },
}

/// Explicit three-state filter value.
///
/// `Unset` is a supplied-but-unknown marker and is distinct from the key
/// being absent altogether; both apply no predicate, but only the former
/// round-trips through the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    True,
    False,
    Unset,
}

impl TriState {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "true" => TriState::True,
            "false" => TriState::False,
            _ => TriState::Unset,
        }
    }

    /// The concrete boolean this filter asserts, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unset => None,
        }
    }
}

/// Canonical, sparse filter set for one request.
///
/// Every field is optional; absent means "no predicate". The query builder in
/// `db::query` is the single interpreter of these fields for both the list
/// and the analytics paths.
#[derive(Debug, Clone, Default)]
pub struct ProblemFilters {
    pub impact_level: Option<Vec<String>>,
    pub severity_level: Option<Vec<String>>,
    pub status: Option<Vec<String>>,
    pub management_zones: Option<Vec<String>>,
    pub affected_entity_types: Option<Vec<String>>,
    pub entity_tags: Option<Vec<String>>,
    pub evidence_type: Option<Vec<String>>,
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub duration_min: Option<f64>,
    pub duration_max: Option<f64>,
    pub has_comments: Option<bool>,
    pub has_github_actions: Option<bool>,
    pub has_root_cause: Option<TriState>,
    pub autoremediado: Option<TriState>,
    pub funciono_auto_remediacion: Option<TriState>,
}

fn collect_array(params: &[(String, String)], key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = params
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect();
    if values.is_empty() { None } else { Some(values) }
}

fn first_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Parse an optional duration bound.
///
/// A literal `0` is dropped as "not provided" — the upstream contract cannot
/// tell the two apart, and callers depend on that. Anything unparseable is a
/// validation error rather than a silent NaN.
fn parse_duration(params: &[(String, String)], key: &str) -> Result<Option<f64>, FilterError> {
    match first_value(params, key) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(raw) => {
            let value = raw.parse::<f64>().map_err(|_| FilterError::InvalidNumber {
                field: key.to_string(),
                value: raw.to_string(),
            })?;
            if !value.is_finite() {
                return Err(FilterError::InvalidNumber {
                    field: key.to_string(),
                    value: raw.to_string(),
                });
            }
            Ok(if value == 0.0 { None } else { Some(value) })
        }
    }
}

/// Normalize raw query-string pairs into a [`ProblemFilters`] value.
///
/// Unknown keys (paging, sorting, granularity) are ignored so list and
/// analytics handlers can pass their full query string through.
pub fn normalize(params: &[(String, String)]) -> Result<ProblemFilters, FilterError> {
    let mut filters = ProblemFilters::default();

    filters.impact_level = collect_array(params, "impactLevel");
    filters.severity_level = collect_array(params, "severityLevel");
    filters.status = collect_array(params, "status");
    filters.management_zones = collect_array(params, "managementZones");
    filters.affected_entity_types = collect_array(params, "affectedEntityTypes");
    filters.entity_tags = collect_array(params, "entityTags");
    filters.evidence_type = collect_array(params, "evidenceType");

    filters.search = first_value(params, "search").map(str::to_string);
    filters.date_from = first_value(params, "dateFrom").map(str::to_string);
    filters.date_to = first_value(params, "dateTo").map(str::to_string);

    filters.duration_min = parse_duration(params, "durationMin")?;
    filters.duration_max = parse_duration(params, "durationMax")?;

    filters.has_comments = match first_value(params, "hasComments") {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    };
    // Asymmetric on purpose: only an explicit true ever applies a predicate
    filters.has_github_actions = match first_value(params, "hasGitHubActions") {
        Some("true") => Some(true),
        _ => None,
    };

    filters.has_root_cause = first_value(params, "hasRootCause").map(TriState::from_raw);
    filters.autoremediado = first_value(params, "autoremediado").map(TriState::from_raw);
    filters.funciono_auto_remediacion =
        first_value(params, "funcionoAutoRemediacion").map(TriState::from_raw);

    Ok(filters)
}
