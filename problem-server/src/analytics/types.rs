//! Aggregate view shapes returned by the analytics endpoints

use std::collections::BTreeMap;

use serde::Serialize;

/// Headline KPIs over the filtered record set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_problems: u64,
    pub open_problems: u64,
    pub closed_problems: u64,
    /// Sum of stored durations (minutes)
    pub total_duration: f64,
    /// Mean duration over CLOSED problems, rounded; 0 when none are closed
    pub avg_resolution_time: i64,
    pub problems_with_comments: u64,
    pub github_action_problems: u64,
    /// AVAILABILITY or ERROR severity
    pub critical_problems: u64,
}

/// One time bucket with per-severity counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: String,
    pub total: u64,
    pub severities: BTreeMap<String, u64>,
}

/// One impact level with its severity breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSeverityRow {
    pub impact_level: String,
    pub total: u64,
    pub severities: BTreeMap<String, u64>,
}

/// Affected entity ranked by the number of records it appears in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntity {
    pub entity_id: String,
    pub name: String,
    pub count: u64,
}

/// Per-zone record count and mean severity weight
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementZoneStat {
    pub name: String,
    pub problem_count: u64,
    pub avg_severity_weight: f64,
}

/// One remediation funnel stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub stage: String,
    pub count: u64,
    /// Share of the grand total, 2 decimals; 0 when the set is empty
    pub percentage: f64,
}

/// Fixed duration bucket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBucket {
    pub range: String,
    pub count: u64,
}

/// Generic name/value pair used by the distribution charts
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamedValue {
    pub name: String,
    pub value: u64,
}

/// Evidence type with its event-type children
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceTypeNode {
    pub name: String,
    pub children: Vec<NamedValue>,
}

/// Auto-remediation split per time bucket (comment heuristic)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoremediationPoint {
    pub date: String,
    pub auto_remediated: u64,
    pub manual: u64,
}

/// Mean resolution time per bucket over CLOSED problems
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionTimePoint {
    pub date: String,
    pub avg_resolution_time: i64,
}
