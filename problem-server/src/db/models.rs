//! Problem document model and request/response DTOs
//!
//! Field names on the wire follow the upstream problem-feed JSON (camelCase).

use serde::{Deserialize, Serialize};

/// Problem lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemStatus {
    Open,
    Closed,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Open => "OPEN",
            ProblemStatus::Closed => "CLOSED",
        }
    }
}

/// A named management zone attached to a problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementZone {
    pub name: String,
}

/// Identifier of an affected entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// An entity impacted by the problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedEntity {
    pub name: String,
    pub entity_id: EntityId,
}

/// Tag attached to an affected entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTag {
    pub string_representation: String,
}

/// One piece of evidence collected for the problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDetail {
    pub evidence_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDetails {
    #[serde(default)]
    pub details: Vec<EvidenceDetail>,
}

/// A comment on the problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub content: String,
    pub author: String,
}

/// Comment list plus its maintained count.
///
/// `total_count` must equal `comments.len()` after any mutation; the
/// repository's comment append keeps both in a single atomic update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComments {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// An incident/alert record from the problem feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub problem_id: String,
    #[serde(default)]
    pub display_id: String,
    #[serde(default)]
    pub title: String,
    pub status: ProblemStatus,
    pub impact_level: String,
    pub severity_level: String,
    pub start_time: i64,
    /// -1 while the problem is still open, as in the upstream feed
    pub end_time: i64,
    /// Minutes, precomputed upstream; never derived from the timestamps
    pub duration: f64,
    /// Absent, null, `{}` and populated are four distinct states; the charts
    /// and the list filter intentionally disagree on which of them count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_entity: Option<serde_json::Value>,
    #[serde(default)]
    pub management_zones: Vec<ManagementZone>,
    #[serde(default)]
    pub affected_entities: Vec<AffectedEntity>,
    #[serde(default)]
    pub entity_tags: Vec<EntityTag>,
    #[serde(default)]
    pub evidence_details: EvidenceDetails,
    #[serde(default)]
    pub recent_comments: RecentComments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoremediado: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funciono_auto_remediacion: Option<bool>,
}

impl Problem {
    /// True when any comment mentions "GitHub Actions" (case-insensitive).
    ///
    /// Shared by the KPI count, the remediation funnel and the
    /// autoremediado charts, which all use this comment heuristic rather
    /// than the stored `autoremediado` flag.
    pub fn mentions_github_actions(&self) -> bool {
        self.recent_comments
            .comments
            .iter()
            .any(|c| c.content.to_lowercase().contains("github actions"))
    }

    /// True when any comment mentions one of the given terms (case-insensitive)
    pub fn mentions_any(&self, terms: &[&str]) -> bool {
        self.recent_comments.comments.iter().any(|c| {
            let content = c.content.to_lowercase();
            terms.iter().any(|t| content.contains(t))
        })
    }
}

/// One page of problems plus pagination metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemPage {
    pub problems: Vec<Problem>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Bulk fetch result for the analytics path
#[derive(Debug, Clone)]
pub struct BulkResult {
    pub problems: Vec<Problem>,
    /// Set when more rows matched than the fetch ceiling allowed
    pub truncated: bool,
}

/// Distinct observed values per filterable dimension
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub impact_levels: Vec<String>,
    pub severity_levels: Vec<String>,
    pub statuses: Vec<String>,
    pub management_zones: Vec<String>,
    pub affected_entity_types: Vec<String>,
    pub evidence_types: Vec<String>,
    pub entity_tags: Vec<String>,
}
