//! Aggregate computation over a filtered problem set.
//!
//! Every function takes the same bulk record set (already filtered by the
//! repository) and produces one shaped view in a single O(n) pass plus, for
//! the ranked views, a sort over the group keys.
//!
//! Two different definitions of "auto-remediated" coexist on purpose: the
//! stored `autoremediado` flag drives the list filter, while the charts here
//! use the "any comment mentions GitHub Actions" heuristic.

use std::collections::{BTreeMap, HashMap};

use super::bucketing::{Granularity, bucket_key};
use super::types::*;
use crate::db::models::{Problem, ProblemStatus};

/// Default number of entries returned by [`top_entities`]
pub const DEFAULT_TOP_ENTITIES: usize = 10;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weight table for the management-zone severity average
fn severity_weight(severity: &str) -> f64 {
    match severity {
        "AVAILABILITY" => 5.0,
        "ERROR" => 4.0,
        "PERFORMANCE" => 3.0,
        "RESOURCE_CONTENTION" => 2.0,
        "CUSTOM_ALERT" => 1.0,
        _ => 0.0,
    }
}

fn is_critical(problem: &Problem) -> bool {
    matches!(problem.severity_level.as_str(), "AVAILABILITY" | "ERROR")
}

/// Headline KPIs. The resolution-time average covers CLOSED problems only
/// and is 0 (never NaN) when nothing is closed.
pub fn kpis(problems: &[Problem]) -> Kpis {
    let closed: Vec<&Problem> = problems
        .iter()
        .filter(|p| p.status == ProblemStatus::Closed)
        .collect();

    let avg_resolution_time = if closed.is_empty() {
        0
    } else {
        let sum: f64 = closed.iter().map(|p| p.duration).sum();
        (sum / closed.len() as f64).round() as i64
    };

    Kpis {
        total_problems: problems.len() as u64,
        open_problems: problems
            .iter()
            .filter(|p| p.status == ProblemStatus::Open)
            .count() as u64,
        closed_problems: closed.len() as u64,
        total_duration: problems.iter().map(|p| p.duration).sum(),
        avg_resolution_time,
        problems_with_comments: problems
            .iter()
            .filter(|p| p.recent_comments.total_count > 0)
            .count() as u64,
        github_action_problems: problems
            .iter()
            .filter(|p| p.mentions_github_actions())
            .count() as u64,
        critical_problems: problems.iter().filter(|p| is_critical(p)).count() as u64,
    }
}

/// Problem counts per time bucket, broken down by severity inside each
/// bucket. Output is ascending by bucket key, which is chronological for
/// these key formats.
pub fn time_series(problems: &[Problem], granularity: Granularity) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for problem in problems {
        let key = bucket_key(problem.start_time, granularity);
        *buckets
            .entry(key)
            .or_default()
            .entry(problem.severity_level.clone())
            .or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(date, severities)| TimeSeriesPoint {
            total: severities.values().sum(),
            date,
            severities,
        })
        .collect()
}

/// Two-level impact → severity counting
pub fn impact_severity_matrix(problems: &[Problem]) -> Vec<ImpactSeverityRow> {
    let mut matrix: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for problem in problems {
        *matrix
            .entry(problem.impact_level.clone())
            .or_default()
            .entry(problem.severity_level.clone())
            .or_insert(0) += 1;
    }
    matrix
        .into_iter()
        .map(|(impact_level, severities)| ImpactSeverityRow {
            total: severities.values().sum(),
            impact_level,
            severities,
        })
        .collect()
}

/// Most frequently affected entities.
///
/// Counting iterates each record's entity list as-is; an entity repeated
/// inside one record's list counts twice. Ties break on entity id so the
/// ranking is deterministic.
pub fn top_entities(problems: &[Problem], limit: usize) -> Vec<TopEntity> {
    let mut counts: HashMap<String, (String, u64)> = HashMap::new();
    for problem in problems {
        for entity in &problem.affected_entities {
            let entry = counts
                .entry(entity.entity_id.id.clone())
                .or_insert_with(|| (entity.name.clone(), 0));
            entry.1 += 1;
        }
    }
    let mut ranked: Vec<TopEntity> = counts
        .into_iter()
        .map(|(entity_id, (name, count))| TopEntity {
            entity_id,
            name,
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.entity_id.cmp(&b.entity_id)));
    ranked.truncate(limit);
    ranked
}

/// Per-zone record count and mean severity weight (2 decimals)
pub fn management_zones(problems: &[Problem]) -> Vec<ManagementZoneStat> {
    let mut zones: BTreeMap<String, (u64, f64)> = BTreeMap::new();
    for problem in problems {
        let weight = severity_weight(&problem.severity_level);
        for zone in &problem.management_zones {
            let entry = zones.entry(zone.name.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += weight;
        }
    }
    zones
        .into_iter()
        .map(|(name, (count, weight_sum))| ManagementZoneStat {
            name,
            problem_count: count,
            avg_severity_weight: round2(weight_sum / count as f64),
        })
        .collect()
}

/// Five-stage remediation funnel.
///
/// The first four stages narrow progressively; the closed stage is computed
/// independently and may exceed or undercut any of them.
pub fn remediation_funnel(problems: &[Problem]) -> Vec<FunnelStage> {
    let total = problems.len() as u64;
    let with_comments = problems
        .iter()
        .filter(|p| p.recent_comments.total_count > 0)
        .count() as u64;
    // Stages 3 and 4 narrow stage 2, so they keep its totalCount check even
    // though the mention heuristics only scan the comment list. Ingested
    // records may carry a count that disagrees with the list.
    let with_github_actions = problems
        .iter()
        .filter(|p| p.recent_comments.total_count > 0 && p.mentions_github_actions())
        .count() as u64;
    let with_success = problems
        .iter()
        .filter(|p| {
            p.recent_comments.total_count > 0
                && p.mentions_github_actions()
                && p.mentions_any(&["success", "completed"])
        })
        .count() as u64;
    let closed = problems
        .iter()
        .filter(|p| p.status == ProblemStatus::Closed)
        .count() as u64;

    let percentage = |count: u64| {
        if total == 0 {
            0.0
        } else {
            round2(count as f64 * 100.0 / total as f64)
        }
    };

    [
        ("total", total),
        ("with_comments", with_comments),
        ("with_github_actions", with_github_actions),
        ("with_success_mention", with_success),
        ("closed", closed),
    ]
    .into_iter()
    .map(|(stage, count)| FunnelStage {
        stage: stage.to_string(),
        count,
        percentage: percentage(count),
    })
    .collect()
}

/// Fixed duration buckets in minutes. Everything below 5 — including zero
/// and negative durations — lands in the first bucket so the counts always
/// sum to the input size.
pub fn duration_distribution(problems: &[Problem]) -> Vec<DurationBucket> {
    let mut counts = [0u64; 5];
    for problem in problems {
        let d = problem.duration;
        let slot = if d < 5.0 {
            0
        } else if d < 10.0 {
            1
        } else if d < 30.0 {
            2
        } else if d < 180.0 {
            3
        } else {
            4
        };
        counts[slot] += 1;
    }
    ["less_than_5", "5_to_10", "10_to_30", "30_to_180", "more_than_180"]
        .into_iter()
        .zip(counts)
        .map(|(range, count)| DurationBucket {
            range: range.to_string(),
            count,
        })
        .collect()
}

/// Evidence type → event type counting; events without a type group under
/// "UNKNOWN"
pub fn evidence_types(problems: &[Problem]) -> Vec<EvidenceTypeNode> {
    let mut groups: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for problem in problems {
        for detail in &problem.evidence_details.details {
            let event_type = detail
                .event_type
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string());
            *groups
                .entry(detail.evidence_type.clone())
                .or_default()
                .entry(event_type)
                .or_insert(0) += 1;
        }
    }
    groups
        .into_iter()
        .map(|(name, children)| EvidenceTypeNode {
            name,
            children: children
                .into_iter()
                .map(|(name, value)| NamedValue { name, value })
                .collect(),
        })
        .collect()
}

/// Occurrences per root-cause entity name, descending
pub fn root_cause_analysis(problems: &[Problem]) -> Vec<NamedValue> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for problem in problems {
        let name = problem
            .root_cause_entity
            .as_ref()
            .and_then(|v| v.get("name"))
            .and_then(|n| n.as_str());
        if let Some(name) = name {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<NamedValue> = counts
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value).then(a.name.cmp(&b.name)));
    ranked
}

fn count_distribution<F>(problems: &[Problem], key: F) -> Vec<NamedValue>
where
    F: Fn(&Problem) -> String,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for problem in problems {
        *counts.entry(key(problem)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect()
}

pub fn severity_distribution(problems: &[Problem]) -> Vec<NamedValue> {
    count_distribution(problems, |p| p.severity_level.clone())
}

pub fn impact_distribution(problems: &[Problem]) -> Vec<NamedValue> {
    count_distribution(problems, |p| p.impact_level.clone())
}

/// Split by root-cause presence. "Has" requires a non-null object with at
/// least one key — stricter than the list filter's existence check, and the
/// chart keeps that stricter reading.
pub fn has_root_cause_distribution(problems: &[Problem]) -> Vec<NamedValue> {
    count_distribution(problems, |p| {
        let has = p
            .root_cause_entity
            .as_ref()
            .and_then(|v| v.as_object())
            .is_some_and(|o| !o.is_empty());
        if has { "with_root_cause" } else { "without_root_cause" }.to_string()
    })
}

/// Auto-remediated split by the comment heuristic, not the stored flag
pub fn autoremediado_distribution(problems: &[Problem]) -> Vec<NamedValue> {
    count_distribution(problems, |p| {
        if p.mentions_github_actions() {
            "auto_remediated"
        } else {
            "manual"
        }
        .to_string()
    })
}

/// Auto-remediated vs manual per time bucket (same heuristic)
pub fn autoremediado_time_series(
    problems: &[Problem],
    granularity: Granularity,
) -> Vec<AutoremediationPoint> {
    let mut buckets: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for problem in problems {
        let entry = buckets
            .entry(bucket_key(problem.start_time, granularity))
            .or_insert((0, 0));
        if problem.mentions_github_actions() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, (auto_remediated, manual))| AutoremediationPoint {
            date,
            auto_remediated,
            manual,
        })
        .collect()
}

/// Mean stored duration per bucket over CLOSED problems only, rounded
pub fn avg_resolution_time_series(
    problems: &[Problem],
    granularity: Granularity,
) -> Vec<ResolutionTimePoint> {
    let mut buckets: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for problem in problems {
        if problem.status != ProblemStatus::Closed {
            continue;
        }
        let entry = buckets
            .entry(bucket_key(problem.start_time, granularity))
            .or_insert((0.0, 0));
        entry.0 += problem.duration;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(date, (sum, count))| ResolutionTimePoint {
            date,
            avg_resolution_time: (sum / count as f64).round() as i64,
        })
        .collect()
}
