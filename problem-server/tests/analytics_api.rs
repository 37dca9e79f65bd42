//! End-to-end tests for the analytics endpoints: every view runs over the
//! same filter semantics as the list API.

mod common;

use common::*;
use http::StatusCode;
use problem_server::db::models::*;
use serde_json::json;

fn seed_set() -> Vec<Problem> {
    // Closed ERROR with a GitHub Actions success comment
    let mut remediated = with_comment(
        problem("p-1", ProblemStatus::Closed, "ERROR", 45.0),
        "GitHub Actions pipeline success",
    );
    remediated.start_time = BASE_MS + DAY_MS;
    remediated.affected_entities = vec![
        AffectedEntity {
            name: "checkout".to_string(),
            entity_id: EntityId {
                id: "svc-1".to_string(),
                entity_type: "SERVICE".to_string(),
            },
        },
        AffectedEntity {
            name: "payments-db".to_string(),
            entity_id: EntityId {
                id: "db-1".to_string(),
                entity_type: "DATABASE".to_string(),
            },
        },
    ];
    remediated.management_zones = vec![ManagementZone {
        name: "prod".to_string(),
    }];

    // Closed PERFORMANCE, long running, with a root cause
    let mut slow = problem("p-2", ProblemStatus::Closed, "PERFORMANCE", 200.0);
    slow.start_time = BASE_MS + 2 * DAY_MS;
    slow.root_cause_entity = Some(json!({"name": "db-primary"}));
    slow.affected_entities = vec![AffectedEntity {
        name: "checkout".to_string(),
        entity_id: EntityId {
            id: "svc-1".to_string(),
            entity_type: "SERVICE".to_string(),
        },
    }];
    slow.management_zones = vec![ManagementZone {
        name: "prod".to_string(),
    }];
    slow.evidence_details.details = vec![EvidenceDetail {
        evidence_type: "METRIC".to_string(),
        event_type: None,
    }];

    // Still open AVAILABILITY blip
    let mut open = problem("p-3", ProblemStatus::Open, "AVAILABILITY", 4.0);
    open.start_time = BASE_MS;
    open.root_cause_entity = Some(json!({"name": "db-primary"}));

    vec![remediated, slow, open]
}

#[tokio::test]
async fn kpis_over_mixed_set() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (status, body) = get_json(&router, "/api/analytics/kpis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "E0000");

    let data = &body["data"];
    assert_eq!(data["totalProblems"], 3);
    assert_eq!(data["openProblems"], 1);
    assert_eq!(data["closedProblems"], 2);
    // (45 + 200) / 2 rounds to 123; open problems never count
    assert_eq!(data["avgResolutionTime"], 123);
    assert_eq!(data["problemsWithComments"], 1);
    assert_eq!(data["githubActionProblems"], 1);
    // AVAILABILITY and ERROR are critical, PERFORMANCE is not
    assert_eq!(data["criticalProblems"], 2);
}

#[tokio::test]
async fn kpis_respect_the_shared_filters() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/kpis?status=OPEN").await;
    let data = &body["data"];
    assert_eq!(data["totalProblems"], 1);
    assert_eq!(data["closedProblems"], 0);
    assert_eq!(data["avgResolutionTime"], 0);

    let (status, body) = get_json(&router, "/api/analytics/kpis?durationMin=oops").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn time_series_buckets_by_week() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/time-series?granularity=week").await;
    let points = body["data"].as_array().unwrap();
    // all three start times fall in the week of Sunday 2025-06-15
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["date"], "2025-06-15");
    assert_eq!(points[0]["total"], 3);
    assert_eq!(points[0]["severities"]["ERROR"], 1);
    assert_eq!(points[0]["severities"]["AVAILABILITY"], 1);

    let (_, body) = get_json(&router, "/api/analytics/time-series").await;
    let points = body["data"].as_array().unwrap();
    // default granularity is one bucket per day
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["date"], "2025-06-15");
    assert_eq!(points[2]["date"], "2025-06-17");

    let (status, body) =
        get_json(&router, "/api/analytics/time-series?granularity=hour").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn duration_distribution_buckets_are_exhaustive() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/duration-distribution").await;
    let buckets = body["data"].as_array().unwrap();
    assert_eq!(buckets.len(), 5);
    assert_eq!(buckets[0]["range"], "less_than_5");
    assert_eq!(buckets[0]["count"], 1); // 4 min
    assert_eq!(buckets[3]["range"], "30_to_180");
    assert_eq!(buckets[3]["count"], 1); // 45 min
    assert_eq!(buckets[4]["range"], "more_than_180");
    assert_eq!(buckets[4]["count"], 1); // 200 min
}

#[tokio::test]
async fn top_entities_rank_and_honor_limit() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/top-entities").await;
    let entities = body["data"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["entityId"], "svc-1");
    assert_eq!(entities[0]["name"], "checkout");
    assert_eq!(entities[0]["count"], 2);
    assert_eq!(entities[1]["entityId"], "db-1");

    let (_, body) = get_json(&router, "/api/analytics/top-entities?limit=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = get_json(&router, "/api/analytics/top-entities?limit=many").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn management_zones_average_severity_weight() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/management-zones").await;
    let zones = body["data"].as_array().unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0]["name"], "prod");
    assert_eq!(zones[0]["problemCount"], 2);
    // ERROR=4, PERFORMANCE=3
    assert_eq!(zones[0]["avgSeverityWeight"], 3.5);
}

#[tokio::test]
async fn remediation_funnel_stages() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/remediation-funnel").await;
    let stages = body["data"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages[0]["stage"], "total");
    assert_eq!(stages[0]["count"], 3);
    assert_eq!(stages[0]["percentage"], 100.0);
    assert_eq!(stages[1]["stage"], "with_comments");
    assert_eq!(stages[1]["count"], 1);
    assert_eq!(stages[2]["stage"], "with_github_actions");
    assert_eq!(stages[2]["count"], 1);
    assert_eq!(stages[3]["stage"], "with_success_mention");
    assert_eq!(stages[3]["count"], 1);
    // closed is independent of the comment stages
    assert_eq!(stages[4]["stage"], "closed");
    assert_eq!(stages[4]["count"], 2);
    assert_eq!(stages[4]["percentage"], 66.67);
}

#[tokio::test]
async fn evidence_types_group_untyped_events_as_unknown() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/evidence-types").await;
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["name"], "METRIC");
    assert_eq!(groups[0]["children"][0]["name"], "UNKNOWN");
    assert_eq!(groups[0]["children"][0]["value"], 1);
}

#[tokio::test]
async fn root_cause_views_use_the_strict_check() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/root-cause-analysis").await;
    let causes = body["data"].as_array().unwrap();
    assert_eq!(causes.len(), 1);
    assert_eq!(causes[0]["name"], "db-primary");
    assert_eq!(causes[0]["value"], 2);

    let (_, body) = get_json(&router, "/api/analytics/root-cause-distribution").await;
    let split = body["data"].as_array().unwrap();
    let find = |name: &str| {
        split
            .iter()
            .find(|v| v["name"] == name)
            .map(|v| v["value"].as_u64().unwrap())
            .unwrap_or(0)
    };
    assert_eq!(find("with_root_cause"), 2);
    assert_eq!(find("without_root_cause"), 1);
}

#[tokio::test]
async fn distribution_views_count_by_dimension() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/severity-distribution").await;
    let split = body["data"].as_array().unwrap();
    assert_eq!(split.len(), 3);

    let (_, body) = get_json(&router, "/api/analytics/impact-distribution").await;
    let split = body["data"].as_array().unwrap();
    assert_eq!(split.len(), 1);
    assert_eq!(split[0]["name"], "SERVICE");
    assert_eq!(split[0]["value"], 3);

    let (_, body) = get_json(&router, "/api/analytics/impact-severity-matrix").await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["impactLevel"], "SERVICE");
    assert_eq!(rows[0]["total"], 3);
}

#[tokio::test]
async fn autoremediado_views_use_the_comment_heuristic() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(&router, "/api/analytics/autoremediado-distribution").await;
    let split = body["data"].as_array().unwrap();
    let find = |name: &str| {
        split
            .iter()
            .find(|v| v["name"] == name)
            .map(|v| v["value"].as_u64().unwrap())
            .unwrap_or(0)
    };
    assert_eq!(find("auto_remediated"), 1);
    assert_eq!(find("manual"), 2);

    let (_, body) = get_json(
        &router,
        "/api/analytics/autoremediado-time-series?granularity=week",
    )
    .await;
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["date"], "2025-06-15");
    assert_eq!(points[0]["autoRemediated"], 1);
    assert_eq!(points[0]["manual"], 2);
}

#[tokio::test]
async fn avg_resolution_time_series_covers_closed_only() {
    let (router, state, _guard) = setup().await;
    seed(&state, &seed_set()).await;

    let (_, body) = get_json(
        &router,
        "/api/analytics/avg-resolution-time-series?granularity=week",
    )
    .await;
    let points = body["data"].as_array().unwrap();
    // the open problem contributes nothing
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["date"], "2025-06-15");
    assert_eq!(points[0]["avgResolutionTime"], 123);
}

#[tokio::test]
async fn empty_store_yields_zeroed_views() {
    let (router, _state, _guard) = setup().await;

    let (status, body) = get_json(&router, "/api/analytics/kpis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalProblems"], 0);
    assert_eq!(body["data"]["avgResolutionTime"], 0);

    let (_, body) = get_json(&router, "/api/analytics/remediation-funnel").await;
    for stage in body["data"].as_array().unwrap() {
        assert_eq!(stage["count"], 0);
        assert_eq!(stage["percentage"], 0.0);
    }

    let (_, body) = get_json(&router, "/api/analytics/time-series").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = get_json(&router, "/api/analytics/duration-distribution").await;
    for bucket in body["data"].as_array().unwrap() {
        assert_eq!(bucket["count"], 0);
    }
}
