//! Analytics API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/kpis", get(handler::kpis))
        .route("/time-series", get(handler::time_series))
        .route("/impact-severity-matrix", get(handler::impact_severity_matrix))
        .route("/top-entities", get(handler::top_entities))
        .route("/management-zones", get(handler::management_zones))
        .route("/remediation-funnel", get(handler::remediation_funnel))
        .route("/duration-distribution", get(handler::duration_distribution))
        .route("/evidence-types", get(handler::evidence_types))
        .route("/root-cause-analysis", get(handler::root_cause_analysis))
        .route("/severity-distribution", get(handler::severity_distribution))
        .route("/impact-distribution", get(handler::impact_distribution))
        .route("/root-cause-distribution", get(handler::root_cause_distribution))
        .route(
            "/autoremediado-distribution",
            get(handler::autoremediado_distribution),
        )
        .route(
            "/autoremediado-time-series",
            get(handler::autoremediado_time_series),
        )
        .route(
            "/avg-resolution-time-series",
            get(handler::avg_resolution_time_series),
        )
}
