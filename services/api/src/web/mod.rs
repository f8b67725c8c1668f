//! services/api/src/web/mod.rs
//!
//! Assembles the REST handlers into the application router.

pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

use rest::{
    candidate_summary_handler, create_assessment_handler, create_job_handler,
    delete_assessment_handler, delete_job_handler, get_assessment_handler, get_response_handler,
    health_handler, list_assessments_handler, list_candidates_handler, list_jobs_handler,
    publish_assessment_handler, save_assessment_handler, seed_handler, stats_handler,
    submit_response_handler, take_assessment_handler, update_candidate_handler,
    update_job_handler,
};

/// Builds the API router. Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/assessments",
            get(list_assessments_handler).post(create_assessment_handler),
        )
        .route(
            "/api/assessments/{id}",
            get(get_assessment_handler)
                .put(save_assessment_handler)
                .delete(delete_assessment_handler),
        )
        .route("/api/assessments/{id}/publish", post(publish_assessment_handler))
        .route("/api/take/{link}", get(take_assessment_handler))
        .route("/api/assessment-responses", post(submit_response_handler))
        .route("/api/assessment-responses/{id}", get(get_response_handler))
        .route("/api/jobs", get(list_jobs_handler).post(create_job_handler))
        .route(
            "/api/jobs/{id}",
            put(update_job_handler).delete(delete_job_handler),
        )
        .route("/api/candidates", get(list_candidates_handler))
        .route("/api/candidates/{id}", put(update_candidate_handler))
        .route(
            "/api/candidates/{id}/assessment-summary",
            get(candidate_summary_handler),
        )
        .route("/api/seed", post(seed_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(app_state)
}
