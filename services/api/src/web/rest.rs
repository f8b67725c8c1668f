//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::seed::{ensure_seeded, SeedReport};
use crate::web::protocol::{
    AssessmentEnvelope, AssessmentListQuery, AssessmentListResponse, CandidateAssessmentSummary,
    CandidateEnvelope, CandidateListResponse, CreateAssessmentRequest, HealthResponse, JobEnvelope,
    JobListResponse, ResponseEnvelope, ScoreSummary, SeedResponse, StatsResponse,
    SubmitResponseRequest, TakeAssessmentResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use talentflow_core::scoring::{average_percent, score_percent};
use talentflow_core::validation::validate_responses;
use talentflow_core::{
    Assessment, AssessmentRuntime, CandidatePatch, Collection, JobPatch, NewJob, RuntimeError,
    RuntimePhase,
};
use tracing::{info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_assessments_handler,
        get_assessment_handler,
        create_assessment_handler,
        save_assessment_handler,
        delete_assessment_handler,
        publish_assessment_handler,
        take_assessment_handler,
        submit_response_handler,
        get_response_handler,
        list_jobs_handler,
        create_job_handler,
        update_job_handler,
        delete_job_handler,
        list_candidates_handler,
        update_candidate_handler,
        candidate_summary_handler,
        seed_handler,
        stats_handler,
    ),
    components(
        schemas(
            CreateAssessmentRequest,
            SubmitResponseRequest,
            AssessmentListResponse,
            AssessmentEnvelope,
            TakeAssessmentResponse,
            ResponseEnvelope,
            JobListResponse,
            JobEnvelope,
            CandidateListResponse,
            CandidateEnvelope,
            ScoreSummary,
            CandidateAssessmentSummary,
            SeedReport,
            SeedResponse,
            StatsResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "TalentFlow Assessments API", description = "Assessment authoring, delivery and submission.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

//=========================================================================================
// Assessment Authoring
//=========================================================================================

/// List assessments, optionally only those of one job.
#[utoipa::path(
    get,
    path = "/api/assessments",
    params(AssessmentListQuery),
    responses(
        (status = 200, description = "All assessments", body = AssessmentListResponse),
        (status = 500, description = "Server error")
    )
)]
pub async fn list_assessments_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<AssessmentListQuery>,
) -> Result<Json<AssessmentListResponse>, ApiError> {
    let assessments: Vec<Assessment> = app_state
        .repository
        .list_assessments()
        .await?
        .into_iter()
        .filter(|a| query.job_id.as_deref().map_or(true, |job_id| a.job_id == job_id))
        .collect();
    let summaries = assessments.iter().map(Assessment::summary).collect();
    Ok(Json(AssessmentListResponse {
        assessments,
        summaries,
    }))
}

#[utoipa::path(
    get,
    path = "/api/assessments/{id}",
    params(("id" = String, Path, description = "Assessment id")),
    responses(
        (status = 200, description = "The assessment", body = AssessmentEnvelope),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn get_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentEnvelope>, ApiError> {
    let assessment = app_state
        .repository
        .get_assessment(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Assessment {} not found", id)))?;
    Ok(Json(AssessmentEnvelope { assessment }))
}

/// Create an empty draft with a fresh share link.
#[utoipa::path(
    post,
    path = "/api/assessments",
    request_body = CreateAssessmentRequest,
    responses(
        (status = 201, description = "Draft created", body = AssessmentEnvelope),
        (status = 500, description = "Server error")
    )
)]
pub async fn create_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let assessment = app_state
        .repository
        .create_assessment(&payload.job_id, &payload.title, &payload.description)
        .await?;
    info!(assessment_id = %assessment.id, job_id = %assessment.job_id, "Assessment created");
    Ok((StatusCode::CREATED, Json(AssessmentEnvelope { assessment })))
}

/// Save a full assessment document.
///
/// The document is checked structurally first. Published assessments are frozen.
#[utoipa::path(
    put,
    path = "/api/assessments/{id}",
    params(("id" = String, Path, description = "Assessment id")),
    request_body(content_type = "application/json", description = "The complete assessment document"),
    responses(
        (status = 200, description = "Saved", body = AssessmentEnvelope),
        (status = 404, description = "Assessment not found"),
        (status = 409, description = "Assessment is published"),
        (status = 422, description = "Structural violations")
    )
)]
pub async fn save_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut assessment): Json<Assessment>,
) -> Result<Json<AssessmentEnvelope>, ApiError> {
    assessment.id = id;
    let assessment = app_state.repository.save_assessment(&assessment).await?;
    Ok(Json(AssessmentEnvelope { assessment }))
}

#[utoipa::path(
    delete,
    path = "/api/assessments/{id}",
    params(("id" = String, Path, description = "Assessment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn delete_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !app_state.repository.delete_assessment(&id).await? {
        return Err(ApiError::NotFound(format!("Assessment {} not found", id)));
    }
    info!(assessment_id = %id, "Assessment deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Publish an assessment. Publishing is one-way and idempotent.
#[utoipa::path(
    post,
    path = "/api/assessments/{id}/publish",
    params(("id" = String, Path, description = "Assessment id")),
    responses(
        (status = 200, description = "Published", body = AssessmentEnvelope),
        (status = 404, description = "Assessment not found"),
        (status = 422, description = "Structural violations")
    )
)]
pub async fn publish_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentEnvelope>, ApiError> {
    let assessment = app_state
        .repository
        .publish_assessment(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Assessment {} not found", id)))?;
    info!(assessment_id = %id, "Assessment published");
    Ok(Json(AssessmentEnvelope { assessment }))
}

//=========================================================================================
// Assessment Delivery
//=========================================================================================

/// Public lookup of an assessment by its share link.
#[utoipa::path(
    get,
    path = "/api/take/{link}",
    params(("link" = String, Path, description = "Share link token")),
    responses(
        (status = 200, description = "The assessment to take", body = TakeAssessmentResponse),
        (status = 403, description = "Assessment is not published"),
        (status = 404, description = "No assessment behind this link")
    )
)]
pub async fn take_assessment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(link): Path<String>,
) -> Result<Json<TakeAssessmentResponse>, ApiError> {
    let mut runtime = AssessmentRuntime::new();
    match runtime.load(&app_state.repository, &link).await? {
        RuntimePhase::NotFound => Err(ApiError::NotFound(format!("No assessment for link {}", link))),
        RuntimePhase::NotPublished => Err(ApiError::NotPublished(link)),
        _ => match (runtime.assessment().cloned(), runtime.progress()) {
            (Some(assessment), Some(progress)) => {
                Ok(Json(TakeAssessmentResponse { assessment, progress }))
            }
            _ => Err(ApiError::Internal("Assessment runtime did not start".to_string())),
        },
    }
}

/// Turns a failed validation gate into the per-question error list.
fn gate_error(runtime: &AssessmentRuntime, err: RuntimeError) -> ApiError {
    match err {
        RuntimeError::SectionInvalid(_) | RuntimeError::ResponsesInvalid(_) => {
            ApiError::InvalidAnswers(runtime.errors().clone())
        }
        other => other.into(),
    }
}

/// Submit a candidate's answers to a published assessment.
///
/// Every visible question is validated; hidden questions and unknown ids are
/// dropped from the stored response.
#[utoipa::path(
    post,
    path = "/api/assessment-responses",
    request_body = SubmitResponseRequest,
    responses(
        (status = 201, description = "Response stored", body = ResponseEnvelope),
        (status = 403, description = "Assessment is not published"),
        (status = 404, description = "Assessment not found"),
        (status = 422, description = "Per-question validation errors")
    )
)]
pub async fn submit_response_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SubmitResponseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repository = &app_state.repository;
    let assessment = repository
        .get_assessment(&payload.assessment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Assessment {} not found", payload.assessment_id)))?;
    if !assessment.is_published {
        return Err(ApiError::NotPublished(assessment.id));
    }

    let errors = validate_responses(&assessment, &payload.responses);
    if !errors.is_empty() {
        warn!(assessment_id = %assessment.id, count = errors.len(), "Rejected invalid submission");
        return Err(ApiError::InvalidAnswers(errors));
    }

    let mut runtime = AssessmentRuntime::from_lookup(Some(assessment));
    if let Some(candidate_id) = payload.candidate_id {
        runtime = runtime.with_candidate(candidate_id);
    }
    for (question_id, value) in payload.responses {
        runtime.update_response(&question_id, value)?;
    }
    while !runtime.is_last_section() {
        runtime.next_section().map_err(|e| gate_error(&runtime, e))?;
    }

    let submitted = runtime.submit(repository).await.cloned();
    let response = match submitted {
        Ok(response) => response,
        Err(e) => return Err(gate_error(&runtime, e)),
    };
    Ok((StatusCode::CREATED, Json(ResponseEnvelope { response })))
}

#[utoipa::path(
    get,
    path = "/api/assessment-responses/{id}",
    params(("id" = String, Path, description = "Response id")),
    responses(
        (status = 200, description = "The stored response", body = ResponseEnvelope),
        (status = 404, description = "Response not found")
    )
)]
pub async fn get_response_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let response = app_state
        .repository
        .get_response(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Response {} not found", id)))?;
    Ok(Json(ResponseEnvelope { response }))
}

//=========================================================================================
// Jobs
//=========================================================================================

/// All jobs, sorted by their `order` field.
#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "All jobs", body = JobListResponse),
        (status = 500, description = "Server error")
    )
)]
pub async fn list_jobs_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<JobListResponse>, ApiError> {
    let jobs = app_state.repository.list_jobs().await?;
    Ok(Json(JobListResponse { jobs }))
}

/// Create a job. A missing slug is derived from the title; a missing order appends it.
#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body(content_type = "application/json", description = "Job fields; only `title` is required"),
    responses(
        (status = 201, description = "Job created", body = JobEnvelope),
        (status = 400, description = "Empty title"),
        (status = 500, description = "Server error")
    )
)]
pub async fn create_job_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NewJob>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let job = app_state.repository.create_job(payload).await?;
    info!(job_id = %job.id, "Job created");
    Ok((StatusCode::CREATED, Json(JobEnvelope { job })))
}

/// Overwrite some fields of a job.
#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    request_body(content_type = "application/json", description = "Fields to overwrite"),
    responses(
        (status = 200, description = "Updated", body = JobEnvelope),
        (status = 404, description = "Job not found")
    )
)]
pub async fn update_job_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<JobEnvelope>, ApiError> {
    let job = app_state
        .repository
        .update_job(&id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", id)))?;
    Ok(Json(JobEnvelope { job }))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn delete_job_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !app_state.repository.delete_job(&id).await? {
        return Err(ApiError::NotFound(format!("Job {} not found", id)));
    }
    info!(job_id = %id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Candidates, Seeding and Stats
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/candidates",
    responses(
        (status = 200, description = "All candidates", body = CandidateListResponse),
        (status = 500, description = "Server error")
    )
)]
pub async fn list_candidates_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CandidateListResponse>, ApiError> {
    let candidates = app_state.repository.list_candidates().await?;
    Ok(Json(CandidateListResponse { candidates }))
}

/// Overwrite some fields of a candidate, such as moving them to another stage.
#[utoipa::path(
    put,
    path = "/api/candidates/{id}",
    params(("id" = String, Path, description = "Candidate id")),
    request_body(content_type = "application/json", description = "Fields to overwrite"),
    responses(
        (status = 200, description = "Updated", body = CandidateEnvelope),
        (status = 404, description = "Candidate not found")
    )
)]
pub async fn update_candidate_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<CandidatePatch>,
) -> Result<Json<CandidateEnvelope>, ApiError> {
    let candidate = app_state
        .repository
        .update_candidate(&id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Candidate {} not found", id)))?;
    Ok(Json(CandidateEnvelope { candidate }))
}

/// Per-assessment percentages and their average for one candidate.
#[utoipa::path(
    get,
    path = "/api/candidates/{id}/assessment-summary",
    params(("id" = String, Path, description = "Candidate id")),
    responses(
        (status = 200, description = "Score summary", body = CandidateAssessmentSummary),
        (status = 404, description = "Candidate not found")
    )
)]
pub async fn candidate_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CandidateAssessmentSummary>, ApiError> {
    let candidate = app_state
        .repository
        .get_candidate(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Candidate {} not found", id)))?;
    let scores = candidate
        .assessment_scores
        .iter()
        .map(|score| ScoreSummary {
            assessment_id: score.assessment_id.clone(),
            score: score.score,
            max_score: score.max_score,
            percent: score_percent(score),
        })
        .collect();
    Ok(Json(CandidateAssessmentSummary {
        average_percent: average_percent(&candidate.assessment_scores),
        candidate_id: candidate.id,
        scores,
    }))
}

#[utoipa::path(
    post,
    path = "/api/seed",
    responses(
        (status = 200, description = "Seeding ran", body = SeedResponse),
        (status = 500, description = "Failed to seed database")
    )
)]
pub async fn seed_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<SeedResponse>, ApiError> {
    let inserted = ensure_seeded(app_state.store.as_ref()).await?;
    Ok(Json(SeedResponse {
        message: "Database seeded successfully".to_string(),
        inserted,
    }))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Document counts", body = StatsResponse),
        (status = 500, description = "Server error")
    )
)]
pub async fn stats_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let store = &app_state.store;
    Ok(Json(StatsResponse {
        jobs: store.count(Collection::Jobs).await?,
        candidates: store.count(Collection::Candidates).await?,
        assessments: store.count(Collection::Assessments).await?,
        responses: store.count(Collection::AssessmentResponses).await?,
    }))
}
