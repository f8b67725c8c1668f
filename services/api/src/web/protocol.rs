//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged over the REST API. Response bodies wrap
//! their documents in a named envelope (`{"assessment": ...}`) the way the mock
//! backend the frontend was written against does.

use serde::{Deserialize, Serialize};
use talentflow_core::{
    Assessment, AssessmentResponse, AssessmentSummary, Candidate, Job, Progress, Responses,
};
use utoipa::{IntoParams, ToSchema};

use crate::seed::SeedReport;

//=========================================================================================
// Request Payloads
//=========================================================================================

/// Body of `POST /api/assessments`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub job_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /api/assessment-responses`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub assessment_id: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
    /// Answers keyed by question id, each `{"type": ..., "value": ...}`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub responses: Responses,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssessmentListQuery {
    /// Only return assessments attached to this job.
    pub job_id: Option<String>,
}

//=========================================================================================
// Response Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct AssessmentListResponse {
    #[schema(value_type = Vec<Object>)]
    pub assessments: Vec<Assessment>,
    #[schema(value_type = Vec<Object>)]
    pub summaries: Vec<AssessmentSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct AssessmentEnvelope {
    #[schema(value_type = Object)]
    pub assessment: Assessment,
}

/// A published assessment as presented to a candidate.
#[derive(Serialize, ToSchema)]
pub struct TakeAssessmentResponse {
    #[schema(value_type = Object)]
    pub assessment: Assessment,
    #[schema(value_type = Object)]
    pub progress: Progress,
}

#[derive(Serialize, ToSchema)]
pub struct JobListResponse {
    #[schema(value_type = Vec<Object>)]
    pub jobs: Vec<Job>,
}

#[derive(Serialize, ToSchema)]
pub struct JobEnvelope {
    #[schema(value_type = Object)]
    pub job: Job,
}

#[derive(Serialize, ToSchema)]
pub struct CandidateListResponse {
    #[schema(value_type = Vec<Object>)]
    pub candidates: Vec<Candidate>,
}

#[derive(Serialize, ToSchema)]
pub struct CandidateEnvelope {
    #[schema(value_type = Object)]
    pub candidate: Candidate,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseEnvelope {
    #[schema(value_type = Object)]
    pub response: AssessmentResponse,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub assessment_id: String,
    pub score: f64,
    pub max_score: f64,
    pub percent: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAssessmentSummary {
    pub candidate_id: String,
    pub average_percent: Option<u32>,
    pub scores: Vec<ScoreSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct SeedResponse {
    pub message: String,
    pub inserted: SeedReport,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub jobs: usize,
    pub candidates: usize,
    pub assessments: usize,
    pub responses: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
