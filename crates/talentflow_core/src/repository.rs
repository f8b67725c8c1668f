//! crates/talentflow_core/src/repository.rs
//!
//! Typed access to every collection on top of any [`DocumentStore`]. Persistence
//! failures are returned to the caller unchanged; nothing is retried here, and a
//! value built in memory before a failed save is still owned by the caller.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::builder::{self, BuilderError};
use crate::domain::{
    slugify, Assessment, AssessmentResponse, Candidate, CandidatePatch, Job, JobPatch, JobStatus, NewJob,
};
use crate::ports::{Collection, DocumentStore, PortError, PortResult};
use crate::structure::validate_structure;

/// Errors from operations that both check and persist a document.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Port(#[from] PortError),
}

fn decode<T: DeserializeOwned>(value: Value) -> PortResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn encode<T: Serialize>(document: &T) -> PortResult<Value> {
    Ok(serde_json::to_value(document)?)
}

#[derive(Clone)]
pub struct AssessmentRepository {
    store: Arc<dyn DocumentStore>,
}

impl AssessmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // --- Assessments ---

    /// Creates and stores a new draft with a fresh share link.
    pub async fn create_assessment(&self, job_id: &str, title: &str, description: &str) -> PortResult<Assessment> {
        let assessment = builder::new_assessment(job_id, title, description);
        self.store
            .add(Collection::Assessments, &assessment.id, encode(&assessment)?)
            .await?;
        debug!(assessment_id = %assessment.id, "Created assessment draft");
        Ok(assessment)
    }

    pub async fn get_assessment(&self, id: &str) -> PortResult<Option<Assessment>> {
        self.store
            .get(Collection::Assessments, id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn list_assessments(&self) -> PortResult<Vec<Assessment>> {
        self.store
            .list(Collection::Assessments)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Full scan by share link; there is no index beyond the id.
    pub async fn find_by_share_link(&self, link: &str) -> PortResult<Option<Assessment>> {
        Ok(self
            .list_assessments()
            .await?
            .into_iter()
            .find(|a| a.shareable_link == link))
    }

    /// Persists an edited document after a structural check.
    ///
    /// Published documents are frozen, and the share link of the stored version
    /// always wins over the one in `assessment`.
    pub async fn save_assessment(&self, assessment: &Assessment) -> Result<Assessment, SaveError> {
        let errors = validate_structure(assessment);
        if !errors.is_empty() {
            warn!(assessment_id = %assessment.id, count = errors.len(), "Rejected structurally invalid assessment");
            return Err(BuilderError::Structure(errors).into());
        }

        let stored = self
            .get_assessment(&assessment.id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Assessment {} not found", assessment.id)))?;
        if stored.is_published {
            return Err(BuilderError::Published(stored.id).into());
        }

        let mut next = assessment.clone();
        next.shareable_link = stored.shareable_link;
        next.created_at = stored.created_at;
        next.is_published = false;
        next.updated_at = Utc::now();
        self.store
            .update(Collection::Assessments, &next.id, encode(&next)?)
            .await?;
        Ok(next)
    }

    /// Loads, publishes and stores an assessment. `Ok(None)` when it does not exist.
    pub async fn publish_assessment(&self, id: &str) -> Result<Option<Assessment>, SaveError> {
        let Some(stored) = self.get_assessment(id).await? else {
            return Ok(None);
        };
        if stored.is_published {
            return Ok(Some(stored));
        }
        let mut published = builder::publish(&stored)?;
        published.updated_at = Utc::now();
        self.store
            .update(
                Collection::Assessments,
                id,
                serde_json::json!({
                    "isPublished": true,
                    "updatedAt": published.updated_at,
                }),
            )
            .await?;
        debug!(assessment_id = %id, "Published assessment");
        Ok(Some(published))
    }

    pub async fn delete_assessment(&self, id: &str) -> PortResult<bool> {
        self.store.delete(Collection::Assessments, id).await
    }

    // --- Responses ---

    pub async fn add_response(&self, response: &AssessmentResponse) -> PortResult<AssessmentResponse> {
        let stored = self
            .store
            .add(Collection::AssessmentResponses, &response.id, encode(response)?)
            .await?;
        decode(stored)
    }

    pub async fn get_response(&self, id: &str) -> PortResult<Option<AssessmentResponse>> {
        self.store
            .get(Collection::AssessmentResponses, id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn list_responses_for(&self, assessment_id: &str) -> PortResult<Vec<AssessmentResponse>> {
        let all: Vec<AssessmentResponse> = self
            .store
            .list(Collection::AssessmentResponses)
            .await?
            .into_iter()
            .map(decode)
            .collect::<PortResult<_>>()?;
        Ok(all.into_iter().filter(|r| r.assessment_id == assessment_id).collect())
    }

    // --- Jobs ---

    /// Every job, sorted by `order`.
    pub async fn list_jobs(&self) -> PortResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .store
            .list(Collection::Jobs)
            .await?
            .into_iter()
            .map(decode)
            .collect::<PortResult<_>>()?;
        jobs.sort_by_key(|job| job.order);
        Ok(jobs)
    }

    /// Stores a new job with a fresh id.
    ///
    /// A missing slug is derived from the title and a missing order places the
    /// job after every existing one.
    pub async fn create_job(&self, new_job: NewJob) -> PortResult<Job> {
        let order = match new_job.order {
            Some(order) => order,
            None => self
                .list_jobs()
                .await?
                .last()
                .map_or(1, |job| job.order.saturating_add(1)),
        };
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            slug: new_job.slug.unwrap_or_else(|| slugify(&new_job.title)),
            title: new_job.title,
            description: new_job.description,
            status: new_job.status.unwrap_or(JobStatus::Active),
            tags: new_job.tags,
            order,
            created_at: now,
            updated_at: now,
        };
        self.store.add(Collection::Jobs, &job.id, encode(&job)?).await?;
        debug!(job_id = %job.id, "Created job");
        Ok(job)
    }

    /// Overwrites the given fields and stamps `updatedAt`. `Ok(None)` when the job does not exist.
    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> PortResult<Option<Job>> {
        self.patch(Collection::Jobs, id, encode(patch)?).await
    }

    pub async fn delete_job(&self, id: &str) -> PortResult<bool> {
        self.store.delete(Collection::Jobs, id).await
    }

    // --- Candidates ---

    pub async fn list_candidates(&self) -> PortResult<Vec<Candidate>> {
        self.store
            .list(Collection::Candidates)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn get_candidate(&self, id: &str) -> PortResult<Option<Candidate>> {
        self.store
            .get(Collection::Candidates, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Overwrites the given fields and stamps `updatedAt`. `Ok(None)` when the candidate does not exist.
    pub async fn update_candidate(&self, id: &str, patch: &CandidatePatch) -> PortResult<Option<Candidate>> {
        self.patch(Collection::Candidates, id, encode(patch)?).await
    }

    /// Shallow-merges `partial` plus a fresh `updatedAt` into an existing document.
    async fn patch<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
        mut partial: Value,
    ) -> PortResult<Option<T>> {
        if self.store.get(collection, id).await?.is_none() {
            return Ok(None);
        }
        if let Value::Object(fields) = &mut partial {
            fields.insert("updatedAt".to_string(), encode(&Utc::now())?);
        }
        let updated = self.store.update(collection, id, partial).await?;
        debug!(%collection, id, "Updated document");
        decode(updated).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{add_question, add_section};
    use crate::test_support::MemoryStore;

    fn repository() -> AssessmentRepository {
        AssessmentRepository::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn persisted_assessment_loads_identically() {
        let repo = repository();
        let draft = repo.create_assessment("job-1", "Frontend", "React skills").await.unwrap();
        let doc = add_section(&draft).unwrap();
        let section_id = doc.sections[0].id.clone();
        let doc = add_question(&doc, &section_id).unwrap();

        let saved = repo.save_assessment(&doc).await.unwrap();
        let loaded = repo.get_assessment(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.sections, doc.sections);
    }

    #[tokio::test]
    async fn save_rejects_structural_errors_and_keeps_share_link() {
        let repo = repository();
        let draft = repo.create_assessment("job-1", "Frontend", "").await.unwrap();

        let mut tampered = draft.clone();
        tampered.shareable_link = "forged".into();
        let saved = repo.save_assessment(&tampered).await.unwrap();
        assert_eq!(saved.shareable_link, draft.shareable_link);

        let mut broken = add_section(&draft).unwrap();
        broken.sections[0].order = 4;
        let err = repo.save_assessment(&broken).await.unwrap_err();
        assert!(matches!(err, SaveError::Builder(BuilderError::Structure(_))));
    }

    #[tokio::test]
    async fn publish_then_lookup_by_link() {
        let repo = repository();
        let draft = repo.create_assessment("job-1", "Frontend", "").await.unwrap();
        assert!(repo.find_by_share_link(&draft.shareable_link).await.unwrap().is_some());
        assert!(repo.find_by_share_link("nope").await.unwrap().is_none());

        let published = repo.publish_assessment(&draft.id).await.unwrap().unwrap();
        assert!(published.is_published);
        let again = repo.publish_assessment(&draft.id).await.unwrap().unwrap();
        assert!(again.is_published);
        assert!(repo.publish_assessment("missing").await.unwrap().is_none());

        let err = repo.save_assessment(&published).await.unwrap_err();
        assert!(matches!(err, SaveError::Builder(BuilderError::Published(_))));
    }

    #[tokio::test]
    async fn failed_writes_surface_as_port_errors() {
        let store = Arc::new(MemoryStore::default());
        let repo = AssessmentRepository::new(store.clone());
        store.fail_writes(true);
        let err = repo.create_assessment("job-1", "Frontend", "").await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn responses_are_listed_per_assessment() {
        let repo = repository();
        let response = |id: &str, assessment_id: &str| AssessmentResponse {
            id: id.into(),
            assessment_id: assessment_id.into(),
            candidate_id: None,
            responses: Default::default(),
            completed_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        for (id, assessment_id) in [("r1", "a1"), ("r2", "a2"), ("r3", "a1")] {
            repo.add_response(&response(id, assessment_id)).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list_responses_for("a1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r1", "r3"]);
        assert!(repo.list_responses_for("a3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn jobs_are_listed_by_order_and_appended_last() {
        let repo = repository();
        let second = repo
            .create_job(NewJob {
                title: "Backend Engineer".into(),
                order: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let first = repo
            .create_job(NewJob {
                title: "Data Analyst".into(),
                slug: Some("analyst".into()),
                order: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        let appended = repo
            .create_job(NewJob {
                title: "Site Reliability / Ops".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(second.slug, "backend-engineer");
        assert_eq!(second.status, JobStatus::Active);
        assert_eq!(first.slug, "analyst");
        assert_eq!(appended.order, 3);
        assert_eq!(appended.slug, "site-reliability-ops");
        assert_eq!(appended.created_at, appended.updated_at);

        let ids: Vec<String> = repo.list_jobs().await.unwrap().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![first.id.clone(), second.id, appended.id]);

        assert!(repo.delete_job(&first.id).await.unwrap());
        assert!(!repo.delete_job(&first.id).await.unwrap());
        assert_eq!(repo.list_jobs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn job_update_merges_fields_and_stamps_updated_at() {
        let repo = repository();
        let job = repo
            .create_job(NewJob {
                title: "Designer".into(),
                tags: vec!["Figma".into()],
                ..Default::default()
            })
            .await
            .unwrap();

        let patch = JobPatch {
            status: Some(JobStatus::Archived),
            ..Default::default()
        };
        let updated = repo.update_job(&job.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.status, JobStatus::Archived);
        assert_eq!(updated.title, "Designer");
        assert_eq!(updated.tags, vec!["Figma".to_string()]);
        assert_eq!(updated.created_at, job.created_at);
        assert!(updated.updated_at >= job.updated_at);
        assert_eq!(repo.list_jobs().await.unwrap(), vec![updated]);

        assert!(repo.update_job("missing", &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn candidate_update_keeps_untouched_fields() {
        let store = Arc::new(MemoryStore::default());
        store
            .add(
                Collection::Candidates,
                "c1",
                serde_json::json!({
                    "id": "c1",
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "jobId": "job-1",
                    "stage": "applied",
                    "assessmentScores": [],
                    "createdAt": "2024-02-01T09:00:00Z",
                }),
            )
            .await
            .unwrap();
        let repo = AssessmentRepository::new(store);
        let before = repo.get_candidate("c1").await.unwrap().unwrap();
        assert!(before.updated_at.is_none());

        let patch = CandidatePatch {
            stage: Some(crate::domain::CandidateStage::Interview),
            ..Default::default()
        };
        let after = repo.update_candidate("c1", &patch).await.unwrap().unwrap();
        assert_eq!(after.stage, crate::domain::CandidateStage::Interview);
        assert_eq!(after.name, before.name);
        assert!(after.updated_at.is_some());
        assert_eq!(repo.list_candidates().await.unwrap(), vec![after]);
        assert!(repo.update_candidate("c2", &patch).await.unwrap().is_none());
    }
}
