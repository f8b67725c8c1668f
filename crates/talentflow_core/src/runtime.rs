//! crates/talentflow_core/src/runtime.rs
//!
//! The candidate-facing wizard that walks a published assessment one section at a time.
//!
//! ```text
//! Loading ──load──▶ NotFound | NotPublished       (terminal)
//!    │
//!    └──load──▶ InProgress ──submit──▶ Completed   (terminal)
//!                  ▲    │
//!                  └────┘ update_response / next_section / prev_section
//! ```
//!
//! All methods take `&mut self`, so navigation and submission calls are
//! serialized by construction.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{AnswerValue, Assessment, AssessmentResponse, Question, Responses, Section};
use crate::ports::PortError;
use crate::repository::AssessmentRepository;
use crate::scoring::{self, Progress};
use crate::validation::{
    is_answered, validate_responses, validate_section, visible_question_ids, AnswerError, AnswerErrors,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePhase {
    Loading,
    NotFound,
    NotPublished,
    InProgress,
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("The assessment has already been loaded")]
    AlreadyLoaded,

    #[error("Operation not allowed in the {0:?} phase")]
    NotInProgress(RuntimePhase),

    #[error("The current section has {0} invalid answer(s)")]
    SectionInvalid(usize),

    #[error("The assessment has {0} invalid answer(s)")]
    ResponsesInvalid(usize),

    #[error("There is no next section")]
    NoNextSection,

    #[error("Submission is only possible from the last section")]
    NotOnLastSection,

    #[error("The assessment has already been submitted")]
    AlreadyCompleted,

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PortError),
}

/// State of one candidate taking one assessment.
#[derive(Debug, Clone)]
pub struct AssessmentRuntime {
    phase: RuntimePhase,
    assessment: Option<Assessment>,
    candidate_id: Option<String>,
    current_section_index: usize,
    responses: Responses,
    errors: AnswerErrors,
    submission: Option<AssessmentResponse>,
}

impl Default for AssessmentRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentRuntime {
    pub fn new() -> Self {
        Self {
            phase: RuntimePhase::Loading,
            assessment: None,
            candidate_id: None,
            current_section_index: 0,
            responses: Responses::new(),
            errors: AnswerErrors::new(),
            submission: None,
        }
    }

    /// Attributes the eventual response to a candidate.
    pub fn with_candidate(mut self, candidate_id: impl Into<String>) -> Self {
        self.candidate_id = Some(candidate_id.into());
        self
    }

    /// Starts a runtime from an already fetched lookup result.
    pub fn from_lookup(assessment: Option<Assessment>) -> Self {
        let mut runtime = Self::new();
        runtime.enter(assessment);
        runtime
    }

    /// Fetches the assessment behind `link` and leaves `Loading`.
    ///
    /// A storage failure keeps the runtime in `Loading` so the caller may retry.
    pub async fn load(&mut self, repository: &AssessmentRepository, link: &str) -> Result<RuntimePhase, RuntimeError> {
        if self.phase != RuntimePhase::Loading {
            return Err(RuntimeError::AlreadyLoaded);
        }
        let assessment = repository.find_by_share_link(link).await.map_err(|e| {
            warn!(error = %e, "Failed to load assessment by share link");
            e
        })?;
        self.enter(assessment);
        Ok(self.phase)
    }

    fn enter(&mut self, assessment: Option<Assessment>) {
        self.phase = match &assessment {
            None => RuntimePhase::NotFound,
            Some(a) if !a.is_published => RuntimePhase::NotPublished,
            Some(_) => RuntimePhase::InProgress,
        };
        if self.phase == RuntimePhase::InProgress {
            self.assessment = assessment;
            self.current_section_index = 0;
            self.responses.clear();
            self.errors.clear();
        }
        debug!(phase = ?self.phase, "Assessment runtime entered phase");
    }

    // --- Accessors ---

    pub fn phase(&self) -> RuntimePhase {
        self.phase
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    pub fn current_section_index(&self) -> usize {
        self.current_section_index
    }

    pub fn current_section(&self) -> Option<&Section> {
        self.assessment
            .as_ref()
            .and_then(|a| a.sections.get(self.current_section_index))
    }

    /// Questions of the current section that are shown given the answers so far.
    pub fn visible_questions(&self) -> Vec<&Question> {
        let (Some(assessment), Some(section)) = (self.assessment.as_ref(), self.current_section()) else {
            return Vec::new();
        };
        let visible = visible_question_ids(assessment, &self.responses);
        section
            .questions
            .iter()
            .filter(|q| visible.contains(q.id.as_str()))
            .collect()
    }

    pub fn is_last_section(&self) -> bool {
        self.assessment
            .as_ref()
            .is_some_and(|a| self.current_section_index + 1 >= a.sections.len())
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    pub fn errors(&self) -> &AnswerErrors {
        &self.errors
    }

    pub fn error_for(&self, question_id: &str) -> Option<&AnswerError> {
        self.errors.get(question_id)
    }

    /// The stored response once the runtime is `Completed`.
    pub fn submission(&self) -> Option<&AssessmentResponse> {
        self.submission.as_ref()
    }

    /// Answered and total visible questions. Only available in progress or after completion.
    pub fn progress(&self) -> Option<Progress> {
        match self.phase {
            RuntimePhase::InProgress | RuntimePhase::Completed => self
                .assessment
                .as_ref()
                .map(|a| scoring::progress(a, &self.responses)),
            RuntimePhase::Loading | RuntimePhase::NotFound | RuntimePhase::NotPublished => None,
        }
    }

    // --- Transitions ---

    fn require_in_progress(&self) -> Result<&Assessment, RuntimeError> {
        match (self.phase, &self.assessment) {
            (RuntimePhase::InProgress, Some(assessment)) => Ok(assessment),
            (RuntimePhase::Completed, _) => Err(RuntimeError::AlreadyCompleted),
            (phase, _) => Err(RuntimeError::NotInProgress(phase)),
        }
    }

    /// Records an answer and clears that question's error without re-validating.
    pub fn update_response(&mut self, question_id: &str, value: AnswerValue) -> Result<(), RuntimeError> {
        self.require_in_progress()?;
        self.responses.insert(question_id.to_string(), value);
        self.errors.remove(question_id);
        Ok(())
    }

    /// Validates the current section into `errors`; true when it passed.
    fn gate_current_section(&mut self) -> bool {
        self.errors = match (self.assessment.as_ref(), self.current_section()) {
            (Some(assessment), Some(section)) => validate_section(assessment, section, &self.responses),
            _ => AnswerErrors::new(),
        };
        self.errors.is_empty()
    }

    /// Moves forward when the current section validates. Returns the new index.
    pub fn next_section(&mut self) -> Result<usize, RuntimeError> {
        self.require_in_progress()?;
        if self.is_last_section() {
            return Err(RuntimeError::NoNextSection);
        }
        if !self.gate_current_section() {
            return Err(RuntimeError::SectionInvalid(self.errors.len()));
        }
        self.current_section_index += 1;
        Ok(self.current_section_index)
    }

    /// Moves back without validating; stays at the first section.
    pub fn prev_section(&mut self) -> Result<usize, RuntimeError> {
        self.require_in_progress()?;
        self.current_section_index = self.current_section_index.saturating_sub(1);
        Ok(self.current_section_index)
    }

    /// Validates the last section, then every section, stores the response and completes.
    ///
    /// Answers to earlier sections may have changed since they were left, so the
    /// whole assessment is checked again before anything is stored. On a
    /// validation or storage failure the runtime stays `InProgress` with every
    /// answer kept.
    pub async fn submit(&mut self, repository: &AssessmentRepository) -> Result<&AssessmentResponse, RuntimeError> {
        self.require_in_progress()?;
        if !self.is_last_section() {
            return Err(RuntimeError::NotOnLastSection);
        }
        if !self.gate_current_section() {
            return Err(RuntimeError::SectionInvalid(self.errors.len()));
        }
        let errors = validate_responses(self.require_in_progress()?, &self.responses);
        if !errors.is_empty() {
            warn!(invalid = errors.len(), "Submission blocked by answers outside the current section");
            self.errors = errors;
            return Err(RuntimeError::ResponsesInvalid(self.errors.len()));
        }
        let response = self.build_response()?;

        let stored = repository.add_response(&response).await.map_err(|e| {
            warn!(error = %e, assessment_id = %response.assessment_id, "Failed to store assessment response");
            e
        })?;
        info!(response_id = %stored.id, assessment_id = %stored.assessment_id, "Assessment submitted");
        self.phase = RuntimePhase::Completed;
        Ok(&*self.submission.insert(stored))
    }

    /// Snapshot of the answered, visible questions of the presented assessment.
    fn build_response(&self) -> Result<AssessmentResponse, RuntimeError> {
        let assessment = self.require_in_progress()?;
        let visible = visible_question_ids(assessment, &self.responses);
        let responses = assessment
            .questions()
            .filter(|q| visible.contains(q.id.as_str()))
            .filter_map(|q| {
                self.responses
                    .get(&q.id)
                    .filter(|value| is_answered(Some(*value)))
                    .map(|value| (q.id.clone(), value.clone()))
            })
            .collect();
        let now = Utc::now();
        Ok(AssessmentResponse {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment.id.clone(),
            candidate_id: self.candidate_id.clone(),
            responses,
            completed_at: Some(now),
            created_at: now,
        })
    }
}
