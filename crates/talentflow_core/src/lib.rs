pub mod builder;
pub mod domain;
pub mod ports;
pub mod repository;
pub mod runtime;
pub mod scoring;
pub mod structure;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, QuestionPatch, SectionPatch};
pub use domain::{
    AnswerValue, Assessment, AssessmentResponse, AssessmentScore, AssessmentSummary, Candidate,
    CandidatePatch, CandidateStage, ConditionalLogic, FileHandle, Job, JobPatch, JobStatus, NewJob,
    Question, QuestionType, Responses, Section, ValidationRules,
};
pub use ports::{Collection, DocumentStore, PortError, PortResult};
pub use repository::{AssessmentRepository, SaveError};
pub use runtime::{AssessmentRuntime, RuntimeError, RuntimePhase};
pub use scoring::Progress;
pub use structure::StructuralError;
pub use validation::{AnswerError, AnswerErrors};
