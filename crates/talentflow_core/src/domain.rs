//! crates/talentflow_core/src/domain.rs
//!
//! Defines the core data structures of the assessment engine.
//! Every type serializes to the camelCase JSON shape stored in the document store.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate's answers keyed by question id.
pub type Responses = BTreeMap<String, AnswerValue>;

//=========================================================================================
// Assessment Document
//=========================================================================================

/// The root document: a shareable form of ordered sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    /// Reference to the job this assessment screens for. Not ownership.
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub sections: Vec<Section>,
    pub is_published: bool,
    /// Opaque public token. Immutable once generated.
    pub shareable_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Looks a question up across every section.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions().find(|q| q.id == question_id)
    }

    /// All questions in display order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    pub fn summary(&self) -> AssessmentSummary {
        AssessmentSummary {
            id: self.id.clone(),
            job_id: self.job_id.clone(),
            title: self.title.clone(),
            is_published: self.is_published,
            section_count: self.sections.len(),
            question_count: self.question_count(),
        }
    }
}

/// Counts shown on assessment list cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummary {
    pub id: String,
    pub job_id: String,
    pub title: String,
    pub is_published: bool,
    pub section_count: usize,
    pub question_count: usize,
}

/// An ordered grouping of questions; the unit of forward-navigation gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub order: u32,
}

impl Section {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

//=========================================================================================
// Questions
//=========================================================================================

/// The closed set of question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    ShortText,
    LongText,
    Numeric,
    FileUpload,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::SingleChoice,
        QuestionType::MultiChoice,
        QuestionType::ShortText,
        QuestionType::LongText,
        QuestionType::Numeric,
        QuestionType::FileUpload,
    ];

    /// Whether questions of this kind carry an option list.
    pub fn is_choice(self) -> bool {
        match self {
            QuestionType::SingleChoice | QuestionType::MultiChoice => true,
            QuestionType::ShortText
            | QuestionType::LongText
            | QuestionType::Numeric
            | QuestionType::FileUpload => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultiChoice => "multi-choice",
            QuestionType::ShortText => "short-text",
            QuestionType::LongText => "long-text",
            QuestionType::Numeric => "numeric",
            QuestionType::FileUpload => "file-upload",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prompt of a fixed type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    pub required: bool,
    /// Only meaningful for choice kinds; ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
    pub order: u32,
}

/// Bounds for numeric answers and length limits for text answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Shows a question only when another question's answer equals `show_when`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogic {
    pub depends_on: String,
    pub show_when: String,
}

//=========================================================================================
// Answers and Responses
//=========================================================================================

/// Metadata of an uploaded file. The upload itself is stubbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// An answer value tagged with the kind of question that produced it.
///
/// Numeric answers keep the raw text the candidate typed; it is parsed
/// only when bounds are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum AnswerValue {
    SingleChoice(String),
    MultiChoice(Vec<String>),
    ShortText(String),
    LongText(String),
    Numeric(String),
    FileUpload(Option<FileHandle>),
}

impl AnswerValue {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerValue::SingleChoice(_) => QuestionType::SingleChoice,
            AnswerValue::MultiChoice(_) => QuestionType::MultiChoice,
            AnswerValue::ShortText(_) => QuestionType::ShortText,
            AnswerValue::LongText(_) => QuestionType::LongText,
            AnswerValue::Numeric(_) => QuestionType::Numeric,
            AnswerValue::FileUpload(_) => QuestionType::FileUpload,
        }
    }

    /// Whether this answer selects or equals `expected`.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            AnswerValue::SingleChoice(v) | AnswerValue::ShortText(v) | AnswerValue::LongText(v) => {
                v == expected
            }
            AnswerValue::Numeric(v) => {
                v.trim() == expected.trim()
                    || matches!(
                        (v.trim().parse::<f64>(), expected.trim().parse::<f64>()),
                        (Ok(a), Ok(b)) if a == b
                    )
            }
            AnswerValue::MultiChoice(values) => values.iter().any(|v| v == expected),
            AnswerValue::FileUpload(handle) => handle.as_ref().is_some_and(|h| h.name == expected),
        }
    }
}

/// A candidate's submitted answers, persisted once upon completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: String,
    pub assessment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    pub responses: Responses,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Read-only summary of a graded response, attached to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentScore {
    pub assessment_id: String,
    pub score: f64,
    pub max_score: f64,
    pub completed_at: DateTime<Utc>,
}

//=========================================================================================
// Collaborator Documents
//=========================================================================================

/// A job posting. Managed by the CRUD pages; the core only references its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub status: JobStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Archived,
}

/// A job as submitted for creation. Missing fields get defaults when it is stored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// URL slug of a title: lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// A candidate record. The scoring reporter reads its score summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub job_id: String,
    pub stage: CandidateStage,
    #[serde(default)]
    pub assessment_scores: Vec<AssessmentScore>,
    pub created_at: DateTime<Utc>,
    /// Set by the first edit; seeded candidates have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields of a candidate to overwrite; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<CandidateStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_scores: Option<Vec<AssessmentScore>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStage {
    Applied,
    Screening,
    Interview,
    Assessment,
    Offer,
    Hired,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_serializes_with_wire_names() {
        let question = Question {
            id: "q1".to_string(),
            kind: QuestionType::ShortText,
            question: "Why?".to_string(),
            required: true,
            options: None,
            validation: Some(ValidationRules {
                min_length: Some(5),
                ..Default::default()
            }),
            conditional_logic: None,
            order: 0,
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "q1",
                "type": "short-text",
                "question": "Why?",
                "required": true,
                "validation": { "minLength": 5 },
                "order": 0
            })
        );
    }

    #[test]
    fn answer_value_is_tagged_by_question_type() {
        let value = serde_json::to_value(AnswerValue::MultiChoice(vec!["A".into()])).unwrap();
        assert_eq!(value, json!({ "type": "multi-choice", "value": ["A"] }));

        let back: AnswerValue = serde_json::from_value(json!({ "type": "file-upload", "value": null })).unwrap();
        assert_eq!(back, AnswerValue::FileUpload(None));
    }

    #[test]
    fn numeric_answers_match_by_value() {
        assert!(AnswerValue::Numeric("3.0".into()).matches("3"));
        assert!(!AnswerValue::Numeric("4".into()).matches("3"));
        assert!(AnswerValue::MultiChoice(vec!["A".into(), "B".into()]).matches("B"));
        assert!(!AnswerValue::FileUpload(None).matches("cv.pdf"));
    }

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(slugify("Senior Frontend Developer"), "senior-frontend-developer");
        assert_eq!(slugify("  UX/UI  Designer! "), "ux-ui-designer");
        assert_eq!(slugify("???"), "");
    }
}
