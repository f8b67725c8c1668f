//! crates/talentflow_core/src/validation.rs
//!
//! Response-time validation. Every function here is pure: the same question and
//! answer always produce the same result.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{AnswerValue, Assessment, Question, QuestionType, Responses, Section, ValidationRules};

/// Per-question error messages keyed by question id.
pub type AnswerErrors = BTreeMap<String, AnswerError>;

/// Why an answer was rejected. The display text is what the candidate sees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerError {
    #[error("This field is required")]
    Required,

    #[error("Value must be at least {0}")]
    BelowMinimum(f64),

    #[error("Value must be at most {0}")]
    AboveMaximum(f64),

    #[error("Must be at least {0} characters")]
    TooShort(usize),

    #[error("Must be at most {0} characters")]
    TooLong(usize),

    #[error("Expected a {expected} answer but got {actual}")]
    TypeMismatch {
        expected: QuestionType,
        actual: QuestionType,
    },
}

/// The "answered" predicate behind every progress counter.
///
/// Independent of `required`: absent, empty text, an empty selection and a
/// missing file are all unanswered.
pub fn is_answered(value: Option<&AnswerValue>) -> bool {
    match value {
        None => false,
        Some(
            AnswerValue::SingleChoice(text)
            | AnswerValue::ShortText(text)
            | AnswerValue::LongText(text)
            | AnswerValue::Numeric(text),
        ) => !text.is_empty(),
        Some(AnswerValue::MultiChoice(selected)) => !selected.is_empty(),
        Some(AnswerValue::FileUpload(handle)) => handle.is_some(),
    }
}

/// Ids of the questions shown given the answers so far.
///
/// A conditional question is shown only when the question it depends on is
/// itself shown and answered with `show_when`, so hiding a question hides its
/// whole chain of dependents. Dependencies resolve in document order; one that
/// points at a later question never shows.
pub fn visible_question_ids<'a>(assessment: &'a Assessment, responses: &Responses) -> HashSet<&'a str> {
    let mut visible = HashSet::new();
    for question in assessment.questions() {
        let shown = match &question.conditional_logic {
            None => true,
            Some(logic) => {
                visible.contains(logic.depends_on.as_str())
                    && responses
                        .get(&logic.depends_on)
                        .is_some_and(|answer| answer.matches(&logic.show_when))
            }
        };
        if shown {
            visible.insert(question.id.as_str());
        }
    }
    visible
}

/// Pulls the payload out of the variant matching the question's type.
macro_rules! answer_payload {
    ($question:expr, $value:expr, $($variant:ident)|+) => {
        match $value {
            $(AnswerValue::$variant(payload))|+ => payload,
            other => {
                return Err(AnswerError::TypeMismatch {
                    expected: $question.kind,
                    actual: other.question_type(),
                })
            }
        }
    };
}

/// Checks one answer against its question's type and rules.
pub fn validate_answer(question: &Question, value: Option<&AnswerValue>) -> Result<(), AnswerError> {
    let Some(value) = value.filter(|v| is_answered(Some(*v))) else {
        return if question.required {
            Err(AnswerError::Required)
        } else {
            Ok(())
        };
    };

    let rules = question.validation.as_ref();
    match question.kind {
        QuestionType::Numeric => {
            let raw = answer_payload!(question, value, Numeric);
            rules.map_or(Ok(()), |rules| check_bounds(rules, raw))
        }
        QuestionType::ShortText => {
            let text = answer_payload!(question, value, ShortText);
            rules.map_or(Ok(()), |rules| check_length(rules, text))
        }
        QuestionType::LongText => {
            let text = answer_payload!(question, value, LongText);
            rules.map_or(Ok(()), |rules| check_length(rules, text))
        }
        // Option membership is not checked: an answer outside the options is accepted.
        QuestionType::SingleChoice => {
            let _choice = answer_payload!(question, value, SingleChoice);
            Ok(())
        }
        QuestionType::MultiChoice => {
            let _selected = answer_payload!(question, value, MultiChoice);
            Ok(())
        }
        QuestionType::FileUpload => {
            let _handle = answer_payload!(question, value, FileUpload);
            Ok(())
        }
    }
}

fn check_bounds(rules: &ValidationRules, raw: &str) -> Result<(), AnswerError> {
    let number = raw.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    if let Some(min) = rules.min {
        if number.map_or(true, |n| n < min) {
            return Err(AnswerError::BelowMinimum(min));
        }
    }
    if let Some(max) = rules.max {
        if number.map_or(true, |n| n > max) {
            return Err(AnswerError::AboveMaximum(max));
        }
    }
    Ok(())
}

fn check_length(rules: &ValidationRules, text: &str) -> Result<(), AnswerError> {
    let length = text.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            return Err(AnswerError::TooShort(min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Err(AnswerError::TooLong(max));
        }
    }
    Ok(())
}

fn validate_visible<'q>(
    questions: impl Iterator<Item = &'q Question>,
    visible: &HashSet<&str>,
    responses: &Responses,
) -> AnswerErrors {
    questions
        .filter(|question| visible.contains(question.id.as_str()))
        .filter_map(|question| {
            validate_answer(question, responses.get(&question.id))
                .err()
                .map(|error| (question.id.clone(), error))
        })
        .collect()
}

/// Validates every visible question of one section of `assessment`.
///
/// The section may be left forward only when the returned map is empty.
pub fn validate_section(assessment: &Assessment, section: &Section, responses: &Responses) -> AnswerErrors {
    let visible = visible_question_ids(assessment, responses);
    validate_visible(section.questions.iter(), &visible, responses)
}

/// Validates every visible question of every section.
pub fn validate_responses(assessment: &Assessment, responses: &Responses) -> AnswerErrors {
    let visible = visible_question_ids(assessment, responses);
    validate_visible(assessment.questions(), &visible, responses)
}

/// Result of the builder preview's submit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessReport {
    /// Missing required questions, labelled `section title → question text`.
    pub missing_required: Vec<String>,
    pub answered_count: usize,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Required-field completeness over the whole assessment, ignoring other rules.
pub fn check_completeness(assessment: &Assessment, responses: &Responses) -> CompletenessReport {
    let visible = visible_question_ids(assessment, responses);
    let mut missing_required = Vec::new();
    let mut answered_count = 0;

    for section in &assessment.sections {
        for question in section.questions.iter().filter(|q| visible.contains(q.id.as_str())) {
            if is_answered(responses.get(&question.id)) {
                answered_count += 1;
            } else if question.required {
                missing_required.push(format!("{} → {}", section.title, question.question));
            }
        }
    }

    CompletenessReport {
        missing_required,
        answered_count,
    }
}
