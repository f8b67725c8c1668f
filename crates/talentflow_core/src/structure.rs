//! crates/talentflow_core/src/structure.rs
//!
//! Structural checks over an assessment document, run by the builder before a
//! document is persisted or published. Documents already in storage are not
//! re-checked on load.

use std::collections::{HashMap, HashSet};

use crate::domain::Assessment;

/// One violation of the document's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("Duplicate section id '{0}'")]
    DuplicateSectionId(String),

    #[error("Duplicate question id '{0}'")]
    DuplicateQuestionId(String),

    #[error("Section '{section_id}' has order {found} but sits at position {expected}")]
    SectionOrder {
        section_id: String,
        expected: usize,
        found: u32,
    },

    #[error("Question '{question_id}' has order {found} but sits at position {expected}")]
    QuestionOrder {
        question_id: String,
        expected: usize,
        found: u32,
    },

    #[error("Choice question '{0}' has no options")]
    ChoiceWithoutOptions(String),

    #[error("Question '{0}' has a lower bound greater than its upper bound")]
    InvertedBounds(String),

    #[error("Question '{question_id}' depends on unknown question '{depends_on}'")]
    UnknownDependency {
        question_id: String,
        depends_on: String,
    },

    #[error("Question '{question_id}' depends on '{depends_on}', which does not come before it")]
    ForwardDependency {
        question_id: String,
        depends_on: String,
    },
}

/// Returns every structural violation in the document; empty when it is valid.
pub fn validate_structure(assessment: &Assessment) -> Vec<StructuralError> {
    let mut errors = Vec::new();
    let mut section_ids = HashSet::new();
    let mut question_ids = HashSet::new();

    for (index, section) in assessment.sections.iter().enumerate() {
        if !section_ids.insert(section.id.as_str()) {
            errors.push(StructuralError::DuplicateSectionId(section.id.clone()));
        }
        if section.order as usize != index {
            errors.push(StructuralError::SectionOrder {
                section_id: section.id.clone(),
                expected: index,
                found: section.order,
            });
        }

        for (position, question) in section.questions.iter().enumerate() {
            // Ids must be unique across the whole document: responses are keyed by them.
            if !question_ids.insert(question.id.as_str()) {
                errors.push(StructuralError::DuplicateQuestionId(question.id.clone()));
            }
            if question.order as usize != position {
                errors.push(StructuralError::QuestionOrder {
                    question_id: question.id.clone(),
                    expected: position,
                    found: question.order,
                });
            }
            if question.kind.is_choice()
                && question.options.as_ref().map_or(true, |options| options.is_empty())
            {
                errors.push(StructuralError::ChoiceWithoutOptions(question.id.clone()));
            }
            if let Some(rules) = &question.validation {
                let numeric_inverted = matches!((rules.min, rules.max), (Some(min), Some(max)) if min > max);
                let length_inverted =
                    matches!((rules.min_length, rules.max_length), (Some(min), Some(max)) if min > max);
                if numeric_inverted || length_inverted {
                    errors.push(StructuralError::InvertedBounds(question.id.clone()));
                }
            }
        }
    }

    // A question may only depend on one that precedes it in document order,
    // which also rules out self-references and cycles.
    let mut position_of = HashMap::new();
    for (position, question) in assessment.questions().enumerate() {
        position_of.entry(question.id.as_str()).or_insert(position);
    }
    for (position, question) in assessment.questions().enumerate() {
        let Some(logic) = &question.conditional_logic else {
            continue;
        };
        match position_of.get(logic.depends_on.as_str()) {
            None => errors.push(StructuralError::UnknownDependency {
                question_id: question.id.clone(),
                depends_on: logic.depends_on.clone(),
            }),
            Some(&target) if target >= position => errors.push(StructuralError::ForwardDependency {
                question_id: question.id.clone(),
                depends_on: logic.depends_on.clone(),
            }),
            Some(_) => {}
        }
    }

    errors
}
