//! crates/talentflow_core/src/builder.rs
//!
//! Authoring operations over an assessment document.
//!
//! Every operation takes the current version by reference and returns a new
//! version; the input is never modified. Sibling `order` fields are re-derived
//! from list position after every add, delete and reorder, so they are always
//! contiguous. Once an assessment is published its structure is frozen and every
//! operation fails with [`BuilderError::Published`].

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Assessment, ConditionalLogic, Question, QuestionType, Section, ValidationRules,
};
use crate::structure::{validate_structure, StructuralError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderError {
    #[error("Assessment {0} is published; its structure can no longer change")]
    Published(String),

    #[error("The given ids are not a permutation of the current ones")]
    InvalidPermutation,

    #[error("Question {0} is not a choice question")]
    NotChoiceQuestion(String),

    #[error("Option index {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("Assessment has {} structural error(s)", .0.len())]
    Structure(Vec<StructuralError>),
}

pub type BuilderResult = Result<Assessment, BuilderError>;

/// Fields of a section to overwrite; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

/// Fields of a question to overwrite; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub kind: Option<QuestionType>,
    pub question: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Option<Vec<String>>>,
    pub validation: Option<Option<ValidationRules>>,
    pub conditional_logic: Option<Option<ConditionalLogic>>,
}

/// A fresh, globally unique share token.
pub fn generate_share_link() -> String {
    Uuid::new_v4().to_string()
}

/// A new, empty draft. The share link is generated here and never again.
pub fn new_assessment(job_id: &str, title: &str, description: &str) -> Assessment {
    let now = Utc::now();
    Assessment {
        id: Uuid::new_v4().to_string(),
        job_id: job_id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        sections: Vec::new(),
        is_published: false,
        shareable_link: generate_share_link(),
        created_at: now,
        updated_at: now,
    }
}

/// Copy-on-write helper shared by every mutation.
fn edit<F>(assessment: &Assessment, apply: F) -> BuilderResult
where
    F: FnOnce(&mut Assessment) -> Result<(), BuilderError>,
{
    if assessment.is_published {
        return Err(BuilderError::Published(assessment.id.clone()));
    }
    let mut next = assessment.clone();
    apply(&mut next)?;
    Ok(next)
}

fn edit_question<F>(assessment: &Assessment, section_id: &str, question_id: &str, apply: F) -> BuilderResult
where
    F: FnOnce(&mut Question) -> Result<(), BuilderError>,
{
    edit(assessment, |doc| {
        let question = doc
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .and_then(|s| s.questions.iter_mut().find(|q| q.id == question_id));
        match question {
            Some(question) => apply(question),
            None => Ok(()),
        }
    })
}

fn renumber_sections(sections: &mut [Section]) {
    for (index, section) in sections.iter_mut().enumerate() {
        section.order = index as u32;
    }
}

fn renumber_questions(questions: &mut [Question]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.order = index as u32;
    }
}

/// Rearranges `items` to follow `ids`, which must be a permutation of their ids.
fn permute<T>(items: &mut Vec<T>, ids: &[String], id_of: impl Fn(&T) -> &str) -> Result<(), BuilderError> {
    if ids.len() != items.len() {
        return Err(BuilderError::InvalidPermutation);
    }
    let mut by_id: HashMap<String, T> = HashMap::with_capacity(items.len());
    for item in items.drain(..) {
        by_id.insert(id_of(&item).to_string(), item);
    }
    let mut reordered = Vec::with_capacity(ids.len());
    for id in ids {
        match by_id.remove(id) {
            Some(item) => reordered.push(item),
            None => return Err(BuilderError::InvalidPermutation),
        }
    }
    *items = reordered;
    Ok(())
}

fn moved_ids(ids: Vec<String>, from: usize, to: usize) -> Result<Vec<String>, BuilderError> {
    if from >= ids.len() || to >= ids.len() {
        return Err(BuilderError::InvalidPermutation);
    }
    let mut ids = ids;
    let id = ids.remove(from);
    ids.insert(to, id);
    Ok(ids)
}

//=========================================================================================
// Sections
//=========================================================================================

pub fn add_section(assessment: &Assessment) -> BuilderResult {
    edit(assessment, |doc| {
        doc.sections.push(Section {
            id: Uuid::new_v4().to_string(),
            title: "New Section".to_string(),
            description: Some(String::new()),
            questions: Vec::new(),
            order: doc.sections.len() as u32,
        });
        Ok(())
    })
}

/// Merges `patch` into the section with `section_id`; no-op if there is none.
pub fn update_section(assessment: &Assessment, section_id: &str, patch: SectionPatch) -> BuilderResult {
    edit(assessment, |doc| {
        if let Some(section) = doc.sections.iter_mut().find(|s| s.id == section_id) {
            if let Some(title) = patch.title {
                section.title = title;
            }
            if let Some(description) = patch.description {
                section.description = description;
            }
        }
        Ok(())
    })
}

pub fn delete_section(assessment: &Assessment, section_id: &str) -> BuilderResult {
    edit(assessment, |doc| {
        doc.sections.retain(|s| s.id != section_id);
        renumber_sections(&mut doc.sections);
        Ok(())
    })
}

/// Reorders sections to follow `ordered_ids`, a permutation of the current ids.
pub fn reorder_sections(assessment: &Assessment, ordered_ids: &[String]) -> BuilderResult {
    edit(assessment, |doc| {
        permute(&mut doc.sections, ordered_ids, |s| s.id.as_str())?;
        renumber_sections(&mut doc.sections);
        Ok(())
    })
}

/// Drag-and-drop style move of the section at `from` to position `to`.
pub fn move_section(assessment: &Assessment, from: usize, to: usize) -> BuilderResult {
    let ids = assessment.sections.iter().map(|s| s.id.clone()).collect();
    reorder_sections(assessment, &moved_ids(ids, from, to)?)
}

//=========================================================================================
// Questions
//=========================================================================================

/// Appends a default single-choice question; no-op if the section is absent.
pub fn add_question(assessment: &Assessment, section_id: &str) -> BuilderResult {
    edit(assessment, |doc| {
        if let Some(section) = doc.sections.iter_mut().find(|s| s.id == section_id) {
            section.questions.push(Question {
                id: Uuid::new_v4().to_string(),
                kind: QuestionType::SingleChoice,
                question: "New Question".to_string(),
                required: false,
                options: Some(vec!["Option 1".to_string(), "Option 2".to_string()]),
                validation: None,
                conditional_logic: None,
                order: section.questions.len() as u32,
            });
        }
        Ok(())
    })
}

pub fn update_question(
    assessment: &Assessment,
    section_id: &str,
    question_id: &str,
    patch: QuestionPatch,
) -> BuilderResult {
    edit_question(assessment, section_id, question_id, |question| {
        if let Some(kind) = patch.kind {
            question.kind = kind;
        }
        if let Some(text) = patch.question {
            question.question = text;
        }
        if let Some(required) = patch.required {
            question.required = required;
        }
        if let Some(options) = patch.options {
            question.options = options;
        }
        if let Some(validation) = patch.validation {
            question.validation = validation;
        }
        if let Some(logic) = patch.conditional_logic {
            question.conditional_logic = logic;
        }
        Ok(())
    })
}

pub fn delete_question(assessment: &Assessment, section_id: &str, question_id: &str) -> BuilderResult {
    edit(assessment, |doc| {
        if let Some(section) = doc.sections.iter_mut().find(|s| s.id == section_id) {
            section.questions.retain(|q| q.id != question_id);
            renumber_questions(&mut section.questions);
        }
        Ok(())
    })
}

pub fn reorder_questions(assessment: &Assessment, section_id: &str, ordered_ids: &[String]) -> BuilderResult {
    edit(assessment, |doc| {
        if let Some(section) = doc.sections.iter_mut().find(|s| s.id == section_id) {
            permute(&mut section.questions, ordered_ids, |q| q.id.as_str())?;
            renumber_questions(&mut section.questions);
        }
        Ok(())
    })
}

pub fn move_question(assessment: &Assessment, section_id: &str, from: usize, to: usize) -> BuilderResult {
    let Some(section) = assessment.section(section_id) else {
        return edit(assessment, |_| Ok(()));
    };
    let ids = section.questions.iter().map(|q| q.id.clone()).collect();
    reorder_questions(assessment, section_id, &moved_ids(ids, from, to)?)
}

//=========================================================================================
// Options (choice questions only)
//=========================================================================================

fn choice_options(question: &mut Question) -> Result<&mut Vec<String>, BuilderError> {
    if !question.kind.is_choice() {
        return Err(BuilderError::NotChoiceQuestion(question.id.clone()));
    }
    Ok(question.options.get_or_insert_with(Vec::new))
}

/// Appends `Option N`, where N is the new option count.
pub fn add_option(assessment: &Assessment, section_id: &str, question_id: &str) -> BuilderResult {
    edit_question(assessment, section_id, question_id, |question| {
        let options = choice_options(question)?;
        options.push(format!("Option {}", options.len() + 1));
        Ok(())
    })
}

pub fn update_option(
    assessment: &Assessment,
    section_id: &str,
    question_id: &str,
    index: usize,
    value: &str,
) -> BuilderResult {
    edit_question(assessment, section_id, question_id, |question| {
        let options = choice_options(question)?;
        let len = options.len();
        let slot = options
            .get_mut(index)
            .ok_or(BuilderError::OptionOutOfRange { index, len })?;
        *slot = value.to_string();
        Ok(())
    })
}

/// Removes one option. Removing the last one leaves an empty list.
pub fn remove_option(assessment: &Assessment, section_id: &str, question_id: &str, index: usize) -> BuilderResult {
    edit_question(assessment, section_id, question_id, |question| {
        let options = choice_options(question)?;
        if index >= options.len() {
            return Err(BuilderError::OptionOutOfRange {
                index,
                len: options.len(),
            });
        }
        options.remove(index);
        Ok(())
    })
}

//=========================================================================================
// Publishing
//=========================================================================================

/// Marks a structurally valid assessment as published.
///
/// Publishing is one-way. Publishing an already published assessment returns it unchanged.
pub fn publish(assessment: &Assessment) -> BuilderResult {
    if assessment.is_published {
        return Ok(assessment.clone());
    }
    let errors = validate_structure(assessment);
    if !errors.is_empty() {
        return Err(BuilderError::Structure(errors));
    }
    let mut next = assessment.clone();
    next.is_published = true;
    Ok(next)
}
