//! crates/talentflow_core/src/scoring.rs
//!
//! Progress and score figures for display. Nothing here grades answers:
//! scores are assigned outside the system and only summarized.

use serde::Serialize;

use crate::domain::{Assessment, AssessmentScore, Responses};
use crate::validation::{is_answered, visible_question_ids};

/// How far a respondent is through an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub answered_count: usize,
    pub total_questions: usize,
    pub percent: f64,
}

/// Counts answered questions among the visible ones.
///
/// `percent` is 0 when there are no questions.
pub fn progress(assessment: &Assessment, responses: &Responses) -> Progress {
    let shown = visible_question_ids(assessment, responses);
    let visible = assessment.questions().filter(|q| shown.contains(q.id.as_str()));
    let (total_questions, answered_count) = visible.fold((0, 0), |(total, answered), question| {
        let answered = answered + usize::from(is_answered(responses.get(&question.id)));
        (total + 1, answered)
    });
    let percent = if total_questions == 0 {
        0.0
    } else {
        100.0 * answered_count as f64 / total_questions as f64
    };
    Progress {
        answered_count,
        total_questions,
        percent,
    }
}

fn ratio(score: &AssessmentScore) -> Option<f64> {
    (score.max_score > 0.0).then(|| score.score / score.max_score)
}

/// Rounds a ratio to a whole percentage. Negative ratios floor at 0; there is
/// no upper clamp, so a score above its maximum reports more than 100.
fn to_percent(ratio: f64) -> u32 {
    (100.0 * ratio).round().max(0.0) as u32
}

/// One record as a rounded percentage; `None` when it has no maximum.
pub fn score_percent(score: &AssessmentScore) -> Option<u32> {
    ratio(score).map(to_percent)
}

/// Rounded mean percentage over a candidate's score records.
///
/// Records without a positive maximum are ignored; `None` when none remain.
pub fn average_percent(scores: &[AssessmentScore]) -> Option<u32> {
    let ratios: Vec<f64> = scores.iter().filter_map(ratio).collect();
    if ratios.is_empty() {
        return None;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    Some(to_percent(mean))
}
