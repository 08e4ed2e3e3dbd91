//! Answer normalization and validation.
//!
//! Turns the freeform answer list of a submission into answer rows that match
//! the survey's question and option schema. Pure: no store access, no clock.

use crate::error::{SurveyError, SurveyResult};
use crate::orm::questions::QuestionType;
use crate::question::QuestionWithOptions;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One submitted answer as received from the caller.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawAnswer {
    pub question_id: Option<i32>,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<i32>,
    pub selected_option_ids: Option<Vec<i32>>,
}

impl RawAnswer {
    fn has_text(&self) -> bool {
        self.answer_text.as_deref().map_or(false, |t| !t.is_empty())
    }

    fn has_option_list(&self) -> bool {
        self.selected_option_ids
            .as_ref()
            .map_or(false, |ids| !ids.is_empty())
    }
}

/// One answer row ready to be stored.
///
/// Text answers carry `answer_text`, choice answers carry
/// `selected_option_id`; never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedAnswer {
    pub question_id: i32,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedAnswers {
    pub rows: Vec<NormalizedAnswer>,
    /// Distinct answered question ids, in submission order.
    pub answered: Vec<i32>,
}

/// Validates every entry against its question and expands it into rows.
///
/// Fails on the first offending entry with a message keyed by its index.
pub fn normalize_answers(
    questions: &[QuestionWithOptions],
    answers: &[RawAnswer],
) -> SurveyResult<NormalizedAnswers> {
    let by_id: HashMap<i32, &QuestionWithOptions> =
        questions.iter().map(|q| (q.question.id, q)).collect();
    let mut out = NormalizedAnswers::default();
    let mut seen = HashSet::new();

    for (index, answer) in answers.iter().enumerate() {
        let question = answer
            .question_id
            .and_then(|id| by_id.get(&id).copied())
            .ok_or_else(|| {
                SurveyError::validation(
                    format!("answers.{}.question_id", index),
                    "Invalid question provided.",
                )
            })?;

        let rows = match question.question.question_type {
            QuestionType::Text => normalize_text(question, answer, index)?,
            QuestionType::SingleChoice => normalize_single_choice(question, answer, index)?,
            QuestionType::MultipleChoice => normalize_multiple_choice(question, answer, index)?,
        };

        if seen.insert(question.question.id) {
            out.answered.push(question.question.id);
        }
        out.rows.extend(rows);
    }

    Ok(out)
}

/// Every required question must appear among the answered ids.
///
/// Missing questions are reported as one aggregate error.
pub fn ensure_required_answered(
    questions: &[QuestionWithOptions],
    answered: &[i32],
) -> SurveyResult<()> {
    let answered: HashSet<i32> = answered.iter().copied().collect();
    let missing = questions
        .iter()
        .filter(|q| q.question.required)
        .any(|q| !answered.contains(&q.question.id));

    if missing {
        return Err(SurveyError::validation(
            "answers",
            "Some required questions are missing responses.",
        ));
    }

    Ok(())
}

fn normalize_text(
    question: &QuestionWithOptions,
    answer: &RawAnswer,
    index: usize,
) -> SurveyResult<Vec<NormalizedAnswer>> {
    let text = answer.answer_text.as_deref().unwrap_or("").trim();

    if text.is_empty() {
        return Err(SurveyError::validation(
            format!("answers.{}.answer_text", index),
            "This question requires a text response.",
        ));
    }

    if answer.selected_option_id.is_some() || answer.has_option_list() {
        return Err(SurveyError::validation(
            format!("answers.{}", index),
            "Text questions do not accept option selections.",
        ));
    }

    Ok(vec![NormalizedAnswer {
        question_id: question.question.id,
        answer_text: Some(text.to_string()),
        selected_option_id: None,
    }])
}

fn normalize_single_choice(
    question: &QuestionWithOptions,
    answer: &RawAnswer,
    index: usize,
) -> SurveyResult<Vec<NormalizedAnswer>> {
    let path = format!("answers.{}.selected_option_id", index);

    let option_id = answer.selected_option_id.ok_or_else(|| {
        SurveyError::validation(
            path.clone(),
            "A single choice question requires one option selection.",
        )
    })?;
    let option_id = find_option(question, option_id, &path)?;

    if answer.has_text() || answer.has_option_list() {
        return Err(SurveyError::validation(
            format!("answers.{}", index),
            "Single choice questions accept only one option selection.",
        ));
    }

    Ok(vec![NormalizedAnswer {
        question_id: question.question.id,
        answer_text: None,
        selected_option_id: Some(option_id),
    }])
}

fn normalize_multiple_choice(
    question: &QuestionWithOptions,
    answer: &RawAnswer,
    index: usize,
) -> SurveyResult<Vec<NormalizedAnswer>> {
    let path = format!("answers.{}.selected_option_ids", index);

    let option_ids: Vec<i32> = match (&answer.selected_option_ids, answer.selected_option_id) {
        (Some(ids), _) if !ids.is_empty() => ids.clone(),
        (_, Some(id)) => vec![id],
        _ => Vec::new(),
    };

    if option_ids.is_empty() {
        return Err(SurveyError::validation(
            path,
            "A multiple choice question requires at least one option.",
        ));
    }

    if answer.has_text() {
        return Err(SurveyError::validation(
            format!("answers.{}", index),
            "Multiple choice questions accept only option selections.",
        ));
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(option_ids.len());

    for option_id in option_ids {
        if !seen.insert(option_id) {
            continue;
        }

        rows.push(NormalizedAnswer {
            question_id: question.question.id,
            answer_text: None,
            selected_option_id: Some(find_option(question, option_id, &path)?),
        });
    }

    Ok(rows)
}

fn find_option(question: &QuestionWithOptions, option_id: i32, path: &str) -> SurveyResult<i32> {
    question
        .options
        .iter()
        .find(|o| o.id == option_id)
        .map(|o| o.id)
        .ok_or_else(|| {
            SurveyError::validation(path, "Selected option is invalid for this question.")
        })
}
