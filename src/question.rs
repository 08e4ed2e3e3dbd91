//! Questions and their options.

use crate::error::{FieldErrors, SurveyError, SurveyResult};
use crate::orm::questions::QuestionType;
use crate::orm::{question_options, questions, surveys};
use crate::user::Principal;
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, TransactionTrait};
use serde::Deserialize;

/// A question together with its options, ordered by id.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionWithOptions {
    pub question: questions::Model,
    pub options: Vec<question_options::Model>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewOption {
    pub option_text: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

impl NewQuestion {
    /// Text questions have no options; choice questions need at least one.
    pub fn validate_shape(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.question_text.trim().is_empty() {
            errors.add("question_text", "The question text field is required.");
        }

        match (self.question_type.takes_options(), self.options.is_empty()) {
            (false, false) => errors.add("options", "Text questions cannot have options."),
            (true, true) => errors.add("options", "Choice questions must include options."),
            _ => {}
        }

        for (index, option) in self.options.iter().enumerate() {
            if option.option_text.trim().is_empty() {
                errors.add(
                    format!("options.{}.option_text", index),
                    "The option text field is required.",
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Adds a question and its options to a survey in one transaction.
pub async fn create_question(
    db: &DatabaseConnection,
    survey: &surveys::Model,
    principal: &Principal,
    input: NewQuestion,
    now: NaiveDateTime,
) -> SurveyResult<QuestionWithOptions> {
    principal.ensure_survey_manager(survey)?;
    input.validate_shape().map_err(SurveyError::Validation)?;

    let txn = db.begin().await?;

    let question = questions::ActiveModel {
        survey_id: Set(survey.id),
        question_text: Set(input.question_text.trim().to_string()),
        question_type: Set(input.question_type),
        required: Set(input.required),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut options = Vec::with_capacity(input.options.len());
    for option in input.options {
        let option = question_options::ActiveModel {
            question_id: Set(question.id),
            option_text: Set(option.option_text.trim().to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        options.push(option);
    }

    txn.commit().await?;

    Ok(QuestionWithOptions { question, options })
}

/// Loads a survey's full question set.
pub async fn load_questions(
    db: &DatabaseConnection,
    survey_id: i32,
) -> SurveyResult<Vec<QuestionWithOptions>> {
    let rows = questions::Entity::find()
        .filter(questions::Column::SurveyId.eq(survey_id))
        .order_by_asc(questions::Column::Id)
        .find_with_related(question_options::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(question, mut options)| {
            options.sort_by_key(|o| o.id);
            QuestionWithOptions { question, options }
        })
        .collect())
}
