//! Submission orchestration.
//!
//! Guard, validate, then persist: the response row, its answers and the
//! invitation completion commit together or not at all.

use crate::answers::{ensure_required_answered, normalize_answers, NormalizedAnswer, RawAnswer};
use crate::db::is_unique_violation;
use crate::error::{SurveyError, SurveyResult};
use crate::invitation::mark_completed;
use crate::orm::{survey_answers, survey_invitations, survey_responses, surveys};
use crate::question::load_questions;
use crate::survey::is_available_now;
use crate::user::Principal;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, DatabaseConnection, DatabaseTransaction, PaginatorTrait,
    TransactionTrait,
};

const ALREADY_SUBMITTED: &str = "You have already submitted this survey.";

/// A stored response with its answer rows.
#[derive(Clone, Debug)]
pub struct SubmittedResponse {
    pub response: survey_responses::Model,
    pub answers: Vec<survey_answers::Model>,
}

fn already_submitted() -> SurveyError {
    SurveyError::validation("survey", ALREADY_SUBMITTED)
}

/// Checks made before [`submit`]: creators cannot answer their own surveys
/// and the survey must be answerable at `now`.
pub fn ensure_survey_can_be_submitted<Tz: TimeZone>(
    survey: &surveys::Model,
    respondent: &Principal,
    now: &DateTime<Tz>,
) -> SurveyResult<()> {
    if survey.created_by == respondent.id {
        return Err(SurveyError::forbidden(
            "Creators cannot submit their own surveys.",
        ));
    }

    if !is_available_now(survey, now) {
        return Err(SurveyError::forbidden("Survey is closed"));
    }

    Ok(())
}

pub async fn has_submitted(
    db: &DatabaseConnection,
    survey_id: i32,
    respondent_id: i32,
) -> SurveyResult<bool> {
    let count = survey_responses::Entity::find()
        .filter(survey_responses::Column::SurveyId.eq(survey_id))
        .filter(survey_responses::Column::RespondentId.eq(respondent_id))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Stores one respondent's answers to a survey.
///
/// The unique (survey, respondent) index is what actually prevents double
/// submission; a collision there is reported exactly like the pre-check.
pub async fn submit<Tz: TimeZone>(
    db: &DatabaseConnection,
    survey: &surveys::Model,
    respondent: &Principal,
    raw_answers: &[RawAnswer],
    invitation: Option<&survey_invitations::Model>,
    now: &DateTime<Tz>,
) -> SurveyResult<SubmittedResponse> {
    let questions = load_questions(db, survey.id).await?;

    if has_submitted(db, survey.id, respondent.id).await? {
        return Err(already_submitted());
    }

    let normalized = normalize_answers(&questions, raw_answers)?;
    ensure_required_answered(&questions, &normalized.answered)?;

    let now = now.naive_utc();
    let txn = db.begin().await?;

    let response = match persist(&txn, survey, respondent, &normalized.rows, invitation, now).await
    {
        Ok(response) => response,
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    };
    txn.commit().await?;

    let answers = survey_answers::Entity::find()
        .filter(survey_answers::Column::ResponseId.eq(response.id))
        .order_by_asc(survey_answers::Column::Id)
        .all(db)
        .await?;

    log::info!(
        "User {} submitted survey {} ({} answer rows)",
        respondent.id,
        survey.id,
        answers.len()
    );

    Ok(SubmittedResponse { response, answers })
}

async fn persist(
    txn: &DatabaseTransaction,
    survey: &surveys::Model,
    respondent: &Principal,
    rows: &[NormalizedAnswer],
    invitation: Option<&survey_invitations::Model>,
    now: NaiveDateTime,
) -> SurveyResult<survey_responses::Model> {
    let response = survey_responses::ActiveModel {
        survey_id: Set(survey.id),
        respondent_id: Set(respondent.id),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            already_submitted()
        } else {
            SurveyError::from(e)
        }
    })?;

    if !rows.is_empty() {
        let rows = rows.iter().map(|row| survey_answers::ActiveModel {
            response_id: Set(response.id),
            question_id: Set(row.question_id),
            answer_text: Set(row.answer_text.clone()),
            selected_option_id: Set(row.selected_option_id),
            ..Default::default()
        });
        survey_answers::Entity::insert_many(rows).exec(txn).await?;
    }

    if let Some(invitation) = invitation {
        mark_completed(txn, invitation.id, now).await?;
    }

    Ok(response)
}
