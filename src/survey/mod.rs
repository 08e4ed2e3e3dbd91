//! Survey lifecycle: creation, edits, close/reopen and soft deletion.

pub mod availability;
pub mod share;
pub mod visibility;

pub use availability::is_available_now;

use crate::error::{FieldErrors, SurveyError, SurveyResult};
use crate::orm::surveys::{self, SurveyType};
use crate::user::Principal;
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};
use serde::Deserialize;
use validator::Validate;

/// Input for a new survey.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewSurvey {
    #[validate(length(min = 1, max = 255, message = "The title field is required."))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub is_active: Option<bool>,
    pub available_from_time: Option<String>,
    pub available_until_time: Option<String>,
}

/// Partial update. Absent fields are left untouched.
///
/// The time window is rewritten only when at least one bound is present;
/// sending both bounds as empty strings clears it.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SurveyChanges {
    #[validate(length(min = 1, max = 255, message = "The title may not be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub survey_type: Option<SurveyType>,
    pub is_active: Option<bool>,
    pub available_from_time: Option<String>,
    pub available_until_time: Option<String>,
}

/// Validates a daily window and returns it in stored form.
///
/// Bounds must come as a pair and `from` must be strictly earlier than
/// `until`; windows that wrap past midnight are rejected.
pub fn validate_time_window(
    from: Option<&str>,
    until: Option<&str>,
) -> Result<Option<(String, String)>, FieldErrors> {
    let from = from.map(str::trim).filter(|s| !s.is_empty());
    let until = until.map(str::trim).filter(|s| !s.is_empty());
    let mut errors = FieldErrors::new();

    let (from, until) = match (from, until) {
        (None, None) => return Ok(None),
        (Some(_), None) => {
            errors.add(
                "available_until_time",
                "The available until time is required when available from time is set.",
            );
            return Err(errors);
        }
        (None, Some(_)) => {
            errors.add(
                "available_from_time",
                "The available from time is required when available until time is set.",
            );
            return Err(errors);
        }
        (Some(from), Some(until)) => (from, until),
    };

    let parsed_from = availability::parse_time_of_day(from);
    let parsed_until = availability::parse_time_of_day(until);

    if parsed_from.is_none() {
        errors.add(
            "available_from_time",
            "The available from time must match the format H:i.",
        );
    }
    if parsed_until.is_none() {
        errors.add(
            "available_until_time",
            "The available until time must match the format H:i.",
        );
    }

    match (parsed_from, parsed_until) {
        (Some(f), Some(u)) if f < u => Ok(Some((
            f.format(availability::STORED_TIME_FORMAT).to_string(),
            u.format(availability::STORED_TIME_FORMAT).to_string(),
        ))),
        (Some(_), Some(_)) => {
            errors.add(
                "available_from_time",
                "Available from time must be earlier than available until time.",
            );
            Err(errors)
        }
        _ => Err(errors),
    }
}

/// Loads a live (not soft-deleted) survey.
pub async fn find_survey(db: &DatabaseConnection, id: i32) -> SurveyResult<surveys::Model> {
    surveys::Entity::find_by_id(id)
        .filter(surveys::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| SurveyError::not_found("Survey not found."))
}

pub async fn create_survey(
    db: &DatabaseConnection,
    author: &Principal,
    input: NewSurvey,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    author.require_author()?;
    input.validate()?;

    let window = validate_time_window(
        input.available_from_time.as_deref(),
        input.available_until_time.as_deref(),
    )
    .map_err(SurveyError::Validation)?;
    let (from, until) = window.unzip();

    let survey = surveys::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        survey_type: Set(input.survey_type),
        created_by: Set(author.id),
        is_active: Set(input.is_active.unwrap_or(true)),
        is_closed: Set(false),
        share_token: Set(None),
        is_public: Set(false),
        expires_at: Set(None),
        available_from_time: Set(from),
        available_until_time: Set(until),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "Survey {} created by user {} ({})",
        survey.id,
        author.id,
        survey.survey_type.as_str()
    );

    Ok(survey)
}

pub async fn update_survey(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    changes: SurveyChanges,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    principal.ensure_survey_manager(&survey)?;
    changes.validate()?;

    let touches_window =
        changes.available_from_time.is_some() || changes.available_until_time.is_some();
    let window = if touches_window {
        Some(
            validate_time_window(
                changes.available_from_time.as_deref(),
                changes.available_until_time.as_deref(),
            )
            .map_err(SurveyError::Validation)?,
        )
    } else {
        None
    };

    let mut active: surveys::ActiveModel = survey.into();

    if let Some(title) = changes.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }
    if let Some(survey_type) = changes.survey_type {
        active.survey_type = Set(survey_type);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(window) = window {
        let (from, until) = window.unzip();
        active.available_from_time = Set(from);
        active.available_until_time = Set(until);
    }
    active.updated_at = Set(now);

    Ok(active.update(db).await?)
}

pub async fn close_survey(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    set_closed(db, survey, principal, true, now).await
}

pub async fn reopen_survey(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    set_closed(db, survey, principal, false, now).await
}

async fn set_closed(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    is_closed: bool,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    principal.ensure_survey_manager(&survey)?;

    let mut active: surveys::ActiveModel = survey.into();
    active.is_closed = Set(is_closed);
    active.updated_at = Set(now);

    Ok(active.update(db).await?)
}

/// Soft delete. The row stays restorable by an admin.
pub async fn delete_survey(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    now: NaiveDateTime,
) -> SurveyResult<()> {
    principal.ensure_survey_manager(&survey)?;

    let id = survey.id;
    let mut active: surveys::ActiveModel = survey.into();
    active.deleted_at = Set(Some(now));
    active.update(db).await?;

    log::info!("Survey {} soft-deleted by user {}", id, principal.id);

    Ok(())
}

pub async fn restore_survey(
    db: &DatabaseConnection,
    principal: &Principal,
    id: i32,
    now: NaiveDateTime,
) -> SurveyResult<surveys::Model> {
    principal.require_admin()?;

    let survey = surveys::Entity::find_by_id(id)
        .filter(surveys::Column::DeletedAt.is_not_null())
        .one(db)
        .await?
        .ok_or_else(|| SurveyError::not_found("Survey not found."))?;

    let mut active: surveys::ActiveModel = survey.into();
    active.deleted_at = Set(None);
    active.updated_at = Set(now);
    let survey = active.update(db).await?;

    log::info!("Survey {} restored by admin {}", id, principal.id);

    Ok(survey)
}
