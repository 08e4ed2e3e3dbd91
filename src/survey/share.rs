//! Public share links.
//!
//! A public survey carries an opaque share token that grants unauthenticated
//! read access until the survey's `expires_at`.

use super::availability::is_expired;
use crate::error::{SurveyError, SurveyResult};
use crate::orm::surveys;
use crate::user::Principal;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};

pub fn generate_share_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Turns sharing on or off.
///
/// Going public keeps an already issued token so existing links survive.
/// Going private clears the token, flag and expiry together.
pub async fn update_share_settings<Tz: TimeZone>(
    db: &DatabaseConnection,
    survey: surveys::Model,
    principal: &Principal,
    is_public: bool,
    expires_at: Option<NaiveDateTime>,
    now: &DateTime<Tz>,
) -> SurveyResult<surveys::Model> {
    principal.ensure_survey_manager(&survey)?;

    if let Some(expires_at) = expires_at {
        if expires_at <= now.naive_utc() {
            return Err(SurveyError::validation(
                "expires_at",
                "The expires at must be a date after now.",
            ));
        }
    }

    let existing_token = survey.share_token.clone();
    let mut active: surveys::ActiveModel = survey.into();

    if is_public {
        active.share_token = Set(Some(existing_token.unwrap_or_else(generate_share_token)));
        active.is_public = Set(true);
        active.expires_at = Set(expires_at);
    } else {
        active.share_token = Set(None);
        active.is_public = Set(false);
        active.expires_at = Set(None);
    }
    active.updated_at = Set(now.naive_utc());

    Ok(active.update(db).await?)
}

/// Resolves a share token to a survey that may be shown publicly.
pub async fn find_active_public_survey<Tz: TimeZone>(
    db: &DatabaseConnection,
    share_token: &str,
    now: &DateTime<Tz>,
) -> SurveyResult<surveys::Model> {
    let survey = surveys::Entity::find()
        .filter(surveys::Column::ShareToken.eq(share_token))
        .filter(surveys::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| SurveyError::not_found("Survey not found."))?;

    ensure_survey_is_accessible(&survey, now)?;

    Ok(survey)
}

pub fn ensure_survey_is_accessible<Tz: TimeZone>(
    survey: &surveys::Model,
    now: &DateTime<Tz>,
) -> SurveyResult<()> {
    if !survey.is_active || !survey.is_public {
        return Err(SurveyError::forbidden(
            "Survey is not publicly accessible.",
        ));
    }

    if is_expired(survey.expires_at, now) {
        return Err(SurveyError::gone("Survey link has expired."));
    }

    Ok(())
}
