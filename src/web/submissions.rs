use super::resources::SubmissionResource;
use super::{respond, validate_input};
use crate::answers::RawAnswer;
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::invitation::get_pending_invitation_for_user;
use crate::middleware::ClientCtx;
use crate::submission::{ensure_survey_can_be_submitted, submit};
use crate::survey::find_survey;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(store);
}

#[derive(Deserialize, Validate)]
pub struct SubmitForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "The answers field is required."))]
    pub answers: Vec<RawAnswer>,
    #[validate(custom = "validate_invitation_token")]
    pub invitation_token: Option<String>,
}

/// Blank tokens count as absent; anything else must be a UUID.
fn validate_invitation_token(token: &str) -> Result<(), ValidationError> {
    let token = token.trim();
    if token.is_empty() || uuid::Uuid::parse_str(token).is_ok() {
        return Ok(());
    }

    let mut error = ValidationError::new("uuid");
    error.message = Some("The invitation token field must be a valid UUID.".into());
    Err(error)
}

#[post("/api/surveys/{id}/submit")]
pub async fn store(
    client: ClientCtx,
    path: web::Path<i32>,
    body: web::Json<SubmitForm>,
) -> Result<HttpResponse, SurveyError> {
    let respondent = client.principal();
    respondent.require_respondent()?;

    let form = body.into_inner();
    validate_input(&form)?;

    let db = get_db_pool();
    let now = Utc::now();
    let survey = find_survey(db, path.into_inner()).await?;
    ensure_survey_can_be_submitted(&survey, respondent, &now)?;

    let invitation = match form.invitation_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Some(
            get_pending_invitation_for_user(db, token, &survey, respondent, &now)
                .await?
                .invitation,
        ),
        _ => None,
    };

    let submitted = submit(
        db,
        &survey,
        respondent,
        &form.answers,
        invitation.as_ref(),
        &now,
    )
    .await?;

    Ok(respond(
        StatusCode::CREATED,
        "Survey submitted successfully.",
        SubmissionResource::from(&submitted),
    ))
}
