use super::resources::InvitationResource;
use super::{respond, validate_input};
use crate::db::get_db_pool;
use crate::error::{FieldErrors, SurveyError};
use crate::invitation::send_invitations;
use crate::middleware::ClientCtx;
use crate::notifications::InvitationNotifier;
use crate::survey::find_survey;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(store);
}

#[derive(Deserialize, Validate)]
pub struct InviteForm {
    #[validate(length(min = 1, message = "The emails field is required."))]
    pub emails: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl InviteForm {
    fn check_addresses(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for (index, email) in self.emails.iter().enumerate() {
            if !validator::validate_email(email.trim()) {
                errors.add(
                    format!("emails.{}", index),
                    format!("The emails.{} field must be a valid email address.", index),
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

#[post("/api/surveys/{id}/invite")]
pub async fn store(
    client: ClientCtx,
    notifier: web::Data<dyn InvitationNotifier>,
    path: web::Path<i32>,
    body: web::Json<InviteForm>,
) -> Result<HttpResponse, SurveyError> {
    let form = body.into_inner();
    validate_input(&form)?;
    form.check_addresses().map_err(SurveyError::Validation)?;

    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    client.principal().ensure_survey_manager(&survey)?;

    let invitations = send_invitations(
        db,
        notifier.get_ref(),
        &survey,
        form.emails.as_slice(),
        form.expires_at.map(|at| at.naive_utc()),
        &Utc::now(),
    )
    .await?;

    Ok(respond(
        StatusCode::ACCEPTED,
        "Invitations queued successfully.",
        invitations
            .iter()
            .map(InvitationResource::from)
            .collect::<Vec<_>>(),
    ))
}
