//! Unauthenticated endpoints: share links and invitation previews.

use super::resources::{PublicInvitationResource, SurveyResource};
use super::respond;
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::invitation::get_pending_invitation;
use crate::survey::share::find_active_public_survey;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse};
use chrono::Utc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_shared_survey).service(view_invitation);
}

#[get("/api/public/surveys/{share_token}")]
pub async fn view_shared_survey(path: web::Path<String>) -> Result<HttpResponse, SurveyError> {
    let survey = find_active_public_survey(get_db_pool(), &path.into_inner(), &Utc::now()).await?;

    Ok(respond(
        StatusCode::OK,
        "Survey retrieved successfully.",
        SurveyResource::from(&survey),
    ))
}

#[get("/api/public/invite/{token}")]
pub async fn view_invitation(path: web::Path<String>) -> Result<HttpResponse, SurveyError> {
    let pending = get_pending_invitation(get_db_pool(), &path.into_inner(), &Utc::now()).await?;

    Ok(respond(
        StatusCode::OK,
        "Invitation retrieved successfully.",
        PublicInvitationResource::from(&pending),
    ))
}
