use super::resources::ShareResource;
use super::respond;
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::middleware::ClientCtx;
use crate::survey::find_survey;
use crate::survey::share::update_share_settings;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(store);
}

#[derive(Deserialize)]
pub struct ShareSettingsForm {
    #[serde(default)]
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[post("/api/surveys/{id}/share")]
pub async fn store(
    client: ClientCtx,
    path: web::Path<i32>,
    body: web::Json<ShareSettingsForm>,
) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    let form = body.into_inner();

    let survey = update_share_settings(
        db,
        survey,
        client.principal(),
        form.is_public,
        form.expires_at.map(|at| at.naive_utc()),
        &Utc::now(),
    )
    .await?;

    let message = if survey.is_public {
        "Public sharing enabled."
    } else {
        "Public sharing disabled."
    };

    Ok(respond(StatusCode::OK, message, ShareResource::from(&survey)))
}
