use super::resources::QuestionResource;
use super::respond;
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::middleware::ClientCtx;
use crate::question::{create_question, NewQuestion};
use crate::survey::find_survey;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use chrono::Utc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(store);
}

#[post("/api/surveys/{id}/questions")]
pub async fn store(
    client: ClientCtx,
    path: web::Path<i32>,
    body: web::Json<NewQuestion>,
) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    let question = create_question(
        db,
        &survey,
        client.principal(),
        body.into_inner(),
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(respond(
        StatusCode::CREATED,
        "Question created successfully.",
        QuestionResource::from(&question),
    ))
}
