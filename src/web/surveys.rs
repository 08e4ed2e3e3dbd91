//! Survey listing and lifecycle endpoints.

use super::resources::{PageMeta, SurveyListResource, SurveyResource};
use super::{respond, respond_message, respond_page};
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::middleware::ClientCtx;
use crate::survey::visibility::{list_for_user, SurveyFilters};
use crate::survey::{
    close_survey, create_survey, delete_survey, find_survey, reopen_survey, update_survey,
    NewSurvey, SurveyChanges,
};
use actix_web::http::StatusCode;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(index)
        .service(store)
        .service(update)
        .service(destroy)
        .service(close)
        .service(reopen);
}

/// Applies the configured default page size when the caller sent none.
pub(super) fn with_default_page_size(mut filters: SurveyFilters) -> SurveyFilters {
    if filters.per_page.is_none() {
        filters.per_page = Some(crate::app_config::listing().default_per_page as i64);
    }
    filters
}

#[get("/api/surveys")]
pub async fn index(
    client: ClientCtx,
    query: web::Query<SurveyFilters>,
) -> Result<HttpResponse, SurveyError> {
    let filters = with_default_page_size(query.into_inner());
    let page = list_for_user(get_db_pool(), client.principal(), &filters, &Utc::now()).await?;
    let meta = PageMeta::from(&page);
    let page = page.map(SurveyListResource::from);

    Ok(respond_page(
        "Surveys retrieved successfully",
        page.items,
        meta,
    ))
}

#[post("/api/surveys")]
pub async fn store(
    client: ClientCtx,
    body: web::Json<NewSurvey>,
) -> Result<HttpResponse, SurveyError> {
    let survey = create_survey(
        get_db_pool(),
        client.principal(),
        body.into_inner(),
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(respond(
        StatusCode::CREATED,
        "Survey created successfully",
        SurveyResource::from(&survey),
    ))
}

#[patch("/api/surveys/{id}")]
pub async fn update(
    client: ClientCtx,
    path: web::Path<i32>,
    body: web::Json<SurveyChanges>,
) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    let survey = update_survey(
        db,
        survey,
        client.principal(),
        body.into_inner(),
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(respond(
        StatusCode::OK,
        "Survey updated successfully.",
        SurveyResource::from(&survey),
    ))
}

#[delete("/api/surveys/{id}")]
pub async fn destroy(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    delete_survey(db, survey, client.principal(), Utc::now().naive_utc()).await?;

    Ok(respond_message("Survey deleted successfully."))
}

#[patch("/api/surveys/{id}/close")]
pub async fn close(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    let survey = close_survey(db, survey, client.principal(), Utc::now().naive_utc()).await?;

    Ok(respond(
        StatusCode::OK,
        "Survey closed successfully.",
        SurveyResource::from(&survey),
    ))
}

#[patch("/api/surveys/{id}/reopen")]
pub async fn reopen(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, SurveyError> {
    let db = get_db_pool();
    let survey = find_survey(db, path.into_inner()).await?;
    let survey = reopen_survey(db, survey, client.principal(), Utc::now().naive_utc()).await?;

    Ok(respond(
        StatusCode::OK,
        "Survey reopened successfully.",
        SurveyResource::from(&survey),
    ))
}
