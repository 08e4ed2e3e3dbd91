use super::resources::{PageMeta, SurveyListResource, SurveyResource};
use super::surveys::with_default_page_size;
use super::{respond, respond_page};
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::middleware::ClientCtx;
use crate::survey::restore_survey;
use crate::survey::visibility::{list_deleted, SurveyFilters};
use actix_web::http::StatusCode;
use actix_web::{get, patch, web, HttpResponse};
use chrono::Utc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(deleted).service(restore);
}

#[get("/api/admin/surveys/deleted")]
pub async fn deleted(
    client: ClientCtx,
    query: web::Query<SurveyFilters>,
) -> Result<HttpResponse, SurveyError> {
    let filters = with_default_page_size(query.into_inner());
    let page = list_deleted(get_db_pool(), client.principal(), &filters).await?;
    let meta = PageMeta::from(&page);
    let page = page.map(SurveyListResource::from);

    Ok(respond_page(
        "Deleted surveys retrieved successfully",
        page.items,
        meta,
    ))
}

#[patch("/api/admin/surveys/{id}/restore")]
pub async fn restore(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, SurveyError> {
    let survey = restore_survey(
        get_db_pool(),
        client.principal(),
        path.into_inner(),
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(respond(
        StatusCode::OK,
        "Survey restored successfully",
        SurveyResource::from(&survey),
    ))
}
