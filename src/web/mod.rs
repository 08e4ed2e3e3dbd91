//! JSON API.
//!
//! Every success body is `{ "success": true, "message": ..., "data": ... }`;
//! failures are rendered by `SurveyError`'s `ResponseError` impl.

pub mod admin;
pub mod auth;
pub mod invitations;
pub mod public;
pub mod questions;
pub mod resources;
pub mod share;
pub mod submissions;
pub mod surveys;

use crate::error::{FieldErrors, SurveyError};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use validator::Validate;

pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    auth::configure(conf);
    admin::configure(conf);
    public::configure(conf);
    surveys::configure(conf);
    questions::configure(conf);
    share::configure(conf);
    invitations::configure(conf);
    submissions::configure(conf);
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<resources::PageMeta>,
}

pub(crate) fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        message,
        data: Some(data),
        meta: None,
    })
}

pub(crate) fn respond_page<T: Serialize>(
    message: &str,
    data: T,
    meta: resources::PageMeta,
) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        message,
        data: Some(data),
        meta: Some(meta),
    })
}

pub(crate) fn respond_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::<()> {
        success: true,
        message,
        data: None,
        meta: None,
    })
}

/// Runs `validator` rules and converts failures into a 422.
pub(crate) fn validate_input<T: Validate>(input: &T) -> Result<(), SurveyError> {
    input
        .validate()
        .map_err(|e| SurveyError::Validation(FieldErrors::from(e)))
}
