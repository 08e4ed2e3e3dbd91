//! Error kinds surfaced by the survey engine.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::BTreeMap;

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Field-indexed validation messages, e.g. `answers.2.selected_option_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field shorthand.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// First message in field order, used as the summary line.
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|messages| messages.iter())
            .map(String::as_str)
            .next()
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            for error in list {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field));
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

#[derive(Debug)]
pub enum SurveyError {
    /// Unknown survey, token or record.
    NotFound(String),
    /// Role, ownership or access-state mismatch.
    Forbidden(String),
    /// Expired or already consumed resource.
    Gone(String),
    /// Caller-correctable input problems.
    Validation(FieldErrors),
    /// Store failure.
    Database(DbErr),
    /// Any other server-side failure, such as password hashing.
    Internal(String),
}

impl SurveyError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        SurveyError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        SurveyError::Forbidden(msg.into())
    }

    pub fn gone(msg: impl Into<String>) -> Self {
        SurveyError::Gone(msg.into())
    }

    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        SurveyError::Validation(FieldErrors::single(field, msg))
    }

    /// Validation errors for a field, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SurveyError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl std::fmt::Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::NotFound(msg) => write!(f, "{}", msg),
            SurveyError::Forbidden(msg) => write!(f, "{}", msg),
            SurveyError::Gone(msg) => write!(f, "{}", msg),
            SurveyError::Validation(errors) => write!(
                f,
                "{}",
                errors.first_message().unwrap_or("The given data was invalid.")
            ),
            SurveyError::Database(e) => write!(f, "Database error: {}", e),
            SurveyError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for SurveyError {}

impl From<DbErr> for SurveyError {
    fn from(e: DbErr) -> Self {
        SurveyError::Database(e)
    }
}

impl From<validator::ValidationErrors> for SurveyError {
    fn from(e: validator::ValidationErrors) -> Self {
        SurveyError::Validation(e.into())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for SurveyError {
    fn status_code(&self) -> StatusCode {
        match self {
            SurveyError::NotFound(_) => StatusCode::NOT_FOUND,
            SurveyError::Forbidden(_) => StatusCode::FORBIDDEN,
            SurveyError::Gone(_) => StatusCode::GONE,
            SurveyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SurveyError::Database(_) | SurveyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SurveyError::Database(e) => {
                log::error!("Database error: {}", e);
                "An internal error occurred.".to_string()
            }
            SurveyError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                "An internal error occurred.".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            message,
            errors: self.field_errors(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("answers.0.answer_text", "first");
        errors.add("answers.0.answer_text", "second");
        errors.add("answers.1", "third");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("answers.0.answer_text").unwrap().len(), 2);
        assert_eq!(errors.fields().count(), 2);
    }

    #[test]
    fn test_status_codes_by_kind() {
        assert_eq!(
            SurveyError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SurveyError::forbidden("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(SurveyError::gone("x").status_code(), StatusCode::GONE);
        assert_eq!(
            SurveyError::validation("answers", "x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_validation_display_uses_first_message() {
        let err = SurveyError::validation("survey", "You have already submitted this survey.");
        assert_eq!(err.to_string(), "You have already submitted this survey.");
    }
}
