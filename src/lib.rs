pub mod answers;
pub mod app_config;
pub mod auth;
pub mod db;
pub mod email;
pub mod error;
pub mod invitation;
pub mod middleware;
pub mod notifications;
pub mod orm;
pub mod question;
pub mod submission;
pub mod survey;
pub mod user;
pub mod web;

pub use error::{FieldErrors, SurveyError, SurveyResult};
