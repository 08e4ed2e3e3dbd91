//! JSON projections of domain records.

use crate::invitation::PendingInvitation;
use crate::orm::users::Role;
use crate::orm::{question_options, survey_invitations, surveys, users};
use crate::question::QuestionWithOptions;
use crate::submission::SubmittedResponse;
use crate::survey::visibility::{Page, SurveyListing};
use chrono::NaiveDateTime;
use serde::Serialize;

/// ISO-8601 in UTC with microseconds.
fn iso(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&users::Model> for UserResource {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: iso(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveyResource {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub survey_type: &'static str,
    pub is_active: bool,
    pub is_closed: bool,
    pub created_by: i32,
    pub available_from_time: Option<String>,
    pub available_until_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&surveys::Model> for SurveyResource {
    fn from(survey: &surveys::Model) -> Self {
        Self {
            id: survey.id,
            title: survey.title.clone(),
            description: survey.description.clone(),
            survey_type: survey.survey_type.as_str(),
            is_active: survey.is_active,
            is_closed: survey.is_closed,
            created_by: survey.created_by,
            available_from_time: survey.available_from_time.clone(),
            available_until_time: survey.available_until_time.clone(),
            created_at: iso(survey.created_at),
            updated_at: iso(survey.updated_at),
        }
    }
}

/// Survey as managed by its owner, including share state.
#[derive(Debug, Serialize)]
pub struct ShareResource {
    #[serde(flatten)]
    pub survey: SurveyResource,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub expires_at: Option<String>,
}

impl From<&surveys::Model> for ShareResource {
    fn from(survey: &surveys::Model) -> Self {
        Self {
            survey: survey.into(),
            is_public: survey.is_public,
            share_token: survey.share_token.clone(),
            expires_at: survey.expires_at.map(iso),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveyListResource {
    pub id: i32,
    pub title: String,
    #[serde(rename = "type")]
    pub survey_type: &'static str,
    pub is_active: bool,
    pub is_closed: bool,
    pub available_now: bool,
    pub already_submitted: bool,
}

impl From<SurveyListing> for SurveyListResource {
    fn from(listing: SurveyListing) -> Self {
        Self {
            id: listing.survey.id,
            title: listing.survey.title,
            survey_type: listing.survey.survey_type.as_str(),
            is_active: listing.survey.is_active,
            is_closed: listing.survey.is_closed,
            available_now: listing.available_now,
            already_submitted: listing.already_submitted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            current_page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page: page.last_page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionResource {
    pub id: i32,
    pub question_id: i32,
    pub option_text: String,
}

impl From<&question_options::Model> for OptionResource {
    fn from(option: &question_options::Model) -> Self {
        Self {
            id: option.id,
            question_id: option.question_id,
            option_text: option.option_text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionResource {
    pub id: i32,
    pub survey_id: i32,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: crate::orm::questions::QuestionType,
    pub required: bool,
    pub options: Vec<OptionResource>,
}

impl From<&QuestionWithOptions> for QuestionResource {
    fn from(q: &QuestionWithOptions) -> Self {
        Self {
            id: q.question.id,
            survey_id: q.question.survey_id,
            question_text: q.question.question_text.clone(),
            question_type: q.question.question_type,
            required: q.question.required,
            options: q.options.iter().map(OptionResource::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvitationResource {
    pub id: i32,
    pub survey_id: i32,
    pub email: String,
    pub status: crate::orm::survey_invitations::InvitationStatus,
    pub invitation_token: String,
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<&survey_invitations::Model> for InvitationResource {
    fn from(invitation: &survey_invitations::Model) -> Self {
        Self {
            id: invitation.id,
            survey_id: invitation.survey_id,
            email: invitation.email.clone(),
            status: invitation.status,
            invitation_token: invitation.invitation_token.clone(),
            expires_at: invitation.expires_at.map(iso),
            created_at: iso(invitation.created_at),
        }
    }
}

/// What an invitee sees before logging in.
#[derive(Debug, Serialize)]
pub struct PublicInvitationResource {
    pub survey: SurveyResource,
    pub email: String,
    pub expires_at: Option<String>,
}

impl From<&PendingInvitation> for PublicInvitationResource {
    fn from(pending: &PendingInvitation) -> Self {
        Self {
            survey: (&pending.survey).into(),
            email: pending.invitation.email.clone(),
            expires_at: pending.invitation.expires_at.map(iso),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionResource {
    pub response_id: i32,
    pub submitted_at: String,
    pub answer_count: usize,
}

impl From<&SubmittedResponse> for SubmissionResource {
    fn from(submitted: &SubmittedResponse) -> Self {
        Self {
            response_id: submitted.response.id,
            submitted_at: iso(submitted.response.submitted_at),
            answer_count: submitted.answers.len(),
        }
    }
}
