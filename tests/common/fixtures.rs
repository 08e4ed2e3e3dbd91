//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use std::sync::Mutex;
use surveyor::email::EmailError;
use surveyor::notifications::InvitationNotifier;
use surveyor::orm::questions::QuestionType;
use surveyor::orm::surveys::SurveyType;
use surveyor::orm::users::Role;
use surveyor::orm::{survey_invitations, surveys, users};
use surveyor::question::{create_question, NewOption, NewQuestion, QuestionWithOptions};
use surveyor::user::Principal;

/// Monday 2024-06-03 12:00:00 UTC. Tests run against this clock.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        Utc,
    )
}

pub fn fixed_naive() -> NaiveDateTime {
    fixed_now().naive_utc()
}

pub fn hours_from_now(hours: i64) -> NaiveDateTime {
    fixed_naive() + Duration::hours(hours)
}

pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<Principal, DbErr> {
    let user = users::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name)),
        // Not a valid hash: fixture users cannot log in.
        password: Set("!".to_string()),
        role: Set(role),
        created_at: Set(fixed_naive()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Principal::from(user))
}

/// An active, open, private survey with no window.
pub async fn create_test_survey(
    db: &DatabaseConnection,
    creator: &Principal,
    title: &str,
) -> Result<surveys::Model, DbErr> {
    surveys::ActiveModel {
        title: Set(title.to_string()),
        description: Set(Some(format!("About {}", title))),
        survey_type: Set(SurveyType::Survey),
        created_by: Set(creator.id),
        is_active: Set(true),
        is_closed: Set(false),
        share_token: Set(None),
        is_public: Set(false),
        expires_at: Set(None),
        available_from_time: Set(None),
        available_until_time: Set(None),
        created_at: Set(fixed_naive()),
        updated_at: Set(fixed_naive()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Applies `change` to a stored survey and returns the updated row.
pub async fn alter_survey(
    db: &DatabaseConnection,
    survey: surveys::Model,
    change: impl FnOnce(&mut surveys::ActiveModel),
) -> Result<surveys::Model, DbErr> {
    let mut active: surveys::ActiveModel = survey.into();
    change(&mut active);
    active.update(db).await
}

pub async fn create_public_survey(
    db: &DatabaseConnection,
    creator: &Principal,
    title: &str,
) -> Result<surveys::Model, DbErr> {
    let survey = create_test_survey(db, creator, title).await?;
    alter_survey(db, survey, |s| s.is_public = Set(true)).await
}

pub async fn add_question(
    db: &DatabaseConnection,
    survey: &surveys::Model,
    creator: &Principal,
    question_type: QuestionType,
    options: &[&str],
    required: bool,
) -> QuestionWithOptions {
    create_question(
        db,
        survey,
        creator,
        NewQuestion {
            question_text: format!("{:?} question", question_type),
            question_type,
            required,
            options: options
                .iter()
                .map(|t| NewOption {
                    option_text: t.to_string(),
                })
                .collect(),
        },
        fixed_naive(),
    )
    .await
    .expect("Failed to create question")
}

pub async fn reload_invitation(
    db: &DatabaseConnection,
    id: i32,
) -> Result<survey_invitations::Model, DbErr> {
    survey_invitations::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("invitation {}", id)))
}

/// Records every notice instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i32, String, String)>>,
}

impl RecordingNotifier {
    /// (survey id, email, token) per notice, in dispatch order.
    pub fn sent(&self) -> Vec<(i32, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn invitation_issued(
        &self,
        survey: &surveys::Model,
        invitation: &survey_invitations::Model,
    ) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push((
            survey.id,
            invitation.email.clone(),
            invitation.invitation_token.clone(),
        ));
        Ok(())
    }
}

/// Fails every delivery.
pub struct FailingNotifier;

#[async_trait]
impl InvitationNotifier for FailingNotifier {
    async fn invitation_issued(
        &self,
        _survey: &surveys::Model,
        _invitation: &survey_invitations::Model,
    ) -> Result<(), EmailError> {
        Err(EmailError::ConfigError("SMTP relay unreachable".to_string()))
    }
}
