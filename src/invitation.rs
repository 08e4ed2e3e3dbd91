//! Invitation lifecycle.
//!
//! One invitation row exists per (survey, email). Sending again to the same
//! address reissues the token and resets the row to pending. An invitation
//! is completed by a successful submission and can never be redeemed again.

use crate::db::is_unique_violation;
use crate::error::{SurveyError, SurveyResult};
use crate::notifications::InvitationNotifier;
use crate::orm::survey_invitations::{self, InvitationStatus};
use crate::orm::surveys;
use crate::survey::availability::is_expired;
use crate::user::Principal;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DatabaseConnection};
use std::collections::HashSet;

/// A pending invitation together with its parent survey.
#[derive(Clone, Debug)]
pub struct PendingInvitation {
    pub invitation: survey_invitations::Model,
    pub survey: surveys::Model,
}

pub fn generate_invitation_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trims, lower-cases and de-duplicates addresses, keeping first-seen order.
pub fn normalize_emails<S: AsRef<str>>(emails: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    emails
        .iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

/// Issues or reissues an invitation for every address and notifies each one.
///
/// Notification failures are logged and do not undo the stored invitations.
pub async fn send_invitations<Tz: TimeZone, S: AsRef<str>>(
    db: &DatabaseConnection,
    notifier: &dyn InvitationNotifier,
    survey: &surveys::Model,
    emails: &[S],
    expires_at: Option<NaiveDateTime>,
    now: &DateTime<Tz>,
) -> SurveyResult<Vec<survey_invitations::Model>> {
    let now_utc = now.naive_utc();

    if let Some(expires_at) = expires_at {
        if expires_at <= now_utc {
            return Err(SurveyError::validation(
                "expires_at",
                "The expires at must be a date after now.",
            ));
        }
    }

    let mut invitations = Vec::new();
    for email in normalize_emails(emails) {
        let invitation = upsert_invitation(db, survey.id, &email, expires_at, now_utc).await?;
        invitations.push(invitation);
    }

    log::info!(
        "Issued {} invitation(s) for survey {}",
        invitations.len(),
        survey.id
    );

    for invitation in &invitations {
        if let Err(e) = notifier.invitation_issued(survey, invitation).await {
            log::error!(
                "Failed to deliver invitation {} for survey {} to {}: {}",
                invitation.id,
                survey.id,
                invitation.email,
                e
            );
        }
    }

    Ok(invitations)
}

async fn upsert_invitation(
    db: &DatabaseConnection,
    survey_id: i32,
    email: &str,
    expires_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> SurveyResult<survey_invitations::Model> {
    if let Some(existing) = find_by_survey_and_email(db, survey_id, email).await? {
        return reissue(db, existing, expires_at, now).await;
    }

    let inserted = survey_invitations::ActiveModel {
        survey_id: Set(survey_id),
        email: Set(email.to_string()),
        invitation_token: Set(generate_invitation_token()),
        status: Set(InvitationStatus::Pending),
        expires_at: Set(expires_at),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(invitation) => Ok(invitation),
        // A concurrent invite to the same address won the insert.
        Err(e) if is_unique_violation(&e) => {
            let existing = find_by_survey_and_email(db, survey_id, email)
                .await?
                .ok_or(SurveyError::Database(e))?;
            reissue(db, existing, expires_at, now).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn reissue(
    db: &DatabaseConnection,
    existing: survey_invitations::Model,
    expires_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> SurveyResult<survey_invitations::Model> {
    let mut active: survey_invitations::ActiveModel = existing.into();
    active.invitation_token = Set(generate_invitation_token());
    active.status = Set(InvitationStatus::Pending);
    active.expires_at = Set(expires_at);
    active.updated_at = Set(now);

    Ok(active.update(db).await?)
}

async fn find_by_survey_and_email(
    db: &DatabaseConnection,
    survey_id: i32,
    email: &str,
) -> SurveyResult<Option<survey_invitations::Model>> {
    Ok(survey_invitations::Entity::find()
        .filter(survey_invitations::Column::SurveyId.eq(survey_id))
        .filter(survey_invitations::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Resolves a token to a redeemable invitation.
pub async fn get_pending_invitation<Tz: TimeZone>(
    db: &DatabaseConnection,
    token: &str,
    now: &DateTime<Tz>,
) -> SurveyResult<PendingInvitation> {
    let invitation = survey_invitations::Entity::find()
        .filter(survey_invitations::Column::InvitationToken.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| SurveyError::not_found("Invitation not found."))?;

    if !invitation.is_pending() {
        return Err(SurveyError::gone("Invitation already used."));
    }

    if is_expired(invitation.expires_at, now) {
        return Err(SurveyError::gone("Invitation expired."));
    }

    let survey = surveys::Entity::find_by_id(invitation.survey_id)
        .filter(surveys::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| SurveyError::not_found("Survey not found."))?;

    if !survey.is_active {
        return Err(SurveyError::forbidden("Survey is not active."));
    }

    Ok(PendingInvitation { invitation, survey })
}

/// As [`get_pending_invitation`], additionally bound to a survey and a user.
pub async fn get_pending_invitation_for_user<Tz: TimeZone>(
    db: &DatabaseConnection,
    token: &str,
    survey: &surveys::Model,
    user: &Principal,
    now: &DateTime<Tz>,
) -> SurveyResult<PendingInvitation> {
    let pending = get_pending_invitation(db, token, now).await?;

    if pending.invitation.survey_id != survey.id {
        return Err(SurveyError::forbidden(
            "Invitation does not belong to this survey.",
        ));
    }

    if pending.invitation.email != user.normalized_email() {
        return Err(SurveyError::forbidden(
            "Invitation email does not match your account.",
        ));
    }

    Ok(pending)
}

/// Flips a pending invitation to completed.
///
/// Conditional on the row still being pending, so two redemptions racing for
/// the same token cannot both succeed.
pub(crate) async fn mark_completed<C: ConnectionTrait>(
    conn: &C,
    invitation_id: i32,
    now: NaiveDateTime,
) -> SurveyResult<()> {
    let result = survey_invitations::Entity::update_many()
        .col_expr(
            survey_invitations::Column::Status,
            Expr::value(InvitationStatus::Completed),
        )
        .col_expr(survey_invitations::Column::UpdatedAt, Expr::value(now))
        .filter(survey_invitations::Column::Id.eq(invitation_id))
        .filter(survey_invitations::Column::Status.eq(InvitationStatus::Pending))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(SurveyError::gone("Invitation already used."));
    }

    Ok(())
}
