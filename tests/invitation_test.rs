//! Integration tests for the invitation lifecycle

mod common;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait, PaginatorTrait};
use surveyor::error::SurveyError;
use surveyor::invitation::{get_pending_invitation, get_pending_invitation_for_user, send_invitations};
use surveyor::orm::survey_invitations::{self, InvitationStatus};
use surveyor::orm::users::Role;

#[actix_rt::test]
async fn test_send_invitations_normalizes_and_notifies() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let survey = create_test_survey(&db, &creator, "Team lunch").await.unwrap();
    let notifier = RecordingNotifier::default();

    let invitations = send_invitations(
        &db,
        &notifier,
        &survey,
        &[" Bob@Example.com", "alice@example.com", "BOB@example.com "],
        Some(hours_from_now(48)),
        &fixed_now(),
    )
    .await
    .expect("Failed to send invitations");

    let emails: Vec<&str> = invitations.iter().map(|i| i.email.as_str()).collect();
    assert_eq!(emails, vec!["bob@example.com", "alice@example.com"]);
    assert!(invitations.iter().all(|i| i.status == InvitationStatus::Pending));
    assert!(invitations.iter().all(|i| i.expires_at == Some(hours_from_now(48))));
    assert_ne!(invitations[0].invitation_token, invitations[1].invitation_token);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, "bob@example.com");
    assert_eq!(sent[0].2, invitations[0].invitation_token);
    assert_eq!(sent[1].1, "alice@example.com");
}

#[actix_rt::test]
async fn test_reinvite_reuses_row_with_new_token() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let survey = create_test_survey(&db, &creator, "Offsite").await.unwrap();
    let notifier = RecordingNotifier::default();

    let first = send_invitations(&db, &notifier, &survey, &["dana@example.com"], None, &fixed_now())
        .await
        .unwrap()
        .remove(0);

    // Simulate a completed invitation before re-inviting.
    let mut completed: survey_invitations::ActiveModel = first.clone().into();
    completed.status = Set(InvitationStatus::Completed);
    completed.update(&db).await.unwrap();

    let second = send_invitations(
        &db,
        &notifier,
        &survey,
        &["Dana@Example.com"],
        Some(hours_from_now(2)),
        &fixed_now(),
    )
    .await
    .unwrap()
    .remove(0);

    assert_eq!(second.id, first.id);
    assert_ne!(second.invitation_token, first.invitation_token);
    assert_eq!(second.status, InvitationStatus::Pending);
    assert_eq!(second.expires_at, Some(hours_from_now(2)));

    let count = survey_invitations::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);

    // The old token no longer resolves.
    let old = get_pending_invitation(&db, &first.invitation_token, &fixed_now()).await;
    assert!(matches!(old, Err(SurveyError::NotFound(_))));
}

#[actix_rt::test]
async fn test_notification_failure_keeps_invitations() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let survey = create_test_survey(&db, &creator, "Retro").await.unwrap();

    let invitations = send_invitations(
        &db,
        &FailingNotifier,
        &survey,
        &["erin@example.com", "finn@example.com"],
        None,
        &fixed_now(),
    )
    .await
    .expect("Delivery failures must not fail the call");

    assert_eq!(invitations.len(), 2);
    let stored = survey_invitations::Entity::find().count(&db).await.unwrap();
    assert_eq!(stored, 2);
}

#[actix_rt::test]
async fn test_expiry_must_be_in_the_future() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let survey = create_test_survey(&db, &creator, "Past").await.unwrap();
    let notifier = RecordingNotifier::default();

    let result = send_invitations(
        &db,
        &notifier,
        &survey,
        &["gus@example.com"],
        Some(hours_from_now(-1)),
        &fixed_now(),
    )
    .await;

    match result {
        Err(SurveyError::Validation(errors)) => assert!(errors.get("expires_at").is_some()),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert!(notifier.sent().is_empty());
}

#[actix_rt::test]
async fn test_get_pending_invitation_states() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let survey = create_test_survey(&db, &creator, "States").await.unwrap();
    let notifier = RecordingNotifier::default();

    let unknown = get_pending_invitation(&db, "no-such-token", &fixed_now()).await;
    match unknown {
        Err(SurveyError::NotFound(msg)) => assert_eq!(msg, "Invitation not found."),
        other => panic!("Expected NotFound, got {:?}", other),
    }

    let invitation = send_invitations(
        &db,
        &notifier,
        &survey,
        &["hana@example.com"],
        Some(hours_from_now(1)),
        &fixed_now(),
    )
    .await
    .unwrap()
    .remove(0);

    let pending = get_pending_invitation(&db, &invitation.invitation_token, &fixed_now())
        .await
        .expect("Invitation should be pending");
    assert_eq!(pending.survey.id, survey.id);
    assert_eq!(pending.invitation.status, InvitationStatus::Pending);

    // Two hours later the invitation has expired.
    let later = fixed_now() + chrono::Duration::hours(2);
    match get_pending_invitation(&db, &invitation.invitation_token, &later).await {
        Err(SurveyError::Gone(msg)) => assert_eq!(msg, "Invitation expired."),
        other => panic!("Expected Gone, got {:?}", other),
    }

    // Inactive parent survey.
    alter_survey(&db, survey.clone(), |s| s.is_active = Set(false))
        .await
        .unwrap();
    match get_pending_invitation(&db, &invitation.invitation_token, &fixed_now()).await {
        Err(SurveyError::Forbidden(msg)) => assert_eq!(msg, "Survey is not active."),
        other => panic!("Expected Forbidden, got {:?}", other),
    }

    // Completed invitations are gone for good.
    let mut completed: survey_invitations::ActiveModel = invitation.clone().into();
    completed.status = Set(InvitationStatus::Completed);
    completed.update(&db).await.unwrap();
    match get_pending_invitation(&db, &invitation.invitation_token, &fixed_now()).await {
        Err(SurveyError::Gone(msg)) => assert_eq!(msg, "Invitation already used."),
        other => panic!("Expected Gone, got {:?}", other),
    }
}

#[actix_rt::test]
async fn test_invitation_bound_to_survey_and_user() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let creator = create_test_user(&db, "creator", Role::Creator).await.unwrap();
    let ivy = create_test_user(&db, "ivy", Role::Respondent).await.unwrap();
    let jay = create_test_user(&db, "jay", Role::Respondent).await.unwrap();
    let survey = create_test_survey(&db, &creator, "Bound").await.unwrap();
    let other_survey = create_test_survey(&db, &creator, "Other").await.unwrap();
    let notifier = RecordingNotifier::default();

    let invitation = send_invitations(&db, &notifier, &survey, &["IVY@example.com"], None, &fixed_now())
        .await
        .unwrap()
        .remove(0);
    let token = invitation.invitation_token.as_str();

    let ok = get_pending_invitation_for_user(&db, token, &survey, &ivy, &fixed_now()).await;
    assert!(ok.is_ok());

    match get_pending_invitation_for_user(&db, token, &other_survey, &ivy, &fixed_now()).await {
        Err(SurveyError::Forbidden(msg)) => {
            assert_eq!(msg, "Invitation does not belong to this survey.")
        }
        other => panic!("Expected Forbidden, got {:?}", other),
    }

    match get_pending_invitation_for_user(&db, token, &survey, &jay, &fixed_now()).await {
        Err(SurveyError::Forbidden(msg)) => {
            assert_eq!(msg, "Invitation email does not match your account.")
        }
        other => panic!("Expected Forbidden, got {:?}", other),
    }
}
