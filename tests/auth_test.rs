//! Integration tests for registration and password login

mod common;

use common::{database::*, fixtures::*};
use surveyor::auth::{authenticate, register, Credentials, NewAccount};
use surveyor::error::SurveyError;
use surveyor::orm::users::Role;

fn account(email: &str, role: Role) -> NewAccount {
    NewAccount {
        name: "Cora".to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        role,
    }
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[actix_rt::test]
async fn test_register_then_login() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let user = register(&db, account("Cora@Example.com", Role::Creator), fixed_naive())
        .await
        .expect("Failed to register");
    assert_eq!(user.email, "cora@example.com");
    assert_eq!(user.role, Role::Creator);
    assert_ne!(user.password, "correct horse");

    let found = authenticate(&db, &credentials("CORA@example.com", "correct horse"))
        .await
        .expect("Login should succeed");
    assert_eq!(found.id, user.id);

    for attempt in [
        credentials("cora@example.com", "wrong password"),
        credentials("nobody@example.com", "correct horse"),
    ] {
        match authenticate(&db, &attempt).await {
            Err(SurveyError::Validation(errors)) => assert_eq!(
                errors.get("email").unwrap(),
                &["The provided credentials are incorrect.".to_string()]
            ),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}

#[actix_rt::test]
async fn test_register_rejections() {
    let db = setup_test_database().await.expect("Failed to set up database");

    register(&db, account("dup@example.com", Role::Respondent), fixed_naive())
        .await
        .unwrap();

    match register(&db, account("DUP@example.com", Role::Creator), fixed_naive()).await {
        Err(SurveyError::Validation(errors)) => assert_eq!(
            errors.get("email").unwrap(),
            &["The email has already been taken.".to_string()]
        ),
        other => panic!("Expected validation error, got {:?}", other),
    }

    match register(&db, account("boss@example.com", Role::Admin), fixed_naive()).await {
        Err(SurveyError::Validation(errors)) => assert!(errors.get("role").is_some()),
        other => panic!("Expected validation error, got {:?}", other),
    }

    let mut short = account("short@example.com", Role::Creator);
    short.password = "1234".to_string();
    let result = register(&db, short, fixed_naive()).await;
    assert!(matches!(result, Err(SurveyError::Validation(_))));
}

#[actix_rt::test]
async fn test_fixture_users_cannot_log_in() {
    let db = setup_test_database().await.expect("Failed to set up database");
    create_test_user(&db, "ghost", Role::Respondent).await.unwrap();

    let result = authenticate(&db, &credentials("ghost@example.com", "!")).await;
    assert!(matches!(result, Err(SurveyError::Validation(_))));
}
