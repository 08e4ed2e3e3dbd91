//! End-to-end HTTP tests against the JSON API
//!
//! Handlers read the global pool, so this binary holds a single test.

mod common;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use common::{database::*, fixtures::*};
use serde_json::{json, Value};
use std::sync::Arc;
use surveyor::notifications::InvitationNotifier;

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
}

#[actix_rt::test]
async fn test_account_survey_invite_and_submit_over_http() {
    setup_global_database()
        .await
        .expect("Failed to set up database");

    let recorder = Arc::new(RecordingNotifier::default());
    let notifier: Arc<dyn InvitationNotifier> = recorder.clone();

    let app = test::init_service(
        App::new()
            .app_data(Data::from(notifier))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_secure(false)
                    .build(),
            )
            .configure(surveyor::web::configure),
    )
    .await;

    // Anonymous callers are turned away.
    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Registering a creator logs them in.
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(&json!({
            "name": "Cora",
            "email": "Cora@Example.com",
            "password": "correct horse",
            "role": "creator",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let creator = session_cookie(&resp).expect("Registration should start a session");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["email"], "cora@example.com");
    assert_eq!(body["data"]["user"]["role"], "creator");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .cookie(creator.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["name"], "Cora");

    // Survey with one required text question.
    let req = test::TestRequest::post()
        .uri("/api/surveys")
        .cookie(creator.clone())
        .set_json(&json!({ "title": "Team lunch", "type": "survey" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let survey_id = body["data"]["id"].as_i64().expect("survey id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/surveys/{}/questions", survey_id))
        .cookie(creator.clone())
        .set_json(&json!({ "question_text": "Where to?", "type": "text", "required": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let question_id = body["data"]["id"].as_i64().expect("question id");

    // Invitations: every address is checked, then the notifier is called.
    let invite_uri = format!("/api/surveys/{}/invite", survey_id);
    let req = test::TestRequest::post()
        .uri(&invite_uri)
        .cookie(creator.clone())
        .set_json(&json!({ "emails": ["rex@example.com", "nope"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["emails.1"].is_array());
    assert!(recorder.sent().is_empty());

    let req = test::TestRequest::post()
        .uri(&invite_uri)
        .cookie(creator.clone())
        .set_json(&json!({ "emails": ["Rex@Example.com"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "rex@example.com");
    let token = sent[0].2.clone();

    // Logging out clears the session cookie.
    let req = test::TestRequest::post()
        .uri("/api/logout")
        .cookie(creator.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = session_cookie(&resp).expect("Logout should reset the cookie");
    assert_eq!(cleared.value(), "");

    // The invitee signs up, then logs in again with a password.
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(&json!({
            "name": "Rex",
            "email": "rex@example.com",
            "password": "hunter2hunter2",
            "role": "respondent",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(&json!({ "email": "rex@example.com", "password": "wrong password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "The provided credentials are incorrect.");

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(&json!({ "email": "REX@example.com", "password": "hunter2hunter2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let respondent = session_cookie(&resp).expect("Login should start a session");

    // Respondents cannot manage surveys.
    let req = test::TestRequest::post()
        .uri(&invite_uri)
        .cookie(respondent.clone())
        .set_json(&json!({ "emails": ["someone@example.com"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // A malformed invitation token never reaches the lookup.
    let submit_uri = format!("/api/surveys/{}/submit", survey_id);
    let answers = json!([{ "question_id": question_id, "answer_text": "Tacos" }]);
    let req = test::TestRequest::post()
        .uri(&submit_uri)
        .cookie(respondent.clone())
        .set_json(&json!({ "answers": answers, "invitation_token": "not-a-token" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["invitation_token"][0],
        "The invitation token field must be a valid UUID."
    );

    let req = test::TestRequest::post()
        .uri(&submit_uri)
        .cookie(respondent.clone())
        .set_json(&json!({ "answers": answers, "invitation_token": token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["answer_count"], 1);

    // The invitation is spent.
    let req = test::TestRequest::get()
        .uri(&format!("/api/public/invite/{}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
}
