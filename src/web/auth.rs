use super::resources::UserResource;
use super::{respond, respond_message};
use crate::auth::{authenticate, register, Credentials, NewAccount};
use crate::db::get_db_pool;
use crate::error::SurveyError;
use crate::middleware::{ClientCtx, SESSION_USER_KEY};
use crate::orm::users;
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::EntityTrait;
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_register)
        .service(post_login)
        .service(post_logout)
        .service(view_me);
}

#[derive(Serialize)]
struct AccountPayload {
    user: UserResource,
}

fn start_session(session: &Session, user: &users::Model) -> Result<(), SurveyError> {
    session.renew();
    session
        .insert(SESSION_USER_KEY, user.id)
        .map_err(|e| SurveyError::Internal(format!("Failed to write session: {}", e)))
}

#[post("/api/register")]
pub async fn post_register(
    session: Session,
    body: web::Json<NewAccount>,
) -> Result<HttpResponse, SurveyError> {
    let user = register(get_db_pool(), body.into_inner(), Utc::now().naive_utc()).await?;
    start_session(&session, &user)?;

    Ok(respond(
        StatusCode::CREATED,
        "User registered successfully",
        AccountPayload {
            user: UserResource::from(&user),
        },
    ))
}

#[post("/api/login")]
pub async fn post_login(
    session: Session,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, SurveyError> {
    let user = authenticate(get_db_pool(), &body).await?;
    start_session(&session, &user)?;
    log::info!("User {} logged in", user.id);

    Ok(respond(
        StatusCode::OK,
        "Login successful",
        AccountPayload {
            user: UserResource::from(&user),
        },
    ))
}

#[post("/api/logout")]
pub async fn post_logout(client: ClientCtx, session: Session) -> Result<HttpResponse, SurveyError> {
    session.purge();
    log::info!("User {} logged out", client.get_id());

    Ok(respond_message("Logged out successfully"))
}

#[get("/api/me")]
pub async fn view_me(client: ClientCtx) -> Result<HttpResponse, SurveyError> {
    let user = users::Entity::find_by_id(client.get_id())
        .one(get_db_pool())
        .await?
        .ok_or_else(|| SurveyError::not_found("User not found."))?;

    Ok(respond(
        StatusCode::OK,
        "Current user.",
        AccountPayload {
            user: UserResource::from(&user),
        },
    ))
}
