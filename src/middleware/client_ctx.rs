use crate::db::get_db_pool;
use crate::user::Principal;
use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

/// Session key holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Authenticated caller of a route.
///
/// Extracting it fails with 401 when the session carries no user or the
/// user no longer exists.
#[derive(Clone, Debug)]
pub struct ClientCtx {
    principal: Principal,
}

impl ClientCtx {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn get_id(&self) -> i32 {
        self.principal.id
    }
}

/// Provides `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.get_session();

        Box::pin(async move {
            let user_id = session
                .get::<i32>(SESSION_USER_KEY)
                .map_err(|e| {
                    log::warn!("Unreadable session: {}", e);
                    actix_web::error::ErrorUnauthorized("Unauthenticated.")
                })?
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unauthenticated."))?;

            let principal = Principal::get_by_id(get_db_pool(), user_id)
                .await
                .map_err(|e| {
                    log::error!("Failed to load user {}: {}", user_id, e);
                    actix_web::error::ErrorInternalServerError("An internal error occurred.")
                })?
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unauthenticated."))?;

            Ok(ClientCtx::new(principal))
        })
    }
}
