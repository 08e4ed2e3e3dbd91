use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use surveyor::db::{get_db_pool, init_db, migrate};
use surveyor::notifications::{InvitationNotifier, MailNotifier};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    surveyor::app_config::init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set.")?;
    init_db(database_url).await;
    migrate(get_db_pool())
        .await
        .context("Failed to apply the database schema")?;

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!(
                "SECRET_KEY was invalid ({:?}). Session cookies will not survive a restart. A secret key must be at least 64 bytes long.",
                other.map(|k| format!("{} bytes", k.len()))
            );
            Key::from(random_string.as_bytes())
        }
    };

    let notifier: Arc<dyn InvitationNotifier> = Arc::new(MailNotifier::from_config());
    let bind = surveyor::app_config::server().bind;
    log::info!("Listening on {}", bind);

    HttpServer::new(move || {
        // Middleware runs in reverse registration order.
        App::new()
            .app_data(Data::from(notifier.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false)
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .configure(surveyor::web::configure)
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
