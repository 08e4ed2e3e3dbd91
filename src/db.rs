//! Database pool and schema bootstrap.

use crate::orm::{
    question_options, questions, survey_answers, survey_invitations, survey_responses, surveys,
    users,
};
use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Returns the global connection pool.
///
/// Panics if `init_db` has not been called.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("DB_POOL not initialized")
}

/// Connects to the database and stores the pool globally.
pub async fn init_db(database_url: String) -> &'static DatabaseConnection {
    let db = connect(&database_url)
        .await
        .expect("Failed to connect to database.");

    if DB_POOL.set(db).is_err() {
        log::warn!("DB_POOL was already initialized; keeping the existing pool");
    }

    get_db_pool()
}

/// Opens a connection pool without touching global state.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    // Every connection to `sqlite::memory:` is its own database.
    if database_url.contains(":memory:") {
        opt.max_connections(1).min_connections(1);
    }

    Database::connect(opt).await
}

/// Creates every table and unique index the engine relies on.
///
/// Safe to run on every startup: all statements are `IF NOT EXISTS`.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    // Parents before children for foreign keys.
    create_table(db, users::Entity).await?;
    create_table(db, surveys::Entity).await?;
    create_table(db, questions::Entity).await?;
    create_table(db, question_options::Entity).await?;
    create_table(db, survey_invitations::Entity).await?;
    create_table(db, survey_responses::Entity).await?;
    create_table(db, survey_answers::Entity).await?;

    let indexes = [
        "CREATE UNIQUE INDEX IF NOT EXISTS survey_responses_survey_respondent_unique
            ON survey_responses (survey_id, respondent_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS survey_invitations_survey_email_unique
            ON survey_invitations (survey_id, email)",
        "CREATE INDEX IF NOT EXISTS survey_answers_response_idx
            ON survey_answers (response_id)",
    ];

    for sql in indexes {
        db.execute(Statement::from_string(backend, sql.to_string()))
            .await?;
    }

    log::info!("Database schema is up to date");

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();

    db.execute(backend.build(&stmt)).await?;

    Ok(())
}

/// Whether a store error is a unique-constraint collision.
///
/// The driver only surfaces these as text, so the known messages of each
/// supported backend are matched.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let message = match err {
        DbErr::Exec(msg) | DbErr::Query(msg) | DbErr::Conn(msg) | DbErr::Custom(msg) => msg,
        _ => return false,
    };
    let message = message.to_lowercase();

    message.contains("duplicate key value")
        || message.contains("unique constraint failed")
        || message.contains("duplicate entry")
}
