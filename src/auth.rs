//! Account registration and password login.

use crate::db::is_unique_violation;
use crate::error::{SurveyError, SurveyResult};
use crate::orm::users::{self, Role};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::NaiveDateTime;
use rand::rngs::OsRng;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};
use serde::Deserialize;
use validator::Validate;

const BAD_CREDENTIALS: &str = "The provided credentials are incorrect.";
const EMAIL_TAKEN: &str = "The email has already been taken.";

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 1000,
        message = "The password field must be at least 8 characters."
    ))]
    pub password: String,
    pub role: Role,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

pub fn hash_password(password: &str) -> SurveyResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SurveyError::Internal(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for a stored value that is not a PHC hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Creates a creator or respondent account. Admins are never self-registered.
pub async fn register(
    db: &DatabaseConnection,
    account: NewAccount,
    now: NaiveDateTime,
) -> SurveyResult<users::Model> {
    account.validate()?;

    let name = account.name.trim();
    if name.is_empty() {
        return Err(SurveyError::validation("name", "The name field is required."));
    }

    match account.role {
        Role::Creator | Role::Respondent => {}
        Role::Admin => {
            return Err(SurveyError::validation("role", "The selected role is invalid."))
        }
    }

    let email = account.email.trim().to_lowercase();
    let taken = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(SurveyError::validation("email", EMAIL_TAKEN));
    }

    let user = users::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email),
        password: Set(hash_password(&account.password)?),
        role: Set(account.role),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            SurveyError::validation("email", EMAIL_TAKEN)
        } else {
            SurveyError::from(e)
        }
    })?;

    log::info!("Registered user {} as {:?}", user.id, user.role);

    Ok(user)
}

/// Resolves an email and password pair to its account.
///
/// Unknown emails and wrong passwords fail identically.
pub async fn authenticate(
    db: &DatabaseConnection,
    credentials: &Credentials,
) -> SurveyResult<users::Model> {
    credentials.validate()?;

    let email = credentials.email.trim().to_lowercase();
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    match user {
        Some(user) if verify_password(&credentials.password, &user.password) => Ok(user),
        _ => {
            log::debug!("Login failure for {}", email);
            Err(SurveyError::validation("email", BAD_CREDENTIALS))
        }
    }
}
