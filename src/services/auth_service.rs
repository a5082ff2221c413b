use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use thiserror::Error;

use crate::{db::DbPool, dto::auth::RegisterRequest, models::User};

const USERNAME_MAX_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {0}")]
    InvalidField(&'static str),

    #[error("password hashing error")]
    PasswordHash,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Hash verified when the username is unknown, so both misses cost the same.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("not-a-real-password").ok());

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn password_matches(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_string())
}

pub async fn register_user(pool: &DbPool, payload: RegisterRequest) -> Result<User, AuthError> {
    let username = required(&payload.username, "username")?;
    let first_name = required(&payload.first_name, "first name")?;
    let last_name = required(&payload.last_name, "last name")?;
    let email = required(&payload.email, "email")?;
    if payload.password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(AuthError::InvalidField("username"));
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidField("email"));
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHash)??;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, first_name, last_name, email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, password_hash, first_name, last_name, email
        "#,
    )
    .bind(&username)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return AuthError::DuplicateUsername;
        }
        AuthError::Database(e)
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// The user when `password` matches the stored hash; `None` for a wrong
/// password and for an unknown username alike.
pub async fn verify_credentials(
    pool: &DbPool,
    username: &str,
    password: &str,
) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, first_name, last_name, email FROM users WHERE username = $1",
    )
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    let stored_hash = match &user {
        Some(user) => Some(user.password_hash.clone()),
        None => DUMMY_HASH.clone(),
    };
    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || {
        stored_hash.is_some_and(|hash| password_matches(&password, &hash))
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?;

    Ok(user.filter(|_| matches))
}

pub async fn find_user(pool: &DbPool, id: i64) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, first_name, last_name, email FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}
