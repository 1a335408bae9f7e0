use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::user::User;

pub async fn find_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Inserts a user and returns the new id. Uniqueness is enforced by the
/// schema; callers check first to pick the right message.
pub async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn create_session(
    pool: &SqlitePool,
    token_digest: &str,
    user_id: i64,
    ttl_days: i64,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO auth_sessions (token_digest, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_digest)
    .bind(user_id)
    .bind(now)
    .bind(now + Duration::days(ttl_days))
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(FromRow)]
struct SessionRecord {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Resolves a session digest to its user. Expired sessions resolve to `None`.
pub async fn find_session_user(
    pool: &SqlitePool,
    token_digest: &str,
) -> Result<Option<User>, sqlx::Error> {
    let record = sqlx::query_as::<_, SessionRecord>(
        "SELECT user_id, expires_at FROM auth_sessions WHERE token_digest = ?",
    )
    .bind(token_digest)
    .fetch_optional(pool)
    .await?;

    match record {
        Some(r) if r.expires_at > Utc::now() => find_user_by_id(pool, r.user_id).await,
        _ => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, token_digest: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM auth_sessions WHERE token_digest = ?")
        .bind(token_digest)
        .execute(pool)
        .await?;
    Ok(())
}
