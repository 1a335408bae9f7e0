use serde::Serialize;
use sqlx::FromRow;

pub const MAX_USERNAME_CHARS: usize = 20;
pub const MAX_EMAIL_CHARS: usize = 120;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}
