use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Duration;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::auth::store;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// A fresh opaque session token handed to the browser.
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}

/// The value stored server-side for a token: hex HMAC-SHA256 keyed with the
/// application secret. The raw token never reaches the database.
pub fn token_digest(secret: &str, token: &str) -> Result<String, AppError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid session key: {e}")))?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn session_cookie(token: &str, ttl_days: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        Duration::days(ttl_days).num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Finds the session token among all `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty())
}

/// The logged-in user. Handlers that take this extractor reject anonymous
/// callers with 401 and a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = session_token(&parts.headers).ok_or_else(AppError::login_required)?;
        let digest = token_digest(&state.config.secret_key, token)?;
        let user = store::find_session_user(&state.db, &digest)
            .await?
            .ok_or_else(AppError::login_required)?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_digest_is_keyed() {
        let a = token_digest("secret-a", "token").unwrap();
        let b = token_digest("secret-b", "token").unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, token_digest("secret-a", "token").unwrap());
    }

    #[test]
    fn test_token_digest_accepts_any_key_length() {
        assert!(token_digest("", "token").is_ok());
        assert!(token_digest(&"k".repeat(500), "token").is_ok());
    }

    #[test]
    fn test_session_token_found_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; sessionish=no"),
        );
        assert_eq!(session_token(&headers), Some("abc-123"));
    }

    #[test]
    fn test_session_token_ignores_lookalike_names() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid=zzz"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_empty_session_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("tok", 30, true);
        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!session_cookie("tok", 30, false).contains("Secure"));
    }
}
