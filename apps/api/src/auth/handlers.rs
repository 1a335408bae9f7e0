use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{
    expired_session_cookie, new_token, session_cookie, session_token, token_digest, CurrentUser,
};
use crate::auth::store;
use crate::errors::AppError;
use crate::models::user::{MAX_EMAIL_CHARS, MAX_USERNAME_CHARS};
use crate::routes::notice::ActionResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn already_logged_in() -> Response {
    Json(ActionResponse::info("You are already logged in.").redirect_to("/")).into_response()
}

/// Starts a login session and returns the cookie to set.
async fn start_session(state: &AppState, user_id: i64) -> Result<String, AppError> {
    let token = new_token();
    let digest = token_digest(&state.config.secret_key, &token)?;
    store::create_session(&state.db, &digest, user_id, state.config.session_ttl_days).await?;
    Ok(session_cookie(
        &token,
        state.config.session_ttl_days,
        state.config.cookie_secure,
    ))
}

/// Only local absolute paths are honoured as post-login destinations.
fn safe_next(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

/// POST /auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(already_logged_in());
    }

    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "Username, email and password are required.".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters."
        )));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(AppError::Validation(format!(
            "Email must be at most {MAX_EMAIL_CHARS} characters."
        )));
    }
    if form.password != form.confirm_password {
        return Err(AppError::Validation("Passwords do not match!".to_string()));
    }

    if store::find_user_by_username(&state.db, username).await?.is_some() {
        return Err(AppError::conflict(
            "Username already taken. Please choose another.",
            "/auth/register",
        ));
    }
    if store::find_user_by_email(&state.db, email).await?.is_some() {
        return Err(AppError::conflict(
            "Email already registered. Please log in.",
            "/auth/login",
        ));
    }

    let password_hash = hash_password(&form.password)?;
    let user_id = match store::insert_user(&state.db, username, email, &password_hash).await {
        Ok(id) => id,
        // Lost a race with a concurrent registration of the same name/email.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::conflict(
                "Username or email already registered.",
                "/auth/register",
            ))
        }
        Err(e) => return Err(e.into()),
    };
    info!("Registered user {user_id} ({username})");

    let cookie = start_session(&state, user_id).await?;
    let body = ActionResponse::success("Your account has been created! Please create your profile.")
        .redirect_to("/profile/create");

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(already_logged_in());
    }

    let user = store::find_user_by_email(&state.db, form.email.trim()).await?;
    let user = match user {
        Some(u) if verify_password(&form.password, &u.password_hash) => u,
        _ => {
            return Err(AppError::Unauthorized(
                "Login Unsuccessful. Please check email and password".to_string(),
            ))
        }
    };
    info!("User {} logged in", user.id);

    let cookie = start_session(&state, user.id).await?;
    let body = ActionResponse::success("Login Successful!").redirect_to(safe_next(query.next));

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// GET|POST /auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        let digest = token_digest(&state.config.secret_key, token)?;
        store::delete_session(&state.db, &digest).await?;
    }
    let body = ActionResponse::info("You have been logged out.").redirect_to("/");
    Ok(([(header::SET_COOKIE, expired_session_cookie())], Json(body)).into_response())
}
