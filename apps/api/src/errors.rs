use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A rejected request that also tells the client where to go next,
    /// e.g. a duplicate username sends the user back to the register form.
    #[error("Conflict: {message}")]
    Conflict { message: String, redirect: String },

    /// The caller must complete another step first (create a profile,
    /// upload a resume, generate a plan).
    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String, redirect: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("AI features are not configured")]
    AiUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn conflict(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn precondition(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        AppError::PreconditionFailed {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    /// The standard "please log in" rejection.
    pub fn login_required() -> Self {
        AppError::Unauthorized("Please log in to access this page.".to_string())
    }
}

/// A JSON body Axum could not accept (wrong content type, bad syntax or a
/// field of the wrong type) is reported like any other invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, redirect) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Conflict { message, redirect } => (
                StatusCode::CONFLICT,
                "CONFLICT",
                message.clone(),
                Some(redirect.clone()),
            ),
            AppError::PreconditionFailed { message, redirect } => (
                StatusCode::CONFLICT,
                "PRECONDITION_FAILED",
                message.clone(),
                Some(redirect.clone()),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                msg.clone(),
                Some("/auth/login".to_string()),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Forbidden".to_string(),
                None,
            ),
            AppError::AiUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI_UNAVAILABLE",
                "AI features are not configured. Please set GEMINI_API_KEY.".to_string(),
                None,
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(redirect) = redirect {
            error["redirect"] = json!(redirect);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unauthorized_points_at_login() {
        let (status, body) = body_json(AppError::login_required()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["redirect"], "/auth/login");
    }

    #[tokio::test]
    async fn test_precondition_carries_redirect() {
        let (status, body) = body_json(AppError::precondition(
            "Please create your profile first.",
            "/profile/create",
        ))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PRECONDITION_FAILED");
        assert_eq!(body["error"]["redirect"], "/profile/create");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, body) =
            body_json(AppError::Internal(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"]["message"].as_str().unwrap().contains("disk"));
        assert!(body["error"].get("redirect").is_none());
    }
}
