use axum::Json;
use serde_json::{json, Value};

use crate::auth::CurrentUser;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME")
    }))
}

/// GET /
/// Service index: where to go next depending on whether the caller is logged in.
pub async fn index_handler(user: Option<CurrentUser>) -> Json<Value> {
    let user = user.map(|CurrentUser(u)| json!({ "id": u.id, "username": u.username }));
    let next = if user.is_some() { "/career/chat" } else { "/auth/login" };
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "logged_in": user.is_some(),
        "user": user,
        "next": next
    }))
}
