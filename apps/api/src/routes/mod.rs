pub mod health;
pub mod notice;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::career::handlers as career;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();
    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/auth/register", post(auth::handle_register))
        .route("/auth/login", post(auth::handle_login))
        .route(
            "/auth/logout",
            get(auth::handle_logout).post(auth::handle_logout),
        )
        // Profile
        .route("/profile/create", post(profile::handle_create_profile))
        .route("/profile/view", get(profile::handle_view_profile))
        .route(
            "/profile/edit",
            get(profile::handle_get_edit_profile).post(profile::handle_edit_profile),
        )
        .route("/profile/parse_resume", post(profile::handle_parse_resume))
        .route(
            "/profile/resume/:user_id/download",
            get(profile::handle_download_resume),
        )
        // Career advisor chat
        .route("/career/chat", get(career::handle_chat_page))
        .route("/career/api/chat", post(career::handle_chat))
        .route(
            "/career/api/load_messages/:session_id",
            get(career::handle_load_messages),
        )
        .route(
            "/career/api/chat_session/:session_id/rename",
            post(career::handle_rename_session),
        )
        .route(
            "/career/api/chat_session/:session_id/delete",
            post(career::handle_delete_session),
        )
        .route(
            "/career/api/chat_session/:session_id/autoname",
            post(career::handle_autoname_session),
        )
        // Career plans
        .route("/career/tracker", get(career::handle_tracker))
        .route("/career/generate_plan", post(career::handle_generate_plan_form))
        .route(
            "/career/api/generate_career_plan",
            post(career::handle_generate_plan_api),
        )
        .route(
            "/career/api/clear_career_plan",
            post(career::handle_clear_plan),
        )
        .route(
            "/career/complete_task/:task_id",
            post(career::handle_complete_task),
        )
        // Resume tailoring
        .route(
            "/career/tailor_resume",
            get(career::handle_tailor_page).post(career::handle_tailor_resume),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
