//! Axum route handlers for the career advisor: chat, plans and tailoring.

use std::path::Path as FsPath;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::career::advisor::{
    advisor_reply, conversation_transcript, days_from_text, days_from_value,
    extract_goal_and_days, suggest_session_title, user_consented_to_plan, PLAN_CREATED_NOTE,
};
use crate::career::plan::generate_career_plan;
use crate::career::store;
use crate::career::tailor::{tailor_resume_with_ai, TailoringSuggestions};
use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::models::career::{clamp_career_goal, CareerPlan, DailyTask};
use crate::models::chat::{clamp_session_name, ChatMessage, ChatSession, Sender};
use crate::models::profile::ProfileContext;
use crate::profile::resume_store::extract_pdf_text_from_file;
use crate::profile::store::find_profile;
use crate::routes::notice::{ActionResponse, Level, Notice};
use crate::state::AppState;

const INVALID_SESSION: &str = "Invalid session ID";
const PLAN_FAILED: &str = "Failed to generate career plan. Please try again.";
const TAILOR_FAILED: &str = "Failed to get resume tailoring suggestions. Please try again.";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatPageQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatPage {
    pub sessions: Vec<ChatSession>,
    pub session_id: Option<i64>,
    pub messages: Vec<ChatMessage>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// A number or a numeric string.
    #[serde(default)]
    pub session_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: i64,
    pub plan_generated: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub sender: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlanForm {
    pub career_goal: Option<String>,
    pub days: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePlanRequest {
    #[serde(default)]
    pub career_goal: Option<String>,
    #[serde(default)]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub days: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PlanCreated {
    pub success: bool,
    pub plan_id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub day_number: i64,
    pub task_description: String,
    pub resources: Vec<String>,
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
}

impl From<DailyTask> for TaskView {
    fn from(task: DailyTask) -> Self {
        Self {
            resources: task.resource_list(),
            id: task.id,
            day_number: task.day_number,
            task_description: task.task_description,
            is_completed: task.is_completed,
            completed_date: task.completed_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: CareerPlan,
    pub tasks: Vec<TaskView>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Serialize)]
pub struct TrackerView {
    pub current_plan: Option<PlanView>,
}

#[derive(Debug, Deserialize)]
pub struct TailorForm {
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct TailorView {
    pub ready: bool,
    pub suggestions: Option<TailoringSuggestions>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads an optional session id sent as a number or numeric string. Null and
/// the empty string mean "no session"; anything else unreadable is rejected.
fn session_id_from_value(value: Option<&Value>) -> Result<Option<i64>, AppError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::Validation(INVALID_SESSION.to_string())),
        Some(Value::String(s)) => session_id_from_text(Some(s.as_str())),
        Some(_) => Err(AppError::Validation(INVALID_SESSION.to_string())),
    }
}

fn session_id_from_text(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation(INVALID_SESSION.to_string())),
    }
}

/// A session the caller may post into; anything else is "Invalid session ID".
async fn chat_session_for(
    pool: &SqlitePool,
    session_id: i64,
    user_id: i64,
) -> Result<ChatSession, AppError> {
    store::find_session(pool, session_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| AppError::Validation(INVALID_SESSION.to_string()))
}

/// A session the caller manages: 404 when unknown, 403 when someone else's.
async fn owned_session(
    pool: &SqlitePool,
    session_id: i64,
    user_id: i64,
) -> Result<ChatSession, AppError> {
    let session = store::find_session(pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))?;
    if session.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(session)
}

/// A JSON body that may be left out entirely. A request without a JSON
/// content type gets the defaults; a malformed body is still rejected.
fn optional_json<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

async fn profile_context(pool: &SqlitePool, user_id: i64) -> Result<Option<ProfileContext>, AppError> {
    Ok(find_profile(pool, user_id).await?.map(|p| p.ai_context()))
}

/// Generates a plan and stores it as the user's active plan.
async fn generate_and_store_plan(
    state: &AppState,
    user_id: i64,
    career_goal: Option<&str>,
    days: Option<usize>,
    session_id: Option<i64>,
) -> Result<i64, AppError> {
    let goal = career_goal
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .ok_or_else(|| AppError::Validation("Please provide a career goal.".to_string()))?;
    if let Some(id) = session_id {
        chat_session_for(&state.db, id, user_id).await?;
    }
    let llm = state.llm().ok_or(AppError::AiUnavailable)?;
    let profile = profile_context(&state.db, user_id).await?;

    let plan = generate_career_plan(llm, profile.as_ref(), goal, days)
        .await
        .map_err(|e| {
            warn!("Plan generation failed for user {user_id}: {e}");
            AppError::Llm(PLAN_FAILED.to_string())
        })?;

    let goal = clamp_career_goal(goal);
    let plan_id = store::create_active_plan(&state.db, user_id, &goal, &plan, session_id).await?;
    info!("Created career plan {plan_id} ({} days) for user {user_id}", plan.len());
    Ok(plan_id)
}

/// Turns a consenting chat turn into a stored plan. Every failure is logged
/// and reported as `false`; the chat reply itself is unaffected.
async fn plan_from_conversation(
    state: &AppState,
    user_id: i64,
    session_id: i64,
    profile: Option<&ProfileContext>,
) -> bool {
    let Some(llm) = state.llm() else {
        return false;
    };
    let messages = match store::session_messages(&state.db, session_id).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!("Could not load session {session_id} for plan creation: {e}");
            return false;
        }
    };

    let transcript = conversation_transcript(&messages);
    let Some((goal, days)) = extract_goal_and_days(llm, &transcript, profile).await else {
        info!("No career goal found in session {session_id}");
        return false;
    };

    let plan = match generate_career_plan(llm, profile, &goal, days).await {
        Ok(plan) => plan,
        Err(e) => {
            warn!("Plan generation from chat failed for session {session_id}: {e}");
            return false;
        }
    };

    let goal = clamp_career_goal(&goal);
    match store::create_active_plan(&state.db, user_id, &goal, &plan, Some(session_id)).await {
        Ok(plan_id) => {
            info!("Created career plan {plan_id} from chat session {session_id}");
            true
        }
        Err(e) => {
            warn!("Could not store plan for session {session_id}: {e}");
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat
// ────────────────────────────────────────────────────────────────────────────

/// GET /career/chat
pub async fn handle_chat_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ChatPageQuery>,
) -> Result<Json<ChatPage>, AppError> {
    let sessions = store::list_sessions(&state.db, user.id()).await?;
    let mut notices = Vec::new();

    let requested = match session_id_from_text(query.session_id.as_deref()) {
        Ok(id) => id,
        Err(_) => {
            notices.push(Notice {
                level: Level::Warning,
                message: INVALID_SESSION.to_string(),
            });
            None
        }
    };
    let session_id = match requested {
        Some(id) if sessions.iter().any(|s| s.id == id) => Some(id),
        Some(_) => {
            notices.push(Notice {
                level: Level::Warning,
                message: INVALID_SESSION.to_string(),
            });
            None
        }
        None => None,
    };

    let messages = match session_id {
        Some(id) => store::session_messages(&state.db, id).await?,
        None => Vec::new(),
    };

    Ok(Json(ChatPage {
        sessions,
        session_id,
        messages,
        notices,
    }))
}

/// POST /career/api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body?;
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No message provided".to_string()))?;

    let session = match session_id_from_value(req.session_id.as_ref())? {
        Some(id) => chat_session_for(&state.db, id, user.id()).await?,
        None => store::create_session(&state.db, user.id()).await?,
    };

    let profile = profile_context(&state.db, user.id()).await?;
    let prior = store::session_messages(&state.db, session.id).await?;
    let mut response = advisor_reply(state.llm(), &message, profile.as_ref(), &prior).await;

    store::add_message(&state.db, session.id, Sender::User, &message).await?;
    store::add_message(&state.db, session.id, Sender::Ai, &response).await?;

    let mut plan_generated = false;
    if user_consented_to_plan(&message)
        && plan_from_conversation(&state, user.id(), session.id, profile.as_ref()).await
    {
        plan_generated = true;
        store::add_message(&state.db, session.id, Sender::Ai, PLAN_CREATED_NOTE).await?;
        response = format!("{response}\n\n{PLAN_CREATED_NOTE}").trim().to_string();
    }

    Ok(Json(ChatResponse {
        response,
        session_id: session.id,
        plan_generated,
    }))
}

/// GET /career/api/load_messages/:session_id
pub async fn handle_load_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    chat_session_for(&state.db, session_id, user.id()).await?;
    let messages: Vec<MessageView> = store::session_messages(&state.db, session_id)
        .await?
        .into_iter()
        .map(|m| MessageView {
            sender: m.sender,
            content: m.content,
        })
        .collect();
    Ok(Json(json!({ "messages": messages })))
}

/// POST /career/api/chat_session/:id/rename
pub async fn handle_rename_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    owned_session(&state.db, session_id, user.id()).await?;

    let req = optional_json(body)?;
    let name = req.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AppError::Validation("Name required".to_string()));
    }

    store::rename_session(&state.db, session_id, &clamp_session_name(name)).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /career/api/chat_session/:id/delete
pub async fn handle_delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    owned_session(&state.db, session_id, user.id()).await?;
    store::delete_session(&state.db, session_id).await?;
    info!("Deleted chat session {session_id} for user {}", user.id());
    Ok(Json(json!({ "success": true })))
}

/// POST /career/api/chat_session/:id/autoname
pub async fn handle_autoname_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    owned_session(&state.db, session_id, user.id()).await?;
    let messages = store::session_messages(&state.db, session_id).await?;
    let llm = state.llm().ok_or(AppError::AiUnavailable)?;

    let name = suggest_session_title(llm, &messages)
        .await
        .map_err(|e| match e {
            LlmError::Shape(message) => AppError::Llm(message),
            other => AppError::Llm(format!("AI error: {other}")),
        })?;

    store::rename_session(&state.db, session_id, &name).await?;
    Ok(Json(json!({ "success": true, "name": name })))
}

// ────────────────────────────────────────────────────────────────────────────
// Plans
// ────────────────────────────────────────────────────────────────────────────

/// GET /career/tracker
pub async fn handle_tracker(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TrackerView>, AppError> {
    if !store::has_any_plan(&state.db, user.id()).await? {
        return Err(AppError::precondition(
            "Please generate career path from chat window to get a personalized career plan.",
            "/career/chat",
        ));
    }

    let current_plan = match store::active_plan(&state.db, user.id()).await? {
        Some(plan) => {
            let tasks: Vec<TaskView> = store::plan_tasks(&state.db, plan.id)
                .await?
                .into_iter()
                .map(TaskView::from)
                .collect();
            Some(PlanView {
                completed_tasks: tasks.iter().filter(|t| t.is_completed).count(),
                total_tasks: tasks.len(),
                plan,
                tasks,
            })
        }
        None => None,
    };

    Ok(Json(TrackerView { current_plan }))
}

/// POST /career/generate_plan
pub async fn handle_generate_plan_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<GeneratePlanForm>,
) -> Result<Json<PlanCreated>, AppError> {
    let session_id = session_id_from_text(form.session_id.as_deref())?;
    let days = days_from_text(form.days.as_deref());
    let plan_id = generate_and_store_plan(
        &state,
        user.id(),
        form.career_goal.as_deref(),
        days,
        session_id,
    )
    .await?;

    Ok(Json(PlanCreated {
        success: true,
        plan_id,
        notices: vec![Notice {
            level: Level::Success,
            message: "Your personalized career plan has been generated!".to_string(),
        }],
        redirect: Some("/career/tracker".to_string()),
    }))
}

/// POST /career/api/generate_career_plan
pub async fn handle_generate_plan_api(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<GeneratePlanRequest>, JsonRejection>,
) -> Result<Json<PlanCreated>, AppError> {
    let req = optional_json(body)?;
    let session_id = session_id_from_value(req.session_id.as_ref())?;
    let days = req.days.as_ref().and_then(days_from_value);
    let plan_id = generate_and_store_plan(
        &state,
        user.id(),
        req.career_goal.as_deref(),
        days,
        session_id,
    )
    .await?;

    Ok(Json(PlanCreated {
        success: true,
        plan_id,
        notices: Vec::new(),
        redirect: None,
    }))
}

/// POST /career/api/clear_career_plan
pub async fn handle_clear_plan(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    if store::clear_active_plan(&state.db, user.id()).await? {
        info!("Cleared active plan for user {}", user.id());
        Ok(Json(json!({ "success": true })))
    } else {
        Ok(Json(json!({ "success": true, "message": "No active plan to clear." })))
    }
}

/// POST /career/complete_task/:task_id
pub async fn handle_complete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<Json<ActionResponse>, AppError> {
    let task = store::find_task_owner(&state.db, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    if task.owner_id != user.id() {
        return Err(AppError::Forbidden);
    }

    store::complete_task(&state.db, &task).await?;
    Ok(Json(
        ActionResponse::success("Task marked as complete!").redirect_to("/career/tracker"),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Resume tailoring
// ────────────────────────────────────────────────────────────────────────────

/// Checks the caller can use tailoring and returns their resume text.
async fn tailoring_gate(
    state: &AppState,
    user_id: i64,
) -> Result<(ProfileContext, String), AppError> {
    let profile = find_profile(&state.db, user_id).await?.ok_or_else(|| {
        AppError::precondition("Please create your profile first.", "/profile/create")
    })?;

    let resume_path = match profile.resume_path.as_deref() {
        Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => path.to_string(),
        _ => {
            return Err(AppError::precondition(
                "Please upload your resume (PDF) in your profile before using resume tailoring.",
                "/profile/edit",
            ))
        }
    };

    let mut text = state.resumes.load_extracted_text(user_id).await;
    if text.trim().is_empty() {
        text = extract_pdf_text_from_file(FsPath::new(&resume_path)).await;
    }
    if text.trim().is_empty() {
        return Err(AppError::precondition(
            "Your resume could not be processed. Please re-upload your PDF.",
            "/profile/edit",
        ));
    }

    Ok((profile.ai_context(), text))
}

/// GET /career/tailor_resume
pub async fn handle_tailor_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TailorView>, AppError> {
    tailoring_gate(&state, user.id()).await?;
    Ok(Json(TailorView {
        ready: true,
        suggestions: None,
    }))
}

/// POST /career/tailor_resume
pub async fn handle_tailor_resume(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<TailorForm>,
) -> Result<Json<TailorView>, AppError> {
    let (profile, resume_text) = tailoring_gate(&state, user.id()).await?;

    let job_description = form.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "Please provide a job description.".to_string(),
        ));
    }

    let suggestions =
        tailor_resume_with_ai(state.llm(), &resume_text, job_description, Some(&profile))
            .await
            .ok_or_else(|| AppError::Llm(TAILOR_FAILED.to_string()))?;

    Ok(Json(TailorView {
        ready: true,
        suggestions: Some(suggestions),
    }))
}
