//! Axum route handlers for the Profile API.

use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::profile::resume_parser::parse_resume_with_ai;
use crate::profile::resume_store::is_allowed_resume;
use crate::profile::store::{find_profile, insert_profile, update_profile, ProfileFields};
use crate::routes::notice::{ActionResponse, Level};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Raw multipart submission of the create/edit profile form.
#[derive(Debug, Default)]
pub struct ProfileSubmission {
    pub name: String,
    pub place: String,
    pub user_type: String,
    pub organization_name: Option<String>,
    pub detail_1: String,
    pub detail_2: String,
    pub interests: Option<String>,
    pub hobbies: Option<String>,
    pub additional_info: Option<String>,
    pub resume: Option<ResumeUpload>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Profile,
    /// Fields the AI extracted from the resume, if any.
    pub parsed: Option<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Form handling
// ────────────────────────────────────────────────────────────────────────────

/// Joins the two detail inputs, each followed by a newline, skipping blanks.
pub fn combine_details(detail_1: &str, detail_2: &str) -> String {
    [detail_1, detail_2]
        .iter()
        .filter(|d| !d.is_empty())
        .map(|d| format!("{d}\n"))
        .collect()
}

fn optional_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

pub async fn read_submission(mut multipart: Multipart) -> Result<ProfileSubmission, AppError> {
    let mut submission = ProfileSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume_file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read resume upload: {e}")))?;
            // Browsers send an empty part when no file was chosen.
            if !filename.is_empty() {
                submission.resume = Some(ResumeUpload { filename, bytes });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))?;
        match name.as_str() {
            "name" => submission.name = value.trim().to_string(),
            "place" => submission.place = value.trim().to_string(),
            "user_type" => submission.user_type = value.trim().to_string(),
            "organization_name" => submission.organization_name = optional_text(value),
            "detail_1" => submission.detail_1 = value.trim().to_string(),
            "detail_2" => submission.detail_2 = value.trim().to_string(),
            "interests" => submission.interests = optional_text(value),
            "hobbies" => submission.hobbies = optional_text(value),
            "additional_info" => submission.additional_info = optional_text(value),
            _ => {}
        }
    }

    Ok(submission)
}

impl ProfileSubmission {
    /// Validates required fields and the resume type, splitting off the upload.
    pub fn validate(self) -> Result<(ProfileFields, Option<ResumeUpload>), AppError> {
        if self.name.is_empty() || self.user_type.is_empty() {
            return Err(AppError::Validation(
                "Full Name and \"I am a\" are required fields.".to_string(),
            ));
        }
        if let Some(upload) = &self.resume {
            if !is_allowed_resume(&upload.filename) {
                return Err(AppError::Validation("Resume must be a PDF file.".to_string()));
            }
        }

        let fields = ProfileFields {
            details: combine_details(&self.detail_1, &self.detail_2),
            name: self.name,
            place: self.place,
            user_type: self.user_type,
            organization_name: self.organization_name,
            interests: self.interests,
            hobbies: self.hobbies,
            additional_info: self.additional_info,
        };
        Ok((fields, self.resume))
    }
}

/// Stores an uploaded resume and parses it right away. Returns the stored
/// path and the notice describing how parsing went.
async fn store_and_parse(
    state: &AppState,
    user_id: i64,
    upload: ResumeUpload,
) -> Result<(String, Level, &'static str), AppError> {
    let path = state.resumes.save_resume(user_id, upload.bytes).await?;
    let parsed = parse_resume_with_ai(&state.resumes, state.llm(), user_id).await;
    let (level, message) = match parsed {
        Some(_) => (Level::Success, "Resume uploaded and parsed successfully."),
        None => (
            Level::Warning,
            "Resume uploaded but parsing failed. You can try \"Parse Resume\" later.",
        ),
    };
    Ok((path.to_string_lossy().into_owned(), level, message))
}

/// Loads the caller's profile or asks them to create one first.
pub async fn require_profile(pool: &SqlitePool, user_id: i64) -> Result<Profile, AppError> {
    find_profile(pool, user_id).await?.ok_or_else(|| {
        AppError::precondition("Please create your profile first.", "/profile/create")
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /profile/create
pub async fn handle_create_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    if find_profile(&state.db, user.id()).await?.is_some() {
        return Err(AppError::conflict("You already have a profile!", "/profile/view"));
    }

    let (fields, upload) = read_submission(multipart).await?.validate()?;

    let mut resume_notice = None;
    let mut resume_path = None;
    if let Some(upload) = upload {
        let (path, level, message) = store_and_parse(&state, user.id(), upload).await?;
        resume_path = Some(path);
        resume_notice = Some((level, message));
    }

    insert_profile(&state.db, user.id(), &fields, resume_path.as_deref()).await?;
    tracing::info!("Created profile for user {}", user.id());

    let mut body = ActionResponse::success("Your profile has been created!");
    if let Some((level, message)) = resume_notice {
        body = body.notice(level, message);
    }
    Ok(Json(body.redirect_to("/profile/view")))
}

/// GET /profile/view
pub async fn handle_view_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileView>, AppError> {
    let profile = require_profile(&state.db, user.id()).await?;
    let parsed = state
        .resumes
        .read_sidecar(profile.user_id)
        .await
        .and_then(|s| s.ai_parsed);
    Ok(Json(ProfileView { profile, parsed }))
}

/// GET /profile/edit
///
/// Returns the stored profile so the client can prefill the edit form.
pub async fn handle_get_edit_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(require_profile(&state.db, user.id()).await?))
}

/// POST /profile/edit
pub async fn handle_edit_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    require_profile(&state.db, user.id()).await?;

    let (fields, upload) = read_submission(multipart).await?.validate()?;

    let mut resume_notice = None;
    let mut new_resume_path = None;
    if let Some(upload) = upload {
        let (path, level, message) = store_and_parse(&state, user.id(), upload).await?;
        new_resume_path = Some(path);
        resume_notice = Some((level, message));
    }

    update_profile(&state.db, user.id(), &fields, new_resume_path.as_deref()).await?;

    let mut body = ActionResponse::success("Your profile has been updated!");
    if let Some((level, message)) = resume_notice {
        body = body.notice(level, message);
    }
    Ok(Json(body.redirect_to("/profile/view")))
}

/// POST /profile/parse_resume
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ActionResponse>, AppError> {
    let has_resume = find_profile(&state.db, user.id())
        .await?
        .and_then(|p| p.resume_path)
        .is_some();
    if !has_resume {
        return Err(AppError::precondition("No resume to parse.", "/profile/view"));
    }

    let body = match parse_resume_with_ai(&state.resumes, state.llm(), user.id()).await {
        Some(_) => ActionResponse::success("Resume parsed successfully."),
        None => ActionResponse::failure(
            "Failed to parse resume. Check AI configuration or try again.",
        ),
    };
    Ok(Json(body.redirect_to("/profile/view")))
}

/// GET /profile/resume/:user_id/download
pub async fn handle_download_resume(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    if user.id() != user_id {
        return Err(AppError::Forbidden);
    }
    let resume_path = find_profile(&state.db, user_id)
        .await?
        .and_then(|p| p.resume_path)
        .ok_or_else(|| AppError::NotFound("No resume uploaded".to_string()))?;

    let bytes = match tokio::fs::read(&resume_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Resume file is missing".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let filename = FsPath::new(&resume_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume.pdf")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
