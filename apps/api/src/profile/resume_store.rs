//! Filesystem storage for uploaded resumes.
//!
//! Each user has at most one PDF (`uploads/user_<id>_resume.pdf`) and one JSON
//! sidecar (`user_data/user_<id>_resume.json`) holding the extracted text and
//! whatever the AI parser made of it.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSidecar {
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub ai_parsed: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ResumeStore {
    upload_dir: PathBuf,
    user_data_dir: PathBuf,
}

/// Only `.pdf` uploads are accepted (extension check, case-insensitive).
pub fn is_allowed_resume(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extracts text from PDF bytes on the blocking pool. Unreadable documents,
/// including ones that make the extractor panic, yield an empty string.
pub async fn extract_pdf_text(bytes: Bytes) -> String {
    let result =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
    match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e}");
            String::new()
        }
        Err(e) => {
            warn!("PDF text extraction aborted: {e}");
            String::new()
        }
    }
}

pub async fn extract_pdf_text_from_file(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => extract_pdf_text(Bytes::from(bytes)).await,
        Err(e) => {
            warn!("Could not read resume {}: {e}", path.display());
            String::new()
        }
    }
}

impl ResumeStore {
    pub fn new(upload_dir: PathBuf, user_data_dir: PathBuf) -> Self {
        Self {
            upload_dir,
            user_data_dir,
        }
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.user_data_dir).await
    }

    pub fn resume_path(&self, user_id: i64) -> PathBuf {
        self.upload_dir.join(format!("user_{user_id}_resume.pdf"))
    }

    pub fn sidecar_path(&self, user_id: i64) -> PathBuf {
        self.user_data_dir.join(format!("user_{user_id}_resume.json"))
    }

    /// Stores the PDF, extracts its text and resets the sidecar
    /// (`ai_parsed = null`). Returns the stored PDF path.
    pub async fn save_resume(&self, user_id: i64, pdf: Bytes) -> io::Result<PathBuf> {
        self.ensure_dirs().await?;

        let path = self.resume_path(user_id);
        tokio::fs::write(&path, &pdf).await?;

        let extracted_text = extract_pdf_text(pdf).await;
        info!(
            "Stored resume for user {user_id} ({} chars extracted)",
            extracted_text.chars().count()
        );
        self.write_sidecar(
            user_id,
            &ResumeSidecar {
                extracted_text,
                ai_parsed: None,
            },
        )
        .await?;

        Ok(path)
    }

    /// The sidecar, or `None` when missing or unreadable.
    pub async fn read_sidecar(&self, user_id: i64) -> Option<ResumeSidecar> {
        let raw = tokio::fs::read(self.sidecar_path(user_id)).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(sidecar) => Some(sidecar),
            Err(e) => {
                warn!("Resume sidecar for user {user_id} is corrupt: {e}");
                None
            }
        }
    }

    pub async fn write_sidecar(&self, user_id: i64, sidecar: &ResumeSidecar) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.user_data_dir).await?;
        let json = serde_json::to_vec_pretty(sidecar).map_err(io::Error::other)?;
        tokio::fs::write(self.sidecar_path(user_id), json).await
    }

    /// Extracted resume text from the sidecar; empty when unavailable.
    pub async fn load_extracted_text(&self, user_id: i64) -> String {
        self.read_sidecar(user_id)
            .await
            .map(|s| s.extracted_text)
            .unwrap_or_default()
    }
}
