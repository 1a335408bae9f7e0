//! Turns a stored resume's extracted text into structured fields with the AI
//! provider. Best effort: every failure path returns `None`.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm_client::json_recovery::extract_json_object;
use crate::llm_client::prompts::STRICT_JSON_RETRY;
use crate::llm_client::{preview, GenerationOptions, TextGenerator};
use crate::profile::prompts::resume_parse_prompt;
use crate::profile::resume_store::ResumeStore;

/// Parses the user's resume and records the result in the sidecar.
///
/// Returns `None` when there is no sidecar or no extracted text, when AI is
/// not configured, or when neither the first answer nor one strict-JSON retry
/// yields an object.
pub async fn parse_resume_with_ai(
    store: &ResumeStore,
    llm: Option<&dyn TextGenerator>,
    user_id: i64,
) -> Option<Map<String, Value>> {
    let mut sidecar = store.read_sidecar(user_id).await?;
    if sidecar.extracted_text.trim().is_empty() {
        return None;
    }
    let llm = llm?;

    let prompt = resume_parse_prompt(&sidecar.extracted_text);
    let options = GenerationOptions::json();

    let first = match llm.generate(&prompt, &options).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Resume parsing call failed for user {user_id}: {e}");
            return None;
        }
    };

    let parsed = match extract_json_object(&first) {
        Some(obj) => obj,
        None => {
            let retry_prompt = format!("{prompt}\n\n{STRICT_JSON_RETRY}");
            let retry = llm.generate(&retry_prompt, &options).await.unwrap_or_default();
            match extract_json_object(&retry) {
                Some(obj) => obj,
                None => {
                    warn!(
                        "Model did not return valid JSON for user {user_id}'s resume. Raw preview: {}",
                        preview(&first)
                    );
                    return None;
                }
            }
        }
    };

    sidecar.ai_parsed = Some(Value::Object(parsed.clone()));
    if let Err(e) = store.write_sidecar(user_id, &sidecar).await {
        warn!("Could not store parsed resume for user {user_id}: {e}");
        return None;
    }
    info!("Parsed resume for user {user_id}");
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedGenerator;
    use crate::profile::resume_store::ResumeSidecar;

    async fn store_with_text(text: &str) -> (tempfile::TempDir, ResumeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::new(dir.path().join("uploads"), dir.path().join("user_data"));
        store
            .write_sidecar(
                1,
                &ResumeSidecar {
                    extracted_text: text.to_string(),
                    ai_parsed: None,
                },
            )
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_parsed_fields_are_saved_to_sidecar() {
        let (_dir, store) = store_with_text("Ada Lovelace, analyst").await;
        let llm = ScriptedGenerator::new(["```json\n{\"name\": \"Ada Lovelace\", \"skills\": [\"math\"]}\n```"]);

        let parsed = parse_resume_with_ai(&store, Some(&llm as &dyn TextGenerator), 1).await.unwrap();

        assert_eq!(parsed["name"], "Ada Lovelace");
        let sidecar = store.read_sidecar(1).await.unwrap();
        assert_eq!(sidecar.ai_parsed.unwrap()["skills"][0], "math");
        assert!(llm.prompts.lock().unwrap()[0].contains("Ada Lovelace, analyst"));
    }

    #[tokio::test]
    async fn test_retries_once_with_strict_instruction() {
        let (_dir, store) = store_with_text("Some resume").await;
        let llm = ScriptedGenerator::new(["I think the name is Ada.", "{\"name\": \"Ada\"}"]);

        let parsed = parse_resume_with_ai(&store, Some(&llm as &dyn TextGenerator), 1).await.unwrap();

        assert_eq!(parsed["name"], "Ada");
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("STRICT JSON"));
    }

    #[tokio::test]
    async fn test_gives_up_after_retry() {
        let (_dir, store) = store_with_text("Some resume").await;
        let llm = ScriptedGenerator::new(["nope", "still nope"]);

        assert!(parse_resume_with_ai(&store, Some(&llm as &dyn TextGenerator), 1).await.is_none());
        assert!(store.read_sidecar(1).await.unwrap().ai_parsed.is_none());
    }

    #[tokio::test]
    async fn test_skips_ai_without_text_or_model() {
        let (_dir, store) = store_with_text("   ").await;
        let llm = ScriptedGenerator::new(["{}"]);
        assert!(parse_resume_with_ai(&store, Some(&llm as &dyn TextGenerator), 1).await.is_none());
        assert_eq!(llm.prompt_count(), 0);

        let (_dir2, store2) = store_with_text("Real text").await;
        assert!(parse_resume_with_ai(&store2, None, 1).await.is_none());
        assert!(parse_resume_with_ai(&store2, Some(&llm as &dyn TextGenerator), 99).await.is_none());
    }
}
