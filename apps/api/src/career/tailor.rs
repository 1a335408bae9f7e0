//! Resume tailoring: sentence-level edit suggestions for a job description.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::career::prompts::tailor_prompt;
use crate::llm_client::json_recovery::parse_lenient_object;
use crate::llm_client::{preview, GenerationOptions, TextGenerator};
use crate::models::profile::ProfileContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeEdit {
    pub section: String,
    pub original: String,
    pub suggested: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailoringSuggestions {
    pub summary: String,
    pub edits: Vec<ResumeEdit>,
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn objects<'a>(data: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    data.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Keeps edits that name a section and a suggestion. When none survive, an
/// older `points: [{heading, details}]` answer is converted instead.
pub fn normalize_suggestions(data: &Map<String, Value>) -> TailoringSuggestions {
    let mut edits: Vec<ResumeEdit> = objects(data, "edits")
        .map(|e| ResumeEdit {
            section: text_field(e, "section"),
            original: text_field(e, "original"),
            suggested: text_field(e, "suggested"),
            reason: text_field(e, "reason"),
        })
        .filter(|e| !e.section.is_empty() && !e.suggested.is_empty())
        .collect();

    if edits.is_empty() {
        edits = objects(data, "points")
            .map(|p| (text_field(p, "heading"), text_field(p, "details")))
            .filter(|(heading, details)| !heading.is_empty() && !details.is_empty())
            .map(|(section, suggested)| ResumeEdit {
                section,
                original: String::new(),
                suggested,
                reason: String::new(),
            })
            .collect();
    }

    TailoringSuggestions {
        summary: text_field(data, "summary"),
        edits,
    }
}

/// Asks the provider how to adapt the resume to the job description.
/// `None` when AI is not configured, the call fails or no object comes back.
pub async fn tailor_resume_with_ai(
    llm: Option<&dyn TextGenerator>,
    resume_text: &str,
    job_description: &str,
    profile: Option<&ProfileContext>,
) -> Option<TailoringSuggestions> {
    let llm = llm?;
    let prompt = tailor_prompt(resume_text, job_description, profile);

    let raw = match llm.generate(&prompt, &GenerationOptions::json()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Resume tailoring call failed: {e}");
            return None;
        }
    };

    match parse_lenient_object(&raw) {
        Some(data) => Some(normalize_suggestions(&data)),
        None => {
            warn!("Tailoring output was not a JSON object. Raw preview: {}", preview(&raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedGenerator;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_edits_without_section_or_suggestion_dropped() {
        let data = as_map(json!({
            "summary": "  Focus on data pipelines. ",
            "edits": [
                {"section": "Experience", "original": "Did ETL", "suggested": "Built Spark ETL", "reason": "keywords"},
                {"section": "", "suggested": "orphan"},
                {"section": "Skills", "suggested": "   "},
                "junk"
            ]
        }));
        let out = normalize_suggestions(&data);
        assert_eq!(out.summary, "Focus on data pipelines.");
        assert_eq!(out.edits.len(), 1);
        assert_eq!(out.edits[0].suggested, "Built Spark ETL");
    }

    #[test]
    fn test_legacy_points_converted() {
        let data = as_map(json!({
            "points": [
                {"heading": "Skills", "details": "Add Airflow"},
                {"heading": "", "details": "ignored"}
            ]
        }));
        let out = normalize_suggestions(&data);
        assert_eq!(out.summary, "");
        assert_eq!(
            out.edits,
            vec![ResumeEdit {
                section: "Skills".to_string(),
                original: String::new(),
                suggested: "Add Airflow".to_string(),
                reason: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_tailor_reads_fenced_object() {
        let llm = ScriptedGenerator::new([
            "```json\n{\"summary\": \"ok\", \"edits\": [{\"section\": \"Summary\", \"suggested\": \"New\"}]}\n```",
        ]);
        let out = tailor_resume_with_ai(Some(&llm as &dyn TextGenerator), "resume", "jd", None)
            .await
            .unwrap();
        assert_eq!(out.edits[0].section, "Summary");
        assert!(llm.prompts.lock().unwrap()[0].contains("Job Description:\njd"));
    }

    #[tokio::test]
    async fn test_tailor_failures_yield_none() {
        assert!(tailor_resume_with_ai(None, "r", "jd", None).await.is_none());
        let llm = ScriptedGenerator::new(["not json"]);
        assert!(
            tailor_resume_with_ai(Some(&llm as &dyn TextGenerator), "r", "jd", None)
                .await
                .is_none()
        );
    }
}
