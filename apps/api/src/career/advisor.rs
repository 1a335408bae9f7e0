//! The conversational side of the career advisor: chat replies, consent
//! detection, goal extraction and session titles.

use serde_json::Value;
use tracing::warn;

use crate::career::prompts::{advisor_prompt, goal_extraction_prompt, session_title_prompt};
use crate::llm_client::json_recovery::parse_lenient_object;
use crate::llm_client::{GenerationOptions, LlmError, TextGenerator};
use crate::models::chat::{clamp_session_name, ChatMessage};
use crate::models::profile::ProfileContext;

pub const AI_NOT_CONFIGURED_REPLY: &str =
    "AI features are not configured. Please set GEMINI_API_KEY.";
pub const AI_UNREACHABLE_REPLY: &str =
    "I apologize, but I'm having trouble connecting to the AI at the moment. Please try again later.";
pub const PLAN_CREATED_NOTE: &str = "Plan created in your Tracker.";

pub const MIN_PLAN_DAYS: i64 = 1;
pub const MAX_PLAN_DAYS: i64 = 60;

/// Messages used as context when naming a session.
const TITLE_CONTEXT_MESSAGES: usize = 8;

const NEGATIVE_PHRASES: &[&str] = &[
    "don't", "do not", "not now", "later", "no", "cancel", "stop", "wait",
];

const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes",
    "yep",
    "yeah",
    "ok",
    "okay",
    "sure",
    "please",
    "go ahead",
    "generate",
    "create",
    "proceed",
    "do it",
    "start the plan",
    "make the plan",
    "sounds good",
    "looks good",
    "let's do it",
    "let us do it",
    "let's start",
    "start now",
    "i agree",
    "agree",
    "approved",
    "confirm",
    "confirmed",
    "let's proceed",
    "proceed with plan",
    "ready",
];

fn advisor_options() -> GenerationOptions {
    GenerationOptions {
        max_output_tokens: Some(220),
        temperature: Some(0.6),
        top_p: Some(0.9),
        top_k: Some(40),
        json_response: false,
    }
}

/// Keeps the first `?` and turns every later one into `.`.
pub fn enforce_single_question(text: &str) -> String {
    let mut seen = false;
    text.chars()
        .map(|c| match c {
            '?' if seen => '.',
            '?' => {
                seen = true;
                '?'
            }
            other => other,
        })
        .collect()
}

/// Lowercases, maps everything but letters, digits and apostrophes to spaces
/// and pads both ends, so phrases can be matched as whole words.
fn normalize_for_phrases(text: &str) -> String {
    let body: String = text
        .to_lowercase()
        .replace('\u{2019}', "'")
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    format!(" {} ", body.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {phrase} "))
}

/// True when the message agrees to scheduling a plan: no negative phrase and
/// at least one affirmative one, matched on word boundaries.
pub fn user_consented_to_plan(message: &str) -> bool {
    let normalized = normalize_for_phrases(message);
    if normalized.trim().is_empty() {
        return false;
    }
    if NEGATIVE_PHRASES
        .iter()
        .any(|p| contains_phrase(&normalized, p))
    {
        return false;
    }
    AFFIRMATIVE_PHRASES
        .iter()
        .any(|p| contains_phrase(&normalized, p))
}

/// `User: ..`/`AI: ..` lines for the advisor prompt.
pub fn history_lines(messages: &[ChatMessage]) -> Vec<String> {
    messages
        .iter()
        .map(|m| {
            let role = if m.is_from_user() { "User" } else { "AI" };
            format!("{role}: {}", m.content)
        })
        .collect()
}

/// The whole conversation with upper-cased sender tags, used for goal extraction.
pub fn conversation_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produces the advisor's reply. Never fails: missing configuration and
/// provider errors turn into fixed fallback replies.
pub async fn advisor_reply(
    llm: Option<&dyn TextGenerator>,
    user_input: &str,
    profile: Option<&ProfileContext>,
    prior_messages: &[ChatMessage],
) -> String {
    let Some(llm) = llm else {
        return AI_NOT_CONFIGURED_REPLY.to_string();
    };

    let prompt = advisor_prompt(user_input, profile, &history_lines(prior_messages));
    match llm.generate(&prompt, &advisor_options()).await {
        Ok(text) => enforce_single_question(text.trim()),
        Err(e) => {
            warn!("Advisor reply failed: {e}");
            AI_UNREACHABLE_REPLY.to_string()
        }
    }
}

/// Clamps a requested plan length to the supported range.
pub fn clamp_days(days: i64) -> usize {
    days.clamp(MIN_PLAN_DAYS, MAX_PLAN_DAYS) as usize
}

/// Reads a day count from a JSON value: integers, floats (truncated) and
/// numeric strings. Anything else means no preference.
pub fn days_from_value(value: &Value) -> Option<usize> {
    let days = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(clamp_days(days))
}

/// Reads a day count from a form field.
pub fn days_from_text(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).map(clamp_days)
}

/// Asks the provider what plan the conversation settled on. Returns the goal
/// and an optional day count, or `None` when no goal could be read.
pub async fn extract_goal_and_days(
    llm: &dyn TextGenerator,
    conversation: &str,
    profile: Option<&ProfileContext>,
) -> Option<(String, Option<usize>)> {
    let prompt = goal_extraction_prompt(conversation, profile);
    let raw = match llm.generate(&prompt, &GenerationOptions::json()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Goal extraction failed: {e}");
            return None;
        }
    };

    let data = parse_lenient_object(&raw)?;
    let goal = data
        .get("goal")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|g| !g.is_empty())?
        .to_string();
    let days = data.get("days").and_then(days_from_value);
    Some((goal, days))
}

/// Asks the provider for a short session title from the latest messages.
pub async fn suggest_session_title(
    llm: &dyn TextGenerator,
    messages: &[ChatMessage],
) -> Result<String, LlmError> {
    let start = messages.len().saturating_sub(TITLE_CONTEXT_MESSAGES);
    let context = messages[start..]
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let reply = llm
        .generate(&session_title_prompt(&context), &GenerationOptions::default())
        .await?;
    let title = reply.trim().lines().next().unwrap_or_default().trim();
    if title.is_empty() {
        return Err(LlmError::Shape("No title generated".to_string()));
    }
    Ok(clamp_session_name(title))
}
