//! Prompt templates for the career advisor. Kept apart from the logic so the
//! wording can be tuned without touching control flow.

use crate::llm_client::prompts::JSON_ONLY_PREAMBLE;
use crate::models::profile::ProfileContext;

pub const ADVISOR_STYLE_RULES: &str = "\
You are an AI career advisor and mentor. Be clear, friendly, and encouraging, like a helpful guide. \
Respond concisely in plain text. Keep replies less than 5 lines unless a plan overview truly needs more. \
Prefer short sentences and tight bullet points. Avoid code blocks unless explicitly requested.

Behavior & goals:
- Greet warmly and set a collaborative, motivating tone.
- Detect the user's language from their latest message and reply in that language where feasible.
- Quickly understand the user's experience level and context (one concise question at a time only if essential). Do NOT ask the user to choose the number of days or content formats.
- Propose an appropriate plan duration yourself (based on breadth, depth, and typical time to learn), then explain the high-level roadmap in skills/modules (e.g., for ML: Supervised/Unsupervised/Semi-supervised, MLOps & Deployment, Current Trends), not micro-topics.
- Recommend specific top-quality resources (courses and books) by name/platform/author; no generic 'YouTube or books?' questions. 1-2 curated picks per module is enough.
- When the user seems ready, briefly summarize their context and propose scheduling this plan. If they confirm, say you're creating it now and it will appear in the Tracker. Do not mention any buttons.
- After progress begins, suggest resume improvements where impactful (brief).
- Ask at most one question per reply.";

/// `Name: ..; User Type: ..; Interests: ..` for the fields that are present.
pub fn profile_line(profile: Option<&ProfileContext>) -> Option<String> {
    let profile = profile?;
    let bits: Vec<String> = [
        ("Name", profile.name()),
        ("User Type", profile.user_type()),
        ("Interests", profile.interests()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}")))
    .collect();
    if bits.is_empty() {
        None
    } else {
        Some(bits.join("; "))
    }
}

pub fn advisor_prompt(
    user_input: &str,
    profile: Option<&ProfileContext>,
    history_lines: &[String],
) -> String {
    let profile_block = profile_line(profile)
        .map(|line| format!("User Profile: {line}\n\n"))
        .unwrap_or_default();
    let conversation = if history_lines.is_empty() {
        "(No prior messages)".to_string()
    } else {
        history_lines.join("\n")
    };
    format!(
        "{ADVISOR_STYLE_RULES}\n\n{profile_block}Conversation so far:\n{conversation}\n\n\
         Current user message: {user_input}\n\n\
         Your reply (<= 5 lines unless a domain explanation is needed):"
    )
}

pub fn goal_extraction_prompt(conversation: &str, profile: Option<&ProfileContext>) -> String {
    let profile_block = profile
        .and_then(|p| serde_json::to_string(p).ok())
        .map(|json| format!("User Profile: {json}\n"))
        .unwrap_or_default();
    format!(
        "From the following conversation, infer the user's primary career goal and an optional \
         desired duration in days if mentioned. \
         Return ONLY JSON: {{\n  \"goal\": string,\n  \"days\": number|null\n}}. \
         If duration is not stated, use null for days.\n\n\
         Conversation:\n{conversation}\n\n{profile_block}"
    )
}

pub fn plan_prompt(goal: &str, profile: Option<&ProfileContext>, days: Option<usize>) -> String {
    let duration_clause = match days {
        Some(n) => format!("Create a personalized learning plan with exactly {n} days. "),
        None => "Create a personalized learning plan with an appropriate number of days based on \
                 the user's current experience and the goal. "
            .to_string(),
    };
    let field = |v: Option<&str>| v.unwrap_or("N/A").to_string();
    let (name, user_type, interests) = match profile {
        Some(p) => (field(p.name()), field(p.user_type()), field(p.interests())),
        None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    let mut prompt = format!(
        "As an AI career advisor, {duration_clause}Goal: '{goal}'.
Include day-wise tasks and relevant resources (links to credible articles, courses, or books).
Consider the user's profile:
Name: {name}, User Type: {user_type}, Interests: {interests}.

Output format requirements (STRICT):
- Return ONLY application/json with a top-level JSON array.
- Do NOT include markdown fences, labels, or any prose.
- Each array item MUST be an object with EXACT keys: 'day' (1-based integer), 'task' (string), 'resources' (array of strings).
- 'day' increments sequentially starting at 1; no gaps or duplicates.
- Use real, accessible resource URLs or clear source names.
- Frame tasks as skill modules and outcomes (e.g., for ML: Supervised/Unsupervised/Semi-supervised learning, MLOps & Deployment, Current Trends), not micro-algorithm lists.
- Recommend specific top-quality resources (courses and books) by platform/author; do not ask the user to choose formats or number of days.
"
    );
    if let Some(n) = days {
        prompt.push_str(&format!(
            "\nThe top-level array MUST contain exactly {n} items (one per day)."
        ));
    }
    prompt
}

pub fn plan_retry_prompt(base_prompt: &str, days: usize) -> String {
    format!(
        "{base_prompt} Ensure the JSON array has exactly {days} items. No comments, no extra keys."
    )
}

pub fn plan_continuation_prompt(base_prompt: &str, start_day: usize, days: usize) -> String {
    format!(
        "{base_prompt} Provide ONLY the JSON array items for days {start_day} through {days}. \
         Start numbering at day {start_day}. No prose, no wrappers, just the array items."
    )
}

pub fn tailor_prompt(
    resume_text: &str,
    job_description: &str,
    profile: Option<&ProfileContext>,
) -> String {
    let mut parts = vec![
        format!("{JSON_ONLY_PREAMBLE} You are also an expert resume analyst and career coach."),
        "Return ONLY a JSON object with the following shape: \
         { \"summary\": string, \"edits\": [ { \"section\": string, \"original\": string, \"suggested\": string, \"reason\": string } ] }."
            .to_string(),
        "- `section`: the resume section (e.g., Summary, Experience, Education, Skills).".to_string(),
        "- `original`: the exact sentence or bullet from the resume to improve.".to_string(),
        "- `suggested`: a rewritten version aligned to the job description and best practices.".to_string(),
        "- `reason`: brief rationale (keywords added, quantified impact, clarity, ATS, etc.).".to_string(),
    ];
    if let Some(p) = profile {
        parts.push(format!("The user's name is {}.", p.name().unwrap_or("there")));
        if let Some(user_type) = p.user_type() {
            parts.push(format!("They are a {user_type}."));
        }
        if let Some(interests) = p.interests() {
            parts.push(format!("Their interests include: {interests}."));
        }
    }
    parts.push(format!(
        "\n\nJob Description:\n{job_description}\n\nUser Resume Text:\n{resume_text}\n\n\
         Ensure edits are sentence-level and actionable. Output strictly valid JSON."
    ));
    parts.join(" ")
}

pub fn session_title_prompt(context: &str) -> String {
    format!(
        "Create a concise 3-6 word title for this chat that captures the main topic. \
         No quotes, no punctuation at the end. Title case.\n\nConversation:\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ProfileContext {
        ProfileContext {
            name: Some("Ada".to_string()),
            user_type: Some("student".to_string()),
            interests: None,
        }
    }

    #[test]
    fn test_profile_line_skips_missing_fields() {
        assert_eq!(
            profile_line(Some(&profile())).unwrap(),
            "Name: Ada; User Type: student"
        );
        assert!(profile_line(Some(&ProfileContext::default())).is_none());
        assert!(profile_line(None).is_none());
    }

    #[test]
    fn test_advisor_prompt_without_history() {
        let prompt = advisor_prompt("Hi", None, &[]);
        assert!(prompt.contains("(No prior messages)"));
        assert!(prompt.contains("Current user message: Hi"));
        assert!(!prompt.contains("User Profile:"));
    }

    #[test]
    fn test_plan_prompt_pins_day_count() {
        let prompt = plan_prompt("Data engineer", Some(&profile()), Some(14));
        assert!(prompt.contains("exactly 14 days"));
        assert!(prompt.contains("MUST contain exactly 14 items"));
        assert!(prompt.contains("Interests: N/A"));

        let open = plan_prompt("Data engineer", None, None);
        assert!(open.contains("appropriate number of days"));
        assert!(!open.contains("MUST contain exactly"));
    }
}
