//! Day-by-day career plan generation: prompt the provider for a JSON array,
//! recover whatever array it produced, and normalize it into `PlanDay`s.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::career::prompts::{plan_continuation_prompt, plan_prompt, plan_retry_prompt};
use crate::llm_client::json_recovery::{extract_json_array, recover_plan_items};
use crate::llm_client::{preview, GenerationOptions, LlmError, TextGenerator};
use crate::models::profile::ProfileContext;

const PLAN_MAX_OUTPUT_TOKENS: u32 = 1400;

const DAY_KEYS: &[&str] = &["day", "day_number", "daynum", "index", "step"];
const TASK_KEYS: &[&str] = &[
    "task",
    "tasks",
    "activity",
    "activities",
    "objective",
    "focus",
    "description",
    "summary",
];
const RESOURCE_KEYS: &[&str] = &[
    "resources",
    "links",
    "materials",
    "references",
    "sources",
    "urls",
    "resource_links",
];

/// One normalized day of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDay {
    pub day: i64,
    pub task: String,
    pub resources: Vec<String>,
}

fn plan_options() -> GenerationOptions {
    GenerationOptions {
        max_output_tokens: Some(PLAN_MAX_OUTPUT_TOKENS),
        ..GenerationOptions::json()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The first key in `keys` whose value is present and non-empty.
fn first_present<'a>(item: &'a BTreeMap<String, &'a Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k).copied())
        .find(|v| is_truthy(v))
}

/// Renders a scalar the way it reads in text: strings unquoted.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_day(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn parse_task(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|p| is_truthy(p))
            .map(|p| value_text(p).trim().to_string())
            .collect::<Vec<_>>()
            .join("; "),
        Some(v) => value_text(v).trim().to_string(),
        None => String::new(),
    }
}

fn parse_resources(value: Option<&Value>) -> Vec<String> {
    let entries: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v) => vec![v],
        None => Vec::new(),
    };
    entries
        .into_iter()
        .filter(|v| is_truthy(v))
        .map(|v| value_text(v).trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

fn normalize_item(item: &Map<String, Value>, position: usize) -> Option<PlanDay> {
    let lowered: BTreeMap<String, &Value> = item
        .iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect();

    let task = parse_task(first_present(&lowered, TASK_KEYS));
    if task.is_empty() {
        return None;
    }
    let day = parse_day(first_present(&lowered, DAY_KEYS)).unwrap_or(position as i64 + 1);
    let resources = parse_resources(first_present(&lowered, RESOURCE_KEYS));
    Some(PlanDay {
        day,
        task,
        resources,
    })
}

/// Maps raw items to `PlanDay`s, accepting common key variants. Items that
/// are not objects or carry no task are skipped; a missing day number falls
/// back to the item's position among the kept items.
pub fn normalize_plan_items(items: &[Value]) -> Vec<PlanDay> {
    let mut out: Vec<PlanDay> = Vec::with_capacity(items.len());
    for item in items {
        if let Value::Object(obj) = item {
            if let Some(day) = normalize_item(obj, out.len()) {
                out.push(day);
            }
        }
    }
    out
}

/// Keyed by day number, first occurrence wins.
fn dedupe_by_day(days: Vec<PlanDay>, into: &mut BTreeMap<i64, PlanDay>) {
    for day in days {
        into.entry(day.day).or_insert(day);
    }
}

/// Sorted by day, renumbered from 1 and cut to `limit`.
fn renumber(by_day: &BTreeMap<i64, PlanDay>, limit: usize) -> Vec<PlanDay> {
    by_day
        .values()
        .take(limit)
        .enumerate()
        .map(|(idx, d)| PlanDay {
            day: idx as i64 + 1,
            ..d.clone()
        })
        .collect()
}

async fn call_for_items(
    llm: &dyn TextGenerator,
    prompt: &str,
) -> Result<(String, Option<Vec<Value>>), LlmError> {
    let raw = llm.generate(prompt, &plan_options()).await?;
    let items = recover_plan_items(&raw);
    Ok((raw, items))
}

/// Generates a plan for `goal`. With `days`, the result holds at most that
/// many consecutive days starting at 1; a shorter plan is accepted.
pub async fn generate_career_plan(
    llm: &dyn TextGenerator,
    profile: Option<&ProfileContext>,
    goal: &str,
    days: Option<usize>,
) -> Result<Vec<PlanDay>, LlmError> {
    let base_prompt = plan_prompt(goal, profile, days);

    let (mut raw, mut items) = call_for_items(llm, &base_prompt).await?;
    if items.is_none() {
        if let Some(n) = days {
            info!("Plan output unreadable, retrying with an explicit item count");
            let (retry_raw, retry_items) =
                call_for_items(llm, &plan_retry_prompt(&base_prompt, n)).await?;
            raw = retry_raw;
            items = retry_items;
        }
    }
    let Some(items) = items else {
        warn!("Model did not return a plan array. Raw preview: {}", preview(&raw));
        return Err(LlmError::Shape(
            "Model did not return a valid JSON array for the plan".to_string(),
        ));
    };

    let mut plan = normalize_plan_items(&items);

    if let Some(n) = days {
        let mut by_day = BTreeMap::new();
        dedupe_by_day(plan, &mut by_day);
        plan = renumber(&by_day, n);

        if plan.len() < n {
            let start_day = plan.len() + 1;
            let prompt = plan_continuation_prompt(&base_prompt, start_day, n);
            match llm.generate(&prompt, &plan_options()).await {
                Ok(raw_tail) => {
                    let tail = serde_json::from_str::<Value>(raw_tail.trim())
                        .ok()
                        .and_then(|v| match v {
                            Value::Array(items) => Some(items),
                            _ => None,
                        })
                        .or_else(|| extract_json_array(&raw_tail))
                        .unwrap_or_default();
                    if !tail.is_empty() {
                        let mut merged: BTreeMap<i64, PlanDay> = plan
                            .iter()
                            .cloned()
                            .map(|d| (d.day, d))
                            .collect();
                        dedupe_by_day(normalize_plan_items(&tail), &mut merged);
                        plan = renumber(&merged, n);
                    }
                }
                Err(e) => warn!("Plan continuation for days {start_day}-{n} failed: {e}"),
            }
        }
    }

    if plan.is_empty() {
        warn!("No valid plan items were returned. Raw preview: {}", preview(&raw));
        return Err(LlmError::Shape("No valid plan items were returned".to_string()));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedGenerator;
    use serde_json::json;

    #[test]
    fn test_normalize_accepts_key_variants() {
        let items = vec![
            json!({"Day": "Day 3", "Activities": ["Read", "", "Practice"], "Links": "https://a.example"}),
            json!({"step": 1, "focus": "SQL basics", "materials": ["Book", null, " Course "]}),
            json!("not an object"),
            json!({"day": 2, "resources": ["x"]}),
            json!({"objective": "Warehousing"}),
        ];
        let plan = normalize_plan_items(&items);
        assert_eq!(
            plan,
            vec![
                PlanDay {
                    day: 3,
                    task: "Read; Practice".to_string(),
                    resources: vec!["https://a.example".to_string()],
                },
                PlanDay {
                    day: 1,
                    task: "SQL basics".to_string(),
                    resources: vec!["Book".to_string(), "Course".to_string()],
                },
                PlanDay {
                    day: 3,
                    task: "Warehousing".to_string(),
                    resources: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_empty_task_key_falls_through_to_next() {
        let plan = normalize_plan_items(&[json!({"task": "", "description": "Study"})]);
        assert_eq!(plan[0].task, "Study");
    }

    #[test]
    fn test_blank_resources_dropped_after_trimming() {
        let plan = normalize_plan_items(&[
            json!({"task": "Docker", "resources": [" ", "docs.docker.com", "\t"]}),
            json!({"task": "Compose", "resources": "   "}),
        ]);
        assert_eq!(plan[0].resources, vec!["docs.docker.com".to_string()]);
        assert!(plan[1].resources.is_empty());
    }

    #[tokio::test]
    async fn test_plan_is_deduped_and_renumbered() {
        let llm = ScriptedGenerator::new([r#"[
            {"day": 5, "task": "E", "resources": []},
            {"day": 2, "task": "B", "resources": []},
            {"day": 2, "task": "B again", "resources": []},
            {"day": 9, "task": "I", "resources": []}
        ]"#]);
        let plan = generate_career_plan(&llm, None, "Data engineer", Some(2))
            .await
            .unwrap();
        let tasks: Vec<_> = plan.iter().map(|d| (d.day, d.task.as_str())).collect();
        assert_eq!(tasks, vec![(1, "B"), (2, "E")]);
        assert_eq!(llm.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_short_plan_requests_missing_tail() {
        let llm = ScriptedGenerator::new([
            r#"{"plan": [{"day": 1, "task": "A"}, {"day": 2, "task": "B"}]}"#,
            r#"```json
[{"day": 3, "task": "C"}, {"day": 4, "task": "D"}, {"day": 5, "task": "extra"}]
```"#,
        ]);
        let plan = generate_career_plan(&llm, None, "Goal", Some(4)).await.unwrap();
        let tasks: Vec<_> = plan.iter().map(|d| d.task.as_str()).collect();
        assert_eq!(tasks, vec!["A", "B", "C", "D"]);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[1].contains("days 3 through 4"));
    }

    #[tokio::test]
    async fn test_failed_continuation_keeps_short_plan() {
        let llm = ScriptedGenerator::new([r#"[{"day": 1, "task": "A"}]"#]);
        let plan = generate_career_plan(&llm, None, "Goal", Some(3)).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(llm.prompt_count(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_output_retries_once_with_count() {
        let llm = ScriptedGenerator::new([
            "Sorry, here is your plan in prose.",
            r#"[{"day": 1, "task": "A"}, {"day": 2, "task": "B"}]"#,
        ]);
        let plan = generate_career_plan(&llm, None, "Goal", Some(2)).await.unwrap();
        assert_eq!(plan.len(), 2);
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[1].contains("Ensure the JSON array has exactly 2 items."));
    }

    #[tokio::test]
    async fn test_unreadable_output_without_days_fails() {
        let llm = ScriptedGenerator::new(["no json here"]);
        assert!(generate_career_plan(&llm, None, "Goal", None).await.is_err());
        assert_eq!(llm.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_plan_without_day_limit_keeps_numbers() {
        let llm = ScriptedGenerator::new([r#"[{"day": 1, "task": "A"}, {"day": 3, "task": "C"}]"#]);
        let plan = generate_career_plan(&llm, None, "Goal", None).await.unwrap();
        assert_eq!(plan.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let llm = ScriptedGenerator::failing();
        assert!(generate_career_plan(&llm, None, "Goal", Some(3)).await.is_err());
    }
}
