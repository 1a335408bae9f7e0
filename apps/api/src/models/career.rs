use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const MAX_CAREER_GOAL_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CareerPlan {
    pub id: i64,
    pub user_id: i64,
    pub career_goal: String,
    pub created_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyTask {
    pub id: i64,
    pub career_plan_id: i64,
    pub day_number: i64,
    pub task_description: String,
    /// JSON-encoded array of strings.
    pub resources: Option<String>,
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
}

impl DailyTask {
    /// Decodes the stored resource list; anything unreadable is an empty list.
    pub fn resource_list(&self) -> Vec<String> {
        self.resources
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }
}

/// Cuts a goal to the stored column width, respecting char boundaries.
pub fn clamp_career_goal(goal: &str) -> String {
    goal.chars().take(MAX_CAREER_GOAL_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(resources: Option<&str>) -> DailyTask {
        DailyTask {
            id: 1,
            career_plan_id: 1,
            day_number: 1,
            task_description: "Read chapter 1".to_string(),
            resources: resources.map(String::from),
            is_completed: false,
            completed_date: None,
        }
    }

    #[test]
    fn test_resource_list_decodes_json_array() {
        let task = task_with(Some(r#"["https://example.com", "Book"]"#));
        assert_eq!(task.resource_list(), vec!["https://example.com", "Book"]);
    }

    #[test]
    fn test_clamp_career_goal() {
        assert_eq!(clamp_career_goal(&"x".repeat(250)).len(), 200);
        assert_eq!(clamp_career_goal("Data engineer"), "Data engineer");
    }

    #[test]
    fn test_resource_list_tolerates_bad_json() {
        assert!(task_with(Some("not json")).resource_list().is_empty());
        assert!(task_with(None).resource_list().is_empty());
    }
}
