use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub place: String,
    /// Free text: student, teacher, professional, learner.
    pub user_type: String,
    pub organization_name: Option<String>,
    pub details: Option<String>,
    pub resume_path: Option<String>,
    pub interests: Option<String>,
    pub hobbies: Option<String>,
    pub additional_info: Option<String>,
}

impl Profile {
    /// The subset of the profile that is shared with the AI provider.
    pub fn ai_context(&self) -> ProfileContext {
        ProfileContext {
            name: Some(self.name.clone()),
            user_type: Some(self.user_type.clone()),
            interests: self.interests.clone(),
        }
    }
}

/// Profile fields included in AI prompts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileContext {
    pub name: Option<String>,
    pub user_type: Option<String>,
    pub interests: Option<String>,
}

impl ProfileContext {
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    pub fn user_type(&self) -> Option<&str> {
        non_blank(self.user_type.as_deref())
    }

    pub fn interests(&self) -> Option<&str> {
        non_blank(self.interests.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
