use serde::Serialize;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Body for form-style actions: what happened, and where the client should
/// navigate next.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self::with(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with(Level::Info, message)
    }

    /// A completed request whose outcome the user should treat as a failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::with(Level::Danger, message)
        }
    }

    fn with(level: Level, message: impl Into<String>) -> Self {
        Self {
            success: true,
            notices: vec![Notice {
                level,
                message: message.into(),
            }],
            redirect: None,
        }
    }

    pub fn notice(mut self, level: Level, message: impl Into<String>) -> Self {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_response_shape() {
        let body = ActionResponse::success("Saved")
            .notice(Level::Warning, "Resume parsing failed")
            .redirect_to("/profile/view");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["notices"][0]["level"], "success");
        assert_eq!(value["notices"][1]["level"], "warning");
        assert_eq!(value["redirect"], "/profile/view");
    }
}
