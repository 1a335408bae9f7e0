use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_SECRET_KEY: &str = "you-will-never-guess";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_UPLOAD_MB: usize = 16;

/// Application configuration loaded from environment variables.
/// Everything has a development default except the AI key, whose absence
/// disables AI features instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub instance_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    /// Largest accepted request body, resume uploads included.
    pub max_upload_mb: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let secret_key =
            optional_env("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());
        let instance_dir = PathBuf::from(
            optional_env("INSTANCE_DIR").unwrap_or_else(|| "instance".to_string()),
        );
        let database_url = optional_env("DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}?mode=rwc", instance_dir.join("site.db").display())
        });

        Ok(Config {
            secret_key,
            database_url,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            instance_dir,
            port: optional_env("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            session_ttl_days: optional_env("SESSION_TTL_DAYS")
                .unwrap_or_else(|| "30".to_string())
                .parse::<i64>()
                .context("SESSION_TTL_DAYS must be a whole number of days")?,
            cookie_secure: optional_env("COOKIE_SECURE")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("COOKIE_SECURE must be true or false")?
                .unwrap_or(false),
            max_upload_mb: optional_env("MAX_UPLOAD_MB")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_MB must be a whole number of megabytes")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_MB),
        })
    }

    /// True when no SECRET_KEY was provided and the development default is in use.
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.instance_dir.join("uploads")
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.instance_dir.join("user_data")
    }
}

/// Reads a variable, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by unit tests; never touches the environment.
    pub fn for_tests(instance_dir: PathBuf) -> Self {
        Config {
            secret_key: "test-secret".to_string(),
            database_url: "sqlite::memory:".to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            instance_dir,
            port: 0,
            rust_log: "debug".to_string(),
            session_ttl_days: 30,
            cookie_secure: false,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" on ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("no").unwrap());
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_instance_subdirectories() {
        let config = Config::for_tests(PathBuf::from("/srv/app"));
        assert_eq!(config.upload_dir(), PathBuf::from("/srv/app/uploads"));
        assert_eq!(config.user_data_dir(), PathBuf::from("/srv/app/user_data"));
    }

    #[test]
    fn test_upload_limit_in_bytes() {
        let config = Config {
            max_upload_mb: 10,
            ..Config::for_tests(PathBuf::from("/srv/app"))
        };
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
    }
}
