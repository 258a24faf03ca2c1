use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, TogglError};

pub const DEFAULT_BASE_URL: &str = "https://api.track.toggl.com/api/v8";
pub const DEFAULT_USER_AGENT: &str = concat!("toggl-track/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CREATED_WITH: &str = "toggl-track";

pub const TOKEN_ENV: &str = "TOGGL_API_TOKEN";
pub const BASE_URL_ENV: &str = "TOGGL_API_URL";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_token: String,
    pub base_url: String,
    pub user_agent: String,
    /// Stamped on every created or started entry.
    pub created_with: String,
}

impl ClientConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            created_with: DEFAULT_CREATED_WITH.to_string(),
        }
    }

    /// Reads the token from `TOGGL_API_TOKEN`, falling back to `~/.toggl`.
    /// `TOGGL_API_URL` overrides the base URL.
    pub fn load() -> Result<Self> {
        let token = resolve_token(env::var(TOKEN_ENV).ok(), read_token_file()).ok_or_else(|| {
            TogglError::Config(format!("no API token: set {TOKEN_ENV} or write it to ~/.toggl"))
        })?;

        let mut config = Self::new(token);
        if let Some(base_url) = non_blank(env::var(BASE_URL_ENV).ok()) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_created_with(mut self, created_with: impl Into<String>) -> Self {
        self.created_with = created_with.into();
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("created_with", &self.created_with)
            .finish()
    }
}

pub fn read_token_file() -> Option<String> {
    let path = token_path()?;
    fs::read_to_string(path).ok()
}

fn token_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".toggl");
    Some(path)
}

fn resolve_token(env_value: Option<String>, file_contents: Option<String>) -> Option<String> {
    non_blank(env_value).or_else(|| non_blank(file_contents))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_token_wins_over_file() {
        let token = resolve_token(Some("from-env".to_string()), Some("from-file".to_string()));
        assert_eq!(token.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_env_token_falls_back_to_file() {
        let token = resolve_token(Some("   ".to_string()), Some("from-file\n".to_string()));
        assert_eq!(token.as_deref(), Some("from-file"));
    }

    #[test]
    fn no_token_anywhere() {
        assert_eq!(resolve_token(None, Some("\n".to_string())), None);
    }

    #[test]
    fn defaults_and_overrides() {
        let config = ClientConfig::new("abc")
            .with_base_url("http://localhost:8080/api/v8")
            .with_created_with("tests");

        assert_eq!(config.base_url, "http://localhost:8080/api/v8");
        assert_eq!(config.created_with, "tests");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn debug_hides_the_token() {
        let rendered = format!("{:?}", ClientConfig::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
