//! API credentials, stored beside the config with owner-only permissions.
//!
//! Environment variables take precedence over the file:
//!   TIX_JIRA_TOKEN       Jira API token (or PAT when no email is configured)
//!   TIX_GEMINI_API_KEY   Gemini API key

use crate::error::{Result, TixError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const JIRA_TOKEN_ENV: &str = "TIX_JIRA_TOKEN";
pub const GEMINI_KEY_ENV: &str = "TIX_GEMINI_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
}

impl Credentials {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = paths::credentials_path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = paths::credentials_path(dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write_private(&path, data.as_bytes())
    }

    /// Load the file, then apply environment overrides.
    pub fn resolve(dir: &Path) -> Result<Self> {
        Ok(Self::load(dir)?.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = lookup(JIRA_TOKEN_ENV).and_then(non_empty) {
            self.jira_token = Some(v);
        }
        if let Some(v) = lookup(GEMINI_KEY_ENV).and_then(non_empty) {
            self.gemini_api_key = Some(v);
        }
        self
    }

    pub fn jira_token(&self) -> Result<&str> {
        self.jira_token
            .as_deref()
            .ok_or_else(|| TixError::MissingCredential(format!("Jira token ({JIRA_TOKEN_ENV})")))
    }

    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key.as_deref().ok_or_else(|| {
            TixError::MissingCredential(format!("Gemini API key ({GEMINI_KEY_ENV})"))
        })
    }
}

/// Mask all but the last four characters for display.
pub fn mask(secret: &str) -> String {
    let n = secret.chars().count();
    if n <= 4 {
        return "*".repeat(n);
    }
    let tail: String = secret.chars().skip(n - 4).collect();
    format!("{}{tail}", "*".repeat(n - 4))
}
