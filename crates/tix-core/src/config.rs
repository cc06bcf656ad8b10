use crate::error::{Result, TixError};
use crate::paths;
use crate::types::EstimateOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// JiraConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub base_url: String,
    /// Account email for basic auth. Empty means the token is a bearer token.
    #[serde(default)]
    pub email: String,
    /// Default project key for new epics.
    #[serde(default)]
    pub project: String,
    #[serde(default = "default_story_points_field")]
    pub story_points_field: String,
    #[serde(default = "default_issue_type")]
    pub default_issue_type: String,
    #[serde(default = "default_epic_issue_type")]
    pub epic_issue_type: String,
}

fn default_story_points_field() -> String {
    "customfield_10016".to_string()
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_epic_issue_type() -> String {
    "Epic".to_string()
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            project: String::new(),
            story_points_field: default_story_points_field(),
            default_issue_type: default_issue_type(),
            epic_issue_type: default_epic_issue_type(),
        }
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
}

fn default_model() -> String {
    genai_client::DEFAULT_MODEL.to_string()
}

fn default_ai_base_url() -> String {
    genai_client::DEFAULT_BASE_URL.to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_ai_base_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// QaConfig / EstimateConfig / UiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaConfig {
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

fn default_max_questions() -> usize {
    4
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    #[serde(default = "default_point_scale")]
    pub point_scale: Vec<u32>,
}

fn default_max_points() -> u32 {
    13
}

fn default_point_scale() -> Vec<u32> {
    vec![1, 2, 3, 5, 8, 13]
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            point_scale: default_point_scale(),
        }
    }
}

impl EstimateConfig {
    pub fn options(&self, ticket_type: Option<&str>) -> EstimateOptions {
        EstimateOptions {
            scale: self.point_scale.clone(),
            ticket_type: ticket_type.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    10
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub estimate: EstimateConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Overrides `$VISUAL` / `$EDITOR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl Config {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(dir: &Path) -> Result<Self> {
        let path = paths::config_path(dir);
        if !path.exists() {
            return Err(TixError::NotConfigured);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Defaults when no config file exists yet.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        match Self::load(dir) {
            Err(TixError::NotConfigured) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = paths::config_path(dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Keys accepted by [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "jira.base_url",
        "jira.email",
        "jira.project",
        "jira.story_points_field",
        "jira.default_issue_type",
        "jira.epic_issue_type",
        "ai.model",
        "ai.base_url",
        "qa.max_questions",
        "estimate.max_points",
        "estimate.point_scale",
        "ui.page_size",
        "editor",
    ];

    /// Set one dotted key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "jira.base_url" => self.jira.base_url = value.trim_end_matches('/').to_string(),
            "jira.email" => self.jira.email = value.to_string(),
            "jira.project" => self.jira.project = value.to_ascii_uppercase(),
            "jira.story_points_field" => self.jira.story_points_field = value.to_string(),
            "jira.default_issue_type" => self.jira.default_issue_type = value.to_string(),
            "jira.epic_issue_type" => self.jira.epic_issue_type = value.to_string(),
            "ai.model" => self.ai.model = value.to_string(),
            "ai.base_url" => self.ai.base_url = value.trim_end_matches('/').to_string(),
            "qa.max_questions" => self.qa.max_questions = parse_number(key, value)?,
            "estimate.max_points" => self.estimate.max_points = parse_number(key, value)?,
            "estimate.point_scale" => {
                let mut scale = value
                    .split(',')
                    .map(|p| parse_number::<u32>(key, p.trim()))
                    .collect::<Result<Vec<_>>>()?;
                scale.sort_unstable();
                scale.dedup();
                self.estimate.point_scale = scale;
            }
            "ui.page_size" => self.ui.page_size = parse_number(key, value)?,
            "editor" => {
                self.editor = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            _ => {
                return Err(TixError::Config(format!(
                    "unknown key '{key}' (expected one of: {})",
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.jira.base_url.is_empty() {
            push(WarnLevel::Error, "jira.base_url is not set".to_string());
        } else if !self.jira.base_url.starts_with("https://") {
            push(
                WarnLevel::Warning,
                format!("jira.base_url '{}' is not https", self.jira.base_url),
            );
        }
        if self.jira.project.is_empty() {
            push(
                WarnLevel::Warning,
                "jira.project is not set; 'tix epic' will need --project".to_string(),
            );
        }
        if self.jira.story_points_field.is_empty() {
            push(WarnLevel::Error, "jira.story_points_field is empty".to_string());
        }
        if self.ai.model.is_empty() {
            push(WarnLevel::Error, "ai.model is empty".to_string());
        }
        if self.ui.page_size == 0 {
            push(WarnLevel::Error, "ui.page_size must be at least 1".to_string());
        }
        if self.estimate.max_points == 0 {
            push(WarnLevel::Error, "estimate.max_points must be at least 1".to_string());
        }
        if self.estimate.point_scale.is_empty() {
            push(WarnLevel::Error, "estimate.point_scale is empty".to_string());
        } else if !self.estimate.point_scale.contains(&self.estimate.max_points) {
            push(
                WarnLevel::Warning,
                format!(
                    "estimate.max_points {} is not on the point scale",
                    self.estimate.max_points
                ),
            );
        }
        let over: Vec<String> = self
            .estimate
            .point_scale
            .iter()
            .filter(|&&p| p > self.estimate.max_points)
            .map(u32::to_string)
            .collect();
        if !over.is_empty() {
            push(
                WarnLevel::Warning,
                format!(
                    "estimate.point_scale has values above estimate.max_points {}: {}",
                    self.estimate.max_points,
                    over.join(", ")
                ),
            );
        }
        if self.qa.max_questions > 10 {
            push(
                WarnLevel::Warning,
                format!("qa.max_questions {} is unusually high", self.qa.max_questions),
            );
        }

        warnings
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| TixError::Config(format!("{key}: '{value}' is not a valid number")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn configured() -> Config {
        let mut cfg = Config::default();
        cfg.jira.base_url = "https://acme.atlassian.net".into();
        cfg.jira.project = "ENG".into();
        cfg
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: Config = serde_yaml::from_str("jira:\n  base_url: https://x\n").unwrap();
        assert_eq!(cfg.jira.story_points_field, "customfield_10016");
        assert_eq!(cfg.qa.max_questions, 4);
        assert_eq!(cfg.estimate.max_points, 13);
        assert_eq!(cfg.ui.page_size, 10);
        assert!(cfg.editor.is_none());
    }

    #[test]
    fn load_missing_is_not_configured() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(Config::load(dir.path()), Err(TixError::NotConfigured)));
        assert_eq!(Config::load_or_default(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = configured();
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn set_parses_typed_values() {
        let mut cfg = Config::default();
        cfg.set("jira.project", "eng").unwrap();
        cfg.set("jira.base_url", "https://acme.atlassian.net/").unwrap();
        cfg.set("qa.max_questions", "2").unwrap();
        cfg.set("estimate.point_scale", "8, 1,2, 3,5,2").unwrap();
        assert_eq!(cfg.jira.project, "ENG");
        assert_eq!(cfg.jira.base_url, "https://acme.atlassian.net");
        assert_eq!(cfg.qa.max_questions, 2);
        assert_eq!(cfg.estimate.point_scale, vec![1, 2, 3, 5, 8]);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_number() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("jira.nope", "x"), Err(TixError::Config(_))));
        assert!(matches!(cfg.set("ui.page_size", "ten"), Err(TixError::Config(_))));
    }

    #[test]
    fn validate_configured_is_clean() {
        assert!(configured().validate().is_empty());
    }

    #[test]
    fn validate_flags_missing_url_as_error() {
        let warnings = Config::default().validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("jira.base_url")));
    }

    #[test]
    fn validate_max_points_off_scale() {
        let mut cfg = configured();
        cfg.estimate.max_points = 10;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("not on the point scale")));
    }

    #[test]
    fn validate_scale_above_max_points() {
        let mut cfg = configured();
        cfg.estimate.point_scale = vec![1, 2, 3, 5, 8, 13, 21];
        cfg.estimate.max_points = 8;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(warnings[0].message.ends_with("above estimate.max_points 8: 13, 21"));
    }
}
