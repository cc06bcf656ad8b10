use crate::editor::{Editor, SystemEditor};
use crate::terminal::Terminal;
use anyhow::Context;
use genai_client::GeminiClient;
use std::path::{Path, PathBuf};
use tix_core::config::Config;
use tix_core::credentials::Credentials;
use tix_core::generation::{GeminiGenerator, Generator};
use tix_core::jira::JiraClient;
use tix_core::state::State;
use tix_core::tracker::TicketSystem;

// ---------------------------------------------------------------------------
// AppContext
// ---------------------------------------------------------------------------

/// Everything a command needs that comes from flags and the config directory.
/// Built once in `main` and passed down; nothing is global.
pub struct AppContext {
    pub config_dir: PathBuf,
    pub config: Config,
    pub credentials: Credentials,
    pub json: bool,
    pub yes: bool,
}

impl AppContext {
    /// Requires an initialized config directory.
    pub fn load(config_dir: &Path, json: bool, yes: bool) -> anyhow::Result<Self> {
        let config = Config::load(config_dir)
            .with_context(|| format!("failed to load config from {}", config_dir.display()))?;
        let credentials = Credentials::resolve(config_dir).context("failed to load credentials")?;
        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            config,
            credentials,
            json,
            yes,
        })
    }

    pub fn jira(&self) -> anyhow::Result<JiraClient> {
        let jira = &self.config.jira;
        if jira.base_url.is_empty() {
            anyhow::bail!("jira.base_url is not set (run 'tix config set jira.base_url <URL>')");
        }
        let token = self.credentials.jira_token()?;
        Ok(JiraClient::new(
            &jira.base_url,
            &jira.email,
            token,
            &jira.story_points_field,
        ))
    }

    pub fn gemini(&self) -> anyhow::Result<GeminiGenerator> {
        let key = self.credentials.gemini_api_key()?;
        let client =
            GeminiClient::new(key, &self.config.ai.model).with_base_url(&self.config.ai.base_url);
        Ok(GeminiGenerator::new(client))
    }

    pub fn terminal(&self) -> Terminal<'static> {
        Terminal::stdio(self.json).assume_yes(self.yes)
    }

    pub fn editor(&self) -> SystemEditor {
        SystemEditor::from_env(self.config.editor.as_deref())
    }

    /// Record that `action` touched `key`. Failure only warns: the remote
    /// work already happened.
    pub fn remember(&self, key: &str, summary: &str, action: &str) {
        let result = State::load(&self.config_dir).and_then(|mut state| {
            state.touch(key, summary, action);
            state.save(&self.config_dir)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, key, "could not update recent tickets");
        }
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// The three collaborators a workflow talks to.
pub struct Services<'a> {
    pub tracker: &'a dyn TicketSystem,
    pub generator: &'a dyn Generator,
    pub editor: &'a dyn Editor,
}

#[cfg(test)]
pub(crate) fn test_context(dir: &Path) -> AppContext {
    let mut config = Config::default();
    config.jira.base_url = "https://example.atlassian.net".to_string();
    config.jira.project = "ENG".to_string();
    AppContext {
        config_dir: dir.to_path_buf(),
        config,
        credentials: Credentials::default(),
        json: false,
        yes: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_requires_init() {
        let dir = TempDir::new().unwrap();
        let err = AppContext::load(dir.path(), false, false).err().unwrap();
        assert!(format!("{err:#}").contains("tix init"));
    }

    #[test]
    fn missing_token_is_reported() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let err = ctx.jira().err().unwrap();
        assert!(format!("{err:#}").contains("missing credential"));
    }

    #[test]
    fn remember_writes_state() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        ctx.remember("ENG-7", "Login", "qa");
        let state = State::load(dir.path()).unwrap();
        assert_eq!(state.recent[0].key, "ENG-7");
        assert_eq!(state.last_project.as_deref(), Some("ENG"));
    }
}
