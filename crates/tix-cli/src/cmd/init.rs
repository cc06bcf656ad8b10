use crate::terminal::Terminal;
use anyhow::Context;
use std::path::Path;
use tix_core::config::{Config, WarnLevel};
use tix_core::credentials::Credentials;
use tix_core::paths;

pub fn run(config_dir: &Path) -> anyhow::Result<()> {
    let mut term = Terminal::stdio(false);
    setup(config_dir, &mut term)?;
    Ok(())
}

/// Prompt for the Jira connection, keeping current values on blank input,
/// and write `config.yaml`. Safe to re-run.
pub(crate) fn setup(config_dir: &Path, term: &mut Terminal<'_>) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(config_dir).context("failed to read existing config")?;

    term.say(format!("Configuring tix in {}", config_dir.display()))?;
    let base_url = term.ask("Jira URL (https://<site>.atlassian.net)", &config.jira.base_url)?;
    config.set("jira.base_url", &base_url)?;
    let email = term.ask("Jira account email (blank for a personal access token)", &config.jira.email)?;
    config.set("jira.email", &email)?;
    let project = term.ask("Default project key", &config.jira.project)?;
    config.set("jira.project", &project)?;

    config.save(config_dir).context("failed to write config")?;
    std::fs::create_dir_all(paths::rejected_dir(config_dir))
        .context("failed to create rejected plan directory")?;
    term.say(format!("Wrote {}", paths::config_path(config_dir).display()))?;

    for w in config.validate() {
        let prefix = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        term.say(format!("[{prefix}] {}", w.message))?;
    }

    let creds = Credentials::resolve(config_dir)?;
    if creds.jira_token.is_none() {
        term.say("Next: store your Jira API token with 'tix auth jira'")?;
    }
    if creds.gemini_api_key.is_none() {
        term.say("Next: store your Gemini API key with 'tix auth gemini'")?;
    }
    Ok(config)
}
