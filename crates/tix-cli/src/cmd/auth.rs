use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::io::BufRead;
use std::path::Path;
use tix_core::credentials::{mask, Credentials};

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Store a Jira API token read from stdin
    Jira,
    /// Store a Gemini API key read from stdin
    Gemini,
    /// Show which credentials are set (masked)
    Status,
}

pub fn run(config_dir: &Path, subcmd: AuthSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AuthSubcommand::Jira => store(config_dir, Service::Jira, json),
        AuthSubcommand::Gemini => store(config_dir, Service::Gemini, json),
        AuthSubcommand::Status => status(config_dir, json),
    }
}

#[derive(Clone, Copy)]
enum Service {
    Jira,
    Gemini,
}

impl Service {
    fn name(self) -> &'static str {
        match self {
            Service::Jira => "Jira token",
            Service::Gemini => "Gemini API key",
        }
    }
}

fn store(config_dir: &Path, service: Service, json: bool) -> anyhow::Result<()> {
    eprintln!("Paste the {} and press Enter:", service.name());
    let secret = read_secret(&mut std::io::stdin().lock())?;

    // The file only; environment overrides are not persisted.
    let mut creds = Credentials::load(config_dir).context("failed to read credentials")?;
    match service {
        Service::Jira => creds.jira_token = Some(secret.clone()),
        Service::Gemini => creds.gemini_api_key = Some(secret.clone()),
    }
    creds.save(config_dir).context("failed to write credentials")?;

    if json {
        print_json(&serde_json::json!({ "stored": service.name(), "value": mask(&secret) }))?;
    } else {
        println!("Stored {} ({})", service.name(), mask(&secret));
    }
    Ok(())
}

fn status(config_dir: &Path, json: bool) -> anyhow::Result<()> {
    let creds = Credentials::resolve(config_dir).context("failed to read credentials")?;
    let shown = |v: &Option<String>| v.as_deref().map(mask);
    if json {
        return print_json(&serde_json::json!({
            "jira_token": shown(&creds.jira_token),
            "gemini_api_key": shown(&creds.gemini_api_key),
        }));
    }
    for (service, value) in [
        (Service::Jira, shown(&creds.jira_token)),
        (Service::Gemini, shown(&creds.gemini_api_key)),
    ] {
        println!("{:<15} {}", service.name(), value.as_deref().unwrap_or("(not set)"));
    }
    Ok(())
}

/// First non-blank line of `input`, trimmed.
fn read_secret(input: &mut dyn BufRead) -> anyhow::Result<String> {
    for line in input.lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
    }
    anyhow::bail!("no value on stdin")
}
