use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use tix_core::config::{Config, WarnLevel};
use tix_core::paths;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the current config
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Set one value by dotted key (e.g. jira.project ENG)
    Set { key: String, value: String },

    /// List the keys accepted by `config set`
    Keys,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_dir: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config_dir, json),
        ConfigSubcommand::Validate => validate(config_dir, json),
        ConfigSubcommand::Set { key, value } => set(config_dir, &key, &value, json),
        ConfigSubcommand::Keys => {
            if json {
                print_json(&Config::KEYS)
            } else {
                print_table(
                    &["KEY"],
                    Config::KEYS.iter().map(|k| vec![k.to_string()]).collect(),
                );
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_dir).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    println!("# {}", paths::config_path(config_dir).display());
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_dir).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(config_dir: &Path, key: &str, value: &str, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_dir).context("failed to load config")?;
    config
        .set(key, value)
        .with_context(|| format!("failed to set '{key}'"))?;
    config.save(config_dir).context("failed to write config")?;

    if json {
        print_json(&serde_json::json!({ "key": key, "value": value }))?;
    } else {
        println!("Set {key} = {value}");
    }
    Ok(())
}
