use crate::error::{Result, TixError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Relative to the home directory.
pub const APP_DIR: &str = ".config/tix";

pub const CONFIG_FILE: &str = "config.yaml";
pub const STATE_FILE: &str = "state.yaml";
pub const CREDENTIALS_FILE: &str = "credentials.yaml";
pub const REJECTED_DIR: &str = "rejected";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn default_config_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(APP_DIR))
        .ok_or(TixError::HomeNotFound)
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILE)
}

pub fn credentials_path(dir: &Path) -> PathBuf {
    dir.join(CREDENTIALS_FILE)
}

pub fn rejected_dir(dir: &Path) -> PathBuf {
    dir.join(REJECTED_DIR)
}

// ---------------------------------------------------------------------------
// Ticket keys
// ---------------------------------------------------------------------------

/// Project prefix, a dash, then a number without leading zeros.
pub(crate) const KEY_PATTERN: &str = r"[A-Z][A-Z0-9_]*-[1-9][0-9]*";

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(&format!("^{KEY_PATTERN}$")).unwrap())
}

/// Uppercase and check a ticket key (`eng-12` → `ENG-12`).
pub fn normalize_ticket_key(key: &str) -> Result<String> {
    let upper = key.trim().to_ascii_uppercase();
    if !key_re().is_match(&upper) {
        return Err(TixError::InvalidKey(key.to_string()));
    }
    Ok(upper)
}

/// Project part of a key: `ENG-12` → `ENG`.
pub fn project_of(key: &str) -> Option<&str> {
    key.rsplit_once('-').map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        assert_eq!(normalize_ticket_key(" eng-12 ").unwrap(), "ENG-12");
        assert_eq!(normalize_ticket_key("A2B_C-1").unwrap(), "A2B_C-1");
    }

    #[test]
    fn bad_keys_are_rejected() {
        for bad in ["", "ENG", "ENG-", "ENG-0", "12-ENG", "ENG 12", "-12"] {
            assert!(normalize_ticket_key(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn project_of_splits_on_last_dash() {
        assert_eq!(project_of("ENG-12"), Some("ENG"));
        assert_eq!(project_of("ENG"), None);
    }
}
