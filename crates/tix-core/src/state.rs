use crate::error::Result;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_RECENT: usize = 20;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTicket {
    pub key: String,
    pub summary: String,
    /// Which command last touched it (`qa`, `decompose`, ...).
    pub action: String,
    pub touched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub recent: Vec<RecentTicket>,
    #[serde(default)]
    pub last_project: Option<String>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: 1,
            recent: Vec::new(),
            last_project: None,
            last_updated: Utc::now(),
        }
    }
}

impl State {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Missing state is an empty state.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = paths::state_path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let state: State = serde_yaml::from_str(&data)?;
        Ok(state)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = paths::state_path(dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Move `key` to the front of the recent list, keeping at most 20 entries.
    pub fn touch(&mut self, key: &str, summary: &str, action: &str) {
        self.recent.retain(|r| r.key != key);
        self.recent.insert(
            0,
            RecentTicket {
                key: key.to_string(),
                summary: summary.to_string(),
                action: action.to_string(),
                touched_at: Utc::now(),
            },
        );
        self.recent.truncate(MAX_RECENT);
        if let Some(project) = paths::project_of(key) {
            self.last_project = Some(project.to_string());
        }
        self.last_updated = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
