use std::io::Write;
use std::process::Command;
use tix_core::{Result, TixError};

/// Open text in an editor and hand back whatever the user saved.
pub trait Editor {
    fn edit(&self, text: &str) -> Result<String>;
}

/// `$VISUAL` / `$EDITOR` (or the config override) on a temporary `.md` file.
pub struct SystemEditor {
    command: String,
}

impl SystemEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Config override first, then `$VISUAL`, `$EDITOR`, and finally `vi`.
    pub fn from_env(config_override: Option<&str>) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let command = config_override
            .map(str::to_string)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env("VISUAL"))
            .or_else(|| env("EDITOR"))
            .unwrap_or_else(|| "vi".to_string());
        Self::new(command)
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for SystemEditor {
    fn edit(&self, text: &str) -> Result<String> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| TixError::Editor("no editor configured".to_string()))?;
        let path = which::which(program)
            .map_err(|_| TixError::Editor(format!("'{program}' not found on PATH")))?;

        let mut file = tempfile::Builder::new()
            .prefix("tix-")
            .suffix(".md")
            .tempfile()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        tracing::debug!(editor = %path.display(), file = %file.path().display(), "opening editor");
        let status = Command::new(&path)
            .args(parts)
            .arg(file.path())
            .status()
            .map_err(|e| TixError::Editor(format!("failed to start '{program}': {e}")))?;
        if !status.success() {
            return Err(TixError::Editor(format!("'{program}' exited with {status}")));
        }
        Ok(std::fs::read_to_string(file.path())?)
    }
}

/// Replays canned edits in order and records what it was given.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ScriptedEditor {
    replies: std::cell::RefCell<std::collections::VecDeque<String>>,
    seen: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl ScriptedEditor {
    pub(crate) fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(reply.into());
        self
    }

    pub(crate) fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

#[cfg(test)]
impl Editor for ScriptedEditor {
    fn edit(&self, text: &str) -> Result<String> {
        self.seen.borrow_mut().push(text.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TixError::Editor("no scripted edit left".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_override_wins() {
        assert_eq!(SystemEditor::from_env(Some("nano -w")).command(), "nano -w");
    }

    #[test]
    fn blank_override_falls_through() {
        assert_ne!(SystemEditor::from_env(Some("  ")).command(), "  ");
    }

    #[test]
    fn missing_program_is_editor_error() {
        let err = SystemEditor::new("tix-no-such-editor-xyz").edit("x").unwrap_err();
        assert!(matches!(err, TixError::Editor(_)));
    }

    #[cfg(unix)]
    #[test]
    fn edits_round_trip_through_file() {
        // `true` leaves the file untouched.
        let out = SystemEditor::new("true").edit("- [ ] keep me\n").unwrap();
        assert_eq!(out, "- [ ] keep me\n");
    }
}
