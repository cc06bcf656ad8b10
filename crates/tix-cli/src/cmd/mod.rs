pub mod auth;
pub mod config;
pub mod decompose;
pub mod epic;
pub mod estimate;
pub mod init;
pub mod qa;
pub mod recent;
pub mod view;

use crate::terminal::MenuChoice;
use anyhow::Context;
use serde::Serialize;

/// Menu for a generated plan that parsed and validated.
pub(crate) const PLAN_MENU: &[MenuChoice] = &[
    MenuChoice::new('c', "create"),
    MenuChoice::new('e', "edit"),
    MenuChoice::new('r', "regenerate"),
    MenuChoice::new('q', "quit"),
];

/// Menu for a plan that failed to parse or validate. `--yes` takes the first
/// choice, so quit leads.
pub(crate) const BROKEN_MENU: &[MenuChoice] = &[
    MenuChoice::new('q', "quit"),
    MenuChoice::new('e', "edit"),
    MenuChoice::new('r', "regenerate"),
];

#[derive(Debug, Serialize)]
pub struct CreatedTicket {
    pub key: String,
    pub summary: String,
    pub story_points: Option<u32>,
}

/// Normalize a ticket key typed on the command line (`eng-12` -> `ENG-12`).
pub(crate) fn parse_key(raw: &str) -> anyhow::Result<String> {
    tix_core::paths::normalize_ticket_key(raw).with_context(|| format!("bad ticket key '{raw}'"))
}
