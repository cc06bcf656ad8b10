//! Command handlers and terminal plumbing for the `tix` binary.
//!
//! Handlers take their collaborators ([`context::Services`]) and a
//! [`terminal::Terminal`] explicitly, so every flow runs the same against
//! Jira/Gemini or against the in-memory fakes from `tix_core::fake`.

pub mod cmd;
pub mod context;
pub mod editor;
pub mod output;
pub mod terminal;
