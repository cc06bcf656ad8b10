pub mod config;
pub mod credentials;
pub mod error;
pub mod fake;
pub mod generation;
pub mod io;
pub mod jira;
pub mod paths;
pub mod plan;
pub mod prompts;
pub mod qa;
pub mod reconcile;
pub mod selection;
pub mod state;
pub mod tracker;
pub mod types;

pub use error::{PlanParseError, Result, TixError, ValidationError};
