//! The ticket-system collaborator.

use crate::error::Result;
use crate::types::{CreateTicketRequest, ExistingChildTicket, Ticket};

/// Issue-tracker capabilities the commands rely on. One production adapter
/// ([`crate::jira::JiraClient`]) and one in-memory fake
/// ([`crate::fake::FakeTracker`]).
pub trait TicketSystem {
    fn get_ticket(&self, key: &str) -> Result<Ticket>;

    fn search(&self, jql: &str, max_results: usize) -> Result<Vec<Ticket>>;

    fn children(&self, parent_key: &str) -> Result<Vec<ExistingChildTicket>>;

    /// Create a ticket and return its key.
    fn create_ticket(&self, request: &CreateTicketRequest) -> Result<String>;

    fn update_description(&self, key: &str, description: &str) -> Result<()>;

    fn update_story_points(&self, key: &str, points: u32) -> Result<()>;

    /// Human-facing URL of a ticket.
    fn browse_url(&self, key: &str) -> String;
}
