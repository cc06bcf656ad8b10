//! In-memory collaborators used by the unit tests of this workspace.

use crate::error::{Result, TixError};
use crate::generation::Generator;
use crate::tracker::TicketSystem;
use crate::types::{CreateTicketRequest, Estimate, EstimateOptions, ExistingChildTicket, Ticket};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

// ---------------------------------------------------------------------------
// FakeGenerator
// ---------------------------------------------------------------------------

/// Scripted [`Generator`]. Records every prompt and counts calls per method.
#[derive(Default)]
pub struct FakeGenerator {
    questions: Vec<String>,
    question_error: Option<String>,
    contents: RefCell<VecDeque<String>>,
    content_error: Option<String>,
    estimates: RefCell<VecDeque<Estimate>>,
    prompts: RefCell<Vec<String>>,
    question_calls: Cell<usize>,
    content_calls: Cell<usize>,
    estimate_calls: Cell<usize>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Questions returned by every `generate_questions` call.
    pub fn with_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.questions = questions.into_iter().map(Into::into).collect();
        self
    }

    /// Queue a reply for `generate_content`. Replies are used once each, in order.
    pub fn with_content(self, content: impl Into<String>) -> Self {
        self.contents.borrow_mut().push_back(content.into());
        self
    }

    pub fn with_estimate(self, points: u32, reasoning: impl Into<String>) -> Self {
        self.estimates.borrow_mut().push_back(Estimate {
            points,
            reasoning: reasoning.into(),
        });
        self
    }

    pub fn failing_questions(mut self, message: impl Into<String>) -> Self {
        self.question_error = Some(message.into());
        self
    }

    pub fn failing_content(mut self, message: impl Into<String>) -> Self {
        self.content_error = Some(message.into());
        self
    }

    pub fn question_calls(&self) -> usize {
        self.question_calls.get()
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.get()
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.get()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Generator for FakeGenerator {
    fn generate_questions(&self, prompt: &str) -> Result<Vec<String>> {
        self.question_calls.set(self.question_calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        match &self.question_error {
            Some(msg) => Err(TixError::Generation(msg.clone())),
            None => Ok(self.questions.clone()),
        }
    }

    fn generate_content(&self, prompt: &str) -> Result<String> {
        self.content_calls.set(self.content_calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        if let Some(msg) = &self.content_error {
            return Err(TixError::Generation(msg.clone()));
        }
        self.contents
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TixError::Generation("no more scripted content".into()))
    }

    fn estimate_story_points(
        &self,
        summary: &str,
        _description: Option<&str>,
        _opts: &EstimateOptions,
    ) -> Result<Estimate> {
        self.estimate_calls.set(self.estimate_calls.get() + 1);
        self.prompts.borrow_mut().push(summary.to_string());
        self.estimates
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TixError::Generation("no more scripted estimates".into()))
    }
}

// ---------------------------------------------------------------------------
// FakeTracker
// ---------------------------------------------------------------------------

/// In-memory [`TicketSystem`]. Created tickets get keys `<PROJECT>-<n>`
/// continuing after the highest seeded number.
pub struct FakeTracker {
    tickets: RefCell<BTreeMap<String, Ticket>>,
    created: RefCell<Vec<CreateTicketRequest>>,
    next_id: Cell<u32>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            tickets: RefCell::new(BTreeMap::new()),
            created: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn with_ticket(self, ticket: Ticket) -> Self {
        if let Some(n) = ticket
            .key
            .rsplit('-')
            .next()
            .and_then(|n| n.parse::<u32>().ok())
        {
            if n >= self.next_id.get() {
                self.next_id.set(n + 1);
            }
        }
        self.tickets.borrow_mut().insert(ticket.key.clone(), ticket);
        self
    }

    pub fn ticket(&self, key: &str) -> Option<Ticket> {
        self.tickets.borrow().get(key).cloned()
    }

    pub fn created(&self) -> Vec<CreateTicketRequest> {
        self.created.borrow().clone()
    }
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A bare ticket for seeding fakes.
pub fn ticket(key: &str, summary: &str) -> Ticket {
    Ticket {
        key: key.to_string(),
        summary: summary.to_string(),
        description: None,
        issue_type: "Story".to_string(),
        status: "To Do".to_string(),
        story_points: None,
        parent_key: None,
        is_epic: false,
    }
}

impl TicketSystem for FakeTracker {
    fn get_ticket(&self, key: &str) -> Result<Ticket> {
        self.ticket(key)
            .ok_or_else(|| TixError::tracker("get ticket", format!("{key} not found")))
    }

    /// Supports only `key in (A, B)` style queries; anything else returns all tickets.
    fn search(&self, jql: &str, max_results: usize) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.borrow();
        let upper = jql.to_uppercase();
        Ok(tickets
            .values()
            .filter(|t| !upper.contains("KEY IN") || upper.contains(&t.key.to_uppercase()))
            .take(max_results)
            .cloned()
            .collect())
    }

    fn children(&self, parent_key: &str) -> Result<Vec<ExistingChildTicket>> {
        Ok(self
            .tickets
            .borrow()
            .values()
            .filter(|t| t.parent_key.as_deref() == Some(parent_key))
            .map(|t| ExistingChildTicket {
                key: t.key.clone(),
                summary: t.summary.clone(),
                story_points: t.story_points.unwrap_or(0),
                issue_type: t.issue_type.clone(),
            })
            .collect())
    }

    fn create_ticket(&self, request: &CreateTicketRequest) -> Result<String> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let key = format!("{}-{id}", request.project);
        self.tickets.borrow_mut().insert(
            key.clone(),
            Ticket {
                key: key.clone(),
                summary: request.summary.clone(),
                description: request.description.clone(),
                issue_type: request.issue_type.clone(),
                status: "To Do".to_string(),
                story_points: request.story_points,
                parent_key: request.parent_key.clone(),
                is_epic: request.issue_type.eq_ignore_ascii_case("epic"),
            },
        );
        self.created.borrow_mut().push(request.clone());
        Ok(key)
    }

    fn update_description(&self, key: &str, description: &str) -> Result<()> {
        let mut tickets = self.tickets.borrow_mut();
        let t = tickets
            .get_mut(key)
            .ok_or_else(|| TixError::tracker("update description", format!("{key} not found")))?;
        t.description = Some(description.to_string());
        Ok(())
    }

    fn update_story_points(&self, key: &str, points: u32) -> Result<()> {
        let mut tickets = self.tickets.borrow_mut();
        let t = tickets
            .get_mut(key)
            .ok_or_else(|| TixError::tracker("update story points", format!("{key} not found")))?;
        t.story_points = Some(points);
        Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://tracker.invalid/browse/{key}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
