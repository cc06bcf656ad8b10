use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Q&A
// ---------------------------------------------------------------------------

/// A clarifying question proposed by the model. `ordinal` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub ordinal: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPair {
    pub question: String,
    pub answer: String,
}

/// What the generated content is about. Built once per command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    pub topic: String,
    pub existing_content: Option<String>,
    pub ticket_type: Option<String>,
    pub is_spike: bool,
    /// Summaries of related tickets (children) the questions should not revisit.
    #[serde(default)]
    pub related: Vec<String>,
}

impl GenerationContext {
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let is_spike = is_spike(&topic, None);
        Self {
            topic,
            is_spike,
            ..Default::default()
        }
    }

    /// Context for an existing ticket: its summary is the topic, its current
    /// description (if non-blank) is the existing content.
    pub fn for_ticket(ticket: &Ticket) -> Self {
        Self {
            topic: ticket.summary.clone(),
            existing_content: ticket
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            ticket_type: Some(ticket.issue_type.clone()).filter(|t| !t.is_empty()),
            is_spike: is_spike(&ticket.summary, Some(&ticket.key)),
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }
}

/// A spike is a time-boxed research ticket: summary starts with "SPIKE"
/// (any case) or the key contains it.
pub fn is_spike(summary: &str, key: Option<&str>) -> bool {
    let summary_hit = summary
        .trim_start()
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("spike"));
    let key_hit = key.is_some_and(|k| k.to_ascii_uppercase().contains("SPIKE"));
    summary_hit || key_hit
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedTicket {
    pub summary: String,
    /// 0 when the plan text carried no points annotation.
    pub story_points: u32,
    pub is_existing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ProposedTicket {
    pub fn new(summary: impl Into<String>, story_points: u32) -> Self {
        Self {
            summary: summary.into(),
            story_points,
            is_existing: false,
            key: None,
        }
    }

    pub fn existing(summary: impl Into<String>, story_points: u32, key: Option<String>) -> Self {
        Self {
            summary: summary.into(),
            story_points,
            is_existing: true,
            key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecompositionPlan {
    pub new_tickets: Vec<ProposedTicket>,
    pub existing_tickets: Vec<ProposedTicket>,
}

impl DecompositionPlan {
    pub fn is_empty(&self) -> bool {
        self.new_tickets.is_empty() && self.existing_tickets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicTask {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicPlan {
    pub title: String,
    pub description: String,
    pub tasks: Vec<EpicTask>,
}

// ---------------------------------------------------------------------------
// Ticket-system records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
    pub issue_type: String,
    pub status: String,
    pub story_points: Option<u32>,
    pub parent_key: Option<String>,
    pub is_epic: bool,
}

/// A child of the ticket being decomposed, as reported by the ticket system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingChildTicket {
    pub key: String,
    pub summary: String,
    pub story_points: u32,
    pub issue_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub project: String,
    pub summary: String,
    pub description: Option<String>,
    pub issue_type: String,
    pub story_points: Option<u32>,
    pub parent_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub points: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateOptions {
    /// Allowed point values, ascending.
    pub scale: Vec<u32>,
    pub ticket_type: Option<String>,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            scale: vec![1, 2, 3, 5, 8, 13],
            ticket_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
