use thiserror::Error;

#[derive(Debug, Error)]
pub enum TixError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("ticket system: {operation} failed: {message}")]
    Tracker { operation: String, message: String },

    #[error(transparent)]
    Parse(#[from] PlanParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("missing credential: {0} (run 'tix auth')")]
    MissingCredential(String),

    #[error("invalid ticket key '{0}': expected PROJECT-123")]
    InvalidKey(String),

    #[error("editor failed: {0}")]
    Editor(String),

    #[error("not configured: run 'tix init'")]
    NotConfigured,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TixError {
    pub fn tracker(operation: impl Into<String>, message: impl ToString) -> Self {
        TixError::Tracker {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

impl From<genai_client::GenAiError> for TixError {
    fn from(e: genai_client::GenAiError) -> Self {
        TixError::Generation(e.to_string())
    }
}

/// Structural failures when recovering a plan from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanParseError {
    #[error("no '# EPIC: <title>' line found")]
    MissingTitle,

    #[error("no '## TASKS' section found")]
    MissingTasks,

    #[error("'## TASKS' section contains no tasks")]
    EmptyTasks,
}

/// The first rule a plan breaks before ticket creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ticket {index} has an empty summary")]
    EmptySummary { index: usize },

    #[error("'{summary}' has invalid story points: {points}")]
    InvalidPoints { summary: String, points: u32 },

    #[error("'{summary}' has {points} story points, over the limit of {limit}")]
    PointsExceedLimit {
        summary: String,
        points: u32,
        limit: u32,
    },
}

pub type Result<T> = std::result::Result<T, TixError>;
