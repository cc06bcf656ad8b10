//! The generation collaborator: a capability trait plus the Gemini adapter.

use crate::error::{Result, TixError};
use crate::prompts;
use crate::types::{Estimate, EstimateOptions};
use genai_client::{GeminiClient, GenerationOptions};
use regex::Regex;
use std::sync::OnceLock;

/// Remote text generation. Every call is a single blocking round-trip; a
/// failure propagates immediately.
pub trait Generator {
    /// Ask the model for clarifying questions. The returned list may be
    /// shorter than the prompt requested, or empty.
    fn generate_questions(&self, prompt: &str) -> Result<Vec<String>>;

    fn generate_content(&self, prompt: &str) -> Result<String>;

    fn estimate_story_points(
        &self,
        summary: &str,
        description: Option<&str>,
        opts: &EstimateOptions,
    ) -> Result<Estimate>;
}

// ---------------------------------------------------------------------------
// GeminiGenerator
// ---------------------------------------------------------------------------

pub struct GeminiGenerator {
    client: GeminiClient,
    options: GenerationOptions,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            options: GenerationOptions {
                temperature: Some(0.4),
                ..Default::default()
            },
        }
    }

    fn generate(&self, prompt: &str, operation: &str) -> Result<String> {
        tracing::debug!(model = %self.client.model(), operation, "calling generation service");
        self.client
            .generate(prompt, &self.options)
            .map_err(|e| TixError::Generation(format!("{operation}: {e}")))
    }
}

impl Generator for GeminiGenerator {
    fn generate_questions(&self, prompt: &str) -> Result<Vec<String>> {
        let text = self.generate(prompt, "generate questions")?;
        let questions = parse_question_list(&text);
        if questions.is_empty() {
            return Err(TixError::Generation(format!(
                "generate questions: no questions found in reply: {}",
                text.trim()
            )));
        }
        Ok(questions)
    }

    fn generate_content(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, "generate content")
    }

    fn estimate_story_points(
        &self,
        summary: &str,
        description: Option<&str>,
        opts: &EstimateOptions,
    ) -> Result<Estimate> {
        let prompt = prompts::estimate_prompt(summary, description, opts);
        let text = self.generate(&prompt, "estimate story points")?;
        parse_estimate(&text, &opts.scale)
    }
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

static LIST_MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn list_marker_re() -> &'static Regex {
    LIST_MARKER_RE.get_or_init(|| {
        Regex::new(r"^(?:\d+[.)]|[-*•]|Q\d+[:.)])\s+(.+)$").unwrap()
    })
}

/// Recover questions from a numbered or bulleted reply. Lines without a list
/// marker are preamble and ignored; if no line has a marker, any line ending
/// in `?` counts.
pub fn parse_question_list(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let marked: Vec<String> = lines
        .iter()
        .filter_map(|l| list_marker_re().captures(l))
        .map(|c| c[1].trim().trim_matches('*').trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if !marked.is_empty() {
        return marked;
    }

    lines
        .into_iter()
        .filter(|l| l.ends_with('?'))
        .map(str::to_string)
        .collect()
}

static POINTS_RE: OnceLock<Regex> = OnceLock::new();
static REASONING_RE: OnceLock<Regex> = OnceLock::new();

fn points_re() -> &'static Regex {
    POINTS_RE.get_or_init(|| Regex::new(r"(?i)\bPOINTS\s*:\s*\**\s*(\d+)").unwrap())
}

fn reasoning_re() -> &'static Regex {
    REASONING_RE.get_or_init(|| Regex::new(r"(?is)\bREASONING\s*:\s*\**\s*(.+)").unwrap())
}

/// Parse a `POINTS: n` / `REASONING: text` reply, snapping the points onto
/// `scale` when one is given.
pub fn parse_estimate(text: &str, scale: &[u32]) -> Result<Estimate> {
    let raw: u32 = points_re()
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| {
            TixError::Generation(format!(
                "estimate story points: no POINTS line in reply: {}",
                text.trim()
            ))
        })?;
    let reasoning = reasoning_re()
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    Ok(Estimate {
        points: snap_to_scale(raw, scale),
        reasoning,
    })
}

/// Nearest allowed value; ties round up. An empty scale leaves `points` as is.
pub fn snap_to_scale(points: u32, scale: &[u32]) -> u32 {
    scale
        .iter()
        .copied()
        .min_by_key(|&s| (s.abs_diff(points), std::cmp::Reverse(s)))
        .unwrap_or(points)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
