//! Prompt templates sent to the generation collaborator.
//!
//! Every function here is pure: identical inputs produce byte-identical
//! prompts. The output grammars requested from the model (`# EPIC:`,
//! `## TASKS`, `## NEW TICKETS`, `POINTS:`) are the ones `plan` and
//! `generation` parse back.

use crate::types::{AnswerPair, EstimateOptions, ExistingChildTicket, GenerationContext, Ticket};
use std::fmt::Write as _;

/// Which family of final prompt the Q&A flow feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Description,
    Epic,
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

pub fn question_prompt(ctx: &GenerationContext, kind: ContentKind, max_questions: usize) -> String {
    let mut p = String::new();
    if ctx.is_spike {
        let _ = writeln!(
            p,
            "You are helping plan a time-boxed research spike in an issue tracker."
        );
        let _ = writeln!(
            p,
            "Ask up to {max_questions} short clarifying questions that pin down the research \
             goal, the options to compare, the time box, and what a useful outcome looks like."
        );
    } else {
        let subject = match kind {
            ContentKind::Description => "a ticket description",
            ContentKind::Epic => "an epic and its task breakdown",
        };
        let _ = writeln!(
            p,
            "You are helping a software team write {subject} in an issue tracker."
        );
        let _ = writeln!(
            p,
            "Ask up to {max_questions} short clarifying questions that would most improve it: \
             scope, acceptance criteria, constraints, dependencies."
        );
    }
    let _ = writeln!(p);
    write_subject(&mut p, ctx);
    if ctx.existing_content.is_some() || !ctx.related.is_empty() {
        let _ = writeln!(
            p,
            "Do not ask about anything the existing content or related tickets already answer."
        );
    }
    let _ = writeln!(p);
    let _ = writeln!(
        p,
        "Reply with the questions only, one per line, numbered \"1.\", \"2.\", and so on."
    );
    p
}

// ---------------------------------------------------------------------------
// Final generation
// ---------------------------------------------------------------------------

pub fn final_prompt(ctx: &GenerationContext, kind: ContentKind, answers: &[AnswerPair]) -> String {
    match kind {
        ContentKind::Description => description_prompt(ctx, answers),
        ContentKind::Epic => epic_prompt(ctx, answers),
    }
}

fn description_prompt(ctx: &GenerationContext, answers: &[AnswerPair]) -> String {
    let mut p = String::new();
    if ctx.is_spike {
        let _ = writeln!(p, "Write the description for a research spike ticket.");
        let _ = writeln!(
            p,
            "Use these markdown sections: Goal, Questions to Answer, Approach, Time Box, Deliverables."
        );
    } else {
        let _ = writeln!(p, "Write the description for an issue-tracker ticket.");
        let _ = writeln!(
            p,
            "Use these markdown sections: Summary, Background, Requirements, Acceptance Criteria."
        );
    }
    let _ = writeln!(p);
    write_subject(&mut p, ctx);
    write_answers(&mut p, answers);
    if ctx.existing_content.is_some() {
        let _ = writeln!(
            p,
            "Keep every fact from the existing description unless an answer contradicts it."
        );
    }
    let _ = writeln!(p);
    let _ = writeln!(
        p,
        "Reply with the description only, no preamble and no closing remarks."
    );
    p
}

fn epic_prompt(ctx: &GenerationContext, answers: &[AnswerPair]) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Plan an epic and break it into independently deliverable tasks."
    );
    if ctx.is_spike {
        let _ = writeln!(
            p,
            "This is research work: tasks should be investigations with concrete findings."
        );
    }
    let _ = writeln!(p);
    write_subject(&mut p, ctx);
    write_answers(&mut p, answers);
    let _ = writeln!(p);
    let _ = writeln!(p, "Reply in exactly this format:");
    let _ = writeln!(p);
    let _ = writeln!(p, "# EPIC: <short epic title>");
    let _ = writeln!(p);
    let _ = writeln!(p, "<epic description, a few paragraphs>");
    let _ = writeln!(p);
    let _ = writeln!(p, "## TASKS");
    let _ = writeln!(p, "- [ ] <task summary>");
    let _ = writeln!(p, "- [ ] <task summary>");
    p
}

// ---------------------------------------------------------------------------
// Decomposition
// ---------------------------------------------------------------------------

pub fn decomposition_prompt(
    ticket: &Ticket,
    children: &[ExistingChildTicket],
    max_points: u32,
    answers: &[AnswerPair],
) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Break the following ticket into smaller child tickets that can each be finished in a few days."
    );
    let _ = writeln!(
        p,
        "Estimate every new ticket in story points; no ticket may exceed {max_points} points."
    );
    let _ = writeln!(p);
    let _ = writeln!(p, "Ticket {}: {}", ticket.key, ticket.summary);
    if let Some(desc) = ticket.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(p);
        let _ = writeln!(p, "Description:");
        let _ = writeln!(p, "{}", desc.trim());
    }
    if !children.is_empty() {
        let _ = writeln!(p);
        let _ = writeln!(
            p,
            "These child tickets already exist. Do not propose them again; list them under EXISTING TICKETS:"
        );
        for child in children {
            let _ = writeln!(
                p,
                "- [{}] {} ({} points)",
                child.key, child.summary, child.story_points
            );
        }
    }
    write_answers(&mut p, answers);
    let _ = writeln!(p);
    let _ = writeln!(p, "Reply in exactly this format:");
    let _ = writeln!(p);
    let _ = writeln!(p, "## NEW TICKETS");
    let _ = writeln!(p, "- [ ] <summary> (<N> points)");
    let _ = writeln!(p);
    let _ = writeln!(p, "## EXISTING TICKETS");
    let _ = writeln!(p, "- [x] [<KEY>] <summary> (<N> points) [EXISTING]");
    p
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

pub fn estimate_prompt(summary: &str, description: Option<&str>, opts: &EstimateOptions) -> String {
    let scale: Vec<String> = opts.scale.iter().map(u32::to_string).collect();
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Estimate the effort of this ticket in story points for an experienced software team."
    );
    let _ = writeln!(p, "Allowed values: {}.", scale.join(", "));
    let _ = writeln!(p);
    if let Some(t) = &opts.ticket_type {
        let _ = writeln!(p, "Type: {t}");
    }
    let _ = writeln!(p, "Summary: {summary}");
    if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(p, "Description:");
        let _ = writeln!(p, "{}", desc.trim());
    }
    let _ = writeln!(p);
    let _ = writeln!(p, "Reply in exactly this format:");
    let _ = writeln!(p, "POINTS: <number>");
    let _ = writeln!(p, "REASONING: <one or two sentences>");
    p
}

// ---------------------------------------------------------------------------
// Shared sections
// ---------------------------------------------------------------------------

fn write_subject(p: &mut String, ctx: &GenerationContext) {
    let _ = writeln!(p, "Topic: {}", ctx.topic.trim());
    if let Some(t) = &ctx.ticket_type {
        let _ = writeln!(p, "Ticket type: {t}");
    }
    if let Some(existing) = &ctx.existing_content {
        let _ = writeln!(p);
        let _ = writeln!(p, "Existing content:");
        let _ = writeln!(p, "{}", existing.trim());
    }
    if !ctx.related.is_empty() {
        let _ = writeln!(p);
        let _ = writeln!(p, "Related tickets:");
        for r in &ctx.related {
            let _ = writeln!(p, "- {r}");
        }
    }
}

fn write_answers(p: &mut String, answers: &[AnswerPair]) {
    if answers.is_empty() {
        return;
    }
    let _ = writeln!(p);
    let _ = writeln!(p, "Clarifications from the team:");
    for (i, pair) in answers.iter().enumerate() {
        let answer = pair.answer.trim();
        let answer = if answer.is_empty() { "(no answer)" } else { answer };
        let _ = writeln!(p, "Q{}: {}", i + 1, pair.question.trim());
        let _ = writeln!(p, "A{}: {}", i + 1, answer);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
