//! `tix decompose`: break a ticket into child tickets.
//!
//! ```text
//! fetch ticket + children ─► Q&A ─► generate plan ─► parse ─► drop duplicates
//!        ▲                                                         │
//!        └──── edit / regenerate ◄── validate ◄── select proposals ◄┘
//!                                       │
//!                                       ▼
//!                         create children ─► roll up points
//! ```

use super::{parse_key, CreatedTicket, BROKEN_MENU, PLAN_MENU};
use crate::context::{AppContext, Services};
use crate::output::{print_json, render_table};
use crate::terminal::Terminal;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tix_core::io::save_snapshot;
use tix_core::paths;
use tix_core::plan::{format_decomposition_plan, parse_decomposition_plan};
use tix_core::prompts::{self, ContentKind};
use tix_core::qa::{InputMethod, QuestionEngine};
use tix_core::reconcile::{filter_duplicates, total_points, validate_plan};
use tix_core::selection::Selection;
use tix_core::types::{
    CreateTicketRequest, DecompositionPlan, ExistingChildTicket, GenerationContext, ProposedTicket,
};

#[derive(Args)]
pub struct DecomposeArgs {
    /// Ticket to break down (e.g. ENG-42)
    pub key: String,

    /// Maximum clarifying questions (default: qa.max_questions)
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Largest estimate a child ticket may carry (default: estimate.max_points)
    #[arg(long)]
    pub max_points: Option<u32>,

    /// Leave the parent's story points unchanged
    #[arg(long)]
    pub no_rollup: bool,

    /// Answer to use instead of prompting; repeat once per question, in order
    #[arg(long = "answer", value_name = "TEXT")]
    pub answers: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DecomposeOutcome {
    pub key: String,
    pub summary: String,
    pub created: Vec<CreatedTicket>,
    /// Duplicate warnings from the last plan considered.
    pub skipped: Vec<String>,
    /// Points written to the parent, when rolled up.
    pub rolled_up: Option<u32>,
    pub rejected: Option<PathBuf>,
}

enum Next {
    Create(Vec<ProposedTicket>),
    Edit(String),
    Regenerate,
    Quit,
}

pub fn run(ctx: &AppContext, args: DecomposeArgs) -> anyhow::Result<()> {
    let jira = ctx.jira()?;
    let gemini = ctx.gemini()?;
    let editor = ctx.editor();
    let svc = Services {
        tracker: &jira,
        generator: &gemini,
        editor: &editor,
    };
    let mut term = ctx.terminal();

    let outcome = decompose(ctx, &svc, &mut term, &args)?;
    if !outcome.created.is_empty() {
        ctx.remember(&outcome.key, &outcome.summary, "decompose");
    }
    if ctx.json {
        print_json(&outcome)?;
    }
    Ok(())
}

pub(crate) fn decompose(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    args: &DecomposeArgs,
) -> anyhow::Result<DecomposeOutcome> {
    let key = parse_key(&args.key)?;
    let ticket = svc
        .tracker
        .get_ticket(&key)
        .with_context(|| format!("failed to fetch {key}"))?;
    let children = svc
        .tracker
        .children(&key)
        .with_context(|| format!("failed to list children of {key}"))?;
    let max_points = args.max_points.unwrap_or(ctx.config.estimate.max_points);

    term.say(format!("{key}: {}", ticket.summary))?;
    if !children.is_empty() {
        term.say(format!("{} existing child tickets", children.len()))?;
    }

    let gen_ctx = GenerationContext::for_ticket(&ticket)
        .with_related(children.iter().map(|c| c.summary.clone()).collect());
    let engine = QuestionEngine::new(svc.generator, ContentKind::Description);
    let max_questions = args.max_questions.unwrap_or(ctx.config.qa.max_questions);
    let answers = if args.answers.is_empty() {
        engine.ask(&gen_ctx, max_questions, &mut term.input_method())?
    } else {
        let mut input = InputMethod::structured(args.answers.iter().cloned());
        engine.ask(&gen_ctx, max_questions, &mut input)?
    };

    let prompt = prompts::decomposition_prompt(&ticket, &children, max_points, &answers);
    let generate = || -> anyhow::Result<String> {
        let text = svc
            .generator
            .generate_content(&prompt)
            .context("failed to generate decomposition plan")?;
        Ok(text.trim().to_string())
    };

    let mut outcome = DecomposeOutcome {
        key: key.clone(),
        summary: ticket.summary.clone(),
        ..Default::default()
    };
    let mut raw = generate()?;

    let chosen = loop {
        let plan = parse_decomposition_plan(&raw);
        let (proposals, warnings) = filter_duplicates(&plan.new_tickets, &children);
        for w in &warnings {
            term.say(format!("  warning: {w}"))?;
        }
        outcome.skipped = warnings;

        let next = if proposals.is_empty() {
            term.say("Nothing new to create.")?;
            fix_menu(term, &plan)?
        } else {
            let items: Vec<(usize, ProposedTicket)> = proposals.into_iter().enumerate().collect();
            let selection =
                Selection::new(items, ctx.config.ui.page_size, |(i, _)| i.to_string()).all_selected();
            match term.select(selection, "create", |(_, t)| label(t))? {
                None => Next::Quit,
                Some(picked) => {
                    let picked: Vec<ProposedTicket> = picked.into_iter().map(|(_, t)| t).collect();
                    let edited = DecompositionPlan {
                        new_tickets: picked.clone(),
                        existing_tickets: plan.existing_tickets.clone(),
                    };
                    match validate_plan(&picked, max_points) {
                        Ok(()) => {
                            term.say(preview(&picked, &children))?;
                            match term.choose("Create these tickets?", PLAN_MENU)? {
                                Some('c') => Next::Create(picked),
                                Some('e') => Next::Edit(format_decomposition_plan(&edited)),
                                Some('r') => Next::Regenerate,
                                _ => Next::Quit,
                            }
                        }
                        Err(e) => {
                            term.say(format!("Plan is not valid: {e}"))?;
                            fix_menu(term, &edited)?
                        }
                    }
                }
            }
        };

        match next {
            Next::Create(picked) => break picked,
            Next::Edit(seed) => {
                raw = svc.editor.edit(&seed).context("failed to edit plan")?;
            }
            Next::Regenerate => raw = generate()?,
            Next::Quit => {
                let path = save_snapshot(&paths::rejected_dir(&ctx.config_dir), &key, &raw)
                    .context("failed to save rejected plan")?;
                term.say(format!("Nothing created. Plan saved to {}", path.display()))?;
                outcome.rejected = Some(path);
                return Ok(outcome);
            }
        }
    };

    let project = paths::project_of(&key).unwrap_or(ctx.config.jira.project.as_str());
    for t in &chosen {
        let child_key = svc
            .tracker
            .create_ticket(&CreateTicketRequest {
                project: project.to_string(),
                summary: t.summary.clone(),
                description: None,
                issue_type: ctx.config.jira.default_issue_type.clone(),
                story_points: Some(t.story_points),
                parent_key: Some(key.clone()),
            })
            .with_context(|| format!("failed to create '{}'", t.summary))?;
        tracing::info!(key = %child_key, parent = %key, "child ticket created");
        term.say(format!("  {child_key}  {}", label(t)))?;
        outcome.created.push(CreatedTicket {
            key: child_key,
            summary: t.summary.clone(),
            story_points: Some(t.story_points),
        });
    }

    if !args.no_rollup {
        let total = total_points(&chosen, &children);
        svc.tracker
            .update_story_points(&key, total)
            .with_context(|| format!("failed to roll up points onto {key}"))?;
        tracing::info!(key = %key, points = total, "story points rolled up");
        term.say(format!("Set {key} to {total} points"))?;
        outcome.rolled_up = Some(total);
    }
    term.say(svc.tracker.browse_url(&key))?;
    Ok(outcome)
}

fn fix_menu(term: &mut Terminal<'_>, plan: &DecompositionPlan) -> anyhow::Result<Next> {
    Ok(match term.choose("Fix it?", BROKEN_MENU)? {
        Some('e') => Next::Edit(format_decomposition_plan(plan)),
        Some('r') => Next::Regenerate,
        _ => Next::Quit,
    })
}

fn label(t: &ProposedTicket) -> String {
    match t.story_points {
        1 => format!("{} (1 point)", t.summary),
        n => format!("{} ({n} points)", t.summary),
    }
}

fn preview(picked: &[ProposedTicket], children: &[ExistingChildTicket]) -> String {
    let rows: Vec<Vec<String>> = picked
        .iter()
        .map(|t| vec![t.story_points.to_string(), t.summary.clone()])
        .collect();
    let new_points = total_points(picked, &[]);
    format!(
        "\n{}\n{} new tickets, {new_points} points ({} including existing children)",
        render_table(&["POINTS", "SUMMARY"], &rows).trim_end(),
        picked.len(),
        total_points(picked, children)
    )
}
