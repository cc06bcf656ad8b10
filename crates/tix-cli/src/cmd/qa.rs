use super::parse_key;
use crate::context::{AppContext, Services};
use crate::output::print_json;
use crate::terminal::{MenuChoice, Terminal};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tix_core::prompts::ContentKind;
use tix_core::qa::{InputMethod, QuestionEngine};
use tix_core::types::GenerationContext;

const RULE: &str = "----------------------------------------";

const MENU: &[MenuChoice] = &[
    MenuChoice::new('a', "accept"),
    MenuChoice::new('e', "edit"),
    MenuChoice::new('r', "regenerate"),
    MenuChoice::new('q', "quit"),
];

#[derive(Args)]
pub struct QaArgs {
    /// Ticket key (e.g. ENG-42)
    pub key: String,

    /// Maximum clarifying questions (default: qa.max_questions)
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Answer to use instead of prompting; repeat once per question, in order
    #[arg(long = "answer", value_name = "TEXT")]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QaOutcome {
    pub key: String,
    pub summary: String,
    pub updated: bool,
    pub description: String,
}

pub fn run(ctx: &AppContext, args: QaArgs) -> anyhow::Result<()> {
    let jira = ctx.jira()?;
    let gemini = ctx.gemini()?;
    let editor = ctx.editor();
    let svc = Services {
        tracker: &jira,
        generator: &gemini,
        editor: &editor,
    };
    let mut term = ctx.terminal();

    let outcome = describe(ctx, &svc, &mut term, &args)?;
    if outcome.updated {
        ctx.remember(&outcome.key, &outcome.summary, "qa");
    }
    if ctx.json {
        print_json(&outcome)?;
    }
    Ok(())
}

/// Q&A, draft, then accept / edit / regenerate until the user accepts or
/// quits. Accepting overwrites the ticket description.
pub(crate) fn describe(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    args: &QaArgs,
) -> anyhow::Result<QaOutcome> {
    let key = parse_key(&args.key)?;
    let ticket = svc
        .tracker
        .get_ticket(&key)
        .with_context(|| format!("failed to fetch {key}"))?;
    let related = if ticket.is_epic {
        svc.tracker
            .children(&key)
            .with_context(|| format!("failed to list children of {key}"))?
            .into_iter()
            .map(|c| c.summary)
            .collect()
    } else {
        Vec::new()
    };
    let gen_ctx = GenerationContext::for_ticket(&ticket).with_related(related);
    let engine = QuestionEngine::new(svc.generator, ContentKind::Description);
    let max_questions = args.max_questions.unwrap_or(ctx.config.qa.max_questions);

    term.say(format!("{key}: {}", ticket.summary))?;
    if gen_ctx.is_spike {
        term.say("(spike: drafting a research description)")?;
    }
    let answers = if args.answers.is_empty() {
        engine.ask(&gen_ctx, max_questions, &mut term.input_method())?
    } else {
        let mut input = InputMethod::structured(args.answers.iter().cloned());
        engine.ask(&gen_ctx, max_questions, &mut input)?
    };

    let mut draft = engine
        .draft(&gen_ctx, &answers)
        .context("failed to generate description")?;
    let mut outcome = QaOutcome {
        key: key.clone(),
        summary: ticket.summary.clone(),
        updated: false,
        description: String::new(),
    };

    loop {
        term.say(format!("\n{RULE}\n{draft}\n{RULE}"))?;
        match term.choose("Use this description?", MENU)? {
            Some('a') if draft.is_empty() => term.say("  the description is empty")?,
            Some('a') => {
                svc.tracker
                    .update_description(&key, &draft)
                    .with_context(|| format!("failed to update {key}"))?;
                tracing::info!(key = %key, "description updated");
                term.say(format!("Updated {}", svc.tracker.browse_url(&key)))?;
                outcome.updated = true;
                break;
            }
            Some('e') => {
                draft = svc
                    .editor
                    .edit(&draft)
                    .context("failed to edit description")?
                    .trim()
                    .to_string();
            }
            Some('r') => {
                draft = engine
                    .draft(&gen_ctx, &answers)
                    .context("failed to regenerate description")?;
            }
            _ => {
                term.say("Left the description unchanged.")?;
                break;
            }
        }
    }
    outcome.description = draft;
    Ok(outcome)
}
