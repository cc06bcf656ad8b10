use super::{CreatedTicket, BROKEN_MENU, PLAN_MENU};
use crate::context::{AppContext, Services};
use crate::output::print_json;
use crate::terminal::Terminal;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tix_core::io::save_snapshot;
use tix_core::paths;
use tix_core::plan::{format_epic_plan, parse_epic_plan};
use tix_core::prompts::ContentKind;
use tix_core::reconcile::check_points;
use tix_core::qa::{InputMethod, QuestionEngine};
use tix_core::types::{CreateTicketRequest, EpicPlan, GenerationContext};

#[derive(Args)]
pub struct EpicArgs {
    /// What the epic is about
    #[arg(required = true, num_args = 1..)]
    pub topic: Vec<String>,

    /// Project key (default: jira.project)
    #[arg(long)]
    pub project: Option<String>,

    /// Maximum clarifying questions (default: qa.max_questions)
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Create tasks without asking the model for story points
    #[arg(long)]
    pub no_estimate: bool,

    /// Answer to use instead of prompting; repeat once per question, in order
    #[arg(long = "answer", value_name = "TEXT")]
    pub answers: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct EpicOutcome {
    pub epic: Option<CreatedTicket>,
    pub tasks: Vec<CreatedTicket>,
    /// Where the plan text was saved when the user quit without creating.
    pub rejected: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: EpicArgs) -> anyhow::Result<()> {
    let jira = ctx.jira()?;
    let gemini = ctx.gemini()?;
    let editor = ctx.editor();
    let svc = Services {
        tracker: &jira,
        generator: &gemini,
        editor: &editor,
    };
    let mut term = ctx.terminal();

    let outcome = plan_epic(ctx, &svc, &mut term, &args)?;
    if let Some(epic) = &outcome.epic {
        ctx.remember(&epic.key, &epic.summary, "epic");
    }
    if ctx.json {
        print_json(&outcome)?;
    }
    Ok(())
}

pub(crate) fn plan_epic(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    args: &EpicArgs,
) -> anyhow::Result<EpicOutcome> {
    let project = args
        .project
        .as_deref()
        .unwrap_or(&ctx.config.jira.project)
        .trim()
        .to_ascii_uppercase();
    if project.is_empty() {
        anyhow::bail!("no project: pass --project or run 'tix config set jira.project <KEY>'");
    }

    let gen_ctx = GenerationContext::new(args.topic.join(" "));
    let engine = QuestionEngine::new(svc.generator, ContentKind::Epic);
    let max_questions = args.max_questions.unwrap_or(ctx.config.qa.max_questions);
    let answers = if args.answers.is_empty() {
        engine.ask(&gen_ctx, max_questions, &mut term.input_method())?
    } else {
        let mut input = InputMethod::structured(args.answers.iter().cloned());
        engine.ask(&gen_ctx, max_questions, &mut input)?
    };

    let mut text = engine
        .draft(&gen_ctx, &answers)
        .context("failed to generate epic plan")?;

    loop {
        let parsed = parse_epic_plan(&text);
        let choice = match &parsed {
            Ok(plan) => {
                term.say(preview(plan))?;
                term.choose("Create this epic?", PLAN_MENU)?
            }
            Err(e) => {
                term.say(&text)?;
                term.say(format!("\nCould not read the plan: {e}"))?;
                term.choose("Fix it?", BROKEN_MENU)?
            }
        };

        match (choice, parsed) {
            (Some('c'), Ok(plan)) => return create(ctx, svc, term, args, &project, &plan),
            (Some('e'), parsed) => {
                let seed = match &parsed {
                    Ok(plan) => format_epic_plan(plan),
                    Err(_) => text.clone(),
                };
                text = svc.editor.edit(&seed).context("failed to edit plan")?;
            }
            (Some('r'), _) => {
                text = engine
                    .draft(&gen_ctx, &answers)
                    .context("failed to regenerate epic plan")?;
            }
            _ => {
                let path = save_snapshot(&paths::rejected_dir(&ctx.config_dir), "epic", &text)
                    .context("failed to save rejected plan")?;
                term.say(format!("Nothing created. Plan saved to {}", path.display()))?;
                return Ok(EpicOutcome {
                    rejected: Some(path),
                    ..Default::default()
                });
            }
        }
    }
}

fn create(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    args: &EpicArgs,
    project: &str,
    plan: &EpicPlan,
) -> anyhow::Result<EpicOutcome> {
    let jira = &ctx.config.jira;
    let description = Some(plan.description.clone()).filter(|d| !d.trim().is_empty());
    let epic_key = svc
        .tracker
        .create_ticket(&CreateTicketRequest {
            project: project.to_string(),
            summary: plan.title.clone(),
            description: description.clone(),
            issue_type: jira.epic_issue_type.clone(),
            story_points: None,
            parent_key: None,
        })
        .context("failed to create epic")?;
    tracing::info!(key = %epic_key, "epic created");
    term.say(format!("Created {epic_key}  {}", plan.title))?;

    let opts = ctx.config.estimate.options(Some(jira.default_issue_type.as_str()));
    let mut tasks = Vec::with_capacity(plan.tasks.len());
    for task in &plan.tasks {
        let story_points = if args.no_estimate {
            None
        } else {
            let estimate = svc
                .generator
                .estimate_story_points(&task.summary, description.as_deref(), &opts)
                .with_context(|| format!("failed to estimate '{}'", task.summary))?;
            match check_points(&task.summary, estimate.points, ctx.config.estimate.max_points) {
                Ok(()) => Some(estimate.points),
                Err(e) => {
                    tracing::warn!(points = estimate.points, "estimate rejected: {e}");
                    term.say(format!("  {e}; creating it unestimated"))?;
                    None
                }
            }
        };
        let key = svc
            .tracker
            .create_ticket(&CreateTicketRequest {
                project: project.to_string(),
                summary: task.summary.clone(),
                description: None,
                issue_type: jira.default_issue_type.clone(),
                story_points,
                parent_key: Some(epic_key.clone()),
            })
            .with_context(|| format!("failed to create task '{}'", task.summary))?;
        tracing::info!(key = %key, parent = %epic_key, "task created");
        let points = story_points.map(|p| format!(" ({p} points)")).unwrap_or_default();
        term.say(format!("  {key}  {}{points}", task.summary))?;
        tasks.push(CreatedTicket {
            key,
            summary: task.summary.clone(),
            story_points,
        });
    }
    term.say(svc.tracker.browse_url(&epic_key))?;

    Ok(EpicOutcome {
        epic: Some(CreatedTicket {
            key: epic_key,
            summary: plan.title.clone(),
            story_points: None,
        }),
        tasks,
        rejected: None,
    })
}

fn preview(plan: &EpicPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nEPIC: {}", plan.title);
    if !plan.description.is_empty() {
        let _ = writeln!(out, "\n{}", plan.description);
    }
    let _ = writeln!(out, "\nTasks:");
    for (i, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, task.summary);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::editor::ScriptedEditor;
    use crate::terminal::{scripted, scripted_with};
    use tempfile::TempDir;
    use tix_core::fake::{FakeGenerator, FakeTracker};

    const PLAN: &str = "# EPIC: Self-service billing\n\nLet customers manage invoices.\n\n## TASKS\n- [ ] Invoice list page\n- [ ] Download PDF\n";

    fn args() -> EpicArgs {
        EpicArgs {
            topic: vec!["billing".to_string(), "portal".to_string()],
            project: None,
            max_questions: Some(0),
            no_estimate: false,
            answers: Vec::new(),
        }
    }

    #[test]
    fn creates_epic_and_estimated_tasks() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new()
            .with_content(PLAN)
            .with_estimate(3, "small")
            .with_estimate(5, "pdf rendering");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (outcome, out) = scripted("c\n", |t| plan_epic(&ctx, &svc, t, &args()).unwrap());

        let created = tracker.created();
        assert_eq!(created.len(), 3);
        assert_eq!(created[0].summary, "Self-service billing");
        assert_eq!(created[0].issue_type, "Epic");
        assert_eq!(created[1].parent_key.as_deref(), Some("ENG-1"));
        assert_eq!(created[1].story_points, Some(3));
        assert_eq!(created[2].story_points, Some(5));
        assert_eq!(outcome.tasks.len(), 2);
        assert!(out.contains("Tasks:"));
        assert!(out.contains("ENG-3  Download PDF (5 points)"));
    }

    #[test]
    fn no_estimate_skips_generator() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new().with_content(PLAN);
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };
        let mut a = args();
        a.no_estimate = true;
        a.project = Some("ops".to_string());

        let (outcome, _) = scripted_with("", true, |t| plan_epic(&ctx, &svc, t, &a).unwrap());

        assert_eq!(generator.estimate_calls(), 0);
        assert_eq!(outcome.epic.unwrap().key, "OPS-1");
        assert!(tracker.created().iter().all(|r| r.story_points.is_none()));
    }

    #[test]
    fn unreadable_plan_can_be_fixed_in_editor() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new().with_content("Here is an epic about billing.");
        let editor = ScriptedEditor::default().with_reply(PLAN);
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };
        let mut a = args();
        a.no_estimate = true;

        let (outcome, out) = scripted("e\nc\n", |t| plan_epic(&ctx, &svc, t, &a).unwrap());

        assert!(out.contains("Could not read the plan: no '# EPIC: <title>' line found"));
        assert_eq!(editor.seen(), vec!["Here is an epic about billing.".to_string()]);
        assert_eq!(outcome.tasks.len(), 2);
    }

    #[test]
    fn quitting_saves_rejected_plan() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new().with_content(PLAN);
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (outcome, _) = scripted("q\n", |t| plan_epic(&ctx, &svc, t, &args()).unwrap());

        let path = outcome.rejected.unwrap();
        assert!(path.starts_with(paths::rejected_dir(dir.path())));
        assert_eq!(std::fs::read_to_string(path).unwrap(), PLAN.trim());
        assert!(tracker.created().is_empty());
    }

    #[test]
    fn missing_project_is_error() {
        let dir = TempDir::new().unwrap();
        let mut ctx = test_context(dir.path());
        ctx.config.jira.project.clear();
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new();
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (err, _) = scripted("", |t| plan_epic(&ctx, &svc, t, &args()).unwrap_err());
        assert!(err.to_string().contains("no project"));
        assert_eq!(generator.content_calls(), 0);
    }

    #[test]
    fn out_of_range_estimate_leaves_task_unestimated() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new()
            .with_content(PLAN)
            .with_estimate(40, "enormous")
            .with_estimate(2, "small");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (outcome, out) = scripted("c\n", |t| plan_epic(&ctx, &svc, t, &args()).unwrap());

        let created = tracker.created();
        assert_eq!(created[1].story_points, None);
        assert_eq!(created[2].story_points, Some(2));
        assert_eq!(outcome.tasks[0].story_points, None);
        assert!(out.contains("over the limit of 13; creating it unestimated"));
    }
}
