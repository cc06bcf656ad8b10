use super::parse_key;
use crate::context::{AppContext, Services};
use crate::output::print_json;
use crate::terminal::Terminal;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tix_core::reconcile::check_points;
use tix_core::selection::Selection;
use tix_core::types::Ticket;

#[derive(Args)]
pub struct EstimateArgs {
    /// Ticket keys to estimate
    pub keys: Vec<String>,

    /// Pick tickets from a JQL search instead of naming them
    #[arg(long, conflicts_with = "keys")]
    pub jql: Option<String>,

    /// Maximum tickets fetched for --jql
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct EstimateResult {
    pub key: String,
    pub summary: String,
    pub previous: Option<u32>,
    pub points: u32,
    pub reasoning: String,
    pub written: bool,
    /// Why the estimate was not usable, when it fell outside `1..=max_points`.
    pub skipped: Option<String>,
}

pub fn run(ctx: &AppContext, args: EstimateArgs) -> anyhow::Result<()> {
    let jira = ctx.jira()?;
    let gemini = ctx.gemini()?;
    let editor = ctx.editor();
    let svc = Services {
        tracker: &jira,
        generator: &gemini,
        editor: &editor,
    };
    let mut term = ctx.terminal();

    let results = estimate(ctx, &svc, &mut term, &args)?;
    for r in results.iter().filter(|r| r.written) {
        ctx.remember(&r.key, &r.summary, "estimate");
    }
    if ctx.json {
        print_json(&results)?;
    }
    Ok(())
}

pub(crate) fn estimate(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    args: &EstimateArgs,
) -> anyhow::Result<Vec<EstimateResult>> {
    let tickets = match &args.jql {
        Some(jql) => match pick_from_search(ctx, svc, term, jql, args.limit)? {
            Some(tickets) => tickets,
            None => return Ok(Vec::new()),
        },
        None => {
            if args.keys.is_empty() {
                anyhow::bail!("name at least one ticket key, or pass --jql");
            }
            args.keys
                .iter()
                .map(|raw| {
                    let key = parse_key(raw)?;
                    svc.tracker
                        .get_ticket(&key)
                        .with_context(|| format!("failed to fetch {key}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?
        }
    };

    let mut results = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let opts = ctx.config.estimate.options(Some(ticket.issue_type.as_str()));
        let est = svc
            .generator
            .estimate_story_points(&ticket.summary, ticket.description.as_deref(), &opts)
            .with_context(|| format!("failed to estimate {}", ticket.key))?;

        let previous = ticket
            .story_points
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        term.say(format!("\n{}  {}", ticket.key, ticket.summary))?;
        term.say(format!("  {previous} -> {} points: {}", est.points, est.reasoning))?;

        let skipped = check_points(&ticket.summary, est.points, ctx.config.estimate.max_points)
            .err()
            .map(|e| e.to_string());
        let written = if let Some(reason) = &skipped {
            tracing::warn!(key = %ticket.key, points = est.points, "estimate rejected");
            term.say(format!("  skipped: {reason}"))?;
            false
        } else if ticket.story_points == Some(est.points) {
            term.say("  unchanged")?;
            false
        } else if term.confirm(&format!("Write {} points to {}?", est.points, ticket.key))? {
            svc.tracker
                .update_story_points(&ticket.key, est.points)
                .with_context(|| format!("failed to update {}", ticket.key))?;
            tracing::info!(key = %ticket.key, points = est.points, "story points updated");
            true
        } else {
            false
        };

        results.push(EstimateResult {
            key: ticket.key,
            summary: ticket.summary,
            previous: ticket.story_points,
            points: est.points,
            reasoning: est.reasoning,
            written,
            skipped,
        });
    }
    Ok(results)
}

/// `None` when the search is empty or the user quits the selection screen.
fn pick_from_search(
    ctx: &AppContext,
    svc: &Services<'_>,
    term: &mut Terminal<'_>,
    jql: &str,
    limit: usize,
) -> anyhow::Result<Option<Vec<Ticket>>> {
    let found = svc
        .tracker
        .search(jql, limit)
        .with_context(|| format!("search failed: {jql}"))?;
    if found.is_empty() {
        term.say("No tickets match.")?;
        return Ok(None);
    }

    let mut selection = Selection::new(found, ctx.config.ui.page_size, |t| t.key.clone());
    if term.is_assume_yes() {
        selection = selection.all_selected();
    }
    Ok(term.select(selection, "estimate", |t| {
        let points = t
            .story_points
            .map(|p| format!(" [{p}]"))
            .unwrap_or_default();
        format!("{}  {}{points}", t.key, t.summary)
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::editor::ScriptedEditor;
    use crate::terminal::{scripted, scripted_with};
    use tempfile::TempDir;
    use tix_core::fake::{ticket, FakeGenerator, FakeTracker};

    fn by_keys(keys: &[&str]) -> EstimateArgs {
        EstimateArgs {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            jql: None,
            limit: 50,
        }
    }

    #[test]
    fn confirmed_estimate_is_written() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new().with_ticket(ticket("ENG-1", "Login form"));
        let generator = FakeGenerator::new().with_estimate(5, "two screens plus validation");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (results, out) =
            scripted("y\n", |t| estimate(&ctx, &svc, t, &by_keys(&["eng-1"])).unwrap());

        assert!(results[0].written);
        assert_eq!(tracker.ticket("ENG-1").unwrap().story_points, Some(5));
        assert!(out.contains("- -> 5 points: two screens plus validation"));
    }

    #[test]
    fn unchanged_estimate_does_not_prompt() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let mut t = ticket("ENG-1", "Login form");
        t.story_points = Some(3);
        let tracker = FakeTracker::new().with_ticket(t);
        let generator = FakeGenerator::new().with_estimate(3, "same");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (results, out) = scripted("", |t| estimate(&ctx, &svc, t, &by_keys(&["ENG-1"])).unwrap());

        assert!(!results[0].written);
        assert!(out.contains("unchanged"));
        assert!(!out.contains("[y/N]"));
    }

    #[test]
    fn jql_selection_picks_tickets_to_estimate() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new()
            .with_ticket(ticket("ENG-1", "Login form"))
            .with_ticket(ticket("ENG-2", "Logout"))
            .with_ticket(ticket("ENG-3", "Audit log"));
        let generator = FakeGenerator::new()
            .with_estimate(2, "small")
            .with_estimate(8, "large");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };
        let args = EstimateArgs {
            keys: Vec::new(),
            jql: Some("project = ENG".to_string()),
            limit: 50,
        };

        let (results, _) = scripted("1\n3\nd\ny\nn\n", |t| estimate(&ctx, &svc, t, &args).unwrap());

        let keys: Vec<&str> = results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["ENG-1", "ENG-3"]);
        assert_eq!(tracker.ticket("ENG-1").unwrap().story_points, Some(2));
        assert_eq!(tracker.ticket("ENG-3").unwrap().story_points, None);
        assert_eq!(generator.estimate_calls(), 2);
    }

    #[test]
    fn assume_yes_estimates_every_match() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new()
            .with_ticket(ticket("ENG-1", "Login form"))
            .with_ticket(ticket("ENG-2", "Logout"));
        let generator = FakeGenerator::new().with_estimate(2, "a").with_estimate(3, "b");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };
        let args = EstimateArgs {
            keys: Vec::new(),
            jql: Some("project = ENG".to_string()),
            limit: 50,
        };

        let (results, _) = scripted_with("", true, |t| estimate(&ctx, &svc, t, &args).unwrap());

        assert!(results.iter().all(|r| r.written));
        assert_eq!(tracker.ticket("ENG-2").unwrap().story_points, Some(3));
    }

    #[test]
    fn nothing_to_estimate_is_error() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let tracker = FakeTracker::new();
        let generator = FakeGenerator::new();
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (err, _) = scripted("", |t| estimate(&ctx, &svc, t, &by_keys(&[])).unwrap_err());
        assert!(err.to_string().contains("--jql"));
    }

    #[test]
    fn estimate_over_limit_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut ctx = test_context(dir.path());
        ctx.config.estimate.point_scale = vec![1, 2, 3, 5, 8, 13, 21];
        ctx.config.estimate.max_points = 8;
        let tracker = FakeTracker::new()
            .with_ticket(ticket("ENG-1", "Rewrite billing"))
            .with_ticket(ticket("ENG-2", "Fix typo"));
        let generator = FakeGenerator::new()
            .with_estimate(21, "huge")
            .with_estimate(0, "nothing to do");
        let editor = ScriptedEditor::default();
        let svc = Services {
            tracker: &tracker,
            generator: &generator,
            editor: &editor,
        };

        let (results, out) = scripted("", |t| {
            estimate(&ctx, &svc, t, &by_keys(&["ENG-1", "ENG-2"])).unwrap()
        });

        assert!(results.iter().all(|r| !r.written));
        assert!(results[0].skipped.as_deref().unwrap().contains("over the limit of 8"));
        assert!(results[1].skipped.as_deref().unwrap().contains("invalid story points: 0"));
        assert_eq!(tracker.ticket("ENG-1").unwrap().story_points, None);
        assert!(out.contains("skipped:"));
        assert!(!out.contains("[y/N]"));
    }
}
