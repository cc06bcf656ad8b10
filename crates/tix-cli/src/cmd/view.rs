use super::parse_key;
use crate::context::AppContext;
use crate::output::{print_json, render_table};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Write as _;
use tix_core::tracker::TicketSystem;
use tix_core::types::{ExistingChildTicket, Ticket};

#[derive(Serialize)]
struct TicketView<'a> {
    #[serde(flatten)]
    ticket: &'a Ticket,
    url: String,
    children: &'a [ExistingChildTicket],
}

pub fn run(ctx: &AppContext, key: &str, open_browser: bool) -> anyhow::Result<()> {
    let key = parse_key(key)?;
    let jira = ctx.jira()?;
    let ticket = jira
        .get_ticket(&key)
        .with_context(|| format!("failed to fetch {key}"))?;
    let children = if ticket.is_epic {
        jira.children(&key)
            .with_context(|| format!("failed to list children of {key}"))?
    } else {
        Vec::new()
    };
    let url = jira.browse_url(&key);

    if ctx.json {
        print_json(&TicketView {
            ticket: &ticket,
            url: url.clone(),
            children: &children,
        })?;
    } else {
        print!("{}", render_ticket(&ticket, &children, &url));
    }

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, url = %url, "could not open browser");
        }
    }
    ctx.remember(&ticket.key, &ticket.summary, "view");
    Ok(())
}

fn render_ticket(ticket: &Ticket, children: &[ExistingChildTicket], url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", ticket.key, ticket.summary);
    let points = ticket
        .story_points
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "{} | {} | {} points",
        ticket.issue_type, ticket.status, points
    );
    if let Some(parent) = &ticket.parent_key {
        let _ = writeln!(out, "parent: {parent}");
    }
    let _ = writeln!(out, "{url}");
    let _ = writeln!(out);
    match ticket.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => {
            let _ = writeln!(out, "{d}");
        }
        _ => {
            let _ = writeln!(out, "(no description)");
        }
    }
    if !children.is_empty() {
        let _ = writeln!(out);
        let rows: Vec<Vec<String>> = children
            .iter()
            .map(|c| {
                vec![
                    c.key.clone(),
                    c.issue_type.clone(),
                    c.story_points.to_string(),
                    c.summary.clone(),
                ]
            })
            .collect();
        out.push_str(&render_table(&["KEY", "TYPE", "POINTS", "SUMMARY"], &rows));
    }
    out
}
