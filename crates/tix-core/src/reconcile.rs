//! Reconcile a parsed plan with the tickets that already exist, then check it
//! strictly before anything is created.

use crate::error::ValidationError;
use crate::types::{ExistingChildTicket, ProposedTicket};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Duplicate filtering
// ---------------------------------------------------------------------------

/// Drop proposals that duplicate an existing child ticket.
///
/// A case-insensitive exact match is checked first. Otherwise a proposal is
/// a fuzzy duplicate when either lowercased summary contains the other. This
/// is over-eager: a short proposal such as "API" matches any
/// existing summary containing "api".
///
/// Returns the surviving proposals in input order and one warning per dropped
/// proposal, also in input order.
pub fn filter_duplicates(
    proposed: &[ProposedTicket],
    existing: &[ExistingChildTicket],
) -> (Vec<ProposedTicket>, Vec<String>) {
    let mut by_summary: HashMap<String, &str> = HashMap::new();
    for child in existing {
        by_summary
            .entry(child.summary.trim().to_lowercase())
            .or_insert(child.key.as_str());
    }

    let mut kept = Vec::with_capacity(proposed.len());
    let mut warnings = Vec::new();

    for ticket in proposed {
        let needle = ticket.summary.trim().to_lowercase();

        if let Some(key) = by_summary.get(&needle) {
            let msg = format!(
                "skipping '{}': already exists as {key}",
                ticket.summary
            );
            tracing::warn!("{msg}");
            warnings.push(msg);
            continue;
        }

        let similar = existing.iter().find(|child| {
            let hay = child.summary.trim().to_lowercase();
            !needle.is_empty() && !hay.is_empty() && (hay.contains(&needle) || needle.contains(&hay))
        });
        if let Some(child) = similar {
            let msg = format!(
                "skipping '{}': similar to {} ('{}')",
                ticket.summary, child.key, child.summary
            );
            tracing::warn!("{msg}");
            warnings.push(msg);
            continue;
        }

        kept.push(ticket.clone());
    }

    (kept, warnings)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check every ticket in order and stop at the first violation. An empty plan
/// is valid.
pub fn validate_plan(plan: &[ProposedTicket], max_points: u32) -> Result<(), ValidationError> {
    for (i, ticket) in plan.iter().enumerate() {
        if ticket.summary.trim().is_empty() {
            return Err(ValidationError::EmptySummary { index: i + 1 });
        }
        check_points(&ticket.summary, ticket.story_points, max_points)?;
    }
    Ok(())
}

/// A usable estimate is in `1..=max_points`.
pub fn check_points(summary: &str, points: u32, max_points: u32) -> Result<(), ValidationError> {
    if points == 0 {
        return Err(ValidationError::InvalidPoints {
            summary: summary.to_string(),
            points,
        });
    }
    if points > max_points {
        return Err(ValidationError::PointsExceedLimit {
            summary: summary.to_string(),
            points,
            limit: max_points,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Roll-up
// ---------------------------------------------------------------------------

/// Points to record on the parent: the new tickets plus every existing child.
/// Saturates at `u32::MAX`.
pub fn total_points(new_tickets: &[ProposedTicket], existing_children: &[ExistingChildTicket]) -> u32 {
    new_tickets
        .iter()
        .map(|t| t.story_points)
        .chain(existing_children.iter().map(|c| c.story_points))
        .fold(0u32, u32::saturating_add)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
