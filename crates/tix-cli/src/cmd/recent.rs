use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use std::path::Path;
use tix_core::state::{RecentTicket, State};

pub fn run(config_dir: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let state = State::load(config_dir).context("failed to load state")?;
    let recent: Vec<&RecentTicket> = state.recent.iter().take(limit).collect();

    if json {
        return print_json(&recent);
    }
    if recent.is_empty() {
        println!("No recent tickets.");
        return Ok(());
    }
    print_table(&["KEY", "ACTION", "WHEN", "SUMMARY"], rows(&recent));
    Ok(())
}

fn rows(recent: &[&RecentTicket]) -> Vec<Vec<String>> {
    recent
        .iter()
        .map(|r| {
            vec![
                r.key.clone(),
                r.action.clone(),
                r.touched_at.format("%Y-%m-%d %H:%M").to_string(),
                truncate(&r.summary, 60),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn rows_format_timestamp_and_truncate() {
        let r = RecentTicket {
            key: "ENG-3".to_string(),
            summary: "x".repeat(80),
            action: "decompose".to_string(),
            touched_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap(),
        };
        let rows = rows(&[&r]);
        assert_eq!(rows[0][2], "2026-03-01 09:05");
        assert_eq!(rows[0][3].chars().count(), 60);
    }
}
