//! Recover typed plans from loosely structured generated text.
//!
//! Parsing is permissive: a bullet that cannot be understood is skipped and a
//! missing points annotation becomes 0. Strict checks live in
//! [`crate::reconcile::validate_plan`], which runs before anything is created.
//!
//! Epic grammar:
//!
//! ```text
//! # EPIC: <title>
//! <description lines>
//! ## TASKS
//! - [ ] <summary>
//! ```
//!
//! Decomposition grammar:
//!
//! ```text
//! ## NEW TICKETS
//! - [ ] <summary> (<N> points)
//! ## EXISTING TICKETS
//! - [x] <summary> (<N> points) [EXISTING]
//! ```

use crate::error::PlanParseError;
use crate::paths::KEY_PATTERN;
use crate::types::{DecompositionPlan, EpicPlan, EpicTask, ProposedTicket};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

const EPIC_PREFIX: &str = "# EPIC:";
const TASKS_HEADER: &str = "## TASKS";
const NEW_HEADER: &str = "## NEW TICKETS";
const EXISTING_HEADER: &str = "## EXISTING TICKETS";
const EXISTING_MARKER: &str = "[EXISTING]";

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static BULLET_RE: OnceLock<Regex> = OnceLock::new();
static POINTS_RE: OnceLock<Regex> = OnceLock::new();
static EXISTING_RE: OnceLock<Regex> = OnceLock::new();
static KEY_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

/// `- text`, `* text`, `1. text`, each optionally followed by `[ ]` / `[x]`.
fn bullet_re() -> &'static Regex {
    BULLET_RE.get_or_init(|| {
        Regex::new(r"^(?:[-*+]|\d+[.)])\s+(?:\[([ xX])\]\s*)?(.*)$").unwrap()
    })
}

/// `(3 points)`, `(1 point)`, `(5 pts)`, `(2pt)`.
fn points_re() -> &'static Regex {
    POINTS_RE.get_or_init(|| Regex::new(r"(?i)\(\s*(\d+)\s*(?:points?|pts?)\s*\)").unwrap())
}

fn existing_re() -> &'static Regex {
    EXISTING_RE.get_or_init(|| Regex::new(r"(?i)\[EXISTING\]").unwrap())
}

/// `[ENG-12] summary`. Only the bracketed form names a key, so summaries
/// such as "UTF-8 encoding fix" stay whole.
fn key_prefix_re() -> &'static Regex {
    KEY_PREFIX_RE.get_or_init(|| Regex::new(&format!(r"^\[({KEY_PATTERN})\]\s*(.+)$")).unwrap())
}

struct Bullet<'a> {
    checked: bool,
    text: &'a str,
}

fn parse_bullet(line: &str) -> Option<Bullet<'_>> {
    let caps = bullet_re().captures(line)?;
    let checked = caps
        .get(1)
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("x"));
    let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    Some(Bullet { checked, text })
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```")
}

// ---------------------------------------------------------------------------
// Epic plans
// ---------------------------------------------------------------------------

pub fn parse_epic_plan(text: &str) -> Result<EpicPlan, PlanParseError> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let (title_idx, title) = lines
        .iter()
        .enumerate()
        .find_map(|(i, l)| l.strip_prefix(EPIC_PREFIX).map(|t| (i, t.trim())))
        .ok_or(PlanParseError::MissingTitle)?;
    if title.is_empty() {
        return Err(PlanParseError::MissingTitle);
    }

    let tasks_idx = lines[title_idx + 1..]
        .iter()
        .position(|l| l.starts_with(TASKS_HEADER))
        .map(|p| title_idx + 1 + p)
        .ok_or(PlanParseError::MissingTasks)?;

    let description = collapse_blank_lines(
        lines[title_idx + 1..tasks_idx]
            .iter()
            .copied()
            .filter(|l| !is_fence(l)),
    );

    let tasks: Vec<EpicTask> = lines[tasks_idx + 1..]
        .iter()
        .take_while(|l| !l.starts_with('#'))
        .filter_map(|l| parse_bullet(l))
        .map(|b| b.text.to_string())
        .filter(|s| !s.is_empty())
        .map(|summary| EpicTask { summary })
        .collect();
    if tasks.is_empty() {
        return Err(PlanParseError::EmptyTasks);
    }

    Ok(EpicPlan {
        title: title.to_string(),
        description,
        tasks,
    })
}

/// Join trimmed lines, folding runs of blank lines into one and dropping
/// leading and trailing blanks.
fn collapse_blank_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

pub fn format_epic_plan(plan: &EpicPlan) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{EPIC_PREFIX} {}", plan.title);
    let _ = writeln!(s);
    if !plan.description.is_empty() {
        let _ = writeln!(s, "{}", plan.description);
        let _ = writeln!(s);
    }
    let _ = writeln!(s, "{TASKS_HEADER}");
    for task in &plan.tasks {
        let _ = writeln!(s, "- [ ] {}", task.summary);
    }
    s
}

// ---------------------------------------------------------------------------
// Decomposition plans
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    New,
    Existing,
}

/// Never fails: unrecognised lines are skipped and missing points become 0.
pub fn parse_decomposition_plan(text: &str) -> DecompositionPlan {
    let mut plan = DecompositionPlan::default();
    let mut section = Section::New;

    for line in text.lines().map(str::trim) {
        if line.starts_with(NEW_HEADER) {
            section = Section::New;
            continue;
        }
        if line.starts_with(EXISTING_HEADER) {
            section = Section::Existing;
            continue;
        }
        let Some(bullet) = parse_bullet(line) else {
            continue;
        };

        let marked = existing_re().is_match(bullet.text);
        let is_existing = marked || bullet.checked || section == Section::Existing;
        let story_points = points_re()
            .captures(bullet.text)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);

        let stripped = points_re().replace_all(bullet.text, " ");
        let stripped = existing_re().replace_all(&stripped, " ");
        let mut summary = normalize_spaces(&stripped);
        if summary.is_empty() {
            continue;
        }

        if is_existing {
            let mut key = None;
            if let Some(caps) = key_prefix_re().captures(&summary) {
                key = Some(caps[1].to_string());
                summary = caps[2].trim().to_string();
            }
            plan.existing_tickets
                .push(ProposedTicket::existing(summary, story_points, key));
        } else {
            plan.new_tickets.push(ProposedTicket::new(summary, story_points));
        }
    }

    plan
}

fn normalize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a plan in the grammar [`parse_decomposition_plan`] reads, for
/// hand-editing. Parsing the output yields an equal plan.
pub fn format_decomposition_plan(plan: &DecompositionPlan) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{NEW_HEADER}");
    for t in &plan.new_tickets {
        let _ = writeln!(s, "- [ ] {} {}", t.summary, points_label(t.story_points));
    }
    if !plan.existing_tickets.is_empty() {
        let _ = writeln!(s);
        let _ = writeln!(s, "{EXISTING_HEADER}");
        for t in &plan.existing_tickets {
            let summary = match &t.key {
                Some(key) => format!("[{key}] {}", t.summary),
                None => t.summary.clone(),
            };
            let _ = writeln!(
                s,
                "- [x] {summary} {} {EXISTING_MARKER}",
                points_label(t.story_points)
            );
        }
    }
    s
}

fn points_label(points: u32) -> String {
    if points == 1 {
        "(1 point)".to_string()
    } else {
        format!("({points} points)")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- epic ---------------------------------------------------------------

    #[test]
    fn epic_plan_happy_path() {
        let text = "\
Sure! Here is the plan.

# EPIC: Single sign-on

Let users log in with the company IdP.


Covers web and mobile.

## TASKS
- [ ] Register the OAuth app
- [x] Add login button
- Handle token refresh
";
        let plan = parse_epic_plan(text).unwrap();
        assert_eq!(plan.title, "Single sign-on");
        assert_eq!(
            plan.description,
            "Let users log in with the company IdP.\n\nCovers web and mobile."
        );
        let tasks: Vec<&str> = plan.tasks.iter().map(|t| t.summary.as_str()).collect();
        assert_eq!(
            tasks,
            vec!["Register the OAuth app", "Add login button", "Handle token refresh"]
        );
    }

    #[test]
    fn first_epic_title_wins() {
        let text = "# EPIC: First\n# EPIC: Second\n## TASKS\n- [ ] a\n";
        assert_eq!(parse_epic_plan(text).unwrap().title, "First");
    }

    #[test]
    fn uppercase_x_checkbox_is_stripped() {
        let plan = parse_epic_plan("# EPIC: T\n## TASKS\n- [X] done thing\n").unwrap();
        assert_eq!(plan.tasks[0].summary, "done thing");
    }

    #[test]
    fn missing_title_is_error() {
        let err = parse_epic_plan("## TASKS\n- [ ] a\n").unwrap_err();
        assert_eq!(err, PlanParseError::MissingTitle);
        let err = parse_epic_plan("# EPIC:   \n## TASKS\n- [ ] a\n").unwrap_err();
        assert_eq!(err, PlanParseError::MissingTitle);
    }

    #[test]
    fn missing_tasks_header_is_error() {
        let err = parse_epic_plan("# EPIC: T\nsome text\n- [ ] a\n").unwrap_err();
        assert_eq!(err, PlanParseError::MissingTasks);
    }

    #[test]
    fn empty_tasks_is_error() {
        let err = parse_epic_plan("# EPIC: T\n## TASKS\n\nnothing here\n").unwrap_err();
        assert_eq!(err, PlanParseError::EmptyTasks);
        let err = parse_epic_plan("# EPIC: T\n## TASKS\n- [ ]   \n").unwrap_err();
        assert_eq!(err, PlanParseError::EmptyTasks);
    }

    #[test]
    fn tasks_stop_at_next_heading() {
        let text = "# EPIC: T\n## TASKS\n- [ ] a\n## NOTES\n- not a task\n";
        assert_eq!(parse_epic_plan(text).unwrap().tasks.len(), 1);
    }

    #[test]
    fn code_fences_are_ignored() {
        let text = "```markdown\n# EPIC: T\nBody\n## TASKS\n- [ ] a\n```\n";
        let plan = parse_epic_plan(text).unwrap();
        assert_eq!(plan.description, "Body");
    }

    #[test]
    fn epic_format_reparses() {
        let plan = parse_epic_plan("# EPIC: T\nLine one\n\nLine two\n## TASKS\n- [ ] a\n- [ ] b\n")
            .unwrap();
        assert_eq!(parse_epic_plan(&format_epic_plan(&plan)).unwrap(), plan);
    }

    // --- decomposition ------------------------------------------------------

    #[test]
    fn decomposition_sections_and_markers() {
        let text = "## NEW TICKETS\n- [ ] Add login (3 points)\n## EXISTING TICKETS\n- [x] Add logout (2 points) [EXISTING]\n";
        let plan = parse_decomposition_plan(text);
        assert_eq!(plan.new_tickets, vec![ProposedTicket::new("Add login", 3)]);
        assert_eq!(
            plan.existing_tickets,
            vec![ProposedTicket::existing("Add logout", 2, None)]
        );
    }

    #[test]
    fn points_spellings() {
        let text = "- a (1 point)\n- b (5 pts)\n- c (2pt)\n- d (8 Points)\n- e ( 13 points )\n- f\n";
        let points: Vec<u32> = parse_decomposition_plan(text)
            .new_tickets
            .iter()
            .map(|t| t.story_points)
            .collect();
        assert_eq!(points, vec![1, 5, 2, 8, 13, 0]);
    }

    #[test]
    fn marker_or_checkbox_overrides_section() {
        let text = "\
## NEW TICKETS
- [ ] Fresh work (3 points)
- [x] Already done (2 points)
- Old thing (1 point) [existing]
";
        let plan = parse_decomposition_plan(text);
        assert_eq!(plan.new_tickets.len(), 1);
        assert_eq!(plan.existing_tickets.len(), 2);
        assert!(plan.existing_tickets.iter().all(|t| t.is_existing));
        assert_eq!(plan.existing_tickets[1].summary, "Old thing");
    }

    #[test]
    fn lines_before_any_header_are_new() {
        let plan = parse_decomposition_plan("- [ ] Early (2 points)\n## EXISTING TICKETS\n- Late\n");
        assert_eq!(plan.new_tickets[0].summary, "Early");
        assert_eq!(plan.existing_tickets[0].summary, "Late");
        assert!(plan.existing_tickets[0].is_existing);
    }

    #[test]
    fn header_with_trailing_words_is_recognised() {
        let plan = parse_decomposition_plan("## EXISTING TICKETS (for reference)\n- [ ] Ref (3 points)\n");
        assert_eq!(plan.existing_tickets.len(), 1);
        assert!(plan.new_tickets.is_empty());
    }

    #[test]
    fn existing_key_prefix_is_extracted() {
        let plan = parse_decomposition_plan(
            "## EXISTING TICKETS\n- [x] [ENG-12] Add logout (2 points) [EXISTING]\n- [x] [X-3]Audit log\n",
        );
        assert_eq!(plan.existing_tickets[0].key.as_deref(), Some("ENG-12"));
        assert_eq!(plan.existing_tickets[0].summary, "Add logout");
        assert_eq!(plan.existing_tickets[1].key.as_deref(), Some("X-3"));
        assert_eq!(plan.existing_tickets[1].summary, "Audit log");
    }

    #[test]
    fn key_like_words_stay_in_summary() {
        let plan = parse_decomposition_plan(
            "## NEW TICKETS\n- [x] HTTP-2 upgrade for gateway (3 points)\n- [x] ENG-12: Add logout [EXISTING]\n",
        );
        assert_eq!(plan.existing_tickets[0].summary, "HTTP-2 upgrade for gateway");
        assert_eq!(plan.existing_tickets[0].key, None);
        assert_eq!(plan.existing_tickets[1].summary, "ENG-12: Add logout");
        assert_eq!(plan.existing_tickets[1].key, None);
    }

    #[test]
    fn new_tickets_never_carry_key() {
        let plan = parse_decomposition_plan("- [ ] ENG-1: looks like a key (3 points)\n");
        assert_eq!(plan.new_tickets[0].key, None);
        assert_eq!(plan.new_tickets[0].summary, "ENG-1: looks like a key");
    }

    #[test]
    fn junk_and_blank_bullets_are_skipped() {
        let text = "Intro prose\n- [ ]\n- (3 points)\n-no space\n## NEW TICKETS\n\n- [ ] Real (2 points)\n";
        let plan = parse_decomposition_plan(text);
        assert_eq!(plan.new_tickets, vec![ProposedTicket::new("Real", 2)]);
        assert!(plan.existing_tickets.is_empty());
    }

    #[test]
    fn empty_text_is_empty_plan() {
        assert!(parse_decomposition_plan("").is_empty());
    }

    #[test]
    fn decomposition_format_reparses() {
        let plan = DecompositionPlan {
            new_tickets: vec![
                ProposedTicket::new("Add login", 3),
                ProposedTicket::new("Write docs", 1),
                ProposedTicket::new("Unsized", 0),
            ],
            existing_tickets: vec![
                ProposedTicket::existing("Add logout", 2, Some("ENG-7".into())),
                ProposedTicket::existing("Spike: caching", 0, None),
                ProposedTicket::existing("UTF-8 encoding fix", 2, None),
                ProposedTicket::existing("COVID-19 handling", 1, Some("X-9".into())),
            ],
        };
        let text = format_decomposition_plan(&plan);
        assert_eq!(parse_decomposition_plan(&text), plan);
    }
}
