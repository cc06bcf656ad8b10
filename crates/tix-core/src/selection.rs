//! Paged multi-item selection shared by every "pick tickets, then act" screen.
//!
//! The loop is a small state machine: the caller parses a line into a
//! [`SelectionCommand`], applies it, and either redraws, acts on the chosen
//! items, or stops.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    /// 1-based row on the current page.
    Toggle(usize),
    MarkAll,
    UnmarkAll,
    Next,
    Prev,
    Act,
    Quit,
}

/// Bad input at the selection prompt. Always recoverable: report and re-prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionInputError {
    #[error("enter a command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("no row {choice} on this page (1-{max})")]
    OutOfRange { choice: usize, max: usize },
    #[error("already on the last page")]
    LastPage,
    #[error("already on the first page")]
    FirstPage,
    #[error("nothing selected")]
    NothingSelected,
}

impl FromStr for SelectionCommand {
    type Err = SelectionInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(SelectionInputError::Empty);
        }
        if let Ok(n) = s.parse::<usize>() {
            return Ok(SelectionCommand::Toggle(n));
        }
        match s.as_str() {
            "a" | "all" => Ok(SelectionCommand::MarkAll),
            "u" | "none" => Ok(SelectionCommand::UnmarkAll),
            "n" | "next" | ">" => Ok(SelectionCommand::Next),
            "p" | "prev" | "<" => Ok(SelectionCommand::Prev),
            "d" | "x" | "done" | "go" => Ok(SelectionCommand::Act),
            "q" | "quit" => Ok(SelectionCommand::Quit),
            _ => Err(SelectionInputError::Unknown(s)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a, T> {
    Continue,
    /// Selected items, in display order.
    Act(Vec<&'a T>),
    Quit,
}

pub struct Selection<T> {
    items: Vec<T>,
    ids: Vec<String>,
    selected: HashSet<String>,
    page: usize,
    page_size: usize,
}

impl<T> Selection<T> {
    /// `id` must give each item a distinct identifier.
    pub fn new(items: Vec<T>, page_size: usize, id: impl Fn(&T) -> String) -> Self {
        let ids = items.iter().map(id).collect();
        Self {
            items,
            ids,
            selected: HashSet::new(),
            page: 0,
            page_size: page_size.max(1),
        }
    }

    /// Start with every item selected.
    pub fn all_selected(mut self) -> Self {
        self.selected = self.ids.iter().cloned().collect();
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.ids
            .get(index)
            .is_some_and(|id| self.selected.contains(id))
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        let start = self.page * self.page_size;
        let end = (start + self.page_size).min(self.items.len());
        start..end
    }

    pub fn apply(&mut self, cmd: SelectionCommand) -> Result<Step<'_, T>, SelectionInputError> {
        match cmd {
            SelectionCommand::Toggle(choice) => {
                let range = self.page_range();
                let max = range.len();
                if choice == 0 || choice > max {
                    return Err(SelectionInputError::OutOfRange { choice, max });
                }
                let id = &self.ids[range.start + choice - 1];
                if !self.selected.remove(id) {
                    self.selected.insert(id.clone());
                }
                Ok(Step::Continue)
            }
            SelectionCommand::MarkAll => {
                self.selected = self.ids.iter().cloned().collect();
                Ok(Step::Continue)
            }
            SelectionCommand::UnmarkAll => {
                self.selected.clear();
                Ok(Step::Continue)
            }
            SelectionCommand::Next => {
                if self.page + 1 >= self.page_count() {
                    return Err(SelectionInputError::LastPage);
                }
                self.page += 1;
                Ok(Step::Continue)
            }
            SelectionCommand::Prev => {
                if self.page == 0 {
                    return Err(SelectionInputError::FirstPage);
                }
                self.page -= 1;
                Ok(Step::Continue)
            }
            SelectionCommand::Act => {
                let chosen: Vec<&T> = self
                    .items
                    .iter()
                    .zip(&self.ids)
                    .filter(|(_, id)| self.selected.contains(*id))
                    .map(|(item, _)| item)
                    .collect();
                if chosen.is_empty() {
                    return Err(SelectionInputError::NothingSelected);
                }
                Ok(Step::Act(chosen))
            }
            SelectionCommand::Quit => Ok(Step::Quit),
        }
    }

    /// Current page as text, with a command legend naming `action`.
    pub fn render(&self, action: &str, label: impl Fn(&T) -> String) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Page {}/{} ({} selected of {})",
            self.page + 1,
            self.page_count(),
            self.selected.len(),
            self.items.len()
        );
        for (row, index) in self.page_range().enumerate() {
            let mark = if self.is_selected(index) { "x" } else { " " };
            let _ = writeln!(out, "  [{mark}] {:>2}. {}", row + 1, label(&self.items[index]));
        }
        let _ = write!(
            out,
            "<n> toggle, a all, u none, n next, p prev, d {action}, q quit"
        );
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
