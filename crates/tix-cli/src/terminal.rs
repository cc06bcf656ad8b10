//! Line-oriented terminal I/O: prompts, yes/no, single-key menus, and the
//! paged selection screen.
//!
//! Invalid input is never fatal. The prompt is repeated until the user gives
//! something usable or input ends; end of input counts as "quit".

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use tix_core::qa::InputMethod;
use tix_core::selection::{Selection, SelectionCommand, Step};

/// One entry of a single-key menu: `[k] label`.
#[derive(Debug, Clone, Copy)]
pub struct MenuChoice {
    pub key: char,
    pub label: &'static str,
}

impl MenuChoice {
    pub const fn new(key: char, label: &'static str) -> Self {
        Self { key, label }
    }
}

pub struct Terminal<'a> {
    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
    assume_yes: bool,
}

impl Terminal<'static> {
    /// Prompts go to stderr when stdout is reserved for `--json` output.
    pub fn stdio(json: bool) -> Self {
        if json {
            Terminal::new(io::stdin().lock(), io::stderr())
        } else {
            Terminal::new(io::stdin().lock(), io::stdout())
        }
    }
}

impl<'a> Terminal<'a> {
    pub fn new(input: impl BufRead + 'a, output: impl Write + 'a) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            assume_yes: false,
        }
    }

    /// Answer every confirmation with yes and take the default menu choice.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn is_assume_yes(&self) -> bool {
        self.assume_yes
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }

    /// Print `prompt` and read one line, trimmed. `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Free-text prompt; a blank line keeps `default`.
    pub fn ask(&mut self, label: &str, default: &str) -> io::Result<String> {
        let prompt = if default.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{default}]: ")
        };
        let line = self.read_line(&prompt)?.unwrap_or_default();
        Ok(if line.is_empty() {
            default.to_string()
        } else {
            line
        })
    }

    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        loop {
            let Some(line) = self.read_line(&format!("{question} [y/N] "))? else {
                return Ok(false);
            };
            match line.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                other => self.say(format!("  please answer y or n (got '{other}')"))?,
            }
        }
    }

    /// Single-key menu. With `assume_yes` the first choice is taken without
    /// asking. `None` at end of input.
    pub fn choose(&mut self, question: &str, choices: &[MenuChoice]) -> io::Result<Option<char>> {
        if self.assume_yes {
            return Ok(choices.first().map(|c| c.key));
        }
        let legend: Vec<String> = choices
            .iter()
            .map(|c| format!("[{}] {}", c.key, c.label))
            .collect();
        loop {
            let Some(line) = self.read_line(&format!("{question} {}: ", legend.join("  ")))? else {
                return Ok(None);
            };
            let picked = line
                .chars()
                .next()
                .map(|c| c.to_ascii_lowercase())
                .filter(|c| choices.iter().any(|choice| choice.key == *c));
            match picked {
                Some(key) if line.chars().count() == 1 => return Ok(Some(key)),
                _ => self.say(format!("  unknown choice '{line}'"))?,
            }
        }
    }

    /// Drive a [`Selection`] until the user acts or quits. Returns the chosen
    /// items, or `None` on quit or end of input. With `assume_yes` the
    /// initial selection is acted on directly.
    pub fn select<T: Clone>(
        &mut self,
        mut selection: Selection<T>,
        action: &str,
        label: impl Fn(&T) -> String,
    ) -> io::Result<Option<Vec<T>>> {
        if self.assume_yes {
            return Ok(match selection.apply(SelectionCommand::Act) {
                Ok(Step::Act(items)) => Some(items.into_iter().cloned().collect()),
                _ => None,
            });
        }
        loop {
            self.say(selection.render(action, &label))?;
            let Some(line) = self.read_line("> ")? else {
                return Ok(None);
            };
            let cmd = match line.parse::<SelectionCommand>() {
                Ok(cmd) => cmd,
                Err(e) => {
                    self.say(format!("  {e}"))?;
                    continue;
                }
            };
            match selection.apply(cmd) {
                Ok(Step::Continue) => {}
                Ok(Step::Act(items)) => return Ok(Some(items.into_iter().cloned().collect())),
                Ok(Step::Quit) => return Ok(None),
                Err(e) => self.say(format!("  {e}"))?,
            }
        }
    }

    /// Hand the terminal to the Q&A engine for interactive answers.
    pub fn input_method(&mut self) -> InputMethod<'_> {
        InputMethod::interactive(&mut *self.input, &mut *self.output)
    }
}

/// Run `f` against a terminal fed from `input`, returning its result and
/// everything written to the terminal.
#[cfg(test)]
pub(crate) fn scripted<R>(input: &str, f: impl FnOnce(&mut Terminal<'_>) -> R) -> (R, String) {
    scripted_with(input, false, f)
}

#[cfg(test)]
pub(crate) fn scripted_with<R>(
    input: &str,
    yes: bool,
    f: impl FnOnce(&mut Terminal<'_>) -> R,
) -> (R, String) {
    let mut out = Vec::new();
    let result = {
        let mut term = Terminal::new(io::Cursor::new(input.to_string()), &mut out).assume_yes(yes);
        f(&mut term)
    };
    (result, String::from_utf8_lossy(&out).into_owned())
}
