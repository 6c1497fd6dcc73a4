use std::io::{self, IsTerminal, Write};

use tidy_shared::{FilterStatus, ListDisplay, TodoDto};
use unicode_width::UnicodeWidthStr;

use crate::config::{Config, KEY_COLOR};

pub const LOADING_MESSAGE: &str = "Fetching to-do list...";
pub const EMPTY_MESSAGE: &str = "No to-dos to show";

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.get_bool(KEY_COLOR).unwrap_or(true),
        }
    }

    #[tracing::instrument(skip(self, display))]
    pub fn print_list(&self, display: &ListDisplay, filter: FilterStatus) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_list(&mut out, display, filter, out_is_terminal())
    }

    pub fn write_list<W: Write>(
        &self,
        mut writer: W,
        display: &ListDisplay,
        filter: FilterStatus,
        terminal: bool,
    ) -> anyhow::Result<()> {
        match display {
            ListDisplay::Loading => writeln!(writer, "{LOADING_MESSAGE}")?,
            ListDisplay::Empty => writeln!(writer, "{EMPTY_MESSAGE}")?,
            ListDisplay::Populated { todos, .. } => {
                writeln!(writer, "Showing: {}", filter.label())?;

                let headers = vec!["ID".to_string(), "Done".to_string(), "Title".to_string()];
                let rows = todos
                    .iter()
                    .map(|todo| self.row(todo, terminal))
                    .collect();
                write_table(&mut writer, headers, rows)?;
            }
        }
        Ok(())
    }

    fn row(&self, todo: &TodoDto, terminal: bool) -> Vec<String> {
        let id: String = todo.id.chars().take(SHORT_ID_LEN).collect();
        let id = self.paint(&id, "33", terminal);
        let done = if todo.is_complete {
            self.paint("x", "32", terminal)
        } else {
            String::new()
        };
        vec![id, done, todo.title.clone()]
    }

    fn paint(&self, text: &str, code: &str, terminal: bool) -> String {
        if !self.color || !terminal {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn out_is_terminal() -> bool {
    io::stdout().is_terminal()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
