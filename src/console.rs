//! Console presentation of render events.
//!
//! Writes the table to stdout as aligned columns, colorized by cell
//! severity. Styling is dropped when stdout is not a terminal or when
//! plain output is requested; carried-forward cells are then marked with
//! a `*` suffix instead of dimming.

use std::io::{self, IsTerminal, Write};

use crossterm::style::{Color, Stylize};

use crate::render::{Cell, CellValue, RenderEvent, RenderSink, Style};

/// Minimum column width in characters.
const MIN_COLUMN_WIDTH: usize = 8;

/// Text shown for failed probes.
const FAILED_TEXT: &str = "error!";

/// Suffix marking carried-forward cells in plain output.
const STALE_MARKER: char = '*';

/// Gap between columns.
const COLUMN_GAP: &str = "  ";

/// Console sink writing aligned, optionally colorized columns to stdout.
pub struct ConsoleSink {
    out: io::Stdout,
    color: bool,
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl ConsoleSink {
    /// Create a sink writing to stdout.
    ///
    /// Colors are used only when `plain` is unset and stdout is a terminal.
    pub fn new(plain: bool) -> Self {
        let out = io::stdout();
        let color = !plain && out.is_terminal();
        Self { out, color }
    }

    fn header_line(&self, destinations: &[String]) -> String {
        let parts: Vec<String> = destinations
            .iter()
            .map(|destination| {
                let width = column_width(destination);
                let padded = format!("{destination:>width$}");
                if self.color {
                    padded.bold().to_string()
                } else {
                    padded
                }
            })
            .collect();
        parts.join(COLUMN_GAP)
    }

    fn row_line(&self, cells: &[Cell]) -> String {
        let parts: Vec<String> = cells
            .iter()
            .map(|cell| {
                let width = column_width(&cell.destination);
                let text = cell_text(cell, !self.color);
                let padded = format!("{text:>width$}");
                if !self.color {
                    return padded;
                }
                match style_color(cell.style) {
                    Some(color) => {
                        let styled = padded.with(color);
                        if cell.stale {
                            styled.dim().to_string()
                        } else {
                            styled.to_string()
                        }
                    }
                    None => padded,
                }
            })
            .collect();
        parts.join(COLUMN_GAP)
    }
}

impl RenderSink for ConsoleSink {
    fn emit(&mut self, event: RenderEvent) {
        let line = match event {
            RenderEvent::Header { destinations } => self.header_line(&destinations),
            RenderEvent::Row { cells } => self.row_line(&cells),
        };
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "Failed to write to stdout");
        }
    }
}

fn column_width(destination: &str) -> usize {
    destination.chars().count().max(MIN_COLUMN_WIDTH)
}

fn cell_text(cell: &Cell, plain: bool) -> String {
    let mut text = match cell.value {
        CellValue::Latency(rtt) => format!("{}ms", rtt.as_millis()),
        CellValue::Failed => FAILED_TEXT.to_string(),
        CellValue::Blank => String::new(),
    };
    if plain && cell.stale {
        text.push(STALE_MARKER);
    }
    text
}

fn style_color(style: Style) -> Option<Color> {
    match style {
        Style::Fast => Some(Color::Green),
        Style::Normal => Some(Color::Blue),
        Style::Warning => Some(Color::Yellow),
        Style::Critical | Style::Failed => Some(Color::Red),
        Style::Blank => None,
    }
}
