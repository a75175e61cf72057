//! Incremental table rendering.
//!
//! Turns grid rows into presentation events: a header before every tenth
//! row, latency cells styled against the configured thresholds, and
//! carry-forward of the previous row's value when a cell is still empty.

use std::time::Duration;

use crate::config::Thresholds;
use crate::probe::Outcome;
use crate::table::ResultTable;

/// A header is emitted before every N-th data row.
pub const HEADER_EVERY: usize = 10;

/// Value shown in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue {
    /// Measured round-trip time.
    Latency(Duration),
    /// The probe failed.
    Failed,
    /// Nothing measured yet for this column.
    Blank,
}

/// Severity styling of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Below the fast threshold.
    Fast,
    /// Between the fast and warning thresholds.
    Normal,
    /// At or above the warning threshold.
    Warning,
    /// At or above the error threshold.
    Critical,
    /// Probe failure.
    Failed,
    /// Empty cell.
    Blank,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column this cell belongs to.
    pub destination: String,
    /// Displayed value.
    pub value: CellValue,
    /// Severity styling.
    pub style: Style,
    /// Carried forward from the previous row instead of measured this round.
    pub stale: bool,
}

/// A presentation event produced while draining the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Column header, emitted before every [`HEADER_EVERY`]-th row.
    Header {
        /// Destination labels in column order.
        destinations: Vec<String>,
    },
    /// One data row with one cell per known destination.
    Row {
        /// Cells in column order.
        cells: Vec<Cell>,
    },
}

/// Consumer of render events.
pub trait RenderSink: Send {
    /// Handle one event.
    fn emit(&mut self, event: RenderEvent);
}

/// Incremental renderer over a result grid.
///
/// The only state carried between drains is the index of the next
/// unrendered row, so draining twice without new rows emits nothing.
#[derive(Debug)]
pub struct Renderer {
    thresholds: Thresholds,
    next_row: usize,
}

impl Renderer {
    /// Create a renderer styling cells against `thresholds`.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            next_row: 0,
        }
    }

    /// Render every grid row not yet rendered, oldest first.
    pub fn drain(&mut self, table: &ResultTable) -> Vec<RenderEvent> {
        let mut events = Vec::new();
        while self.next_row < table.row_count() {
            let row = self.next_row;
            let destinations = table.destinations();
            if row % HEADER_EVERY == 0 {
                events.push(RenderEvent::Header {
                    destinations: destinations.clone(),
                });
            }
            let cells = destinations
                .iter()
                .map(|destination| self.cell(table, row, destination))
                .collect();
            events.push(RenderEvent::Row { cells });
            self.next_row = row + 1;
        }
        events
    }

    fn cell(&self, table: &ResultTable, row: usize, destination: &str) -> Cell {
        if let Some(outcome) = table.get(row, destination) {
            return self.styled(destination, outcome, false);
        }
        // fall back to the previous row's value, marked stale
        match row
            .checked_sub(1)
            .and_then(|prev| table.get(prev, destination))
        {
            Some(outcome) => self.styled(destination, outcome, true),
            None => Cell {
                destination: destination.to_string(),
                value: CellValue::Blank,
                style: Style::Blank,
                stale: false,
            },
        }
    }

    fn styled(&self, destination: &str, outcome: Outcome, stale: bool) -> Cell {
        let (value, style) = match outcome {
            Outcome::Failed => (CellValue::Failed, Style::Failed),
            Outcome::Reply { rtt } => (CellValue::Latency(rtt), self.latency_style(rtt)),
        };
        Cell {
            destination: destination.to_string(),
            value,
            style,
            stale,
        }
    }

    fn latency_style(&self, rtt: Duration) -> Style {
        if rtt >= self.thresholds.error {
            Style::Critical
        } else if rtt >= self.thresholds.warning {
            Style::Warning
        } else if rtt < self.thresholds.fast {
            Style::Fast
        } else {
            Style::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(ms: u64) -> Outcome {
        Outcome::Reply {
            rtt: Duration::from_millis(ms),
        }
    }

    fn rows(events: &[RenderEvent]) -> Vec<&Vec<Cell>> {
        events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Row { cells } => Some(cells),
                RenderEvent::Header { .. } => None,
            })
            .collect()
    }

    fn header_positions(events: &[RenderEvent]) -> Vec<usize> {
        events
            .iter()
            .enumerate()
            .filter_map(|(i, event)| match event {
                RenderEvent::Header { .. } => Some(i),
                RenderEvent::Row { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_latency_style_boundaries() {
        let renderer = Renderer::new(Thresholds::default());
        assert_eq!(
            renderer.latency_style(Duration::from_millis(49)),
            Style::Fast
        );
        assert_eq!(
            renderer.latency_style(Duration::from_millis(50)),
            Style::Normal
        );
        assert_eq!(
            renderer.latency_style(Duration::from_millis(499)),
            Style::Normal
        );
        assert_eq!(
            renderer.latency_style(Duration::from_millis(500)),
            Style::Warning
        );
        assert_eq!(
            renderer.latency_style(Duration::from_millis(999)),
            Style::Warning
        );
        assert_eq!(
            renderer.latency_style(Duration::from_millis(1000)),
            Style::Critical
        );
    }

    #[test]
    fn test_drain_styles_and_orders_cells() {
        let table = ResultTable::new(&["a".to_string(), "b".to_string()]);
        let writer = table.writer();
        writer.record(0, "a", reply(20));
        writer.record(0, "b", Outcome::Failed);

        let mut renderer = Renderer::new(Thresholds::default());
        let events = renderer.drain(&table);

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RenderEvent::Header {
                destinations: vec!["a".to_string(), "b".to_string()],
            }
        );
        let rows = rows(&events);
        let cells = rows[0];
        assert_eq!(cells[0].destination, "a");
        assert_eq!(cells[0].value, CellValue::Latency(Duration::from_millis(20)));
        assert_eq!(cells[0].style, Style::Fast);
        assert!(!cells[0].stale);
        assert_eq!(cells[1].destination, "b");
        assert_eq!(cells[1].value, CellValue::Failed);
        assert_eq!(cells[1].style, Style::Failed);
    }

    #[test]
    fn test_drain_is_idempotent() {
        let table = ResultTable::new(&["a".to_string()]);
        table.writer().record(0, "a", reply(20));

        let mut renderer = Renderer::new(Thresholds::default());
        assert_eq!(renderer.drain(&table).len(), 2);
        assert!(renderer.drain(&table).is_empty());

        // a new row makes the next drain emit exactly that row
        table.writer().record(1, "a", reply(30));
        let events = renderer.drain(&table);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RenderEvent::Row { .. }));
    }

    #[test]
    fn test_missing_cell_carries_previous_value_as_stale() {
        let table = ResultTable::new(&["a".to_string(), "b".to_string()]);
        let writer = table.writer();
        writer.record(0, "a", reply(20));
        writer.record(0, "b", reply(700));
        writer.record(1, "a", reply(25));
        table.open_round(1);

        let mut renderer = Renderer::new(Thresholds::default());
        let events = renderer.drain(&table);
        let rows = rows(&events);

        let b0 = &rows[0][1];
        assert!(!b0.stale);
        let b1 = &rows[1][1];
        assert_eq!(b1.value, CellValue::Latency(Duration::from_millis(700)));
        assert_eq!(b1.style, Style::Warning);
        assert!(b1.stale);
    }

    #[test]
    fn test_missing_cell_without_history_renders_blank() {
        let table = ResultTable::new(&["a".to_string(), "b".to_string()]);
        table.writer().record(0, "a", reply(20));

        let mut renderer = Renderer::new(Thresholds::default());
        let events = renderer.drain(&table);
        let rows = rows(&events);
        let cells = rows[0];

        assert_eq!(cells[1].value, CellValue::Blank);
        assert_eq!(cells[1].style, Style::Blank);
        assert!(!cells[1].stale);
    }

    #[test]
    fn test_header_repeats_every_tenth_row() {
        let table = ResultTable::new(&["a".to_string()]);
        let writer = table.writer();
        for round in 0..21 {
            writer.record(round, "a", reply(10));
        }

        let mut renderer = Renderer::new(Thresholds::default());
        let events = renderer.drain(&table);

        // 21 rows plus headers before rows 0, 10 and 20
        assert_eq!(events.len(), 24);
        assert_eq!(header_positions(&events), vec![0, 11, 22]);
    }

    #[test]
    fn test_header_cadence_survives_partial_drains() {
        let table = ResultTable::new(&["a".to_string()]);
        let writer = table.writer();
        let mut renderer = Renderer::new(Thresholds::default());

        let mut headers = 0;
        for round in 0..12 {
            writer.record(round, "a", reply(10));
            headers += header_positions(&renderer.drain(&table)).len();
        }

        // headers landed before absolute rows 0 and 10 only
        assert_eq!(headers, 2);
    }

    #[test]
    fn test_late_destination_blank_in_earlier_rows() {
        let table = ResultTable::new(&["a".to_string()]);
        let writer = table.writer();
        writer.record(0, "a", reply(10));
        writer.record(1, "a", reply(11));
        writer.record(1, "late", reply(12));

        let mut renderer = Renderer::new(Thresholds::default());
        let events = renderer.drain(&table);

        assert_eq!(
            events[0],
            RenderEvent::Header {
                destinations: vec!["a".to_string(), "late".to_string()],
            }
        );
        let rows = rows(&events);
        assert_eq!(rows[0][1].value, CellValue::Blank);
        assert_eq!(
            rows[1][1].value,
            CellValue::Latency(Duration::from_millis(12))
        );
    }
}
