//! Table observer for pretty-printing counter totals.
//!
//! This module provides [`TableObserver`], which renders a
//! [`MetricsSnapshot`] as a formatted ASCII table using the `tabled` crate.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! contatori-store = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! ## Standard format (vertical list)
//!
//! ```rust,ignore
//! use contatori_store::observers::table::{TableObserver, TableStyle};
//!
//! let snapshot = MetricsSnapshot::collect(&counter, ["requests", "errors"])?;
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render(&snapshot));
//! // ╭──────────┬────────┬───────╮
//! // │ Name     │ Shards │ Value │
//! // ├──────────┼────────┼───────┤
//! // │ requests │ 20     │ 1000  │
//! // │ errors   │ 20     │ 5     │
//! // ╰──────────┴────────┴───────╯
//! ```
//!
//! ## Compact format (multiple columns)
//!
//! ```rust,ignore
//! let observer = TableObserver::new().compact(true).columns(3);
//! println!("{}", observer.render(&snapshot));
//! // ╭────────────────┬───────────┬──────────────╮
//! // │ requests: 1000 │ errors: 5 │ logins: 120  │
//! // ╰────────────────┴───────────┴──────────────╯
//! ```

use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::snapshot::MetricsSnapshot;

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// GitHub-flavored Markdown table
    Markdown,
    /// Dots for borders
    Dots,
    /// No borders, just spacing
    Blank,
}

/// Separator style between name and value in compact mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompactSeparator {
    /// Colon separator: "name: value"
    #[default]
    Colon,
    /// Equals separator: "name = value"
    Equals,
    /// Arrow separator: "name → value"
    Arrow,
}

impl CompactSeparator {
    /// Returns the separator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactSeparator::Colon => ": ",
            CompactSeparator::Equals => " = ",
            CompactSeparator::Arrow => " → ",
        }
    }
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row (only in non-compact mode).
    pub show_header: bool,
    /// Custom title for the table (optional).
    pub title: Option<String>,
    /// Whether to use compact format (name: value in cells).
    pub compact: bool,
    /// Number of columns in compact mode (default: 1).
    pub columns: usize,
    /// Separator between name and value in compact mode.
    pub separator: CompactSeparator,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
            compact: false,
            columns: 1,
            separator: CompactSeparator::default(),
        }
    }
}

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Shards")]
    shards: usize,
    #[tabled(rename = "Value")]
    value: u64,
}

/// An observer that renders counter totals as a formatted ASCII table.
///
/// Supports two rendering modes:
///
/// 1. **Standard mode**: Name, Shards and Value columns, one counter per row
/// 2. **Compact mode**: Multi-column grid with "name: value" cells
///
/// # Examples
///
/// ```rust
/// use contatori_store::observers::table::{TableObserver, TableStyle};
/// use contatori_store::snapshot::{CounterSnapshot, MetricsSnapshot};
///
/// let snapshot = MetricsSnapshot::new(vec![CounterSnapshot::new("requests", 42, 20)]);
///
/// let output = TableObserver::new()
///     .with_style(TableStyle::Ascii)
///     .render(&snapshot);
/// assert!(output.contains("requests"));
/// assert!(output.contains("42"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    ///
    /// Default style is [`TableStyle::Rounded`] in standard (non-compact) mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    ///
    /// Only applies in standard (non-compact) mode.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets an optional title for the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Enables or disables compact mode.
    pub fn compact(mut self, enabled: bool) -> Self {
        self.config.compact = enabled;
        self
    }

    /// Sets the number of columns in compact mode.
    ///
    /// Values less than 1 are treated as 1.
    pub fn columns(mut self, count: usize) -> Self {
        self.config.columns = count.max(1);
        self
    }

    /// Sets the separator between name and value in compact mode.
    pub fn separator(mut self, sep: CompactSeparator) -> Self {
        self.config.separator = sep;
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::Dots => {
                table.with(Style::dots());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    fn titled(&self, table: Table) -> String {
        match &self.config.title {
            Some(title) => format!("{}\n{}", title, table),
            None => table.to_string(),
        }
    }

    fn render_compact(&self, snapshot: &MetricsSnapshot) -> String {
        let cells: Vec<String> = snapshot
            .counters
            .iter()
            .map(|c| format!("{}{}{}", c.name, self.config.separator.as_str(), c.value))
            .collect();

        if cells.is_empty() {
            return String::new();
        }

        let cols = self.config.columns;
        let mut builder = Builder::default();

        for chunk in cells.chunks(cols) {
            let mut row: Vec<String> = chunk.to_vec();
            // Pad the last row with empty cells
            row.resize(cols, String::new());
            builder.push_record(row);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);
        self.titled(table)
    }

    fn render_standard(&self, snapshot: &MetricsSnapshot) -> String {
        let rows: Vec<CounterRow> = snapshot
            .counters
            .iter()
            .map(|c| CounterRow {
                name: c.name.clone(),
                shards: c.shards,
                value: c.value,
            })
            .collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        self.titled(table)
    }

    /// Renders the snapshot as a formatted table string.
    pub fn render(&self, snapshot: &MetricsSnapshot) -> String {
        if self.config.compact {
            self.render_compact(snapshot)
        } else {
            self.render_standard(snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::CounterSnapshot;

    fn sample() -> MetricsSnapshot {
        MetricsSnapshot::new(vec![
            CounterSnapshot::new("a", 1, 20),
            CounterSnapshot::new("b", 22, 20),
            CounterSnapshot::new("c", 333, 50),
        ])
    }

    #[test]
    fn test_render_empty() {
        let output = TableObserver::new().render(&MetricsSnapshot::new(vec![]));
        assert!(output.contains("Name"));
    }

    #[test]
    fn test_render_empty_compact() {
        let output = TableObserver::new()
            .compact(true)
            .columns(3)
            .render(&MetricsSnapshot::new(vec![]));
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_standard() {
        let output = TableObserver::new().render(&sample());
        assert!(output.contains("Name"));
        assert!(output.contains("Shards"));
        assert!(output.contains("Value"));
        assert!(output.contains("333"));
        assert!(output.contains("50"));
    }

    #[test]
    fn test_render_without_header() {
        let output = TableObserver::new().with_header(false).render(&sample());
        assert!(!output.contains("Name"));
        assert!(output.contains("333"));
    }

    #[test]
    fn test_render_with_title() {
        let output = TableObserver::new().with_title("Counters").render(&sample());
        assert!(output.starts_with("Counters\n"));
    }

    #[test]
    fn test_render_compact_single() {
        let snapshot = MetricsSnapshot::new(vec![CounterSnapshot::new("requests", 100, 20)]);
        let output = TableObserver::new().compact(true).render(&snapshot);
        assert!(output.contains("requests: 100"));
    }

    #[test]
    fn test_render_compact_multiple_columns() {
        let output = TableObserver::new()
            .compact(true)
            .columns(2)
            .separator(CompactSeparator::Equals)
            .render(&sample());
        assert!(output.contains("a = 1"));
        assert!(output.contains("b = 22"));
        assert!(output.contains("c = 333"));
        // Two rows of two cells each.
        let first = output.lines().find(|l| l.contains("a = 1")).unwrap();
        assert!(first.contains("b = 22"));
    }

    #[test]
    fn test_columns_min_one() {
        let observer = TableObserver::new().columns(0);
        assert_eq!(observer.config.columns, 1);
    }

    #[test]
    fn test_styles() {
        for style in [
            TableStyle::Ascii,
            TableStyle::Rounded,
            TableStyle::Sharp,
            TableStyle::Modern,
            TableStyle::Markdown,
            TableStyle::Dots,
            TableStyle::Blank,
        ] {
            let output = TableObserver::new().with_style(style).render(&sample());
            assert!(output.contains("333"), "{style:?}");
        }
    }

    #[test]
    fn test_markdown_style() {
        let output = TableObserver::new()
            .with_style(TableStyle::Markdown)
            .render(&sample());
        assert!(output.contains("|"));
    }
}
