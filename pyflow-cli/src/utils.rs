//! Terminal output shared by the commands

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use pyflow_infer::{DiagnosticSink, Severity};
use std::path::Path;
use std::time::Duration;

/// Spinner on stderr while the engine runs
pub struct AnalysisProgress {
    bar: ProgressBar,
}

impl AnalysisProgress {
    pub fn start(input: &Path) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(format!("Analyzing {}", input.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Loading is over; the engine is forcing uncalled functions
    pub fn converging(&self) {
        self.bar.set_message("Applying uncalled functions");
    }

    pub fn done(&self, modules: usize) {
        self.bar
            .finish_with_message(format!("{} Analyzed {}", "✓".green(), plural(modules, "module")));
    }

    pub fn failed(&self) {
        self.bar.abandon_with_message(format!("{} Analysis failed", "✗".red()));
    }
}

/// Wall time of a run: `<1ms`, `42ms`, `1.25s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis == 0 {
        "<1ms".to_string()
    } else if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

/// Diagnostics of a run by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
    pub notes: usize,
}

impl DiagnosticCounts {
    pub fn of(sink: &DiagnosticSink) -> Self {
        Self {
            errors: sink.count(Severity::Error),
            warnings: sink.count(Severity::Warning),
            notes: sink.count(Severity::Info),
        }
    }

    /// Errors and warnings fail a check; notes never do
    pub fn has_problems(&self) -> bool {
        self.errors > 0 || self.warnings > 0
    }

    pub fn summary(&self) -> String {
        if self.errors + self.warnings + self.notes == 0 {
            return "no problems".to_string();
        }
        format!(
            "{}, {}, {}",
            plural(self.errors, "error"),
            plural(self.warnings, "warning"),
            plural(self.notes, "note")
        )
    }
}

/// Closing line of a check, tagged by the worst severity seen
pub fn print_summary(counts: DiagnosticCounts, elapsed: Duration) {
    let line = format!("{} ({})", counts.summary(), format_elapsed(elapsed));
    let tag = if counts.errors > 0 {
        "Failed:".red().bold()
    } else if counts.warnings > 0 {
        "Warning:".yellow().bold()
    } else {
        "Clean:".green().bold()
    };
    println!("{} {}", tag, line);
}

/// Heading above the names of one module
pub fn print_module_heading(name: &str, path: &str) {
    println!();
    println!("{} {}", name.bold().underline(), format!("({})", path).dimmed());
}

/// Severity tag for a diagnostic line
pub fn severity_label(severity: Severity) -> ColoredString {
    let text = severity.to_string();
    match severity {
        Severity::Error => text.red().bold(),
        Severity::Warning => text.yellow().bold(),
        Severity::Info => text.blue(),
    }
}

/// `1 error`, `2 warnings`
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Column-aligned rows for the stats report
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    pub fn headers(mut self, headers: Vec<&str>) -> Self {
        self.headers = headers.iter().map(|s| s.to_string()).collect();
        self.column_widths = headers.iter().map(|s| s.chars().count()).collect();
        self
    }

    pub fn row(mut self, values: Vec<String>) -> Self {
        for (i, value) in values.iter().enumerate() {
            let width = value.chars().count();
            match self.column_widths.get_mut(i) {
                Some(existing) => *existing = (*existing).max(width),
                None => self.column_widths.push(width),
            }
        }
        self.rows.push(values);
        self
    }

    /// Render the table, one line per row
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.headers.is_empty() {
            lines.push(self.render_row(&self.headers));
            let rule: Vec<String> = self.column_widths.iter().map(|w| "─".repeat(*w)).collect();
            lines.push(rule.join("  "));
        }
        for row in &self.rows {
            lines.push(self.render_row(row));
        }
        lines
    }

    fn render_row(&self, values: &[String]) -> String {
        let cells: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let width = self.column_widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", value, width = width)
            })
            .collect();
        cells.join("  ").trim_end().to_string()
    }

    pub fn print(self) {
        for line in self.render() {
            println!("{}", line);
        }
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::{ByteOffset, FileId, Span};
    use pyflow_infer::Problem;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_micros(400)), "<1ms");
        assert_eq!(format_elapsed(Duration::from_millis(42)), "42ms");
        assert_eq!(format_elapsed(Duration::from_millis(1_250)), "1.25s");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "error"), "1 error");
        assert_eq!(plural(0, "warning"), "0 warnings");
    }

    #[test]
    fn test_diagnostic_counts() {
        let mut sink = DiagnosticSink::new();
        assert_eq!(DiagnosticCounts::of(&sink).summary(), "no problems");

        let span = |start| Span::new(FileId::new(0), ByteOffset(start), ByteOffset(start + 1));
        sink.report(span(0), Problem::TooManyValues);
        sink.report(span(1), Problem::UnusedVariable { name: "a".into() });
        sink.report(span(2), Problem::UnusedVariable { name: "b".into() });

        let counts = DiagnosticCounts::of(&sink);
        assert_eq!(counts, DiagnosticCounts { errors: 1, warnings: 0, notes: 2 });
        assert!(counts.has_problems());
        assert_eq!(counts.summary(), "1 error, 0 warnings, 2 notes");

        let notes_only = DiagnosticCounts { notes: 3, ..Default::default() };
        assert!(!notes_only.has_problems());
    }

    #[test]
    fn test_table_builder_aligns_columns() {
        let lines = TableBuilder::new()
            .headers(vec!["Counter", "Value"])
            .row(vec!["calls".to_string(), "12".to_string()])
            .row(vec!["body_walks".to_string(), "3".to_string()])
            .render();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Counter     Value");
        assert_eq!(lines[1], "──────────  ─────");
        assert_eq!(lines[2], "calls       12");
        assert_eq!(lines[3], "body_walks  3");
    }
}
