//! Report and status sinks.
//!
//! The runner hands every finished row to a [`ReportSink`] in completion order
//! and calls [`ReportSink::finalize`] once after the last case has finished.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use subwrap_types::{Report, ReportRow};
use tracing::info;

use crate::Error;

pub const NAME_WIDTH: usize = 12;
pub const EXPECTED_WIDTH: usize = 10;
pub const GOT_WIDTH: usize = 10;
pub const PASS_WIDTH: usize = 4;

pub trait ReportSink {
    fn add_row(&mut self, row: &ReportRow);

    fn finalize(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

pub trait StatusSink {
    fn set_status(&self, message: &str);
}

impl ReportSink for Vec<ReportRow> {
    fn add_row(&mut self, row: &ReportRow) {
        self.push(row.clone());
    }
}

fn got_cell(row: &ReportRow) -> String {
    match (row.got, row.failure) {
        (Some(got), _) => got.to_string(),
        (None, Some(kind)) => kind.label().to_string(),
        (None, None) => "-".to_string(),
    }
}

fn pass_cell(row: &ReportRow) -> &'static str {
    if row.passed {
        "Pass"
    } else {
        "FAIL"
    }
}

fn markdown_line(name: &str, expected: &str, got: &str, pass: &str) -> String {
    format!(
        "| {:<name_w$} | {:<expected_w$} | {:<got_w$} | {:<pass_w$} |",
        name,
        expected,
        got,
        pass,
        name_w = NAME_WIDTH,
        expected_w = EXPECTED_WIDTH,
        got_w = GOT_WIDTH,
        pass_w = PASS_WIDTH
    )
}

/// Fixed-width Markdown table, suitable for pasting verbatim into a bug
/// report. Content wider than a column is not truncated.
pub struct MarkdownTable {
    lines: Vec<String>,
    fenced: bool,
    out: Option<Box<dyn Write>>,
}

impl MarkdownTable {
    pub fn new() -> Self {
        Self {
            lines: vec![
                markdown_line("Name", "Expected", "Got", "Pass"),
                markdown_line(
                    &"-".repeat(NAME_WIDTH),
                    &"-".repeat(EXPECTED_WIDTH),
                    &"-".repeat(GOT_WIDTH),
                    &"-".repeat(PASS_WIDTH),
                ),
            ],
            fenced: false,
            out: None,
        }
    }

    /// Wrap the rendered table in a ```` ``` ```` code fence.
    pub fn fenced(mut self) -> Self {
        self.fenced = true;
        self
    }

    /// Write the rendered table to `out` on finalize.
    pub fn to_writer(mut self, out: impl Write + 'static) -> Self {
        self.out = Some(Box::new(out));
        self
    }

    pub fn render(&self) -> String {
        let table = self.lines.join("\n");
        if self.fenced {
            format!("```\n{table}\n```")
        } else {
            table
        }
    }
}

impl Default for MarkdownTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for MarkdownTable {
    fn add_row(&mut self, row: &ReportRow) {
        self.lines.push(markdown_line(
            &row.name,
            &row.expected.to_string(),
            &got_cell(row),
            pass_cell(row),
        ));
    }

    fn finalize(&mut self) -> Result<(), Error> {
        let rendered = self.render();
        if let Some(out) = self.out.as_mut() {
            writeln!(out, "{rendered}")?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Human-facing table printed row by row as cases finish.
pub struct ConsoleTable<W: Write> {
    out: W,
    header_written: bool,
}

impl ConsoleTable<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleTable<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_row(&mut self, row: &ReportRow) -> io::Result<()> {
        if !self.header_written {
            writeln!(
                self.out,
                "{:<20} {:>12} {:>12} {:>6}",
                "Name", "Expected", "Got", "Result"
            )?;
            writeln!(self.out, "{}", "-".repeat(20 + 12 * 2 + 6 + 3))?;
            self.header_written = true;
        }

        let verdict = if row.passed {
            console::style("Pass").green()
        } else {
            console::style("FAIL").red()
        };
        writeln!(
            self.out,
            "{:<20} {:>12} {:>12} {:>6}",
            row.name,
            row.expected,
            got_cell(row),
            verdict
        )?;
        self.out.flush()
    }
}

impl<W: Write> ReportSink for ConsoleTable<W> {
    fn add_row(&mut self, row: &ReportRow) {
        if let Err(e) = self.write_row(row) {
            tracing::warn!(error = %e, "failed to print report row");
        }
    }
}

/// Collects rows and writes them as a JSON [`Report`] on finalize.
pub struct JsonReport {
    path: PathBuf,
    report: Report,
}

impl JsonReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            report: Report::default(),
        }
    }
}

impl ReportSink for JsonReport {
    fn add_row(&mut self, row: &ReportRow) {
        if row.passed {
            self.report.passed += 1;
        } else {
            self.report.failed += 1;
        }
        self.report.rows.push(row.clone());
    }

    fn finalize(&mut self) -> Result<(), Error> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.report)?;
        writer.flush()?;
        info!(path = %self.path.display(), rows = self.report.rows.len(), "JSON report written");
        Ok(())
    }
}

/// Fans rows out to several sinks.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl ReportSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for SinkSet {
    fn add_row(&mut self, row: &ReportRow) {
        for sink in &mut self.sinks {
            sink.add_row(row);
        }
    }

    fn finalize(&mut self) -> Result<(), Error> {
        // Every sink gets its chance to flush; the first error wins.
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finalize() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Status line on stderr.
pub struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn set_status(&self, message: &str) {
        info!(status = message);
        eprintln!("{message}");
    }
}

/// Keeps every status message; the last one is the current status.
#[derive(Default)]
pub struct StatusLog {
    messages: Mutex<Vec<String>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.messages.lock().ok().and_then(|m| m.last().cloned())
    }
}

impl StatusSink for StatusLog {
    fn set_status(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
