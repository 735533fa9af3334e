//! Structured diagnostics.
//!
//! Parsing never aborts on row-level problems; it reports them to an injected
//! [`DiagnosticSink`] instead. The CLI installs [`TracingSink`], tests install
//! [`Collector`] and assert on the emitted values.

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Marker or order-code row seen before any driver marker.
    NoOpenRoute,
    /// Order-code row for a regular driver with column H but no column G.
    MissingOrderCode,
    /// Status row whose resolved code is empty.
    EmptyCode,
}

/// One status event in a duplicate-code report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateEntry {
    pub timestamp: NaiveDateTime,
    pub raw_timestamp: String,
    pub status: String,
    pub agent: String,
    pub title: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A row was ignored without changing parser state.
    RowSkipped { row: usize, reason: SkipReason },
    /// A timestamp fell back to the epoch sentinel.
    UnparseableDate { text: String },
    /// A code carried several status events. `entries` is newest first; the
    /// first entry is the one in force.
    DuplicateCode { code: String, entries: Vec<DuplicateEntry> },
    /// Occurrence row dropped because its label is not in the vocabulary.
    OccurrenceRejected { row: usize, reference: String, occurrence: String, rule: &'static str },
    /// Occurrence row dropped because of its service type.
    ServiceTypeRejected { row: usize, reference: String, service_type: String },
    /// A later occurrence row replaced an earlier one with the same reference.
    DuplicateReference { reference: String, replaced_row: usize, row: usize },
}

pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::RowSkipped { row, reason } => {
                tracing::debug!(row, ?reason, "route sheet row skipped");
            }
            Diagnostic::UnparseableDate { text } => {
                tracing::warn!(text = %text, "unable to parse date, using epoch");
            }
            Diagnostic::DuplicateCode { code, entries } => {
                tracing::info!(code = %code, entries = entries.len(), "code has several status events");
                for (i, e) in entries.iter().enumerate() {
                    tracing::debug!(
                        code = %code,
                        position = i + 1,
                        in_force = i == 0,
                        agent = %e.agent,
                        title = e.title.as_deref().unwrap_or("N/A"),
                        raw_timestamp = %e.raw_timestamp,
                        timestamp = %e.timestamp,
                        status = %e.status,
                        sender = %e.sender,
                        "status event"
                    );
                }
            }
            Diagnostic::OccurrenceRejected { row, reference, occurrence, rule } => {
                tracing::debug!(row, reference = %reference, occurrence = %occurrence, rule, "occurrence rejected");
            }
            Diagnostic::ServiceTypeRejected { row, reference, service_type } => {
                tracing::debug!(row, reference = %reference, service_type = %service_type, "service type rejected");
            }
            Diagnostic::DuplicateReference { reference, replaced_row, row } => {
                tracing::debug!(reference = %reference, replaced_row, row, "duplicate reference, keeping last");
            }
        }
    }
}

/// Records every diagnostic in emission order.
#[derive(Debug, Default, Clone)]
pub struct Collector {
    pub diagnostics: Vec<Diagnostic>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics.iter().filter(|d| pred(d)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for Collector {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}
