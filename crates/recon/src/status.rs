//! Status events and latest-wins resolution per order code.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::ReconConfig;
use crate::datetime;
use crate::diagnostics::{Diagnostic, DiagnosticSink, DuplicateEntry, SkipReason};
use crate::error::ReconError;
use crate::grid::HeaderTable;

pub const STATUS_DATASET: &str = "status";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One status row, code already resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub code: String,
    /// Lower-cased status text.
    pub status: String,
    pub timestamp: NaiveDateTime,
    pub raw_timestamp: String,
    pub sender: String,
    pub agent: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Unsuccessful,
    /// Neither; the code stays pending.
    Uncounted,
}

impl DeliveryOutcome {
    pub fn from_status(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("sem sucesso") {
            DeliveryOutcome::Unsuccessful
        } else if status.contains("sucesso") {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Uncounted
        }
    }
}

struct StatusColumnsFound {
    code: usize,
    status: usize,
    title: Option<usize>,
    sender: Option<usize>,
    timestamp: Option<usize>,
    agent: Option<usize>,
}

/// Read status events from a header table. The code and status columns are
/// required; the rest fall back to defaults when absent.
pub fn events_from_table(
    table: &HeaderTable,
    config: &ReconConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<StatusEvent>, ReconError> {
    let cols = &config.status;
    let found = StatusColumnsFound {
        code: table.require(STATUS_DATASET, &cols.code)?,
        status: table.require(STATUS_DATASET, &cols.status)?,
        title: table.find(&cols.title),
        sender: table.find(&cols.sender),
        timestamp: table.find(&cols.timestamp),
        agent: table.find(&cols.agent),
    };

    let text_at = |row: &crate::grid::RawRow, col: Option<usize>| -> Option<String> {
        col.and_then(|c| row.text(c)).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };

    let mut events = Vec::with_capacity(table.rows().len());
    for (idx, row) in table.rows().iter().enumerate() {
        let agent = text_at(row, found.agent).unwrap_or_else(|| cols.default_agent.clone());
        let title = text_at(row, found.title);
        let code = if config.is_broker(&agent) {
            title.clone().unwrap_or_default()
        } else {
            text_at(row, Some(found.code)).unwrap_or_default()
        };
        if code.is_empty() {
            sink.emit(Diagnostic::RowSkipped { row: table.grid_row(idx), reason: SkipReason::EmptyCode });
            continue;
        }

        let raw_timestamp = text_at(row, found.timestamp).unwrap_or_default();
        events.push(StatusEvent {
            code,
            status: row.get(found.status).to_text().trim().to_lowercase(),
            timestamp: datetime::parse_with(&raw_timestamp, sink),
            raw_timestamp,
            sender: text_at(row, found.sender).unwrap_or_else(|| cols.default_sender.clone()),
            agent,
            title,
        });
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub status: String,
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub outcome: DeliveryOutcome,
    /// Every event for the code, in input order.
    pub history: Vec<StatusEvent>,
}

/// Resolved status per code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBook {
    records: HashMap<String, StatusRecord>,
    /// Codes in first-seen order.
    codes: Vec<String>,
}

impl StatusBook {
    /// Group events by code. The event with the greatest timestamp is in
    /// force; on equal timestamps the later event in input order wins.
    pub fn resolve(events: &[StatusEvent], sink: &mut dyn DiagnosticSink) -> Self {
        let mut book = StatusBook::default();

        for event in events {
            match book.records.get_mut(&event.code) {
                Some(record) => {
                    if event.timestamp >= record.timestamp {
                        record.status = event.status.clone();
                        record.timestamp = event.timestamp;
                        record.sender = event.sender.clone();
                        record.outcome = DeliveryOutcome::from_status(&event.status);
                    }
                    record.history.push(event.clone());
                }
                None => {
                    book.codes.push(event.code.clone());
                    book.records.insert(
                        event.code.clone(),
                        StatusRecord {
                            status: event.status.clone(),
                            timestamp: event.timestamp,
                            sender: event.sender.clone(),
                            outcome: DeliveryOutcome::from_status(&event.status),
                            history: vec![event.clone()],
                        },
                    );
                }
            }
        }

        for code in &book.codes {
            let record = &book.records[code];
            if record.history.len() > 1 {
                sink.emit(Diagnostic::DuplicateCode {
                    code: code.clone(),
                    entries: newest_first(&record.history),
                });
            }
        }

        tracing::debug!(events = events.len(), codes = book.codes.len(), "status events resolved");
        book
    }

    pub fn get(&self, code: &str) -> Option<&StatusRecord> {
        self.records.get(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Records in first-seen code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusRecord)> {
        self.codes.iter().map(|c| (c.as_str(), &self.records[c]))
    }
}

/// History sorted newest first; among equal timestamps the later input event
/// comes first, so entry 0 is always the one in force.
fn newest_first(history: &[StatusEvent]) -> Vec<DuplicateEntry> {
    let mut order: Vec<usize> = (0..history.len()).collect();
    order.sort_by(|&a, &b| {
        history[b]
            .timestamp
            .cmp(&history[a].timestamp)
            .then(b.cmp(&a))
    });
    order
        .into_iter()
        .map(|i| {
            let e = &history[i];
            DuplicateEntry {
                timestamp: e.timestamp,
                raw_timestamp: e.raw_timestamp.clone(),
                status: e.status.clone(),
                agent: e.agent.clone(),
                title: e.title.clone(),
                sender: e.sender.clone(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Latest entries
// ---------------------------------------------------------------------------

/// Full status row kept for a code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestEntry {
    pub code: String,
    pub timestamp: NaiveDateTime,
    pub fields: BTreeMap<String, String>,
}

/// One row per code: the one with the greatest timestamp (later row on ties),
/// in first-seen code order. Rows missing a code or a timestamp are ignored.
pub fn latest_entries(table: &HeaderTable, config: &ReconConfig) -> Result<Vec<LatestEntry>, ReconError> {
    let code_col = table.require(STATUS_DATASET, &config.status.code)?;
    let ts_col = table.require(STATUS_DATASET, &config.status.timestamp)?;

    let mut entries: Vec<LatestEntry> = Vec::new();
    let mut slot_by_code: HashMap<String, usize> = HashMap::new();

    for row in table.rows() {
        let code = row.get(code_col).to_text().trim().to_string();
        let raw_ts = row.get(ts_col).to_text();
        if code.is_empty() || raw_ts.trim().is_empty() {
            continue;
        }
        let timestamp = datetime::parse(&raw_ts);
        let entry = LatestEntry { code: code.clone(), timestamp, fields: table.record(row) };

        match slot_by_code.get(&code) {
            Some(&slot) => {
                if timestamp >= entries[slot].timestamp {
                    entries[slot] = entry;
                }
            }
            None => {
                slot_by_code.insert(code, entries.len());
                entries.push(entry);
            }
        }
    }
    Ok(entries)
}
