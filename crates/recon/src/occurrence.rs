//! Occurrence labels: validation, canonical vocabulary and row filtering.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::config::ReconConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::ReconError;
use crate::grid::HeaderTable;
use crate::text::fold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrence {
    Collected,
    ReceivedAtBase,
    InTransferManifest,
}

impl Occurrence {
    pub fn label(self) -> &'static str {
        match self {
            Occurrence::Collected => "Coletado",
            Occurrence::ReceivedAtBase => "Recebido na base",
            Occurrence::InTransferManifest => "Romaneio em transferência",
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of checking one label. `canonical` is set only when `valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceCheck {
    pub valid: bool,
    pub canonical: Option<Occurrence>,
    /// Name of the rule that decided.
    pub rule: &'static str,
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Label forms a rule can look at.
pub struct OccurrenceText {
    /// Trimmed and lower-cased.
    pub lower: String,
    /// Lower-cased with accents stripped.
    pub folded: String,
}

impl OccurrenceText {
    pub fn new(raw: &str) -> Self {
        Self {
            lower: raw.trim().to_lowercase(),
            folded: fold(raw),
        }
    }
}

pub struct OccurrenceRule {
    pub name: &'static str,
    pub matches: fn(&OccurrenceText) -> bool,
    /// `None` rejects the label.
    pub outcome: Option<Occurrence>,
}

fn coletado(t: &OccurrenceText) -> bool {
    t.lower == "coletado"
}

fn recebido_na_base(t: &OccurrenceText) -> bool {
    t.lower == "recebido na base"
}

fn romaneio_em_transferencia(t: &OccurrenceText) -> bool {
    t.folded == "romaneio em transferencia"
}

fn negated(t: &OccurrenceText) -> bool {
    t.lower.contains("não") || t.lower.contains("nao")
}

fn sva(t: &OccurrenceText) -> bool {
    t.lower.contains("sva")
}

fn pendente(t: &OccurrenceText) -> bool {
    t.lower.contains("pendente")
}

pub const OCCURRENCE_RULES: &[OccurrenceRule] = &[
    OccurrenceRule { name: "coletado", matches: coletado, outcome: Some(Occurrence::Collected) },
    OccurrenceRule {
        name: "recebido_na_base",
        matches: recebido_na_base,
        outcome: Some(Occurrence::ReceivedAtBase),
    },
    OccurrenceRule {
        name: "romaneio_em_transferencia",
        matches: romaneio_em_transferencia,
        outcome: Some(Occurrence::InTransferManifest),
    },
    OccurrenceRule { name: "negation", matches: negated, outcome: None },
    OccurrenceRule { name: "sva", matches: sva, outcome: None },
    OccurrenceRule { name: "pendente", matches: pendente, outcome: None },
];

/// Name reported when no rule matched.
pub const UNRECOGNIZED: &str = "unrecognized";

pub fn classify(raw: &str) -> OccurrenceCheck {
    let text = OccurrenceText::new(raw);
    match OCCURRENCE_RULES.iter().find(|r| (r.matches)(&text)) {
        Some(rule) => OccurrenceCheck {
            valid: rule.outcome.is_some(),
            canonical: rule.outcome,
            rule: rule.name,
        },
        None => OccurrenceCheck { valid: false, canonical: None, rule: UNRECOGNIZED },
    }
}

pub fn matching_rule(raw: &str) -> &'static str {
    classify(raw).rule
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// An occurrence row that survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceRow {
    pub reference: String,
    pub occurrence: Occurrence,
    pub raw_occurrence: String,
    pub service_type: String,
    /// Every named cell of the source row.
    pub fields: BTreeMap<String, String>,
    /// Grid row (0-based) the kept values came from.
    pub row: usize,
}

pub const OCCURRENCE_DATASET: &str = "occurrences";

/// Keep rows with a valid occurrence and the configured service type, one per
/// reference. A later row for a reference replaces the earlier one in place.
pub fn filter_occurrences(
    table: &HeaderTable,
    config: &ReconConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<OccurrenceRow>, ReconError> {
    let cfg = &config.occurrence;
    let reference_col = table.require(OCCURRENCE_DATASET, &cfg.reference)?;
    let occurrence_col = table.require(OCCURRENCE_DATASET, &cfg.occurrence)?;
    let service_col = table.require(OCCURRENCE_DATASET, &cfg.service_type)?;
    let wanted_service = cfg.service_label.trim().to_lowercase();

    let mut kept: Vec<OccurrenceRow> = Vec::new();
    let mut slot_by_reference: HashMap<String, usize> = HashMap::new();

    for (idx, row) in table.rows().iter().enumerate() {
        let grid_row = table.grid_row(idx);
        let reference = row.get(reference_col).to_text().trim().to_string();
        if reference.is_empty() {
            continue;
        }
        let raw_occurrence = row.get(occurrence_col).to_text().trim().to_string();
        let service_type = row.get(service_col).to_text().trim().to_string();

        let check = classify(&raw_occurrence);
        let Some(occurrence) = check.canonical else {
            sink.emit(Diagnostic::OccurrenceRejected {
                row: grid_row,
                reference,
                occurrence: raw_occurrence,
                rule: check.rule,
            });
            continue;
        };

        if service_type.to_lowercase() != wanted_service {
            sink.emit(Diagnostic::ServiceTypeRejected {
                row: grid_row,
                reference,
                service_type,
            });
            continue;
        }

        let entry = OccurrenceRow {
            reference: reference.clone(),
            occurrence,
            raw_occurrence,
            service_type,
            fields: table.record(row),
            row: grid_row,
        };

        match slot_by_reference.get(&reference) {
            Some(&slot) => {
                sink.emit(Diagnostic::DuplicateReference {
                    reference,
                    replaced_row: kept[slot].row,
                    row: grid_row,
                });
                kept[slot] = entry;
            }
            None => {
                slot_by_reference.insert(reference, kept.len());
                kept.push(entry);
            }
        }
    }

    tracing::debug!(kept = kept.len(), rows = table.rows().len(), "occurrence rows filtered");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Collector;
    use crate::grid::Grid;

    #[test]
    fn canonical_labels() {
        assert_eq!(classify("COLETADO").canonical, Some(Occurrence::Collected));
        assert!(classify("  coletado ").valid);
        assert_eq!(classify("Recebido na Base").canonical, Some(Occurrence::ReceivedAtBase));
        assert_eq!(
            classify("Romaneio em Transferência").canonical,
            Some(Occurrence::InTransferManifest)
        );
        assert_eq!(
            classify("romaneio em transferencia").canonical,
            Some(Occurrence::InTransferManifest)
        );
    }

    #[test]
    fn rejections_name_their_rule() {
        let check = classify("Não Coletado");
        assert!(!check.valid);
        assert_eq!(check.canonical, None);
        assert_eq!(check.rule, "negation");

        assert_eq!(matching_rule("nao recebido"), "negation");
        assert_eq!(matching_rule("pendente sva"), "sva");
        assert!(!classify("pendente sva").valid);
        assert_eq!(matching_rule("Pendente"), "pendente");
        assert_eq!(matching_rule("Entregue"), UNRECOGNIZED);
        assert_eq!(matching_rule(""), UNRECOGNIZED);
    }

    #[test]
    fn containment_does_not_validate() {
        // only exact labels are valid
        assert!(!classify("coletado parcialmente").valid);
        assert!(!classify("recebido").valid);
    }

    fn table(rows: &[Vec<&str>]) -> HeaderTable {
        HeaderTable::from_grid(&Grid::from_rows(rows), 0)
    }

    #[test]
    fn filter_drops_invalid_rows_and_keeps_last_duplicate() {
        let t = table(&[
            vec!["Referência", "Ocorrência", "Tipo de Serviço", "Obs"],
            vec!["100", "Coletado", "Coleta", "first"],
            vec!["200", "Não coletado", "Coleta", ""],
            vec!["300", "Recebido na base", "Entrega", ""],
            vec!["400", "Recebido na base", " coleta ", ""],
            vec!["100", "Romaneio em transferência", "COLETA", "second"],
            vec!["", "Coletado", "Coleta", ""],
        ]);
        let mut sink = Collector::new();
        let rows = filter_occurrences(&t, &ReconConfig::default(), &mut sink).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reference, "100");
        assert_eq!(rows[0].occurrence, Occurrence::InTransferManifest);
        assert_eq!(rows[0].fields.get("Obs").map(String::as_str), Some("second"));
        assert_eq!(rows[0].row, 5);
        assert_eq!(rows[1].reference, "400");

        assert_eq!(sink.count(|d| matches!(d, Diagnostic::OccurrenceRejected { .. })), 1);
        assert_eq!(sink.count(|d| matches!(d, Diagnostic::ServiceTypeRejected { .. })), 1);
        assert!(sink.diagnostics.contains(&Diagnostic::DuplicateReference {
            reference: "100".into(),
            replaced_row: 1,
            row: 5,
        }));
    }

    #[test]
    fn header_synonyms_are_accepted() {
        let t = table(&[
            vec!["ref", "status", "servico"],
            vec!["9", "coletado", "Coleta"],
        ]);
        let rows = filter_occurrences(&t, &ReconConfig::default(), &mut Collector::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].raw_occurrence, "coletado");
    }

    #[test]
    fn missing_service_column_fails_the_whole_run() {
        let t = table(&[vec!["Referência", "Ocorrência"], vec!["1", "Coletado"]]);
        let err = filter_occurrences(&t, &ReconConfig::default(), &mut Collector::new()).unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingColumn {
                dataset: OCCURRENCE_DATASET.into(),
                column: "Tipo de Serviço".into(),
            }
        );
    }
}
