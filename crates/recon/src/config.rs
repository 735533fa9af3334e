use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Vocabulary the pipelines match against. Every section has built-in
/// defaults for the manifest/status exports in use today, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Drivers whose order codes live in the title column (H).
    pub brokers: Vec<String>,
    pub markers: MarkerTokens,
    pub status: StatusColumns,
    pub occurrence: OccurrenceConfig,
    pub compare: CompareConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            brokers: [
                "Aroldo Moreira da Silva Junior",
                "Elisama de Oliveira Pereira",
                "Joao Batista Carneiro",
                "Edson Rodrigues de Figueiredo",
                "Gabriel Silva de Figueiredo",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            markers: MarkerTokens::default(),
            status: StatusColumns::default(),
            occurrence: OccurrenceConfig::default(),
            compare: CompareConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Route sheet markers
// ---------------------------------------------------------------------------

/// Tokens searched for (substring) in column A of the route manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTokens {
    pub driver: String,
    pub order_count: String,
    pub vehicle: String,
    pub origin: String,
}

impl Default for MarkerTokens {
    fn default() -> Self {
        Self {
            driver: "Agente:".into(),
            order_count: "Serviços:".into(),
            vehicle: "Veículo:".into(),
            origin: "Início:".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Status export columns
// ---------------------------------------------------------------------------

/// Header synonyms for the status export, tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusColumns {
    pub code: Vec<String>,
    pub title: Vec<String>,
    pub status: Vec<String>,
    pub sender: Vec<String>,
    pub timestamp: Vec<String>,
    pub agent: Vec<String>,
    /// Used when the sender column is absent or blank.
    pub default_sender: String,
    /// Used when the agent column is absent or blank.
    pub default_agent: String,
}

impl Default for StatusColumns {
    fn default() -> Self {
        Self {
            code: strings(&["Código", "Codigo", "Code"]),
            title: strings(&["H", "Título", "Titulo", "Title"]),
            status: strings(&["Situação - Finalizado", "Situacao - Finalizado", "Status"]),
            sender: strings(&["F", "Remetente"]),
            timestamp: strings(&[
                "Horários (execução) - Concluído",
                "Horarios (execucao) - Concluido",
                "Timestamp",
            ]),
            agent: strings(&["Agente", "Agent"]),
            default_sender: "Não especificado".into(),
            default_agent: "Não especificado".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Occurrence export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccurrenceConfig {
    /// Rows whose service type differs from this label (case-insensitive) are dropped.
    pub service_label: String,
    pub reference: Vec<String>,
    pub occurrence: Vec<String>,
    pub service_type: Vec<String>,
}

impl Default for OccurrenceConfig {
    fn default() -> Self {
        Self {
            service_label: "Coleta".into(),
            reference: strings(&["Referência", "Referencia", "Ref"]),
            occurrence: strings(&["Ocorrência", "Ocorrencia", "Status"]),
            service_type: strings(&["Tipo de Serviço", "Tipo de Servico", "Serviço", "Servico"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Order-number comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Leading rows ignored in each primary export.
    pub primary_skip_rows: usize,
    /// Leading rows ignored in the secondary export.
    pub secondary_skip_rows: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            primary_skip_rows: 1,
            secondary_skip_rows: 2,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ReconError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if let Some(i) = self.brokers.iter().position(|b| b.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(format!("brokers[{i}] is blank")));
        }

        let markers = [
            ("markers.driver", &self.markers.driver),
            ("markers.order_count", &self.markers.order_count),
            ("markers.vehicle", &self.markers.vehicle),
            ("markers.origin", &self.markers.origin),
        ];
        for (name, token) in markers {
            if token.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{name} must not be empty")));
            }
        }

        let synonyms = [
            ("status.code", &self.status.code),
            ("status.title", &self.status.title),
            ("status.status", &self.status.status),
            ("status.sender", &self.status.sender),
            ("status.timestamp", &self.status.timestamp),
            ("status.agent", &self.status.agent),
            ("occurrence.reference", &self.occurrence.reference),
            ("occurrence.occurrence", &self.occurrence.occurrence),
            ("occurrence.service_type", &self.occurrence.service_type),
        ];
        for (name, list) in synonyms {
            if list.iter().all(|s| s.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} needs at least one header name"
                )));
            }
        }

        if self.occurrence.service_label.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "occurrence.service_label must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Exact (trimmed) membership in the broker allow-list.
    pub fn is_broker(&self, name: &str) -> bool {
        let name = name.trim();
        self.brokers.iter().any(|b| b.trim() == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
