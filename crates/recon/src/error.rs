use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// Config text is not valid TOML or does not fit the config shape.
    ConfigParse(String),
    /// Config validation error (empty marker token, empty synonym list, etc.).
    ConfigValidation(String),
    /// None of the accepted header synonyms is present in the dataset.
    MissingColumn { dataset: String, column: String },
    /// Input is not a two-dimensional grid.
    NotAGrid(String),
    /// A pipeline was handed no data where at least one dataset is required.
    EmptyDataset(String),
    /// A file the engine was asked to read could not be read.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { dataset, column } => {
                write!(f, "{dataset}: missing required column '{column}'")
            }
            Self::NotAGrid(msg) => write!(f, "input is not a two-dimensional grid: {msg}"),
            Self::EmptyDataset(msg) => write!(f, "empty dataset: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
