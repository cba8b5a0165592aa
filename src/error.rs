//! Error types for the prediction pipeline

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PredictorError>;

/// A single field failing the record schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("field `{field}` = {value} is outside its domain {domain}")]
    OutOfDomain {
        field: &'static str,
        value: f64,
        domain: String,
    },

    #[error("field `{0}` must be a finite number")]
    NotFinite(&'static str),

    #[error("unexpected field `{0}`")]
    Unexpected(String),
}

impl FieldError {
    /// Missing or unexpected fields are schema problems; the rest are value problems
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, FieldError::Missing(_) | FieldError::Unexpected(_))
    }
}

/// Predictor errors
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    #[error("schema mismatch in training row {row}: {source}")]
    SchemaMismatch { row: usize, source: FieldError },

    #[error("invalid value in training row {row}: {source}")]
    InvalidTrainingRow { row: usize, source: FieldError },

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] FieldError),

    #[error("no trained artifact is loaded, cannot predict")]
    ArtifactNotLoaded,

    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("estimator error: {0}")]
    Estimator(String),

    #[error("invalid noise distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    #[error("invalid scenario shift {0}: must be a finite number")]
    InvalidShift(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PredictorError {
    /// Wrap a field error raised while validating a training row
    pub fn training_row(row: usize, source: FieldError) -> Self {
        if source.is_schema_mismatch() {
            PredictorError::SchemaMismatch { row, source }
        } else {
            PredictorError::InvalidTrainingRow { row, source }
        }
    }
}
