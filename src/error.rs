//! Error types for riskgate

use thiserror::Error;

/// Errors that fail a risk assessment request.
///
/// Store failures never appear here: the engine absorbs them and degrades to
/// neutral state instead.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid session telemetry: {0}")]
    InvalidSession(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Classifier unavailable: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Classifier exceeded its {limit_ms} ms deadline (took {elapsed_ms} ms)")]
    ClassifierTimeout { limit_ms: u64, elapsed_ms: u64 },
}

impl RiskError {
    /// Stable machine-readable kind for callers that branch on failure type
    pub fn kind(&self) -> &'static str {
        match self {
            RiskError::InvalidSession(_) => "invalid_session",
            RiskError::JsonError(_) => "invalid_json",
            RiskError::MissingField(_) => "missing_field",
            RiskError::InvalidIdentity(_) => "invalid_identity",
            RiskError::Classifier(_) => "classifier_unavailable",
            RiskError::ClassifierTimeout { .. } => "classifier_timeout",
        }
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RiskError::InvalidSession(_)
                | RiskError::JsonError(_)
                | RiskError::MissingField(_)
                | RiskError::InvalidIdentity(_)
        )
    }
}

/// Errors raised by a classifier provider
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("{0}")]
    Unavailable(String),
}

/// Errors raised while loading or validating engine configuration.
///
/// All of these are startup failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Remapper needs at least one anchor")]
    EmptyAnchors,

    #[error("Remapper anchors must have strictly increasing raw values (index {index}: {previous} then {current})")]
    UnsortedAnchors {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Remapper anchor {index} ({raw}, {target}) is outside [0, 1]")]
    AnchorOutOfRange { index: usize, raw: f64, target: f64 },

    #[error("Decision bands overlap at attack intensity {intensity}: allow={allow}, soft={soft}, hard={hard}")]
    ThresholdOrdering {
        intensity: f64,
        allow: f64,
        soft: f64,
        hard: f64,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Model artifact {field} has {actual} entries, expected {expected}")]
    ArtifactLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Classifier feature order does not match engine schema {schema}: {detail}")]
    FeatureSchemaMismatch { schema: String, detail: String },
}

/// Errors raised by a state store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
