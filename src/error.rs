//! Error types.
//!
//! Fatal conditions are detected before simulation starts and returned as
//! [`PlanError`]; nothing is partially planned. Expected outcomes such as
//! unassigned instances or idle slots are part of a successful
//! [`PlanResult`](crate::planning::PlanResult), not errors.

use thiserror::Error;

use crate::validation::ValidationError;

/// Fatal planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no workers available")]
    NoWorkers,

    #[error("no orders to process")]
    EmptyOrder,

    #[error("order references unknown product '{0}'")]
    UnknownProduct(String),

    #[error("worker selection references unknown worker '{0}'")]
    UnknownWorker(String),

    #[error("invalid start time for worker '{worker}': {source}")]
    InvalidStartTime {
        worker: String,
        #[source]
        source: ConfigError,
    },

    #[error("invalid product catalogue: {}", summarize(.0))]
    InvalidCatalogue(Vec<ValidationError>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Tabular import/export errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}, column '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: String,
        message: String,
    },

    #[error("no rows found")]
    Empty,
}

/// Result alias for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_no_workers_message() {
        assert_eq!(PlanError::NoWorkers.to_string(), "no workers available");
    }

    #[test]
    fn test_catalogue_errors_are_joined() {
        let err = PlanError::InvalidCatalogue(vec![
            ValidationError::new(ValidationErrorKind::EmptyProduct, "Product 'A' has no tasks"),
            ValidationError::new(ValidationErrorKind::CyclicRequirement, "cycle in 'B'"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("has no tasks"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn test_config_error_converts() {
        let err: PlanError = ConfigError::InvalidTime("25:99".into()).into();
        assert!(matches!(err, PlanError::Config(_)));
    }
}
