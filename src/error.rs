//! Error types for the loading/saving edges of the crate.
//!
//! The per-tick simulation is infallible; only configuration and persistence
//! paths return [`SimError`].

use thiserror::Error;

/// Errors raised while loading tuning files or persisting scores.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A tuning value is outside the range the simulation can handle.
    #[error("tuning value `{name}` = {value} is outside its valid range {valid}")]
    InvalidTuning {
        /// Dotted path of the offending value.
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the valid range.
        valid: &'static str,
    },
}

impl SimError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;
