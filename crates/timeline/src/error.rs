use std::path::PathBuf;

use thiserror::Error;

/// Failures while bringing a trace or a configuration into the viewer.
///
/// Nothing in the interactive engine produces these: once a [`crate::Simulation`]
/// is loaded every anomaly degrades to "render nothing" or "select nothing".
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed trace JSON")]
    Json(#[from] serde_json::Error),
    #[error("invalid timeline configuration: {0}")]
    Config(String),
}
