//! Errors raised while setting a simulation up.
//!
//! Nothing inside a tick returns these: tick code takes an explicit fallback
//! branch and logs instead. They only surface from configuration and asset
//! loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid asset data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing {kind} asset with id {id}")]
    MissingAsset { kind: &'static str, id: u32 },
}
