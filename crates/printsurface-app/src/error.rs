//! Application errors.

use printsurface_core::{SnapshotError, SpecError, StageError};
use printsurface_render::ExportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid print spec: {0}")]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Malformed export payload for side '{0}'")]
    MalformedExport(String),
    #[error("Failed to encode export JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}
