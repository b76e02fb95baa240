use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("External extraction step '{step}' failed (status {status:?}): {diagnostic}")]
    ExtractionFailed {
        step: &'static str,
        status: Option<i32>,
        diagnostic: String,
    },
    #[error("Expected artifact is missing: {0}")]
    MissingArtifact(PathBuf),
    #[error("No origins or destinations lie within the extent")]
    NoPlacesWithinExtent,
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Routing error: {0}")]
    RoutingError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
