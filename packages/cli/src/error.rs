//! Run-level error type.

use fire_map_generate::SerializationError;
use fire_map_geography::{ConfigurationError, GeoError};
use fire_map_geography_models::ReferenceSystemError;
use fire_map_source::RetrievalError;

/// A fatal pipeline failure, tagged with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Downloading or extracting the fire archive failed.
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),

    /// A configured input is missing, unreadable, or lacks a column.
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Reference systems are undefined or cannot be reconciled.
    #[error("reference system: {0}")]
    ReferenceSystem(#[from] ReferenceSystemError),

    /// Output documents could not be persisted.
    #[error("serialization: {0}")]
    Serialization(#[from] SerializationError),
}

impl From<GeoError> for PipelineError {
    fn from(error: GeoError) -> Self {
        match error {
            GeoError::Configuration(e) => Self::Configuration(e),
            GeoError::ReferenceSystem(e) => Self::ReferenceSystem(e),
        }
    }
}
