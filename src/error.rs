//! Error types.
//!
//! Most of these are expected negative outcomes rather than faults: the
//! systems that receive them log and carry on with the next frame.

use thiserror::Error;

use crate::types::ModelIndex;

/// Errors raised while configuring or mutating the object registry.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The model catalog has no templates.
    #[error("model catalog is empty")]
    EmptyCatalog,
    /// The registry was configured to hold no objects.
    #[error("registry capacity must be at least 1")]
    ZeroCapacity,
    /// A model index outside the catalog was requested.
    #[error("model index {index} out of range for a catalog of {len}")]
    InvalidModelIndex {
        /// Requested index.
        index: ModelIndex,
        /// Number of templates in the catalog.
        len: usize,
    },
    /// A delete was requested for an index with no placed object.
    #[error("nothing to delete at model index {0}")]
    NothingToDelete(ModelIndex),
    /// An operation needed a placed object at this index.
    #[error("no object placed at model index {0}")]
    NotPlaced(ModelIndex),
    /// The template has no alternate parts to switch to.
    #[error("model index {0} has no variant")]
    NoVariant(ModelIndex),
    /// A setting is outside the range the controllers can work with.
    #[error("invalid setting {field}: {reason}")]
    InvalidSettings {
        /// Offending field.
        field: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
    /// Settings could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Reasons a precise mesh collider could not be built for a part.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColliderError {
    /// The part has no mesh asset loaded.
    #[error("mesh asset is not available")]
    MissingMesh,
    /// The mesh data was handed off to the render world and is not readable.
    #[error("mesh data is not readable from the main world")]
    NotReadable,
    /// The mesh has no vertex positions.
    #[error("mesh has no position attribute")]
    MissingPositions,
    /// Vertex positions are not stored as three-component floats.
    #[error("mesh positions are not Float32x3")]
    UnsupportedPositions,
    /// The mesh has a position attribute without any vertices.
    #[error("mesh has no vertices")]
    Empty,
}
