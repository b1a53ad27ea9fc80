//! Error types for texel-density.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`DensityError`].
pub type Result<T> = std::result::Result<T, DensityError>;

/// Errors that can occur while measuring or normalizing texel density.
#[derive(Error, Debug)]
pub enum DensityError {
    /// An operation that needs a mesh was called without one.
    #[error("no mesh selected")]
    NoSelection,

    /// The mesh cannot produce a meaningful density.
    #[error("degenerate mesh: {0}")]
    DegenerateMesh(Degeneracy),

    /// The requested target density is not a positive number.
    #[error("invalid target density: {value} (must be a positive number)")]
    InvalidTarget {
        /// The rejected value, as given.
        value: String,
    },

    /// The UV rescale primitive reported a failure.
    #[error("UV rescale failed: {reason}")]
    RescaleFailed {
        /// Description of the failure.
        reason: String,
    },

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face references an invalid UV index.
    #[error("face {face} references invalid UV index {uv}")]
    InvalidUvIndex {
        /// The face index.
        face: usize,
        /// The invalid UV index.
        uv: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

/// Why a mesh has no well-defined texel density.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Every edge lies on a UV seam or shell boundary.
    #[error("mesh has no interior edges")]
    NoInteriorEdges,

    /// An interior edge has zero world-space length.
    #[error("interior edge {edge} has zero world-space length")]
    ZeroLengthEdge {
        /// The edge index.
        edge: usize,
    },
}

impl DensityError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        DensityError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid target error from any displayable value.
    pub fn invalid_target<T: std::fmt::Display>(value: T) -> Self {
        DensityError::InvalidTarget {
            value: value.to_string(),
        }
    }

    /// Create a rescale failure.
    pub fn rescale_failed(reason: impl Into<String>) -> Self {
        DensityError::RescaleFailed {
            reason: reason.into(),
        }
    }
}

impl From<Degeneracy> for DensityError {
    fn from(d: Degeneracy) -> Self {
        DensityError::DegenerateMesh(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DensityError::NoSelection;
        assert_eq!(err.to_string(), "no mesh selected");

        let err = DensityError::from(Degeneracy::ZeroLengthEdge { edge: 7 });
        assert!(err.to_string().contains("edge 7"));

        let err = DensityError::invalid_target(-5);
        assert!(err.to_string().contains("-5"));

        let err = DensityError::rescale_failed("non-manifold edge");
        assert!(err.to_string().contains("non-manifold edge"));
    }

    #[test]
    fn test_invalid_param() {
        let err = DensityError::invalid_param("resolution", 0, "must be positive");
        match err {
            DensityError::InvalidParameter { name, value, .. } => {
                assert_eq!(name, "resolution");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
