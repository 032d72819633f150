// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur while building structures, meshes, phases or catalogs.
///
/// Rays without a valid geometry for a phase are not errors: they show up as
/// NaN distances and times.
#[derive(Debug)]
pub enum AnisoError {
    /// Phase name could not be parsed.
    PhaseParse {
        /// The name as given.
        name: String,
        /// What was wrong with it.
        reason: String,
    },
    /// Radius lies outside the structure.
    RadiusOutOfRange {
        /// The radius requested \[km\].
        radius: f64,
        /// The earth radius of the structure \[km\].
        earth_radius: f64,
    },
    /// Mesh shell thickness is not positive and finite.
    InvalidMeshThickness(f64),
    /// Ray parameter is negative or not finite.
    InvalidRayParameter(f64),
    /// Ray-parameter sampling of a catalog is invalid.
    InvalidSampling {
        /// Explanation of why it's invalid.
        reason: String,
    },
    /// Worker thread count is zero.
    InvalidThreadCount(usize),
    /// Velocity structure definition is inconsistent.
    InvalidStructure(String),
    /// A persisted catalog does not belong to the given structure and mesh.
    CatalogMismatch {
        /// Fingerprint of the structure and mesh supplied.
        expected: u64,
        /// Fingerprint stored in the file.
        found: u64,
    },
    /// Array shape does not match expected shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// I/O error occurred.
    IoError(std::io::Error),
    /// JSON (de)serialization error.
    JsonError(serde_json::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for AnisoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnisoError::PhaseParse { name, reason } => {
                write!(f, "invalid phase name '{}': {}", name, reason)
            }
            AnisoError::RadiusOutOfRange {
                radius,
                earth_radius,
            } => {
                write!(
                    f,
                    "radius {} km is outside the structure [0, {}]",
                    radius, earth_radius
                )
            }
            AnisoError::InvalidMeshThickness(dr) => {
                write!(
                    f,
                    "invalid mesh thickness: {} (must be positive and finite)",
                    dr
                )
            }
            AnisoError::InvalidRayParameter(p) => {
                write!(
                    f,
                    "invalid ray parameter: {} (must be non-negative and finite)",
                    p
                )
            }
            AnisoError::InvalidSampling { reason } => {
                write!(f, "invalid ray parameter sampling: {}", reason)
            }
            AnisoError::InvalidThreadCount(n) => {
                write!(f, "invalid thread count: {} (must be >= 1)", n)
            }
            AnisoError::InvalidStructure(msg) => write!(f, "invalid structure: {}", msg),
            AnisoError::CatalogMismatch { expected, found } => {
                write!(
                    f,
                    "catalog fingerprint {:016x} does not match structure and mesh {:016x}",
                    found, expected
                )
            }
            AnisoError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            AnisoError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            AnisoError::IoError(e) => write!(f, "I/O error: {}", e),
            AnisoError::JsonError(e) => write!(f, "JSON error: {}", e),
            AnisoError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AnisoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnisoError::IoError(e) => Some(e),
            AnisoError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnisoError {
    fn from(e: std::io::Error) -> Self {
        AnisoError::IoError(e)
    }
}

impl From<serde_json::Error> for AnisoError {
    fn from(e: serde_json::Error) -> Self {
        AnisoError::JsonError(e)
    }
}

/// Convenience type alias for Results with AnisoError.
pub type Result<T> = std::result::Result<T, AnisoError>;
