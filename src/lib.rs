// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Travel times of seismic body-wave phases in radially layered, transversely
//! isotropic earth models.
//!
//! A phase's travel time and epicentral distance are integrals along a ray
//! with a single ray parameter `p`. This library integrates those rays through
//! a [`VelocityStructure`] on a [`ComputationalMesh`], decomposes phase names
//! into legs, and searches a precomputed [`RaypathCatalog`] for the rays that
//! reach a given distance. Catalogs are built in parallel.

#![warn(missing_docs)]

/// Catalog of precomputed rays and distance search.
pub mod catalog;
/// Error types for the library.
pub mod error;
/// Catalog persistence and travel-time table export.
pub mod io;
/// Vertical slowness and ray integrands in transversely isotropic media.
pub mod kernels;
/// Radial integration mesh.
pub mod mesh;
/// Phase names and their decomposition into legs.
pub mod phase;
/// Gauss-Legendre quadrature rules.
pub mod quadrature;
/// Rays with a fixed ray parameter.
pub mod raypath;
/// Radially layered velocity structures.
pub mod structure;

pub use crate::catalog::{Arrival, CatalogBuilder, CatalogRegistry, ProgressInfo, RaypathCatalog};
pub use crate::error::{AnisoError, Result};
pub use crate::mesh::{ComputationalMesh, Region};
pub use crate::phase::{Phase, PhasePart, Polarity};
pub use crate::raypath::{Raypath, Turning};
pub use crate::structure::{
    ElasticModuli, NamedDiscontinuityStructure, PolynomialStructure, VelocityStructure,
};
