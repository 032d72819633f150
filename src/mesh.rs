// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::ops::Range;

use crate::error::{AnisoError, Result};
use crate::structure::VelocityStructure;

/// Offset of the mesh points placed on either side of a discontinuity \[km\].
pub const EPS: f64 = 1e-7;

/// The three radial regions a phase part can propagate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Centre to the inner-core boundary.
    InnerCore,
    /// Inner-core boundary to the core-mantle boundary.
    OuterCore,
    /// Core-mantle boundary to the surface.
    Mantle,
}

/// Radial discretization of a [`VelocityStructure`].
///
/// Radii are strictly increasing from the centre to the surface. Every
/// discontinuity `d` is represented by the pair `d - EPS`, `d + EPS` so that
/// no integration interval has a discontinuity at its end points.
#[derive(Debug, Clone)]
pub struct ComputationalMesh {
    radii: Vec<f64>,
    core_mantle_boundary: f64,
    inner_core_boundary: f64,
    thickness: [f64; 3],
}

fn validate_thickness(t: f64) -> Result<f64> {
    if !t.is_finite() || t <= 0.0 {
        return Err(AnisoError::InvalidMeshThickness(t));
    }
    Ok(t)
}

impl ComputationalMesh {
    /// Create a mesh with separate maximum shell thicknesses \[km\] for the
    /// inner core, outer core and mantle.
    ///
    /// # Errors
    /// Returns an error if any thickness is not positive and finite.
    pub fn new(
        structure: &dyn VelocityStructure,
        inner_core: f64,
        outer_core: f64,
        mantle: f64,
    ) -> Result<Self> {
        let thickness = [
            validate_thickness(inner_core)?,
            validate_thickness(outer_core)?,
            validate_thickness(mantle)?,
        ];
        Ok(Self::build(structure, thickness))
    }

    fn build(structure: &dyn VelocityStructure, thickness: [f64; 3]) -> Self {
        let icb = structure.inner_core_boundary();
        let cmb = structure.core_mantle_boundary();
        let earth_radius = structure.earth_radius();
        let discontinuities = structure.discontinuities();

        let mut edges = Vec::with_capacity(discontinuities.len() + 2);
        edges.push(0.0);
        edges.extend(discontinuities.iter().copied());
        edges.push(earth_radius);

        let mut radii = Vec::new();
        for w in edges.windows(2) {
            let start = if w[0] > 0.0 { w[0] + EPS } else { w[0] };
            let end = if w[1] < earth_radius { w[1] - EPS } else { w[1] };
            let dr = if w[1] <= icb {
                thickness[0]
            } else if w[1] <= cmb {
                thickness[1]
            } else {
                thickness[2]
            };
            let n = ((end - start) / dr).ceil().max(1.0) as usize;
            for j in 0..n {
                radii.push(start + (end - start) * j as f64 / n as f64);
            }
            radii.push(end);
        }

        ComputationalMesh {
            radii,
            core_mantle_boundary: cmb,
            inner_core_boundary: icb,
            thickness,
        }
    }

    /// Create a mesh with the same maximum thickness everywhere.
    ///
    /// # Errors
    /// Returns an error if the thickness is not positive and finite.
    pub fn uniform(structure: &dyn VelocityStructure, thickness: f64) -> Result<Self> {
        Self::new(structure, thickness, thickness, thickness)
    }

    /// The default 1 km mesh.
    pub fn simple(structure: &dyn VelocityStructure) -> Self {
        Self::build(structure, [1.0; 3])
    }

    /// All mesh radii, ascending.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Number of mesh points.
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// Always false; a mesh has at least the centre and the surface.
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Radius of the outermost point.
    pub fn earth_radius(&self) -> f64 {
        self.radii[self.radii.len() - 1]
    }

    /// Maximum shell thickness used in a region.
    pub fn thickness(&self, region: Region) -> f64 {
        match region {
            Region::InnerCore => self.thickness[0],
            Region::OuterCore => self.thickness[1],
            Region::Mantle => self.thickness[2],
        }
    }

    /// Index `i` with `radii[i] <= r < radii[i + 1]`.
    ///
    /// The surface maps to the last interval; radii outside the mesh give `None`.
    pub fn bracket(&self, r: f64) -> Option<usize> {
        if !(r >= 0.0 && r <= self.earth_radius()) {
            return None;
        }
        let upper = self.radii.partition_point(|&x| x <= r);
        Some(upper.saturating_sub(1).min(self.radii.len() - 2))
    }

    /// Index of the mesh point closest to `r` (clamped to the mesh).
    pub fn nearest(&self, r: f64) -> usize {
        let upper = self.radii.partition_point(|&x| x < r);
        if upper == 0 {
            return 0;
        }
        if upper == self.radii.len() {
            return upper - 1;
        }
        if r - self.radii[upper - 1] <= self.radii[upper] - r {
            upper - 1
        } else {
            upper
        }
    }

    /// Region containing a radius; boundary radii belong to the region above.
    pub fn region_of(&self, r: f64) -> Region {
        if r >= self.core_mantle_boundary {
            Region::Mantle
        } else if r >= self.inner_core_boundary {
            Region::OuterCore
        } else {
            Region::InnerCore
        }
    }

    /// Index range of the mesh points lying in a region.
    pub fn region_range(&self, region: Region) -> Range<usize> {
        let icb = self.radii.partition_point(|&x| x < self.inner_core_boundary);
        let cmb = self.radii.partition_point(|&x| x < self.core_mantle_boundary);
        match region {
            Region::InnerCore => 0..icb,
            Region::OuterCore => icb..cmb,
            Region::Mantle => cmb..self.radii.len(),
        }
    }

    /// Lowest and highest mesh radius of a region.
    pub fn region_bounds(&self, region: Region) -> (f64, f64) {
        let range = self.region_range(region);
        (self.radii[range.start], self.radii[range.end - 1])
    }

    /// Mesh points strictly between `lower` and `upper`.
    pub fn interior(&self, lower: f64, upper: f64) -> &[f64] {
        let start = self.radii.partition_point(|&x| x <= lower);
        let end = self.radii.partition_point(|&x| x < upper);
        if start >= end {
            &[]
        } else {
            &self.radii[start..end]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::PolynomialStructure;

    #[test]
    fn mesh_is_strictly_increasing() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::new(&prem, 50.0, 30.0, 20.0).unwrap();
        let radii = mesh.radii();
        assert_eq!(radii[0], 0.0);
        assert_eq!(mesh.earth_radius(), 6371.0);
        for w in radii.windows(2) {
            assert!(w[1] > w[0], "not increasing: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn mesh_brackets_discontinuities() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::uniform(&prem, 25.0).unwrap();
        for d in prem.discontinuities() {
            let below = mesh.radii().iter().any(|&r| r == d - EPS);
            let above = mesh.radii().iter().any(|&r| r == d + EPS);
            assert!(below && above, "discontinuity {} not bracketed", d);
            assert!(!mesh.radii().contains(&d));
        }
    }

    #[test]
    fn mesh_respects_thickness() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::new(&prem, 100.0, 40.0, 10.0).unwrap();
        for w in mesh.radii().windows(2) {
            let region = mesh.region_of(w[1]);
            assert!(
                w[1] - w[0] <= mesh.thickness(region) + 1e-9,
                "shell {}..{} thicker than {}",
                w[0],
                w[1],
                mesh.thickness(region)
            );
        }
    }

    #[test]
    fn invalid_thickness() {
        let prem = PolynomialStructure::prem();
        for t in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ComputationalMesh::uniform(&prem, t),
                Err(AnisoError::InvalidMeshThickness(_))
            ));
        }
        assert!(ComputationalMesh::new(&prem, 10.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn bracket_and_nearest() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::uniform(&prem, 10.0).unwrap();
        let radii = mesh.radii();
        for r in [0.0, 1.0, 1221.5, 3480.0, 5000.3, 6370.9, 6371.0] {
            let i = mesh.bracket(r).unwrap();
            assert!(radii[i] <= r && (r < radii[i + 1] || i == radii.len() - 2));
        }
        assert_eq!(mesh.bracket(-1.0), None);
        assert_eq!(mesh.bracket(6372.0), None);
        assert_eq!(mesh.nearest(6371.0), radii.len() - 1);
        assert_eq!(mesh.nearest(0.1), 0);
        assert_eq!(mesh.nearest(1e9), radii.len() - 1);
    }

    #[test]
    fn region_bounds() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::uniform(&prem, 20.0).unwrap();
        let (lo, hi) = mesh.region_bounds(Region::Mantle);
        assert_eq!(lo, 3480.0 + EPS);
        assert_eq!(hi, 6371.0);
        let (lo, hi) = mesh.region_bounds(Region::OuterCore);
        assert_eq!(lo, 1221.5 + EPS);
        assert_eq!(hi, 3480.0 - EPS);
        let (lo, hi) = mesh.region_bounds(Region::InnerCore);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1221.5 - EPS);

        let total: usize = [Region::InnerCore, Region::OuterCore, Region::Mantle]
            .iter()
            .map(|&r| mesh.region_range(r).len())
            .sum();
        assert_eq!(total, mesh.len());
    }

    #[test]
    fn interior_points() {
        let prem = PolynomialStructure::prem();
        let mesh = ComputationalMesh::uniform(&prem, 10.0).unwrap();
        let inner = mesh.interior(6000.0, 6371.0);
        assert!(inner.iter().all(|&r| r > 6000.0 && r < 6371.0));
        assert!(!inner.is_empty());
        assert!(mesh.interior(6371.0, 6371.0).is_empty());
    }
}
