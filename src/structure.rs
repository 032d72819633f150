// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{AnisoError, Result};

/// Density and Love's five elastic moduli of a transversely isotropic medium
/// with a radial symmetry axis.
///
/// Units follow the velocity convention: density in g/cm³, moduli in
/// (g/cm³)(km/s)², so `sqrt(A / rho)` is a velocity in km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticModuli {
    /// Density.
    pub rho: f64,
    /// Horizontal P modulus, `rho * Vph^2`.
    pub a: f64,
    /// Vertical P modulus, `rho * Vpv^2`.
    pub c: f64,
    /// Coupling modulus, `eta * (A - 2L)`.
    pub f: f64,
    /// Vertical S modulus, `rho * Vsv^2`.
    pub l: f64,
    /// Horizontal S modulus, `rho * Vsh^2`.
    pub n: f64,
}

impl ElasticModuli {
    /// Build moduli from density, the four phase velocities and eta.
    pub fn from_velocities(rho: f64, vpv: f64, vph: f64, vsv: f64, vsh: f64, eta: f64) -> Self {
        let a = rho * vph * vph;
        let l = rho * vsv * vsv;
        ElasticModuli {
            rho,
            a,
            c: rho * vpv * vpv,
            f: eta * (a - 2.0 * l),
            l,
            n: rho * vsh * vsh,
        }
    }

    /// Isotropic moduli from density, P and S velocities.
    pub fn isotropic(rho: f64, vp: f64, vs: f64) -> Self {
        Self::from_velocities(rho, vp, vp, vs, vs, 1.0)
    }

    /// Horizontally propagating P velocity.
    pub fn vph(&self) -> f64 {
        (self.a / self.rho).sqrt()
    }

    /// Vertically propagating P velocity.
    pub fn vpv(&self) -> f64 {
        (self.c / self.rho).sqrt()
    }

    /// Horizontally propagating, horizontally polarized S velocity.
    pub fn vsh(&self) -> f64 {
        (self.n / self.rho).sqrt()
    }

    /// Vertically propagating (or horizontally propagating, vertically polarized) S velocity.
    pub fn vsv(&self) -> f64 {
        (self.l / self.rho).sqrt()
    }

    /// The anisotropy parameter eta, `F / (A - 2L)`.
    pub fn eta(&self) -> f64 {
        self.f / (self.a - 2.0 * self.l)
    }

    /// A medium without shear strength.
    pub fn is_fluid(&self) -> bool {
        self.l <= 0.0
    }
}

/// A spherically symmetric earth model.
///
/// Implementations are immutable after construction and shared between
/// threads. At a discontinuity radius the layer above it is reported.
pub trait VelocityStructure: Send + Sync {
    /// Radius of the surface \[km\].
    fn earth_radius(&self) -> f64;

    /// Radius of the core-mantle boundary \[km\].
    fn core_mantle_boundary(&self) -> f64;

    /// Radius of the inner-core boundary \[km\].
    fn inner_core_boundary(&self) -> f64;

    /// Radii of all first-order discontinuities strictly inside the model,
    /// ascending. Always contains the ICB and the CMB.
    fn discontinuities(&self) -> Vec<f64>;

    /// Moduli at a radius already known to lie within `[0, earth_radius]`.
    fn moduli_at(&self, radius: f64) -> ElasticModuli;

    /// Check that a radius lies within the structure.
    fn check_radius(&self, radius: f64) -> Result<()> {
        let earth_radius = self.earth_radius();
        if !radius.is_finite() || !(0.0..=earth_radius).contains(&radius) {
            return Err(AnisoError::RadiusOutOfRange {
                radius,
                earth_radius,
            });
        }
        Ok(())
    }

    /// Moduli at a radius.
    ///
    /// # Errors
    /// Returns an error if the radius lies outside `[0, earth_radius]`.
    fn elastic_moduli(&self, radius: f64) -> Result<ElasticModuli> {
        self.check_radius(radius)?;
        Ok(self.moduli_at(radius))
    }

    /// Horizontal P velocity at a radius \[km/s\].
    fn compute_vph(&self, radius: f64) -> Result<f64> {
        Ok(self.elastic_moduli(radius)?.vph())
    }

    /// Vertical P velocity at a radius \[km/s\].
    fn compute_vpv(&self, radius: f64) -> Result<f64> {
        Ok(self.elastic_moduli(radius)?.vpv())
    }

    /// SH velocity at a radius \[km/s\].
    fn compute_vsh(&self, radius: f64) -> Result<f64> {
        Ok(self.elastic_moduli(radius)?.vsh())
    }

    /// SV velocity at a radius \[km/s\].
    fn compute_vsv(&self, radius: f64) -> Result<f64> {
        Ok(self.elastic_moduli(radius)?.vsv())
    }
}

/// One radial shell of a [`PolynomialStructure`].
///
/// Each property is a cubic polynomial in the normalized radius
/// `x = r / earth_radius`, coefficients in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialLayer {
    /// Lower radius of the shell \[km\].
    pub r_min: f64,
    /// Upper radius of the shell \[km\].
    pub r_max: f64,
    /// Density.
    pub rho: [f64; 4],
    /// Vertical P velocity.
    pub vpv: [f64; 4],
    /// Horizontal P velocity.
    pub vph: [f64; 4],
    /// Vertical S velocity.
    pub vsv: [f64; 4],
    /// Horizontal S velocity.
    pub vsh: [f64; 4],
    /// Anisotropy parameter eta.
    pub eta: [f64; 4],
}

impl PolynomialLayer {
    /// An isotropic shell.
    pub fn isotropic(r_min: f64, r_max: f64, rho: [f64; 4], vp: [f64; 4], vs: [f64; 4]) -> Self {
        PolynomialLayer {
            r_min,
            r_max,
            rho,
            vpv: vp,
            vph: vp,
            vsv: vs,
            vsh: vs,
            eta: [1.0, 0.0, 0.0, 0.0],
        }
    }

    fn moduli(&self, x: f64) -> ElasticModuli {
        ElasticModuli::from_velocities(
            horner(&self.rho, x),
            horner(&self.vpv, x),
            horner(&self.vph, x),
            horner(&self.vsv, x),
            horner(&self.vsh, x),
            horner(&self.eta, x),
        )
    }
}

fn horner(coeffs: &[f64; 4], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Earth model made of shells with polynomial properties, as PREM is defined.
#[derive(Debug, Clone)]
pub struct PolynomialStructure {
    earth_radius: f64,
    core_mantle_boundary: f64,
    inner_core_boundary: f64,
    layers: Vec<PolynomialLayer>,
}

impl PolynomialStructure {
    /// Create a structure from contiguous shells ordered from the centre outward.
    ///
    /// # Errors
    /// Returns an error if the shells do not tile `[0, earth_radius]` or if the
    /// CMB and ICB radii are not shell boundaries with `0 < icb < cmb`.
    pub fn new(
        core_mantle_boundary: f64,
        inner_core_boundary: f64,
        layers: Vec<PolynomialLayer>,
    ) -> Result<Self> {
        let first = layers
            .first()
            .ok_or_else(|| AnisoError::InvalidStructure("no layers".to_string()))?;
        if first.r_min != 0.0 {
            return Err(AnisoError::InvalidStructure(format!(
                "innermost layer starts at {} km instead of the centre",
                first.r_min
            )));
        }
        for (i, layer) in layers.iter().enumerate() {
            if !(layer.r_max > layer.r_min) || !layer.r_max.is_finite() {
                return Err(AnisoError::InvalidStructure(format!(
                    "layer {} has invalid extent [{}, {}]",
                    i, layer.r_min, layer.r_max
                )));
            }
            if i > 0 && layers[i - 1].r_max != layer.r_min {
                return Err(AnisoError::InvalidStructure(format!(
                    "gap or overlap between layers {} and {} at {} / {} km",
                    i - 1,
                    i,
                    layers[i - 1].r_max,
                    layer.r_min
                )));
            }
        }
        let earth_radius = layers[layers.len() - 1].r_max;
        let is_boundary = |r: f64| layers.iter().skip(1).any(|l| l.r_min == r);
        if !(inner_core_boundary > 0.0
            && inner_core_boundary < core_mantle_boundary
            && core_mantle_boundary < earth_radius)
            || !is_boundary(inner_core_boundary)
            || !is_boundary(core_mantle_boundary)
        {
            return Err(AnisoError::InvalidStructure(format!(
                "core boundaries icb={} cmb={} must be layer boundaries with 0 < icb < cmb < {}",
                inner_core_boundary, core_mantle_boundary, earth_radius
            )));
        }
        Ok(PolynomialStructure {
            earth_radius,
            core_mantle_boundary,
            inner_core_boundary,
            layers,
        })
    }

    /// The shells of the model.
    pub fn layers(&self) -> &[PolynomialLayer] {
        &self.layers
    }

    /// Anisotropic PREM (Dziewonski & Anderson, 1981) without the ocean layer.
    pub fn prem() -> Self {
        Self::prem_with(true)
    }

    /// Isotropic PREM without the ocean layer.
    pub fn iso_prem() -> Self {
        Self::prem_with(false)
    }

    fn prem_with(anisotropic: bool) -> Self {
        let d2_rho = [7.9565, -6.4761, 5.5283, -3.0807];
        let lid_rho = [2.6910, 0.6924, 0.0, 0.0];
        let lid_vp = [4.1875, 3.9382, 0.0, 0.0];
        let lid_vs = [2.1519, 2.3481, 0.0, 0.0];
        let lid = |r_min: f64, r_max: f64| {
            if anisotropic {
                PolynomialLayer {
                    r_min,
                    r_max,
                    rho: lid_rho,
                    vpv: [0.8317, 7.2180, 0.0, 0.0],
                    vph: [3.5908, 4.6172, 0.0, 0.0],
                    vsv: [5.8582, -1.4678, 0.0, 0.0],
                    vsh: [-1.0839, 5.7176, 0.0, 0.0],
                    eta: [3.3687, -2.4778, 0.0, 0.0],
                }
            } else {
                PolynomialLayer::isotropic(r_min, r_max, lid_rho, lid_vp, lid_vs)
            }
        };
        let layers = vec![
            PolynomialLayer::isotropic(
                0.0,
                1221.5,
                [13.0885, 0.0, -8.8381, 0.0],
                [11.2622, 0.0, -6.3640, 0.0],
                [3.6678, 0.0, -4.4475, 0.0],
            ),
            PolynomialLayer::isotropic(
                1221.5,
                3480.0,
                [12.5815, -1.2638, -3.6426, -5.5281],
                [11.0487, -4.0362, 4.8023, -13.5732],
                [0.0; 4],
            ),
            PolynomialLayer::isotropic(
                3480.0,
                3630.0,
                d2_rho,
                [15.3891, -5.3181, 5.5242, -2.5514],
                [6.9254, 1.4672, -2.0834, 0.9783],
            ),
            PolynomialLayer::isotropic(
                3630.0,
                5600.0,
                d2_rho,
                [24.9520, -40.4673, 51.4832, -26.6419],
                [11.1671, -13.7818, 17.4575, -9.2777],
            ),
            PolynomialLayer::isotropic(
                5600.0,
                5701.0,
                d2_rho,
                [29.2766, -23.6027, 5.5242, -2.5514],
                [22.3459, -17.2473, -2.0834, 0.9783],
            ),
            PolynomialLayer::isotropic(
                5701.0,
                5771.0,
                [5.3197, -1.4836, 0.0, 0.0],
                [19.0957, -9.8672, 0.0, 0.0],
                [9.9839, -4.9324, 0.0, 0.0],
            ),
            PolynomialLayer::isotropic(
                5771.0,
                5971.0,
                [11.2494, -8.0298, 0.0, 0.0],
                [39.7027, -32.6166, 0.0, 0.0],
                [22.3512, -18.5856, 0.0, 0.0],
            ),
            PolynomialLayer::isotropic(
                5971.0,
                6151.0,
                [7.1089, -3.8045, 0.0, 0.0],
                [20.3926, -12.2569, 0.0, 0.0],
                [8.9496, -4.4597, 0.0, 0.0],
            ),
            lid(6151.0, 6291.0),
            lid(6291.0, 6346.6),
            PolynomialLayer::isotropic(
                6346.6,
                6356.0,
                [2.900, 0.0, 0.0, 0.0],
                [6.800, 0.0, 0.0, 0.0],
                [3.900, 0.0, 0.0, 0.0],
            ),
            PolynomialLayer::isotropic(
                6356.0,
                6371.0,
                [2.600, 0.0, 0.0, 0.0],
                [5.800, 0.0, 0.0, 0.0],
                [3.200, 0.0, 0.0, 0.0],
            ),
        ];
        PolynomialStructure {
            earth_radius: 6371.0,
            core_mantle_boundary: 3480.0,
            inner_core_boundary: 1221.5,
            layers,
        }
    }

    /// A uniform transversely isotropic earth with nominal core boundaries.
    ///
    /// The core is made of the same solid as the mantle, so core phases
    /// behave like mantle phases that cross two transparent interfaces.
    ///
    /// # Errors
    /// Returns an error if the radii are not ordered `0 < icb < cmb < earth_radius`.
    #[allow(clippy::too_many_arguments)]
    pub fn homogeneous(
        earth_radius: f64,
        core_mantle_boundary: f64,
        inner_core_boundary: f64,
        rho: f64,
        vpv: f64,
        vph: f64,
        vsv: f64,
        vsh: f64,
        eta: f64,
    ) -> Result<Self> {
        let c = |v: f64| [v, 0.0, 0.0, 0.0];
        let layer = |r_min: f64, r_max: f64| PolynomialLayer {
            r_min,
            r_max,
            rho: c(rho),
            vpv: c(vpv),
            vph: c(vph),
            vsv: c(vsv),
            vsh: c(vsh),
            eta: c(eta),
        };
        Self::new(
            core_mantle_boundary,
            inner_core_boundary,
            vec![
                layer(0.0, inner_core_boundary),
                layer(inner_core_boundary, core_mantle_boundary),
                layer(core_mantle_boundary, earth_radius),
            ],
        )
    }

    fn layer_index(&self, radius: f64) -> usize {
        self.layers
            .partition_point(|l| l.r_max <= radius)
            .min(self.layers.len() - 1)
    }
}

impl VelocityStructure for PolynomialStructure {
    fn earth_radius(&self) -> f64 {
        self.earth_radius
    }

    fn core_mantle_boundary(&self) -> f64 {
        self.core_mantle_boundary
    }

    fn inner_core_boundary(&self) -> f64 {
        self.inner_core_boundary
    }

    fn discontinuities(&self) -> Vec<f64> {
        self.layers.iter().skip(1).map(|l| l.r_min).collect()
    }

    fn moduli_at(&self, radius: f64) -> ElasticModuli {
        let layer = &self.layers[self.layer_index(radius)];
        layer.moduli(radius / self.earth_radius)
    }
}

/// One node of a [`NamedDiscontinuityStructure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureNode {
    /// Radius \[km\].
    pub radius: f64,
    /// Density.
    pub rho: f64,
    /// Vertical P velocity.
    pub vpv: f64,
    /// Horizontal P velocity.
    pub vph: f64,
    /// Vertical S velocity.
    pub vsv: f64,
    /// Horizontal S velocity.
    pub vsh: f64,
    /// Anisotropy parameter eta.
    pub eta: f64,
}

/// Earth model given as a table of nodes with linear interpolation in between.
///
/// Two consecutive nodes at the same radius mark a discontinuity; the
/// mantle-outer-core and outer-core-inner-core boundaries are named
/// explicitly.
#[derive(Debug, Clone)]
pub struct NamedDiscontinuityStructure {
    nodes: Vec<StructureNode>,
    core_mantle_boundary: f64,
    inner_core_boundary: f64,
}

impl NamedDiscontinuityStructure {
    /// Create a structure from nodes ordered from the centre outward.
    ///
    /// # Errors
    /// Returns an error if the table does not start at the centre, decreases,
    /// repeats a radius more than twice, or if the named boundaries are not
    /// discontinuities of the table.
    pub fn new(
        nodes: Vec<StructureNode>,
        core_mantle_boundary: f64,
        inner_core_boundary: f64,
    ) -> Result<Self> {
        if nodes.len() < 2 {
            return Err(AnisoError::InvalidStructure(format!(
                "need at least 2 nodes, got {}",
                nodes.len()
            )));
        }
        if nodes[0].radius != 0.0 {
            return Err(AnisoError::InvalidStructure(format!(
                "first node at {} km instead of the centre",
                nodes[0].radius
            )));
        }
        for (i, w) in nodes.windows(2).enumerate() {
            if !(w[1].radius >= w[0].radius) {
                return Err(AnisoError::InvalidStructure(format!(
                    "node radii decrease at node {}: {} -> {}",
                    i + 1,
                    w[0].radius,
                    w[1].radius
                )));
            }
        }
        for (i, w) in nodes.windows(3).enumerate() {
            if w[0].radius == w[2].radius {
                return Err(AnisoError::InvalidStructure(format!(
                    "radius {} km repeated more than twice at node {}",
                    w[0].radius, i
                )));
            }
        }
        let structure = NamedDiscontinuityStructure {
            nodes,
            core_mantle_boundary,
            inner_core_boundary,
        };
        let discontinuities = structure.discontinuities();
        let earth_radius = structure.earth_radius();
        if !(inner_core_boundary > 0.0
            && inner_core_boundary < core_mantle_boundary
            && core_mantle_boundary < earth_radius)
            || !discontinuities.contains(&inner_core_boundary)
            || !discontinuities.contains(&core_mantle_boundary)
        {
            return Err(AnisoError::InvalidStructure(format!(
                "named boundaries icb={} cmb={} must be discontinuities with 0 < icb < cmb < {}",
                inner_core_boundary, core_mantle_boundary, earth_radius
            )));
        }
        Ok(structure)
    }

    /// Tabulate another structure every `step` km, keeping its discontinuities.
    ///
    /// # Errors
    /// Returns an error if `step` is not positive and finite.
    pub fn from_structure(structure: &dyn VelocityStructure, step: f64) -> Result<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(AnisoError::InvalidMeshThickness(step));
        }
        let mut edges = vec![0.0];
        edges.extend(structure.discontinuities());
        edges.push(structure.earth_radius());

        let node = |r: f64, m: ElasticModuli| StructureNode {
            radius: r,
            rho: m.rho,
            vpv: m.vpv(),
            vph: m.vph(),
            vsv: m.vsv(),
            vsh: m.vsh(),
            eta: if m.is_fluid() { 1.0 } else { m.eta() },
        };

        let mut nodes = Vec::new();
        for w in edges.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            let n = ((hi - lo) / step).ceil().max(1.0) as usize;
            // Evaluate just inside the shell so each side of a discontinuity
            // keeps its own values.
            let inside = |r: f64| r.clamp(lo + 1e-9 * (hi - lo), hi - 1e-9 * (hi - lo));
            for j in 0..=n {
                let r = lo + (hi - lo) * j as f64 / n as f64;
                nodes.push(node(r, structure.moduli_at(inside(r))));
            }
        }
        Self::new(
            nodes,
            structure.core_mantle_boundary(),
            structure.inner_core_boundary(),
        )
    }

    /// The node table.
    pub fn nodes(&self) -> &[StructureNode] {
        &self.nodes
    }
}

impl VelocityStructure for NamedDiscontinuityStructure {
    fn earth_radius(&self) -> f64 {
        self.nodes[self.nodes.len() - 1].radius
    }

    fn core_mantle_boundary(&self) -> f64 {
        self.core_mantle_boundary
    }

    fn inner_core_boundary(&self) -> f64 {
        self.inner_core_boundary
    }

    fn discontinuities(&self) -> Vec<f64> {
        self.nodes
            .windows(2)
            .filter(|w| w[0].radius == w[1].radius)
            .map(|w| w[0].radius)
            .collect()
    }

    fn moduli_at(&self, radius: f64) -> ElasticModuli {
        let len = self.nodes.len();
        let upper = self
            .nodes
            .partition_point(|n| n.radius <= radius)
            .clamp(1, len - 1);
        let (a, b) = (&self.nodes[upper - 1], &self.nodes[upper]);
        let t = if b.radius > a.radius {
            ((radius - a.radius) / (b.radius - a.radius)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let lerp = |x: f64, y: f64| x + (y - x) * t;
        ElasticModuli::from_velocities(
            lerp(a.rho, b.rho),
            lerp(a.vpv, b.vpv),
            lerp(a.vph, b.vph),
            lerp(a.vsv, b.vsv),
            lerp(a.vsh, b.vsh),
            lerp(a.eta, b.eta),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prem_surface_and_cmb_velocities() {
        let prem = PolynomialStructure::iso_prem();
        assert!((prem.compute_vph(6371.0).unwrap() - 5.8).abs() < 1e-12);
        assert!((prem.compute_vsh(6371.0).unwrap() - 3.2).abs() < 1e-12);
        // Mantle side of the CMB
        assert!((prem.compute_vph(3480.0).unwrap() - 13.7166).abs() < 1e-3);
        // Core side of the CMB
        assert!((prem.compute_vph(3479.999).unwrap() - 8.0648).abs() < 1e-3);
        assert_eq!(prem.compute_vsv(3479.999).unwrap(), 0.0);
        // Centre
        assert!((prem.compute_vpv(0.0).unwrap() - 11.2622).abs() < 1e-12);
    }

    #[test]
    fn prem_lid_is_anisotropic() {
        let prem = PolynomialStructure::prem();
        let r = 6300.0;
        let vph = prem.compute_vph(r).unwrap();
        let vpv = prem.compute_vpv(r).unwrap();
        let vsh = prem.compute_vsh(r).unwrap();
        let vsv = prem.compute_vsv(r).unwrap();
        assert!(vph > vpv, "vph={} vpv={}", vph, vpv);
        assert!(vsh > vsv, "vsh={} vsv={}", vsh, vsv);

        let iso = PolynomialStructure::iso_prem();
        let m = iso.elastic_moduli(r).unwrap();
        assert!((m.eta() - 1.0).abs() < 1e-12);
        assert_eq!(m.a, m.c);
        assert_eq!(m.l, m.n);
    }

    #[test]
    fn out_of_range_radius() {
        let prem = PolynomialStructure::prem();
        assert!(matches!(
            prem.compute_vph(6371.5),
            Err(AnisoError::RadiusOutOfRange { .. })
        ));
        assert!(matches!(
            prem.compute_vsv(-1.0),
            Err(AnisoError::RadiusOutOfRange { .. })
        ));
        assert!(matches!(
            prem.elastic_moduli(f64::NAN),
            Err(AnisoError::RadiusOutOfRange { .. })
        ));
    }

    #[test]
    fn prem_discontinuities() {
        let prem = PolynomialStructure::prem();
        let d = prem.discontinuities();
        assert_eq!(d.first(), Some(&1221.5));
        assert!(d.contains(&3480.0));
        assert!(d.contains(&5701.0));
        assert!(d.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(prem.core_mantle_boundary(), 3480.0);
        assert_eq!(prem.inner_core_boundary(), 1221.5);
    }

    #[test]
    fn polynomial_structure_rejects_gaps() {
        let layer = |a: f64, b: f64| {
            PolynomialLayer::isotropic(a, b, [3.0, 0.0, 0.0, 0.0], [8.0, 0.0, 0.0, 0.0], [4.0, 0.0, 0.0, 0.0])
        };
        let result = PolynomialStructure::new(
            3000.0,
            1000.0,
            vec![layer(0.0, 1000.0), layer(1100.0, 3000.0), layer(3000.0, 6000.0)],
        );
        assert!(matches!(result, Err(AnisoError::InvalidStructure(_))));

        let result = PolynomialStructure::new(
            3500.0,
            1000.0,
            vec![layer(0.0, 1000.0), layer(1000.0, 3000.0), layer(3000.0, 6000.0)],
        );
        assert!(matches!(result, Err(AnisoError::InvalidStructure(_))));
    }

    #[test]
    fn homogeneous_structure() {
        let s = PolynomialStructure::homogeneous(6371.0, 3480.0, 1221.5, 3.0, 8.0, 8.0, 4.5, 4.5, 1.0)
            .unwrap();
        for r in [0.0, 1000.0, 3480.0, 6371.0] {
            assert_eq!(s.compute_vph(r).unwrap(), 8.0);
            assert_eq!(s.compute_vsv(r).unwrap(), 4.5);
        }
    }

    #[test]
    fn named_discontinuity_interpolates() {
        let node = |radius: f64, v: f64| StructureNode {
            radius,
            rho: 3.0,
            vpv: v,
            vph: v,
            vsv: v / 2.0,
            vsh: v / 2.0,
            eta: 1.0,
        };
        let s = NamedDiscontinuityStructure::new(
            vec![
                node(0.0, 10.0),
                node(1000.0, 10.0),
                node(1000.0, 8.0),
                node(3000.0, 8.0),
                node(3000.0, 12.0),
                node(6000.0, 6.0),
            ],
            3000.0,
            1000.0,
        )
        .unwrap();
        assert_eq!(s.earth_radius(), 6000.0);
        assert_eq!(s.discontinuities(), vec![1000.0, 3000.0]);
        assert!((s.compute_vph(4500.0).unwrap() - 9.0).abs() < 1e-12);
        // Upper side at the discontinuity
        assert!((s.compute_vph(3000.0).unwrap() - 12.0).abs() < 1e-12);
        assert!((s.compute_vph(2999.0).unwrap() - 8.0).abs() < 1e-12);
        assert!((s.compute_vph(6000.0).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn named_discontinuity_requires_named_boundaries() {
        let node = |radius: f64| StructureNode {
            radius,
            rho: 3.0,
            vpv: 8.0,
            vph: 8.0,
            vsv: 4.0,
            vsh: 4.0,
            eta: 1.0,
        };
        let result =
            NamedDiscontinuityStructure::new(vec![node(0.0), node(3000.0), node(6000.0)], 3000.0, 1000.0);
        assert!(matches!(result, Err(AnisoError::InvalidStructure(_))));
    }

    #[test]
    fn tabulated_prem_matches_polynomial() {
        let prem = PolynomialStructure::prem();
        let nd = NamedDiscontinuityStructure::from_structure(&prem, 1.0).unwrap();
        assert_eq!(nd.discontinuities(), prem.discontinuities());
        for r in [100.0, 2000.5, 3480.0, 4000.25, 6200.0, 6371.0] {
            let a = prem.compute_vph(r).unwrap();
            let b = nd.compute_vph(r).unwrap();
            assert!((a - b).abs() < 1e-4, "r={} poly={} table={}", r, a, b);
            let a = prem.compute_vsh(r).unwrap();
            let b = nd.compute_vsh(r).unwrap();
            assert!((a - b).abs() < 1e-4, "r={} poly={} table={}", r, a, b);
        }
    }
}
