// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::{AnisoError, Result};
use crate::kernels::{integrand, vertical_slowness_squared, Integrand, WaveMode};
use crate::mesh::{ComputationalMesh, Region};
use crate::phase::{Direction, Phase, PhasePart, Reach};
use crate::quadrature::{integrate, integrate_from_turning};
use crate::structure::VelocityStructure;

/// Relative tolerance on `q²` for a mesh point to count as a turning point.
const TURNING_TOLERANCE: f64 = 1e-10;

/// Relative tolerance for a ray parameter to count as grazing the CMB.
const GRAZING_TOLERANCE: f64 = 1e-9;

/// Deepest point of a phase part for one ray parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Turning {
    /// The vertical slowness vanishes at this radius \[km\].
    At(f64),
    /// The part crosses its whole region and reaches the inner boundary.
    Penetrates,
    /// The part cannot propagate at the top of its region.
    Evanescent,
}

/// τ, Δ and T of a part over its whole vertical extent, from its deepest
/// point to the top of its region. NaN when the part is evanescent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartIntegrals {
    /// Turning behaviour of the part.
    pub turning: Turning,
    /// Delay time \[s\].
    #[serde(with = "nan_as_null")]
    pub tau: f64,
    /// Epicentral distance \[rad\].
    #[serde(with = "nan_as_null")]
    pub delta: f64,
    /// Travel time \[s\].
    #[serde(with = "nan_as_null")]
    pub time: f64,
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_some(v)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

impl PartIntegrals {
    fn evanescent() -> Self {
        PartIntegrals {
            turning: Turning::Evanescent,
            tau: f64::NAN,
            delta: f64::NAN,
            time: f64::NAN,
        }
    }

    fn sums(&self) -> Integrand {
        Integrand {
            tau: self.tau,
            delta: self.delta,
            time: self.time,
        }
    }
}

fn nan_sums() -> Integrand {
    Integrand {
        tau: f64::NAN,
        delta: f64::NAN,
        time: f64::NAN,
    }
}

/// Ray parameter at which a part propagates horizontally at `radius`.
///
/// Infinite where the mode does not exist (shear waves in a fluid).
pub fn grazing_ray_parameter(
    structure: &dyn VelocityStructure,
    part: PhasePart,
    radius: f64,
) -> f64 {
    let v = part.mode().horizontal_velocity(&structure.moduli_at(radius));
    if v > 0.0 {
        radius / v
    } else {
        f64::INFINITY
    }
}

/// Ray parameter of a mantle part grazing the core-mantle boundary.
pub fn cmb_grazing_ray_parameter(
    structure: &dyn VelocityStructure,
    mesh: &ComputationalMesh,
    part: PhasePart,
) -> f64 {
    let (bottom, _) = mesh.region_bounds(Region::Mantle);
    grazing_ray_parameter(structure, part, bottom)
}

/// A ray with a fixed ray parameter in a given structure and mesh.
///
/// Integrals over each phase part are computed at most once, on first use,
/// and shared by every phase that uses the part.
#[derive(Clone)]
pub struct Raypath {
    ray_parameter: f64,
    structure: Arc<dyn VelocityStructure>,
    mesh: Arc<ComputationalMesh>,
    parts: [OnceLock<PartIntegrals>; 7],
}

impl fmt::Debug for Raypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let computed = self.parts.iter().filter(|c| c.get().is_some()).count();
        f.debug_struct("Raypath")
            .field("ray_parameter", &self.ray_parameter)
            .field("computed_parts", &computed)
            .finish()
    }
}

impl Raypath {
    /// Create a ray with ray parameter `p` \[s/rad\].
    ///
    /// # Errors
    /// Returns an error if `p` is negative or not finite.
    pub fn new(
        p: f64,
        structure: Arc<dyn VelocityStructure>,
        mesh: Arc<ComputationalMesh>,
    ) -> Result<Self> {
        if !p.is_finite() || p < 0.0 {
            return Err(AnisoError::InvalidRayParameter(p));
        }
        Ok(Raypath {
            ray_parameter: p,
            structure,
            mesh,
            parts: std::array::from_fn(|_| OnceLock::new()),
        })
    }

    /// Rebuild a ray from previously computed part integrals.
    pub(crate) fn with_parts(
        p: f64,
        structure: Arc<dyn VelocityStructure>,
        mesh: Arc<ComputationalMesh>,
        parts: [Option<PartIntegrals>; 7],
    ) -> Result<Self> {
        let ray = Self::new(p, structure, mesh)?;
        for (cell, value) in ray.parts.iter().zip(parts) {
            if let Some(v) = value {
                let _ = cell.set(v);
            }
        }
        Ok(ray)
    }

    /// The ray parameter \[s/rad\].
    pub fn ray_parameter(&self) -> f64 {
        self.ray_parameter
    }

    /// The structure the ray travels through.
    pub fn structure(&self) -> &Arc<dyn VelocityStructure> {
        &self.structure
    }

    /// The mesh used for integration.
    pub fn mesh(&self) -> &Arc<ComputationalMesh> {
        &self.mesh
    }

    /// Part integrals computed so far, indexed by [`PhasePart::index`].
    pub fn computed_parts(&self) -> [Option<PartIntegrals>; 7] {
        std::array::from_fn(|i| self.parts[i].get().copied())
    }

    /// Integrals of a part over its whole extent, computed on first use.
    pub fn part_integrals(&self, part: PhasePart) -> PartIntegrals {
        *self.parts[part.index()].get_or_init(|| self.integrate_part(part))
    }

    /// Compute the integrals of every part.
    pub fn compute_all(&self) {
        for part in PhasePart::ALL {
            self.part_integrals(part);
        }
    }

    /// Turning behaviour of a part.
    pub fn turning(&self, part: PhasePart) -> Turning {
        self.part_integrals(part).turning
    }

    /// Deepest radius a part reaches: its turning radius, or the bottom of its
    /// region when it penetrates. `None` when it is evanescent.
    pub fn turning_radius(&self, part: PhasePart) -> Option<f64> {
        match self.turning(part) {
            Turning::At(r) => Some(r),
            Turning::Penetrates => Some(self.mesh.region_bounds(part.region()).0),
            Turning::Evanescent => None,
        }
    }

    /// Epicentral distance \[rad\] of a phase from a source at `event_radius` \[km\].
    ///
    /// NaN when the ray has no valid path for the phase.
    pub fn compute_delta(&self, phase: &Phase, event_radius: f64) -> f64 {
        self.sum_legs(phase, event_radius).delta
    }

    /// Travel time \[s\] of a phase from a source at `event_radius` \[km\].
    ///
    /// NaN when the ray has no valid path for the phase.
    pub fn compute_t(&self, phase: &Phase, event_radius: f64) -> f64 {
        self.sum_legs(phase, event_radius).time
    }

    /// Delay time τ = T − pΔ \[s\] of a phase from a source at `event_radius` \[km\].
    pub fn compute_tau(&self, phase: &Phase, event_radius: f64) -> f64 {
        self.sum_legs(phase, event_radius).tau
    }

    fn sum_legs(&self, phase: &Phase, event_radius: f64) -> Integrand {
        let (mantle_bottom, surface) = self.mesh.region_bounds(Region::Mantle);
        if !(event_radius >= mantle_bottom && event_radius <= surface) {
            return nan_sums();
        }

        let mut total = Integrand::default();
        for (k, leg) in phase.legs().iter().enumerate() {
            let part = self.part_integrals(leg.part);
            let region_bottom = self.mesh.region_bounds(leg.part.region()).0;
            let bottom = match (leg.reach, part.turning) {
                (Reach::Turning, Turning::At(r)) | (Reach::Source, Turning::At(r)) => r,
                (Reach::Boundary, Turning::Penetrates) | (Reach::Source, Turning::Penetrates) => {
                    region_bottom
                }
                _ => return nan_sums(),
            };

            let contribution = if k == 0 {
                if bottom > event_radius {
                    return nan_sums();
                }
                let below = self.below_source(leg.part, &part, bottom, event_radius);
                match leg.direction {
                    Direction::Down => below,
                    Direction::Up => part.sums().add(below.scale(-1.0)),
                }
            } else {
                part.sums()
            };
            total = total.add(contribution);

            if self.ray_parameter == 0.0 && leg.part.region() == Region::InnerCore {
                total.delta += FRAC_PI_2;
            }
        }

        if let Some(angle) = phase.diffraction() {
            let first = match phase.legs().first() {
                Some(leg) => leg.part,
                None => return nan_sums(),
            };
            let grazing = cmb_grazing_ray_parameter(self.structure.as_ref(), &self.mesh, first);
            if (self.ray_parameter - grazing).abs() > GRAZING_TOLERANCE * grazing {
                return nan_sums();
            }
            let theta = angle.to_radians();
            total.delta += theta;
            total.time += self.ray_parameter * theta;
        }
        total
    }

    fn below_source(
        &self,
        part: PhasePart,
        integrals: &PartIntegrals,
        bottom: f64,
        event_radius: f64,
    ) -> Integrand {
        let top = self.mesh.region_bounds(part.region()).1;
        if event_radius >= top {
            return integrals.sums();
        }
        let from_turning = matches!(integrals.turning, Turning::At(_));
        self.integrate_range(part, bottom, event_radius, from_turning)
    }

    fn integrate_part(&self, part: PhasePart) -> PartIntegrals {
        let turning = self.find_turning(part);
        let (bottom, top) = self.mesh.region_bounds(part.region());
        let sums = match turning {
            Turning::Evanescent => return PartIntegrals::evanescent(),
            Turning::At(r) => self.integrate_range(part, r, top, true),
            Turning::Penetrates => self.integrate_range(part, bottom, top, false),
        };
        PartIntegrals {
            turning,
            tau: sums.tau,
            delta: sums.delta,
            time: sums.time,
        }
    }

    fn integrate_range(&self, part: PhasePart, lower: f64, upper: f64, from_turning: bool) -> Integrand {
        let mode = part.mode();
        let p = self.ray_parameter;
        let nodes = self.mesh.interior(lower, upper);
        let f = |r: f64| integrand(mode, &self.structure.moduli_at(r), p, r);
        if from_turning {
            integrate_from_turning(nodes, lower, upper, f)
        } else {
            integrate(nodes, lower, upper, f)
        }
    }

    fn q2(&self, mode: WaveMode, r: f64) -> f64 {
        let p = self.ray_parameter;
        if r <= 0.0 && p > 0.0 {
            return f64::NEG_INFINITY;
        }
        let x = if r > 0.0 { (p / r) * (p / r) } else { 0.0 };
        vertical_slowness_squared(mode, &self.structure.moduli_at(r), x)
    }

    fn tolerance(&self, r: f64) -> f64 {
        if r > 0.0 {
            let x = self.ray_parameter / r;
            TURNING_TOLERANCE * x * x
        } else {
            0.0
        }
    }

    /// Scan the region's mesh points from the top down for the first point
    /// where `q²` stops being positive.
    fn find_turning(&self, part: PhasePart) -> Turning {
        let mode = part.mode();
        let radii = &self.mesh.radii()[self.mesh.region_range(part.region())];
        let top = radii.len() - 1;

        let q_top = self.q2(mode, radii[top]);
        let tol_top = self.tolerance(radii[top]);
        if !(q_top >= -tol_top) {
            return Turning::Evanescent;
        }
        if q_top <= tol_top {
            return Turning::At(radii[top]);
        }
        for j in (0..top).rev() {
            let q = self.q2(mode, radii[j]);
            if q.abs() <= self.tolerance(radii[j]) {
                return Turning::At(radii[j]);
            }
            if !(q > 0.0) {
                return Turning::At(self.bisect(mode, radii[j], radii[j + 1]));
            }
        }
        if part.region() == Region::InnerCore {
            Turning::At(radii[0])
        } else {
            Turning::Penetrates
        }
    }

    /// Zero of `q²` between a non-positive `lo` and a positive `hi`; returns
    /// the last radius known to have positive `q²`.
    fn bisect(&self, mode: WaveMode, mut lo: f64, mut hi: f64) -> f64 {
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if self.q2(mode, mid) > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }
}
