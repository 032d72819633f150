// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::{AnisoError, Result};
use crate::mesh::ComputationalMesh;
use crate::phase::{Phase, PhasePart};
use crate::raypath::{cmb_grazing_ray_parameter, grazing_ray_parameter, Raypath};
use crate::structure::VelocityStructure;

/// Distance tolerance of a search result \[rad\].
///
/// Turning radii are resolved to about one ulp, and the inverse square-root
/// singularity at the turning point turns that into Δ scatter of order
/// 1e-8 rad, so a tighter bound cannot be guaranteed.
pub const DELTA_TOLERANCE: f64 = 1e-7;

/// Distance misfit at which refinement stops early \[rad\].
const REFINE_TARGET: f64 = 1e-9;

/// Default maximum spacing of catalog ray parameters \[s/rad\].
pub const DEFAULT_MAX_STEP: f64 = 2.0;

const MAX_REFINE_ITERS: usize = 100;

/// Progress information passed to the optional callback.
pub struct ProgressInfo {
    /// Number of rays whose part integrals are complete.
    pub rays_computed: u64,
    /// Number of rays in the catalog being built.
    pub total_rays: usize,
    /// Elapsed time since the build started.
    pub elapsed: Duration,
}

/// One arrival of a phase: the ray, its distance and its travel time.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    /// The phase; for diffracted phases it carries the resolved diffraction angle.
    pub phase: Phase,
    /// Ray parameter \[s/rad\].
    pub ray_parameter: f64,
    /// Epicentral distance \[rad\].
    pub delta: f64,
    /// Travel time \[s\].
    pub time: f64,
}

impl Arrival {
    /// Epicentral distance in degrees.
    pub fn delta_degrees(&self) -> f64 {
        self.delta.to_degrees()
    }

    /// Ray parameter in s/deg.
    pub fn ray_parameter_per_degree(&self) -> f64 {
        self.ray_parameter.to_radians()
    }
}

#[derive(Debug, Clone, Copy)]
enum Sampling {
    MaxStep(f64),
    Samples(usize),
}

/// Configures and builds a [`RaypathCatalog`].
pub struct CatalogBuilder {
    structure: Arc<dyn VelocityStructure>,
    mesh: Arc<ComputationalMesh>,
    sampling: Sampling,
    num_threads: Option<usize>,
    progress_callback: Option<Box<dyn Fn(ProgressInfo) + Send + Sync>>,
}

impl CatalogBuilder {
    /// Start configuring a catalog for a structure and mesh.
    pub fn new(structure: Arc<dyn VelocityStructure>, mesh: Arc<ComputationalMesh>) -> Self {
        CatalogBuilder {
            structure,
            mesh,
            sampling: Sampling::MaxStep(DEFAULT_MAX_STEP),
            num_threads: None,
            progress_callback: None,
        }
    }

    /// Set the maximum spacing of ray parameters \[s/rad\] (builder method).
    /// Default is 2 s/rad.
    ///
    /// # Errors
    /// Returns an error if the step is not positive and finite.
    pub fn with_max_step(mut self, max_step: f64) -> Result<Self> {
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(AnisoError::InvalidSampling {
                reason: format!("max step {} must be positive and finite", max_step),
            });
        }
        self.sampling = Sampling::MaxStep(max_step);
        Ok(self)
    }

    /// Sample `n` evenly spaced ray parameters from 0 to the surface grazing
    /// value, plus the critical values (builder method).
    ///
    /// # Errors
    /// Returns an error if `n < 2`.
    pub fn with_samples(mut self, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(AnisoError::InvalidSampling {
                reason: format!("need at least 2 samples, got {}", n),
            });
        }
        self.sampling = Sampling::Samples(n);
        Ok(self)
    }

    /// Set the number of worker threads (builder method).
    /// If not specified, defaults to the number of available CPU cores.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Set a progress callback invoked at most every 500ms while building (builder method).
    pub fn with_progress(mut self, callback: Box<dyn Fn(ProgressInfo) + Send + Sync>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Fingerprint of the structure and mesh the catalog will be built for.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(self.structure.as_ref(), &self.mesh)
    }

    fn get_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Compute every ray of the catalog in parallel.
    ///
    /// The catalog is returned only once all rays are complete. Rays without
    /// a valid path for some part keep NaN integrals for that part.
    ///
    /// # Errors
    /// Returns an error if the thread count is zero or the pool cannot be created.
    pub fn build(self) -> Result<RaypathCatalog> {
        let num_threads = self.get_num_threads();
        if num_threads == 0 {
            return Err(AnisoError::InvalidThreadCount(num_threads));
        }

        let p_max = surface_max_ray_parameter(self.structure.as_ref());
        let grid = ray_parameter_grid(self.structure.as_ref(), &self.mesh, p_max, self.sampling);
        debug!(
            "catalog grid: {} ray parameters up to {:.4} s/rad on {} threads",
            grid.len(),
            p_max,
            num_threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| AnisoError::Other(e.to_string()))?;

        let total_rays = grid.len();
        let computed = AtomicU64::new(0);
        let start_time = Instant::now();
        let last_progress = AtomicU64::new(0);

        let structure = &self.structure;
        let mesh = &self.mesh;
        let progress_callback = &self.progress_callback;

        let raypaths: Result<Vec<Raypath>> = pool.install(|| {
            grid.par_iter()
                .map(|&p| {
                    let ray = Raypath::new(p, Arc::clone(structure), Arc::clone(mesh))?;
                    ray.compute_all();
                    let done = computed.fetch_add(1, Ordering::Relaxed) + 1;

                    if let Some(cb) = progress_callback {
                        let elapsed_ms = start_time.elapsed().as_millis() as u64;
                        let last = last_progress.load(Ordering::Relaxed);
                        if elapsed_ms >= last + 500
                            && last_progress
                                .compare_exchange(
                                    last,
                                    elapsed_ms,
                                    Ordering::Relaxed,
                                    Ordering::Relaxed,
                                )
                                .is_ok()
                        {
                            cb(ProgressInfo {
                                rays_computed: done,
                                total_rays,
                                elapsed: start_time.elapsed(),
                            });
                        }
                    }
                    Ok(ray)
                })
                .collect()
        });
        let raypaths = raypaths?;

        let invalid = raypaths
            .iter()
            .flat_map(|r| r.computed_parts())
            .filter(|p| p.map_or(true, |p| p.delta.is_nan()))
            .count();
        info!(
            "built catalog of {} rays in {:.2?} ({:.1}% of part integrals invalid)",
            raypaths.len(),
            start_time.elapsed(),
            100.0 * invalid as f64 / (raypaths.len() * PhasePart::ALL.len()) as f64
        );

        RaypathCatalog::from_raypaths(self.structure, self.mesh, raypaths)
    }
}

/// Largest surface grazing ray parameter over the mantle modes.
fn surface_max_ray_parameter(structure: &dyn VelocityStructure) -> f64 {
    let r = structure.earth_radius();
    [PhasePart::P, PhasePart::SV, PhasePart::SH]
        .iter()
        .map(|&part| grazing_ray_parameter(structure, part, r))
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max)
}

/// Evenly spaced ray parameters on `[0, p_max]` merged with the grazing
/// values at the surface and at both sides of every discontinuity.
fn ray_parameter_grid(
    structure: &dyn VelocityStructure,
    mesh: &ComputationalMesh,
    p_max: f64,
    sampling: Sampling,
) -> Vec<f64> {
    let steps = match sampling {
        Sampling::MaxStep(dp) => (p_max / dp).ceil().max(1.0) as usize,
        Sampling::Samples(n) => n - 1,
    };
    let mut candidates: Vec<(f64, bool)> = (0..=steps)
        .map(|i| (p_max * i as f64 / steps as f64, false))
        .collect();

    let radii = mesh.radii();
    let mut critical_radii = vec![structure.earth_radius()];
    for d in structure.discontinuities() {
        if let Some(i) = mesh.bracket(d) {
            critical_radii.push(radii[i]);
            critical_radii.push(radii[i + 1]);
        }
    }
    for r in critical_radii {
        for part in [PhasePart::P, PhasePart::SV, PhasePart::SH] {
            let p = grazing_ray_parameter(structure, part, r);
            if p.is_finite() && p <= p_max {
                candidates.push((p, true));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let merge = 1e-9 * p_max;
    let mut grid: Vec<(f64, bool)> = Vec::with_capacity(candidates.len());
    for (p, critical) in candidates {
        match grid.last_mut() {
            Some(last) if p - last.0 <= merge => {
                if critical && !last.1 {
                    *last = (p, critical);
                }
            }
            _ => grid.push((p, critical)),
        }
    }
    grid.into_iter().map(|(p, _)| p).collect()
}

/// FNV-1a hash of the mesh radii and the moduli at every mesh radius.
pub fn fingerprint(structure: &dyn VelocityStructure, mesh: &ComputationalMesh) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET;
    let mut feed = |v: f64| {
        for byte in v.to_bits().to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    };
    feed(structure.earth_radius());
    feed(structure.core_mantle_boundary());
    feed(structure.inner_core_boundary());
    for &r in mesh.radii() {
        let m = structure.moduli_at(r);
        for v in [r, m.rho, m.a, m.c, m.f, m.l, m.n] {
            feed(v);
        }
    }
    hash
}

/// Sorted table of rays over `[0, p_max]` for one structure and mesh.
///
/// Immutable after construction and safe to query from several threads.
pub struct RaypathCatalog {
    structure: Arc<dyn VelocityStructure>,
    mesh: Arc<ComputationalMesh>,
    raypaths: Vec<Raypath>,
    fingerprint: u64,
}

impl RaypathCatalog {
    /// Start configuring a catalog.
    pub fn builder(
        structure: Arc<dyn VelocityStructure>,
        mesh: Arc<ComputationalMesh>,
    ) -> CatalogBuilder {
        CatalogBuilder::new(structure, mesh)
    }

    /// Assemble a catalog from rays with strictly increasing ray parameters.
    ///
    /// # Errors
    /// Returns an error if there are fewer than two rays or they are not
    /// strictly increasing.
    pub fn from_raypaths(
        structure: Arc<dyn VelocityStructure>,
        mesh: Arc<ComputationalMesh>,
        raypaths: Vec<Raypath>,
    ) -> Result<Self> {
        if raypaths.len() < 2 {
            return Err(AnisoError::InvalidSampling {
                reason: format!("need at least 2 rays, got {}", raypaths.len()),
            });
        }
        if let Some(w) = raypaths
            .windows(2)
            .find(|w| !(w[1].ray_parameter() > w[0].ray_parameter()))
        {
            return Err(AnisoError::InvalidSampling {
                reason: format!(
                    "ray parameters not strictly increasing: {} -> {}",
                    w[0].ray_parameter(),
                    w[1].ray_parameter()
                ),
            });
        }
        let fingerprint = fingerprint(structure.as_ref(), &mesh);
        Ok(RaypathCatalog {
            structure,
            mesh,
            raypaths,
            fingerprint,
        })
    }

    /// The rays, by increasing ray parameter.
    pub fn raypaths(&self) -> &[Raypath] {
        &self.raypaths
    }

    /// Number of rays.
    pub fn len(&self) -> usize {
        self.raypaths.len()
    }

    /// Whether the catalog has no rays (never true for a built catalog).
    pub fn is_empty(&self) -> bool {
        self.raypaths.is_empty()
    }

    /// Largest ray parameter in the catalog \[s/rad\].
    pub fn max_ray_parameter(&self) -> f64 {
        self.raypaths
            .last()
            .map_or(0.0, |r| r.ray_parameter())
    }

    /// The structure.
    pub fn structure(&self) -> &Arc<dyn VelocityStructure> {
        &self.structure
    }

    /// The mesh.
    pub fn mesh(&self) -> &Arc<ComputationalMesh> {
        &self.mesh
    }

    /// Fingerprint of the structure and mesh.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Every ray whose distance for `phase` from a source at `event_radius`
    /// \[km\] equals `target_delta` \[rad\] within [`DELTA_TOLERANCE`].
    ///
    /// Rays are sorted by ray parameter; an empty result means the phase does
    /// not exist at that distance. Diffracted phases return the CMB grazing
    /// ray once the target lies beyond the end of the undiffracted branch.
    pub fn search_path(&self, phase: &Phase, event_radius: f64, target_delta: f64) -> Vec<Raypath> {
        if !target_delta.is_finite() {
            return Vec::new();
        }
        if phase.is_diffracted() {
            return self.search_diffracted(phase, event_radius, target_delta);
        }

        let deltas: Vec<f64> = self
            .raypaths
            .par_iter()
            .map(|r| r.compute_delta(phase, event_radius))
            .collect();
        let runs = monotonic_runs(&deltas);
        debug!(
            "{} from r={} km: {} monotonic sub-intervals",
            phase,
            event_radius,
            runs.len()
        );

        let mut found = Vec::new();
        for run in &runs {
            for i in run.clone() {
                if (deltas[i] - target_delta).abs() < DELTA_TOLERANCE {
                    found.push(self.raypaths[i].clone());
                }
            }
            for i in run.start..run.end.saturating_sub(1) {
                let (fa, fb) = (deltas[i] - target_delta, deltas[i + 1] - target_delta);
                if fa.abs() < DELTA_TOLERANCE || fb.abs() < DELTA_TOLERANCE || fa * fb > 0.0 {
                    continue;
                }
                let neighbor = if i > run.start {
                    Some(i - 1)
                } else if i + 2 < run.end {
                    Some(i + 2)
                } else {
                    None
                };
                let point = |j: usize| (self.raypaths[j].ray_parameter(), deltas[j]);
                if let Some(ray) = self.refine(
                    phase,
                    event_radius,
                    target_delta,
                    point(i),
                    point(i + 1),
                    neighbor.map(point),
                ) {
                    found.push(ray);
                }
            }
        }

        found.sort_by(|a, b| a.ray_parameter().total_cmp(&b.ray_parameter()));
        let merge = 1e-7 * self.max_ray_parameter();
        found.dedup_by(|b, a| (b.ray_parameter() - a.ray_parameter()).abs() < merge);
        found
    }

    fn search_diffracted(&self, phase: &Phase, event_radius: f64, target_delta: f64) -> Vec<Raypath> {
        if let Some(angle) = phase.diffraction().filter(|&a| a != 0.0) {
            warn!(
                "diffraction angle {} of {} is ignored when searching by distance",
                angle, phase
            );
        }
        let part = match phase.legs().first() {
            Some(leg) => leg.part,
            None => return Vec::new(),
        };
        let grazing = cmb_grazing_ray_parameter(self.structure.as_ref(), &self.mesh, part);
        let ray = match self
            .raypaths
            .iter()
            .find(|r| r.ray_parameter() == grazing)
        {
            Some(r) => r.clone(),
            None => match Raypath::new(grazing, self.structure.clone(), self.mesh.clone()) {
                Ok(r) => r,
                Err(_) => return Vec::new(),
            },
        };
        let edge = ray.compute_delta(&phase.without_diffraction(), event_radius);
        if edge.is_finite() && target_delta >= edge - DELTA_TOLERANCE {
            vec![ray]
        } else {
            Vec::new()
        }
    }

    /// Refine a bracketing pair `(p, Δ)` to a ray hitting the target.
    ///
    /// `None` when Δ(p) is discontinuous inside the bracket and no ray comes
    /// within [`DELTA_TOLERANCE`].
    fn refine(
        &self,
        phase: &Phase,
        event_radius: f64,
        target: f64,
        lo: (f64, f64),
        hi: (f64, f64),
        neighbor: Option<(f64, f64)>,
    ) -> Option<Raypath> {
        let (mut a, mut fa) = (lo.0, lo.1 - target);
        let (mut b, mut fb) = (hi.0, hi.1 - target);

        let mut guess = neighbor
            .map(|c| inverse_quadratic(lo, hi, c, target))
            .filter(|&g| g > a && g < b)
            .unwrap_or_else(|| secant(a, fa, b, fb));
        let mut best: Option<(f64, Raypath)> = None;

        for iter in 0..MAX_REFINE_ITERS {
            let ray = Raypath::new(guess, self.structure.clone(), self.mesh.clone()).ok()?;
            let f = ray.compute_delta(phase, event_radius) - target;
            if f.is_nan() {
                debug!("{}: invalid ray at p={} while refining", phase, guess);
                return None;
            }
            if f.abs() < REFINE_TARGET {
                return Some(ray);
            }
            if best.as_ref().map_or(true, |(e, _)| f.abs() < *e) {
                best = Some((f.abs(), ray));
            }
            if (f < 0.0) == (fa < 0.0) {
                a = guess;
                fa = f;
            } else {
                b = guess;
                fb = f;
            }
            if b - a <= 4.0 * f64::EPSILON * b {
                break;
            }
            guess = if iter % 2 == 0 {
                secant(a, fa, b, fb)
            } else {
                0.5 * (a + b)
            };
        }
        match best {
            Some((misfit, ray)) if misfit < DELTA_TOLERANCE => Some(ray),
            Some((misfit, _)) => {
                // The bracket closed on a jump of Δ(p), e.g. a shadow zone edge.
                debug!(
                    "{}: no root in [{}, {}], closest ray misses by {:.3e} rad",
                    phase,
                    a,
                    b,
                    misfit
                );
                None
            }
            None => None,
        }
    }

    /// Rays of a phase at a distance, with their times.
    ///
    /// For diffracted phases the diffraction angle is resolved from the target.
    pub fn arrivals(&self, phase: &Phase, event_radius: f64, target_delta: f64) -> Vec<Arrival> {
        self.search_path(phase, event_radius, target_delta)
            .into_iter()
            .filter_map(|ray| {
                let resolved = if phase.is_diffracted() {
                    let base = phase.without_diffraction();
                    let edge = ray.compute_delta(&base, event_radius);
                    phase.with_diffraction((target_delta - edge).max(0.0).to_degrees())
                } else {
                    phase.clone()
                };
                arrival(&ray, resolved, event_radius)
            })
            .collect()
    }

    /// Distance and time of a phase for a given ray parameter \[s/rad\].
    ///
    /// `None` when the ray parameter is invalid or the phase has no path for it.
    pub fn search_ray_parameter(&self, phase: &Phase, event_radius: f64, p: f64) -> Option<Arrival> {
        let ray = Raypath::new(p, self.structure.clone(), self.mesh.clone()).ok()?;
        arrival(&ray, phase.clone(), event_radius)
    }
}

fn arrival(ray: &Raypath, phase: Phase, event_radius: f64) -> Option<Arrival> {
    let delta = ray.compute_delta(&phase, event_radius);
    let time = ray.compute_t(&phase, event_radius);
    if delta.is_finite() && time.is_finite() {
        Some(Arrival {
            phase,
            ray_parameter: ray.ray_parameter(),
            delta,
            time,
        })
    } else {
        None
    }
}

fn secant(a: f64, fa: f64, b: f64, fb: f64) -> f64 {
    let g = a - fa * (b - a) / (fb - fa);
    if g > a && g < b {
        g
    } else {
        0.5 * (a + b)
    }
}

/// Ray parameter at `target` from the quadratic through three `(p, Δ)` points.
fn inverse_quadratic(x0: (f64, f64), x1: (f64, f64), x2: (f64, f64), target: f64) -> f64 {
    let pts = [x0, x1, x2];
    let mut sum = 0.0;
    for (i, &(pi, di)) in pts.iter().enumerate() {
        let mut term = pi;
        for (j, &(_, dj)) in pts.iter().enumerate() {
            if i != j {
                term *= (target - dj) / (di - dj);
            }
        }
        sum += term;
    }
    sum
}

/// Split finite values into maximal monotonic runs.
///
/// NaN values end a run; a local extremum ends one run and starts the next.
fn monotonic_runs(values: &[f64]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut direction = 0.0_f64;
    for i in 0..values.len() {
        if !values[i].is_finite() {
            if let Some(s) = start.take() {
                runs.push(s..i);
            }
            continue;
        }
        let s = match start {
            Some(s) => s,
            None => {
                start = Some(i);
                direction = 0.0;
                continue;
            }
        };
        let step = values[i] - values[i - 1];
        let sign = if step > 0.0 {
            1.0
        } else if step < 0.0 {
            -1.0
        } else {
            0.0
        };
        if direction == 0.0 {
            direction = sign;
        } else if sign != 0.0 && sign != direction {
            runs.push(s..i);
            start = Some(i - 1);
            direction = sign;
        }
    }
    if let Some(s) = start {
        runs.push(s..values.len());
    }
    runs
}

/// Caller-owned map from structure and mesh fingerprints to built catalogs.
#[derive(Default)]
pub struct CatalogRegistry {
    catalogs: HashMap<u64, Arc<RaypathCatalog>>,
}

impl CatalogRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog built for a structure and mesh, if any.
    pub fn get(
        &self,
        structure: &dyn VelocityStructure,
        mesh: &ComputationalMesh,
    ) -> Option<Arc<RaypathCatalog>> {
        self.catalogs.get(&fingerprint(structure, mesh)).cloned()
    }

    /// Register a catalog, replacing any with the same fingerprint.
    pub fn insert(&mut self, catalog: RaypathCatalog) -> Arc<RaypathCatalog> {
        let catalog = Arc::new(catalog);
        self.catalogs
            .insert(catalog.fingerprint(), Arc::clone(&catalog));
        catalog
    }

    /// The registered catalog for the builder's structure and mesh, building
    /// and registering it first if needed.
    ///
    /// Catalogs are keyed by structure and mesh only. A registered catalog is
    /// returned even if the builder asks for a different ray-parameter
    /// sampling; call [`RaypathCatalog::builder`] directly and
    /// [`CatalogRegistry::insert`] to replace it.
    ///
    /// # Errors
    /// Returns any error from [`CatalogBuilder::build`].
    pub fn get_or_build(&mut self, builder: CatalogBuilder) -> Result<Arc<RaypathCatalog>> {
        let key = builder.fingerprint();
        if let Some(catalog) = self.catalogs.get(&key) {
            return Ok(Arc::clone(catalog));
        }
        let catalog = builder.build()?;
        Ok(self.insert(catalog))
    }

    /// Number of registered catalogs.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Whether no catalog is registered.
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
