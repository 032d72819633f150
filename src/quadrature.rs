// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::kernels::Integrand;

/// Abscissae of the 5-point Gauss-Legendre rule on [-1, 1].
const GL5_NODES: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683,
    0.0,
    0.538_469_310_105_683,
    0.906_179_845_938_664,
];

/// Weights of the 5-point Gauss-Legendre rule on [-1, 1].
const GL5_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189,
    0.478_628_670_499_366,
    0.568_888_888_888_889,
    0.478_628_670_499_366,
    0.236_926_885_056_189,
];

/// Number of geometric pieces the interval next to a turning point is cut into.
const TURNING_SPLITS: usize = 8;

/// Ratio between successive geometric pieces.
const TURNING_RATIO: f64 = 0.25;

/// 5-point Gauss-Legendre rule on `[a, b]`.
///
/// The end points are never evaluated.
pub fn gauss_legendre<F>(a: f64, b: f64, f: &F) -> Integrand
where
    F: Fn(f64) -> Integrand,
{
    let half = 0.5 * (b - a);
    let mid = 0.5 * (a + b);
    GL5_NODES
        .iter()
        .zip(GL5_WEIGHTS.iter())
        .fold(Integrand::default(), |acc, (&x, &w)| {
            acc.add(f(mid + half * x).scale(w * half))
        })
}

/// Composite rule over `[lower, upper]` with breakpoints at `nodes`.
///
/// `nodes` must be ascending and lie strictly inside the interval.
pub fn integrate<F>(nodes: &[f64], lower: f64, upper: f64, f: F) -> Integrand
where
    F: Fn(f64) -> Integrand,
{
    if !(upper > lower) {
        return Integrand::default();
    }
    let mut sum = Integrand::default();
    let mut a = lower;
    for &b in nodes.iter().chain(std::iter::once(&upper)) {
        sum = sum.add(gauss_legendre(a, b, &f));
        a = b;
    }
    sum
}

/// Composite rule over `[turning, upper]` for an integrand with an inverse
/// square-root singularity at `turning`.
///
/// Substitutes `r = turning + u²`, which makes `2u·f(r)` regular, and cuts the
/// first interval geometrically towards `u = 0`.
///
/// `f` receives `r`, not `u`. An integrand that rebuilds `r - turning` from it
/// keeps only the bits of `u²` that survive the addition, so the result is good
/// to a few parts in 1e10 rather than to machine precision.
pub fn integrate_from_turning<F>(nodes: &[f64], turning: f64, upper: f64, f: F) -> Integrand
where
    F: Fn(f64) -> Integrand,
{
    if !(upper > turning) {
        return Integrand::default();
    }
    let g = |u: f64| f(turning + u * u).scale(2.0 * u);

    let first = nodes.first().copied().unwrap_or(upper);
    let u_first = (first - turning).sqrt();
    let mut sum = Integrand::default();

    let mut hi = u_first;
    for _ in 0..TURNING_SPLITS {
        let lo = hi * TURNING_RATIO;
        sum = sum.add(gauss_legendre(lo, hi, &g));
        hi = lo;
    }
    sum = sum.add(gauss_legendre(0.0, hi, &g));

    let mut a = u_first;
    for &b in nodes.iter().skip(1).chain(std::iter::once(&upper)) {
        let ub = (b - turning).sqrt();
        sum = sum.add(gauss_legendre(a, ub, &g));
        a = ub;
    }
    sum
}
