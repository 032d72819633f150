// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Vertical slowness of the three body-wave modes in a transversely isotropic
//! medium (Woodhouse, 1981) and the radial integrands of τ, Δ and T.
//!
//! With `X = (p / r)^2` the squared vertical slowness is
//!
//! - P:  `q² = s1 - s3·X - R`
//! - SV: `q² = s1 - s3·X + R`
//! - SH: `q² = ρ/L - (N/L)·X`
//!
//! where `R = sqrt(s4·X² + 2·s5·X + s2²)`. In a fluid only P exists and
//! `q² = ρ/C - X`.

use crate::structure::ElasticModuli;

/// Body-wave mode, fixing which root of the Christoffel equation is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveMode {
    /// Quasi-P.
    P,
    /// Quasi-SV.
    SV,
    /// SH.
    SH,
}

impl WaveMode {
    /// Velocity of horizontal propagation, which fixes the grazing ray parameter.
    pub fn horizontal_velocity(self, m: &ElasticModuli) -> f64 {
        match self {
            WaveMode::P => m.vph(),
            WaveMode::SV => m.vsv(),
            WaveMode::SH => m.vsh(),
        }
    }
}

/// Radial derivatives of τ, Δ and T at one radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Integrand {
    /// dτ/dr, the vertical slowness \[s/km\].
    pub tau: f64,
    /// dΔ/dr \[rad/km\].
    pub delta: f64,
    /// dT/dr \[s/km\].
    pub time: f64,
}

impl Integrand {
    /// Integrand scaled by a quadrature weight.
    pub fn scale(self, w: f64) -> Self {
        Integrand {
            tau: self.tau * w,
            delta: self.delta * w,
            time: self.time * w,
        }
    }

    /// Component-wise sum.
    pub fn add(self, other: Self) -> Self {
        Integrand {
            tau: self.tau + other.tau,
            delta: self.delta + other.delta,
            time: self.time + other.time,
        }
    }
}

struct Woodhouse {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
}

impl Woodhouse {
    fn new(m: &ElasticModuli) -> Self {
        let s1 = m.rho / 2.0 * (1.0 / m.l + 1.0 / m.c);
        let s2 = m.rho / 2.0 * (1.0 / m.l - 1.0 / m.c);
        let s3 = (m.a * m.c - m.f * m.f - 2.0 * m.l * m.f) / (2.0 * m.l * m.c);
        let s4 = s3 * s3 - m.a / m.c;
        let s5 = m.rho / (2.0 * m.c) * (1.0 + m.a / m.l) - s1 * s3;
        Woodhouse { s1, s2, s3, s4, s5 }
    }

    fn r(&self, x: f64) -> f64 {
        (self.s4 * x * x + 2.0 * self.s5 * x + self.s2 * self.s2).sqrt()
    }
}

/// Squared vertical slowness for a mode at `X = (p / r)^2`.
///
/// Shear modes in a fluid give NaN.
pub fn vertical_slowness_squared(mode: WaveMode, m: &ElasticModuli, x: f64) -> f64 {
    if m.is_fluid() {
        return match mode {
            WaveMode::P => m.rho / m.c - x,
            WaveMode::SV | WaveMode::SH => f64::NAN,
        };
    }
    match mode {
        WaveMode::SH => m.rho / m.l - m.n / m.l * x,
        WaveMode::P => {
            let w = Woodhouse::new(m);
            w.s1 - w.s3 * x - w.r(x)
        }
        WaveMode::SV => {
            let w = Woodhouse::new(m);
            w.s1 - w.s3 * x + w.r(x)
        }
    }
}

/// τ, Δ and T integrands for a ray parameter `p` \[s/rad\] at radius `r` \[km\].
///
/// `dτ/dr = q`, `dΔ/dr = -∂q/∂p` and `dT/dr = dτ/dr + p·dΔ/dr`, the last two
/// written in closed form. A non-positive `q²` contributes nothing, which only
/// happens at quadrature nodes within round-off of a turning point.
pub fn integrand(mode: WaveMode, m: &ElasticModuli, p: f64, r: f64) -> Integrand {
    let x = (p / r) * (p / r);
    let dx = p / (r * r);
    let (q2, slope, time_num) = if m.is_fluid() {
        match mode {
            WaveMode::P => (m.rho / m.c - x, 1.0, m.rho / m.c),
            WaveMode::SV | WaveMode::SH => return nan_integrand(),
        }
    } else {
        match mode {
            WaveMode::SH => (m.rho / m.l - m.n / m.l * x, m.n / m.l, m.rho / m.l),
            WaveMode::P => {
                let w = Woodhouse::new(m);
                let r_ = w.r(x);
                (
                    w.s1 - w.s3 * x - r_,
                    w.s3 + (w.s4 * x + w.s5) / r_,
                    w.s1 - (w.s5 * x + w.s2 * w.s2) / r_,
                )
            }
            WaveMode::SV => {
                let w = Woodhouse::new(m);
                let r_ = w.r(x);
                (
                    w.s1 - w.s3 * x + r_,
                    w.s3 - (w.s4 * x + w.s5) / r_,
                    w.s1 + (w.s5 * x + w.s2 * w.s2) / r_,
                )
            }
        }
    };
    if q2.is_nan() {
        return nan_integrand();
    }
    if q2 <= 0.0 {
        return Integrand::default();
    }
    let q = q2.sqrt();
    Integrand {
        tau: q,
        delta: dx * slope / q,
        time: time_num / q,
    }
}

fn nan_integrand() -> Integrand {
    Integrand {
        tau: f64::NAN,
        delta: f64::NAN,
        time: f64::NAN,
    }
}
