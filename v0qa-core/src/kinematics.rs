//! Three-vector kinematics for tracks and decay vertices.

use std::f64::consts::TAU;
use std::ops::Add;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Momentum three-vector (GeV/c).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Momentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
}

impl Momentum {
    /// Creates a new momentum vector.
    #[inline]
    #[must_use]
    pub fn new(px: f64, py: f64, pz: f64) -> Self {
        Self { px, py, pz }
    }

    /// Squared magnitude.
    #[inline]
    #[must_use]
    pub fn p2(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// Magnitude.
    #[inline]
    #[must_use]
    pub fn p(&self) -> f64 {
        self.p2().sqrt()
    }

    /// Transverse momentum.
    #[inline]
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Pseudorapidity.
    #[must_use]
    pub fn eta(&self) -> f64 {
        let p = self.p();
        0.5 * ((p + self.pz) / (p - self.pz)).ln()
    }

    /// Azimuth in `[0, 2*pi)`.
    #[must_use]
    pub fn phi(&self) -> f64 {
        let phi = self.py.atan2(self.px);
        if phi < 0.0 {
            phi + TAU
        } else {
            phi
        }
    }

    /// Energy under the given mass hypothesis.
    #[inline]
    #[must_use]
    pub fn energy(&self, mass: f64) -> f64 {
        (self.p2() + mass * mass).sqrt()
    }

    /// Rapidity under the given mass hypothesis.
    #[must_use]
    pub fn rapidity(&self, mass: f64) -> f64 {
        let e = self.energy(mass);
        0.5 * ((e + self.pz) / (e - self.pz)).ln()
    }
}

impl Add for Momentum {
    type Output = Momentum;

    fn add(self, rhs: Momentum) -> Momentum {
        Momentum::new(self.px + rhs.px, self.py + rhs.py, self.pz + rhs.pz)
    }
}

/// Invariant mass of a two-body system with the given mass hypotheses.
///
/// `m = sqrt((E1 + E2)^2 - |p1 + p2|^2)`. Negative `m^2` from rounding is
/// clamped to zero.
#[must_use]
pub fn two_body_mass(p1: Momentum, m1: f64, p2: Momentum, m2: f64) -> f64 {
    let e = p1.energy(m1) + p2.energy(m2);
    let m2_total = e * e - (p1 + p2).p2();
    m2_total.max(0.0).sqrt()
}

/// Position in the detector frame (cm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Radial distance from the beam axis.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
