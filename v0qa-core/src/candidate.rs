//! V0 decay candidates.

use crate::constants::MASS_K0;
use crate::kinematics::{Momentum, Position};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reconstructed V0 candidate with its two daughter references.
///
/// All attributes are computed upstream by the vertexer and are read-only
/// for the analysis.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct V0Candidate {
    /// Index of the positive daughter in the event's track table.
    pub pos_track: usize,
    /// Index of the negative daughter in the event's track table.
    pub neg_track: usize,
    /// Invariant mass under the K0-short hypothesis.
    pub mass_k0_short: f64,
    /// V0 momentum.
    pub momentum: Momentum,
    /// Decay vertex.
    pub decay_vertex: Position,
    /// Positive daughter momentum at the decay vertex.
    pub pos_momentum: Momentum,
    /// Negative daughter momentum at the decay vertex.
    pub neg_momentum: Momentum,
    /// Cosine of the pointing angle.
    pub cos_pa: f64,
    /// DCA between the two daughters.
    pub dca_v0_daughters: f64,
    /// Signed DCA of the positive daughter to the primary vertex.
    pub dca_pos_to_pv: f64,
    /// Signed DCA of the negative daughter to the primary vertex.
    pub dca_neg_to_pv: f64,
    /// Index of the matched truth particle (MC only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub mc_particle: Option<usize>,
}

impl V0Candidate {
    /// Transverse momentum.
    #[inline]
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    /// Pseudorapidity.
    #[inline]
    #[must_use]
    pub fn eta(&self) -> f64 {
        self.momentum.eta()
    }

    /// Azimuth.
    #[inline]
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.momentum.phi()
    }

    /// Rapidity under the K0-short mass hypothesis.
    #[inline]
    #[must_use]
    pub fn rapidity_k0_short(&self) -> f64 {
        self.momentum.rapidity(MASS_K0)
    }

    /// Radial position of the decay vertex.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.decay_vertex.radius()
    }

    /// Decay length from the primary vertex divided by the total momentum.
    ///
    /// Multiplied by the mass this is the proper decay length `L*m/p`.
    #[must_use]
    pub fn dist_over_total_momentum(&self, primary_vertex: &Position) -> f64 {
        self.decay_vertex.distance(primary_vertex) / self.momentum.p()
    }
}
