//! Candidate invariant mass.

use v0qa_core::candidate::V0Candidate;
use v0qa_core::config::MassMode;
use v0qa_core::constants::MASS_PION_CHARGED;
use v0qa_core::kinematics::two_body_mass;
use v0qa_core::track::Track;

/// Invariant mass of the candidate.
///
/// [`MassMode::Stored`] returns the vertexer's K0S mass;
/// [`MassMode::FromDaughters`] recomputes it from the daughter track
/// momenta under the charged-pion hypothesis.
#[must_use]
pub fn candidate_mass(mode: MassMode, v0: &V0Candidate, pos: &Track, neg: &Track) -> f64 {
    match mode {
        MassMode::Stored => v0.mass_k0_short,
        MassMode::FromDaughters => two_body_mass(
            pos.momentum,
            MASS_PION_CHARGED,
            neg.momentum,
            MASS_PION_CHARGED,
        ),
    }
}
