//! Simulated-truth lookup for candidates and their daughters.

use std::fmt;

use v0qa_core::candidate::V0Candidate;
use v0qa_core::constants::{PDG_K0_SHORT, PDG_PION};
use v0qa_core::event::{Event, TruthParticle};
use v0qa_core::track::Track;

/// Reason a candidate could not be matched to truth.
///
/// These are ordinary outcomes in simulated data, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFailure {
    /// The positive daughter has no truth particle.
    MissingPositive,
    /// The negative daughter has no truth particle.
    MissingNegative,
    /// The daughters are not a pi+ pi- pair.
    WrongSpecies {
        /// PDG code of the positive daughter's truth.
        positive: i32,
        /// PDG code of the negative daughter's truth.
        negative: i32,
    },
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPositive => f.write_str("positive daughter has no truth"),
            Self::MissingNegative => f.write_str("negative daughter has no truth"),
            Self::WrongSpecies { positive, negative } => {
                write!(f, "daughter species ({positive}, {negative}) are not (211, -211)")
            }
        }
    }
}

/// Truth counterparts of a matched candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthMatch<'a> {
    /// Truth of the positive daughter.
    pub positive: &'a TruthParticle,
    /// Truth of the negative daughter.
    pub negative: &'a TruthParticle,
    /// Truth of the candidate, if any.
    pub candidate: Option<&'a TruthParticle>,
}

impl TruthMatch<'_> {
    /// Returns true if the candidate itself is a simulated K0-short.
    #[must_use]
    pub fn is_genuine_signal(&self) -> bool {
        self.candidate.is_some_and(|p| p.pdg_code == PDG_K0_SHORT)
    }
}

/// Resolves truth references against one event's truth table.
#[derive(Debug, Clone, Copy)]
pub struct TruthMatcher<'a> {
    event: &'a Event,
}

impl<'a> TruthMatcher<'a> {
    /// Creates a matcher over an event.
    #[must_use]
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }

    /// Truth particle of a track.
    #[must_use]
    pub fn truth_of_track(&self, track: &Track) -> Option<&'a TruthParticle> {
        self.event.mc_particle(track.mc_particle)
    }

    /// Truth particle of a candidate.
    #[must_use]
    pub fn truth_of_candidate(&self, v0: &V0Candidate) -> Option<&'a TruthParticle> {
        self.event.mc_particle(v0.mc_particle)
    }

    /// Returns true if the candidate has truth and it is a K0-short.
    #[must_use]
    pub fn is_genuine_signal(&self, v0: &V0Candidate) -> bool {
        self.truth_of_candidate(v0)
            .is_some_and(|p| p.pdg_code == PDG_K0_SHORT)
    }

    /// Resolves both daughters and checks they are a pi+ pi- pair.
    ///
    /// # Errors
    /// Returns the [`MatchFailure`] that disqualifies the candidate.
    pub fn match_candidate(
        &self,
        v0: &V0Candidate,
        pos: &Track,
        neg: &Track,
    ) -> Result<TruthMatch<'a>, MatchFailure> {
        let positive = self
            .truth_of_track(pos)
            .ok_or(MatchFailure::MissingPositive)?;
        let negative = self
            .truth_of_track(neg)
            .ok_or(MatchFailure::MissingNegative)?;
        if positive.pdg_code != PDG_PION || negative.pdg_code != -PDG_PION {
            return Err(MatchFailure::WrongSpecies {
                positive: positive.pdg_code,
                negative: negative.pdg_code,
            });
        }
        Ok(TruthMatch {
            positive,
            negative,
            candidate: self.truth_of_candidate(v0),
        })
    }
}
