//! Collision events and simulated truth particles.

use crate::candidate::V0Candidate;
use crate::error::{Error, Result};
use crate::kinematics::{Momentum, Position};
use crate::track::Track;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Primary collision information.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Collision {
    /// Primary vertex.
    pub vertex: Position,
    /// Upstream event-selection decision (sel8).
    pub sel8: bool,
}

/// Simulated particle (MC only).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TruthParticle {
    /// PDG species code.
    pub pdg_code: i32,
    /// Generated momentum.
    pub momentum: Momentum,
}

impl TruthParticle {
    /// Creates a truth particle.
    #[must_use]
    pub fn new(pdg_code: i32, momentum: Momentum) -> Self {
        Self { pdg_code, momentum }
    }

    /// Generated transverse momentum.
    #[inline]
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }
}

/// One collision with its track, V0 and truth tables.
///
/// V0s and tracks reference rows by index; truth references are only
/// populated for simulated data.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    pub collision: Collision,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tracks: Vec<Track>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub v0s: Vec<V0Candidate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mc_particles: Vec<TruthParticle>,
}

impl Event {
    /// Creates an event with empty tables.
    #[must_use]
    pub fn new(collision: Collision) -> Self {
        Self {
            collision,
            ..Self::default()
        }
    }

    /// Returns the daughters of a V0 as `(positive, negative)`.
    ///
    /// Returns `None` for a dangling index; [`Event::validate`] rules this out.
    #[must_use]
    pub fn daughters(&self, v0: &V0Candidate) -> Option<(&Track, &Track)> {
        Some((self.tracks.get(v0.pos_track)?, self.tracks.get(v0.neg_track)?))
    }

    /// Returns the truth particle at `index`, if any.
    #[inline]
    #[must_use]
    pub fn mc_particle(&self, index: Option<usize>) -> Option<&TruthParticle> {
        index.and_then(|i| self.mc_particles.get(i))
    }

    /// Returns true if the event carries simulated truth.
    #[must_use]
    pub fn has_truth(&self) -> bool {
        !self.mc_particles.is_empty()
    }

    /// Checks that every cross reference points at an existing row.
    ///
    /// # Errors
    /// Returns [`Error::DanglingReference`] for the first index that is out of range.
    pub fn validate(&self) -> Result<()> {
        let n_tracks = self.tracks.len();
        let n_mc = self.mc_particles.len();
        let check = |kind: &'static str, index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(Error::DanglingReference { kind, index, len })
            }
        };

        for v0 in &self.v0s {
            check("track", v0.pos_track, n_tracks)?;
            check("track", v0.neg_track, n_tracks)?;
            if let Some(mc) = v0.mc_particle {
                check("mc particle", mc, n_mc)?;
            }
        }
        for track in &self.tracks {
            if let Some(mc) = track.mc_particle {
                check("mc particle", mc, n_mc)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_v0() -> Event {
        let mut event = Event::new(Collision::default());
        event.tracks.push(Track::new(Momentum::new(0.5, 0.0, 0.0)));
        event.tracks.push(Track::new(Momentum::new(-0.5, 0.0, 0.0)));
        event.v0s.push(V0Candidate {
            pos_track: 0,
            neg_track: 1,
            ..V0Candidate::default()
        });
        event
    }

    #[test]
    fn test_daughters_lookup() {
        let event = event_with_v0();
        let (pos, neg) = event.daughters(&event.v0s[0]).unwrap();
        assert!(pos.momentum.px > 0.0);
        assert!(neg.momentum.px < 0.0);
        assert!(event.validate().is_ok());
        assert!(!event.has_truth());
    }

    #[test]
    fn test_validate_rejects_dangling_track() {
        let mut event = event_with_v0();
        event.v0s[0].neg_track = 7;
        assert_eq!(
            event.validate(),
            Err(Error::DanglingReference {
                kind: "track",
                index: 7,
                len: 2
            })
        );
        assert!(event.daughters(&event.v0s[0]).is_none());
    }

    #[test]
    fn test_validate_rejects_dangling_truth() {
        let mut event = event_with_v0();
        event.tracks[0].mc_particle = Some(0);
        assert!(matches!(
            event.validate(),
            Err(Error::DanglingReference { kind: "mc particle", .. })
        ));

        event.mc_particles.push(TruthParticle::new(211, Momentum::default()));
        assert!(event.validate().is_ok());
        assert!(event.mc_particle(Some(0)).is_some());
        assert!(event.mc_particle(None).is_none());
    }
}
