//! Track records and the tracking PID hypothesis.

use crate::kinematics::Momentum;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Particle species assumed during track reconstruction.
///
/// Discriminants match the tag stored on tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PidHypothesis {
    Electron = 0,
    Muon = 1,
    Pion = 2,
    Kaon = 3,
    Proton = 4,
}

impl PidHypothesis {
    /// All hypotheses accepted as a selection value.
    pub const ALL: [PidHypothesis; 5] = [
        PidHypothesis::Electron,
        PidHypothesis::Muon,
        PidHypothesis::Pion,
        PidHypothesis::Kaon,
        PidHypothesis::Proton,
    ];

    /// Returns the integer tag used on tracks.
    #[inline]
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up a hypothesis by its selection index.
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|h| i32::from(h.tag()) == index)
    }
}

/// PID information attached to a track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPid {
    /// TPC n-sigma deviation from the pion hypothesis.
    pub tpc_nsigma_pi: f64,
    /// TPC n-sigma deviation from the proton hypothesis.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tpc_nsigma_pr: f64,
    /// TOF n-sigma deviation from the pion hypothesis.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tof_nsigma_pi: f64,
    /// TPC dE/dx signal (a.u.).
    #[cfg_attr(feature = "serde", serde(default))]
    pub tpc_signal: f64,
    /// Momentum at the TPC inner wall (GeV/c).
    #[cfg_attr(feature = "serde", serde(default))]
    pub tpc_inner_param: f64,
}

/// A reconstructed charged track.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    /// Momentum at the point of closest approach.
    pub momentum: Momentum,
    /// Whether the track has TPC clusters.
    pub has_tpc: bool,
    /// Whether the track is matched to TOF.
    pub has_tof: bool,
    /// Whether the track is matched to TRD.
    pub has_trd: bool,
    /// Number of ITS inner-barrel clusters.
    pub its_inner_barrel_clusters: u8,
    /// Number of crossed TPC pad rows.
    pub tpc_crossed_rows: i16,
    /// PID hypothesis tag used in tracking.
    pub pid_for_tracking: u8,
    /// PID block, absent when no PID tables were attached.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pid: Option<TrackPid>,
    /// Index of the matched truth particle (MC only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub mc_particle: Option<usize>,
}

impl Track {
    /// Creates a track with the given momentum and no detector information.
    #[must_use]
    pub fn new(momentum: Momentum) -> Self {
        Self {
            momentum,
            ..Self::default()
        }
    }

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

    /// Returns true if the track has at least one ITS inner-barrel cluster.
    #[inline]
    #[must_use]
    pub fn has_its_inner_barrel(&self) -> bool {
        self.its_inner_barrel_clusters > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_hypothesis_from_index() {
        assert_eq!(PidHypothesis::from_index(2), Some(PidHypothesis::Pion));
        assert_eq!(PidHypothesis::from_index(4), Some(PidHypothesis::Proton));
        assert_eq!(PidHypothesis::from_index(-1), None);
        assert_eq!(PidHypothesis::from_index(5), None);
        assert_eq!(PidHypothesis::Kaon.tag(), 3);
    }

    #[test]
    fn test_track_derived_kinematics() {
        let track = Track::new(Momentum::new(0.3, 0.4, 0.0));
        assert!((track.pt() - 0.5).abs() < 1e-12);
        assert!(track.eta().abs() < 1e-12);
        assert!(!track.has_its_inner_barrel());
    }
}
