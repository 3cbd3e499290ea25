//! Analysis configuration and its startup validation.
//!
//! [`AnalysisConfig`] mirrors the user-facing settings, including the raw
//! integer switches (`-1`, `0`, `1` for detector requirements and `-1..=4`
//! for tracking PID hypotheses). [`AnalysisConfig::validate`] turns it into a
//! [`ValidatedConfig`] whose typed cuts cannot hold invalid values, so the
//! selection code never has to fail while processing events.

use crate::error::{ConfigError, Error, Result};
use crate::histogram::AxisSpec;
use crate::track::PidHypothesis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Requirement on the presence of a detector signal for one daughter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectorRequirement {
    /// Reject tracks that have the signal.
    Exclude,
    /// Accept regardless.
    #[default]
    NoConstraint,
    /// Reject tracks that lack the signal.
    Require,
}

impl DetectorRequirement {
    /// Parses the user-facing flag (`-1`, `0`, `1`).
    #[must_use]
    pub fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            -1 => Some(Self::Exclude),
            0 => Some(Self::NoConstraint),
            1 => Some(Self::Require),
            _ => None,
        }
    }

    /// Returns the user-facing flag.
    #[must_use]
    pub fn flag(self) -> i32 {
        match self {
            Self::Exclude => -1,
            Self::NoConstraint => 0,
            Self::Require => 1,
        }
    }

    /// Gates on whether the detector signal is present.
    #[inline]
    #[must_use]
    pub fn passes(self, present: bool) -> bool {
        match self {
            Self::Exclude => !present,
            Self::NoConstraint => true,
            Self::Require => present,
        }
    }
}

/// Requirement on the PID hypothesis used in tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PidHypothesisCut {
    #[default]
    Any,
    Exactly(PidHypothesis),
}

impl PidHypothesisCut {
    /// Parses the user-facing index (`-1` for no selection, `0..=4` otherwise).
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        if index == -1 {
            Some(Self::Any)
        } else {
            PidHypothesis::from_index(index).map(Self::Exactly)
        }
    }

    /// Returns true if a track with the given tag passes.
    #[inline]
    #[must_use]
    pub fn passes(self, tag: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(hypothesis) => hypothesis.tag() == tag,
        }
    }
}

/// Pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AnalysisMode {
    /// Reconstructed data only.
    Data,
    /// Reconstructed data with simulated truth.
    Mc,
}

impl AnalysisMode {
    /// Short lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Mc => "mc",
        }
    }
}

/// How the candidate mass is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MassMode {
    /// Use the mass stored on the candidate.
    #[default]
    Stored,
    /// Recompute from the daughter track momenta as two charged pions.
    FromDaughters,
}

/// User-facing candidate selection settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectionConfig {
    /// Minimum cosine of the pointing angle (pre-filter).
    pub cos_pa: f64,
    /// Maximum DCA between daughters (pre-filter).
    pub dca_v0_daughters: f64,
    /// Minimum |DCA| of the positive daughter to the PV (pre-filter).
    pub dca_pos_to_pv: f64,
    /// Minimum |DCA| of the negative daughter to the PV (pre-filter).
    pub dca_neg_to_pv: f64,
    /// Minimum decay radius.
    pub radius: f64,
    /// Maximum |rapidity|.
    pub rapidity: f64,
    /// Maximum proper decay length in units of c*tau.
    pub lifetime: f64,
    /// Maximum |TPC n-sigma| under the pion hypothesis.
    pub max_tpc_nsigma: f64,
    /// Minimum number of crossed TPC rows (negative disables).
    pub min_tpc_crossed_rows: f64,
    pub its_ib_selection_pos: i32,
    pub its_ib_selection_neg: i32,
    pub tof_selection_pos: i32,
    pub tof_selection_neg: i32,
    pub trd_selection_pos: i32,
    pub trd_selection_neg: i32,
    pub pid_hypothesis_pos: i32,
    pub pid_hypothesis_neg: i32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cos_pa: 0.995,
            dca_v0_daughters: 1.0,
            dca_pos_to_pv: 0.1,
            dca_neg_to_pv: 0.1,
            radius: 0.9,
            rapidity: 0.5,
            lifetime: 3.0,
            max_tpc_nsigma: 10.0,
            min_tpc_crossed_rows: -1.0,
            its_ib_selection_pos: 0,
            its_ib_selection_neg: 0,
            tof_selection_pos: 0,
            tof_selection_neg: 0,
            trd_selection_pos: 0,
            trd_selection_neg: 0,
            pid_hypothesis_pos: -1,
            pid_hypothesis_neg: -1,
        }
    }
}

/// User-facing event selection settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventSelectionConfig {
    /// Accepted |z| of the primary vertex (cm).
    pub z_vertex_cut: f64,
    /// Require the upstream event-selection flag.
    pub event_selection: bool,
}

impl Default for EventSelectionConfig {
    fn default() -> Self {
        Self {
            z_vertex_cut: 10.0,
            event_selection: true,
        }
    }
}

/// Optional histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistogramOptions {
    /// Book and fill the multidimensional mass histogram.
    pub use_multidim_histogram: bool,
    /// Book and fill the TPC signal vs PID hypothesis histogram.
    pub enable_tpc_plot: bool,
}

/// Axis binning for every booked histogram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BinningConfig {
    pub mass: AxisSpec,
    pub pt: AxisSpec,
    pub pt_res: AxisSpec,
    pub pt_res_rel: AxisSpec,
    pub inv_pt_res: AxisSpec,
    pub eta: AxisSpec,
    pub eta_daughters: AxisSpec,
    pub phi: AxisSpec,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            mass: AxisSpec::new(200, 0.4, 0.6, "m (GeV/c^2)"),
            pt: AxisSpec::new(200, 0.0, 10.0, "pT (GeV/c)"),
            pt_res: AxisSpec::new(200, -1.2, 1.2, "Delta pT (GeV/c)"),
            pt_res_rel: AxisSpec::new(200, -0.2, 0.2, "(pT rec - pT MC)/pT MC"),
            inv_pt_res: AxisSpec::new(200, -1.2, 1.2, "1/pT - 1/pT MC (GeV/c)^-1"),
            eta: AxisSpec::new(2, -1.0, 1.0, "eta"),
            eta_daughters: AxisSpec::new(100, -1.0, 1.0, "eta daughter"),
            phi: AxisSpec::new(100, 0.0, 6.28, "phi"),
        }
    }
}

impl BinningConfig {
    /// Validates every axis.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for the first malformed axis.
    pub fn validate(&self) -> Result<()> {
        for (name, axis) in [
            ("mass", &self.mass),
            ("pt", &self.pt),
            ("pt_res", &self.pt_res),
            ("pt_res_rel", &self.pt_res_rel),
            ("inv_pt_res", &self.inv_pt_res),
            ("eta", &self.eta),
            ("eta_daughters", &self.eta_daughters),
            ("phi", &self.phi),
        ] {
            axis.validate(name)?;
        }
        Ok(())
    }
}

/// Complete user-facing configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    pub selection: SelectionConfig,
    pub event_selection: EventSelectionConfig,
    pub histograms: HistogramOptions,
    pub binning: BinningConfig,
    /// Recompute the invariant mass from the daughters.
    pub mass_from_daughters: bool,
    /// Run the data pipeline.
    pub process_data: bool,
    /// Run the MC pipeline.
    pub process_mc: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            event_selection: EventSelectionConfig::default(),
            histograms: HistogramOptions::default(),
            binning: BinningConfig::default(),
            mass_from_daughters: false,
            process_data: true,
            process_mc: false,
        }
    }
}

impl AnalysisConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate selection settings.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Enable or disable the multidimensional histogram.
    #[must_use]
    pub fn with_multidim_histogram(mut self, enabled: bool) -> Self {
        self.histograms.use_multidim_histogram = enabled;
        self
    }

    /// Enable or disable the TPC diagnostic histogram.
    #[must_use]
    pub fn with_tpc_plot(mut self, enabled: bool) -> Self {
        self.histograms.enable_tpc_plot = enabled;
        self
    }

    /// Select mass recomputation from daughters.
    #[must_use]
    pub fn with_mass_from_daughters(mut self, enabled: bool) -> Self {
        self.mass_from_daughters = enabled;
        self
    }

    /// Select which pipelines run.
    #[must_use]
    pub fn with_modes(mut self, process_data: bool, process_mc: bool) -> Self {
        self.process_data = process_data;
        self.process_mc = process_mc;
        self
    }

    /// Validates the configuration once, before processing.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for out-of-range switches, non-finite
    /// thresholds or no enabled mode, and [`Error::InvalidBinning`] for bad axes.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        if !self.process_data && !self.process_mc {
            return Err(ConfigError::NoProcessingMode.into());
        }

        let s = &self.selection;
        for (name, value) in [
            ("cos_pa", s.cos_pa),
            ("dca_v0_daughters", s.dca_v0_daughters),
            ("dca_pos_to_pv", s.dca_pos_to_pv),
            ("dca_neg_to_pv", s.dca_neg_to_pv),
            ("radius", s.radius),
            ("rapidity", s.rapidity),
            ("lifetime", s.lifetime),
            ("max_tpc_nsigma", s.max_tpc_nsigma),
            ("min_tpc_crossed_rows", s.min_tpc_crossed_rows),
            ("z_vertex_cut", self.event_selection.z_vertex_cut),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold {
                    name,
                    value: value.to_string(),
                }
                .into());
            }
        }
        self.binning.validate()?;

        let cuts = SelectionCuts {
            rapidity: s.rapidity,
            radius: s.radius,
            lifetime: s.lifetime,
            max_tpc_nsigma: s.max_tpc_nsigma,
            min_tpc_crossed_rows: s.min_tpc_crossed_rows,
            its_ib_pos: detector("ITS", "positive", s.its_ib_selection_pos)?,
            its_ib_neg: detector("ITS", "negative", s.its_ib_selection_neg)?,
            tof_pos: detector("TOF", "positive", s.tof_selection_pos)?,
            tof_neg: detector("TOF", "negative", s.tof_selection_neg)?,
            trd_pos: detector("TRD", "positive", s.trd_selection_pos)?,
            trd_neg: detector("TRD", "negative", s.trd_selection_neg)?,
            pid_pos: pid_hypothesis("positive", s.pid_hypothesis_pos)?,
            pid_neg: pid_hypothesis("negative", s.pid_hypothesis_neg)?,
        };

        let prefilter = PrefilterCuts {
            cos_pa: s.cos_pa,
            dca_v0_daughters: s.dca_v0_daughters,
            dca_pos_to_pv: s.dca_pos_to_pv,
            dca_neg_to_pv: s.dca_neg_to_pv,
            z_vertex_cut: self.event_selection.z_vertex_cut,
            event_selection: self.event_selection.event_selection,
        };

        Ok(ValidatedConfig {
            cuts,
            prefilter,
            mass_mode: if self.mass_from_daughters {
                MassMode::FromDaughters
            } else {
                MassMode::Stored
            },
            histograms: self.histograms,
            binning: self.binning.clone(),
            process_data: self.process_data,
            process_mc: self.process_mc,
        })
    }
}

fn detector(
    detector: &'static str,
    daughter: &'static str,
    value: i32,
) -> Result<DetectorRequirement> {
    DetectorRequirement::from_flag(value).ok_or(Error::ConfigError(
        ConfigError::InvalidDetectorSelection {
            detector,
            daughter,
            value,
        },
    ))
}

fn pid_hypothesis(daughter: &'static str, value: i32) -> Result<PidHypothesisCut> {
    PidHypothesisCut::from_index(value).ok_or(Error::ConfigError(
        ConfigError::InvalidPidHypothesis { daughter, value },
    ))
}

/// Typed, already-valid selection cuts applied by the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCuts {
    pub rapidity: f64,
    pub radius: f64,
    pub lifetime: f64,
    pub max_tpc_nsigma: f64,
    pub min_tpc_crossed_rows: f64,
    pub its_ib_pos: DetectorRequirement,
    pub its_ib_neg: DetectorRequirement,
    pub tof_pos: DetectorRequirement,
    pub tof_neg: DetectorRequirement,
    pub trd_pos: DetectorRequirement,
    pub trd_neg: DetectorRequirement,
    pub pid_pos: PidHypothesisCut,
    pub pid_neg: PidHypothesisCut,
}

impl Default for SelectionCuts {
    fn default() -> Self {
        Self {
            rapidity: 0.5,
            radius: 0.9,
            lifetime: 3.0,
            max_tpc_nsigma: 10.0,
            min_tpc_crossed_rows: -1.0,
            its_ib_pos: DetectorRequirement::NoConstraint,
            its_ib_neg: DetectorRequirement::NoConstraint,
            tof_pos: DetectorRequirement::NoConstraint,
            tof_neg: DetectorRequirement::NoConstraint,
            trd_pos: DetectorRequirement::NoConstraint,
            trd_neg: DetectorRequirement::NoConstraint,
            pid_pos: PidHypothesisCut::Any,
            pid_neg: PidHypothesisCut::Any,
        }
    }
}

impl SelectionCuts {
    /// Set the rapidity cut.
    #[must_use]
    pub fn with_rapidity(mut self, rapidity: f64) -> Self {
        self.rapidity = rapidity;
        self
    }

    /// Set the minimum decay radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the lifetime cut in units of c*tau.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: f64) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Set the maximum TPC n-sigma.
    #[must_use]
    pub fn with_max_tpc_nsigma(mut self, nsigma: f64) -> Self {
        self.max_tpc_nsigma = nsigma;
        self
    }

    /// Set the minimum number of crossed TPC rows.
    #[must_use]
    pub fn with_min_tpc_crossed_rows(mut self, rows: f64) -> Self {
        self.min_tpc_crossed_rows = rows;
        self
    }

    /// Set the ITS inner-barrel requirement for both daughters.
    #[must_use]
    pub fn with_its_inner_barrel(
        mut self,
        pos: DetectorRequirement,
        neg: DetectorRequirement,
    ) -> Self {
        self.its_ib_pos = pos;
        self.its_ib_neg = neg;
        self
    }

    /// Set the TOF requirement for both daughters.
    #[must_use]
    pub fn with_tof(mut self, pos: DetectorRequirement, neg: DetectorRequirement) -> Self {
        self.tof_pos = pos;
        self.tof_neg = neg;
        self
    }

    /// Set the TRD requirement for both daughters.
    #[must_use]
    pub fn with_trd(mut self, pos: DetectorRequirement, neg: DetectorRequirement) -> Self {
        self.trd_pos = pos;
        self.trd_neg = neg;
        self
    }

    /// Set the tracking PID hypothesis requirement for both daughters.
    #[must_use]
    pub fn with_pid_hypothesis(mut self, pos: PidHypothesisCut, neg: PidHypothesisCut) -> Self {
        self.pid_pos = pos;
        self.pid_neg = neg;
        self
    }
}

/// Coarse event and candidate cuts applied before the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefilterCuts {
    pub cos_pa: f64,
    pub dca_v0_daughters: f64,
    pub dca_pos_to_pv: f64,
    pub dca_neg_to_pv: f64,
    pub z_vertex_cut: f64,
    pub event_selection: bool,
}

impl Default for PrefilterCuts {
    fn default() -> Self {
        let selection = SelectionConfig::default();
        let events = EventSelectionConfig::default();
        Self {
            cos_pa: selection.cos_pa,
            dca_v0_daughters: selection.dca_v0_daughters,
            dca_pos_to_pv: selection.dca_pos_to_pv,
            dca_neg_to_pv: selection.dca_neg_to_pv,
            z_vertex_cut: events.z_vertex_cut,
            event_selection: events.event_selection,
        }
    }
}

/// Configuration after startup validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub cuts: SelectionCuts,
    pub prefilter: PrefilterCuts,
    pub mass_mode: MassMode,
    pub histograms: HistogramOptions,
    pub binning: BinningConfig,
    pub process_data: bool,
    pub process_mc: bool,
}

impl ValidatedConfig {
    /// Enabled pipeline variants, data first.
    #[must_use]
    pub fn modes(&self) -> Vec<AnalysisMode> {
        let mut modes = Vec::with_capacity(2);
        if self.process_data {
            modes.push(AnalysisMode::Data);
        }
        if self.process_mc {
            modes.push(AnalysisMode::Mc);
        }
        modes
    }
}
