//! v0qa-core: Records, configuration and histograms for V0 resolution analysis.
//!
//! This crate provides the event, track and candidate records the analysis
//! reads, the validated configuration that drives the selection, and the
//! histogram sink the analysis fills.
//!

pub mod candidate;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod histogram;
pub mod kinematics;
pub mod registry;
pub mod track;

pub use candidate::V0Candidate;
pub use config::{
    AnalysisConfig, AnalysisMode, BinningConfig, DetectorRequirement, EventSelectionConfig,
    HistogramOptions, MassMode, PidHypothesisCut, PrefilterCuts, SelectionConfig, SelectionCuts,
    ValidatedConfig,
};
pub use error::{ConfigError, Error, Result};
pub use event::{Collision, Event, TruthParticle};
pub use histogram::{AxisSpec, Histogram, HistogramId, HistogramSink, HistogramSnapshot};
pub use kinematics::{Momentum, Position};
pub use registry::HistogramRegistry;
pub use track::{PidHypothesis, Track, TrackPid};
