//! v0qa-algorithms: Candidate selection and resolution measurement.
//!
//! This crate provides the analysis stages applied to each V0 candidate:
//! - **Pre-filters** - coarse event and topology cuts
//! - **Selection cascade** - ordered quality predicates on the candidate and its daughters
//! - **Mass** - stored or recomputed from the daughters
//! - **Truth matching** and **residuals** - MC only
//! - **Pipeline** - per-event orchestration into a [`HistogramSink`]
//!
#![warn(missing_docs)]

mod mass;
pub mod prefilter;
mod processing;
mod residuals;
mod selection;
mod truth;

pub use mass::candidate_mass;
pub use prefilter::{candidate_passes, event_passes};
pub use processing::{ProcessingSummary, V0Analysis, CANDIDATES_BIN, EVENTS_BIN};
pub use residuals::{ComponentResidual, DaughterResiduals, Residuals};
pub use selection::{Predicate, SelectionCascade};
pub use truth::{MatchFailure, TruthMatch, TruthMatcher};

// Re-export the sink the pipeline fills
pub use v0qa_core::histogram::{HistogramId, HistogramSink};
