//! Per-event analysis pipeline: gate, mass, truth matching, accumulation.

use std::ops::{Add, AddAssign};

use log::{debug, info, warn};
use rayon::prelude::*;
use v0qa_core::candidate::V0Candidate;
use v0qa_core::config::{AnalysisMode, HistogramOptions, MassMode, ValidatedConfig};
use v0qa_core::event::Event;
use v0qa_core::histogram::{HistogramId, HistogramSink};
use v0qa_core::track::Track;

use crate::mass::candidate_mass;
use crate::residuals::{DaughterResiduals, Residuals};
use crate::selection::SelectionCascade;
use crate::truth::{TruthMatch, TruthMatcher};

/// `h1_events` bin for every processed event.
pub const EVENTS_BIN: f64 = 0.5;
/// `h1_events` bin for every candidate entering the cascade.
pub const CANDIDATES_BIN: f64 = 1.5;

/// Counts gathered while processing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingSummary {
    /// Events processed.
    pub events: u64,
    /// Candidates that entered the cascade.
    pub candidates: u64,
    /// Candidates rejected by the cascade.
    pub rejected: u64,
    /// Candidates skipped by truth matching (MC only).
    pub unmatched: u64,
    /// Candidates whose daughters are missing from the event.
    pub malformed: u64,
    /// Candidates accumulated into the histograms.
    pub accumulated: u64,
}

impl Add for ProcessingSummary {
    type Output = ProcessingSummary;

    fn add(mut self, rhs: ProcessingSummary) -> ProcessingSummary {
        self += rhs;
        self
    }
}

impl AddAssign for ProcessingSummary {
    fn add_assign(&mut self, rhs: ProcessingSummary) {
        self.events += rhs.events;
        self.candidates += rhs.candidates;
        self.rejected += rhs.rejected;
        self.unmatched += rhs.unmatched;
        self.malformed += rhs.malformed;
        self.accumulated += rhs.accumulated;
    }
}

enum Outcome {
    Accumulated,
    Rejected,
    Unmatched,
    Malformed,
}

/// The V0 resolution analysis for one pipeline variant.
///
/// Data and MC share the cascade and the mass computation; MC adds truth
/// matching and the residual histograms. The analysis holds no mutable
/// state, so one instance can process events from many threads into a
/// shared sink.
#[derive(Debug, Clone)]
pub struct V0Analysis {
    mode: AnalysisMode,
    cascade: SelectionCascade,
    mass_mode: MassMode,
    histograms: HistogramOptions,
}

impl V0Analysis {
    /// Creates the analysis for `mode` from a validated configuration.
    #[must_use]
    pub fn new(config: &ValidatedConfig, mode: AnalysisMode) -> Self {
        info!(
            "V0 analysis ({}): mass {:?}, multidim {}, tpc plot {}",
            mode.name(),
            config.mass_mode,
            config.histograms.use_multidim_histogram,
            config.histograms.enable_tpc_plot
        );
        Self {
            mode,
            cascade: SelectionCascade::new(config.cuts),
            mass_mode: config.mass_mode,
            histograms: config.histograms,
        }
    }

    /// Pipeline variant.
    #[must_use]
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Selection cascade.
    #[must_use]
    pub fn cascade(&self) -> &SelectionCascade {
        &self.cascade
    }

    /// Processes one event into `sink`.
    pub fn process_event<S>(&self, event: &Event, sink: &S) -> ProcessingSummary
    where
        S: HistogramSink + ?Sized,
    {
        let mut summary = ProcessingSummary {
            events: 1,
            ..ProcessingSummary::default()
        };
        sink.fill(HistogramId::Events, &[EVENTS_BIN]);

        let matcher = TruthMatcher::new(event);
        for v0 in &event.v0s {
            summary.candidates += 1;
            sink.fill(HistogramId::Events, &[CANDIDATES_BIN]);

            match self.process_candidate(event, &matcher, v0, sink) {
                Outcome::Accumulated => summary.accumulated += 1,
                Outcome::Rejected => summary.rejected += 1,
                Outcome::Unmatched => summary.unmatched += 1,
                Outcome::Malformed => summary.malformed += 1,
            }
        }
        summary
    }

    /// Processes events in parallel into a shared sink.
    pub fn process_events<S>(&self, events: &[Event], sink: &S) -> ProcessingSummary
    where
        S: HistogramSink + ?Sized,
    {
        events
            .par_iter()
            .map(|event| self.process_event(event, sink))
            .reduce(ProcessingSummary::default, Add::add)
    }

    fn process_candidate<S>(
        &self,
        event: &Event,
        matcher: &TruthMatcher<'_>,
        v0: &V0Candidate,
        sink: &S,
    ) -> Outcome
    where
        S: HistogramSink + ?Sized,
    {
        let Some((pos, neg)) = event.daughters(v0) else {
            warn!(
                "candidate references missing daughters ({}, {}) in an event with {} tracks",
                v0.pos_track,
                v0.neg_track,
                event.tracks.len()
            );
            return Outcome::Malformed;
        };

        if let Some(predicate) = self.cascade.first_failure(v0, pos, neg, &event.collision) {
            debug!("candidate rejected by {predicate}");
            return Outcome::Rejected;
        }

        let truth = match self.mode {
            AnalysisMode::Data => None,
            AnalysisMode::Mc => match matcher.match_candidate(v0, pos, neg) {
                Ok(truth) => Some(truth),
                Err(reason) => {
                    debug!("candidate skipped: {reason}");
                    return Outcome::Unmatched;
                }
            },
        };

        let mass = candidate_mass(self.mass_mode, v0, pos, neg);
        self.accumulate(mass, v0, pos, neg, truth.as_ref(), sink);
        Outcome::Accumulated
    }

    fn accumulate<S>(
        &self,
        mass: f64,
        v0: &V0Candidate,
        pos: &Track,
        neg: &Track,
        truth: Option<&TruthMatch<'_>>,
        sink: &S,
    ) where
        S: HistogramSink + ?Sized,
    {
        fill_defined(sink, HistogramId::MassPt, &[mass, v0.pt()]);
        fill_defined(sink, HistogramId::MassEta, &[mass, v0.eta()]);
        fill_defined(sink, HistogramId::MassPhi, &[mass, v0.phi()]);

        let residuals = truth.map(|t| Residuals::compute(v0, t));

        if self.histograms.use_multidim_histogram {
            let mut values = vec![mass, v0.pt(), v0.eta(), v0.phi(), pos.eta(), neg.eta()];
            let complete = match (truth, &residuals) {
                (Some(t), Some(r)) => match (r.positive.inverse_pt, r.negative.inverse_pt) {
                    (Some(inv_pos), Some(inv_neg)) => {
                        let genuine = if t.is_genuine_signal() { 1.0 } else { 0.0 };
                        values.extend([inv_pos, inv_neg, genuine]);
                        true
                    }
                    _ => false,
                },
                _ => true,
            };
            if complete {
                fill_defined(sink, HistogramId::MassMultidim, &values);
            } else {
                debug!("multidimensional entry skipped: undefined 1/pT residual");
            }
        }

        if self.histograms.enable_tpc_plot {
            fill_tpc_plot(pos, 1.0, sink);
            fill_tpc_plot(neg, -1.0, sink);
        }

        if let Some(r) = residuals {
            fill_residuals(mass, &r, sink);
        }
    }
}

/// Fills `id` unless a value is NaN, which no bin can hold.
fn fill_defined<S>(sink: &S, id: HistogramId, values: &[f64])
where
    S: HistogramSink + ?Sized,
{
    if values.iter().any(|v| v.is_nan()) {
        debug!("{} fill skipped: undefined value in {values:?}", id.name());
    } else {
        sink.fill(id, values);
    }
}

fn fill_tpc_plot<S>(track: &Track, sign: f64, sink: &S)
where
    S: HistogramSink + ?Sized,
{
    if let Some(pid) = track.pid {
        fill_defined(
            sink,
            HistogramId::TpcVsPidHypothesis,
            &[
                sign * pid.tpc_inner_param,
                pid.tpc_signal,
                f64::from(track.pid_for_tracking),
            ],
        );
    }
}

fn fill_residuals<S>(mass: f64, residuals: &Residuals, sink: &S)
where
    S: HistogramSink + ?Sized,
{
    let daughters = [
        (
            &residuals.positive,
            [
                HistogramId::GenPtPosPtRes,
                HistogramId::GenPxPosPxRes,
                HistogramId::GenPyPosPyRes,
                HistogramId::GenPzPosPzRes,
            ],
            HistogramId::MassPosPtRes,
        ),
        (
            &residuals.negative,
            [
                HistogramId::GenPtNegPtRes,
                HistogramId::GenPxNegPxRes,
                HistogramId::GenPyNegPyRes,
                HistogramId::GenPzNegPzRes,
            ],
            HistogramId::MassNegPtRes,
        ),
    ];

    for (daughter, relative_ids, mass_id) in daughters {
        fill_relative(daughter, relative_ids, sink);
        fill_defined(sink, mass_id, &[mass, daughter.pt.absolute]);
    }
}

fn fill_relative<S>(daughter: &DaughterResiduals, ids: [HistogramId; 4], sink: &S)
where
    S: HistogramSink + ?Sized,
{
    let components = [daughter.pt, daughter.px, daughter.py, daughter.pz];
    for (id, component) in ids.into_iter().zip(components) {
        match component.relative {
            Some(relative) => fill_defined(sink, id, &[relative, component.truth]),
            None => debug!("{} fill skipped: zero truth value", id.name()),
        }
    }
}
