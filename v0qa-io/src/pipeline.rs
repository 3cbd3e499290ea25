//! Batch processing of event files into histogram registries.
//!
//! The driver applies the event and candidate pre-filters, then hands each
//! batch to every enabled analysis variant. Batches are processed in
//! parallel with rayon; each variant fills its own registry.

use crate::reader::EventFileReader;
use crate::Result;
use log::{debug, info};
use std::path::Path;
use v0qa_algorithms::{candidate_passes, event_passes, ProcessingSummary, V0Analysis};
use v0qa_core::config::{AnalysisMode, ValidatedConfig};
use v0qa_core::event::Event;
use v0qa_core::registry::HistogramRegistry;

/// Default number of events per batch.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Pre-filter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrefilterSummary {
    pub events_read: u64,
    pub events_selected: u64,
    pub candidates_read: u64,
    pub candidates_selected: u64,
}

/// Output of one analysis variant.
#[derive(Debug)]
pub struct ModeOutput {
    pub mode: AnalysisMode,
    /// Name prefix in output files; empty unless several variants ran.
    pub prefix: String,
    pub registry: HistogramRegistry,
    pub summary: ProcessingSummary,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub prefilter: PrefilterSummary,
    pub modes: Vec<ModeOutput>,
}

impl AnalysisOutput {
    /// Returns the output of one variant.
    #[must_use]
    pub fn mode(&self, mode: AnalysisMode) -> Option<&ModeOutput> {
        self.modes.iter().find(|m| m.mode == mode)
    }
}

struct ModeState {
    analysis: V0Analysis,
    registry: HistogramRegistry,
    summary: ProcessingSummary,
}

/// Drives the analysis over batches of events.
pub struct AnalysisDriver {
    config: ValidatedConfig,
    batch_size: usize,
    modes: Vec<ModeState>,
    prefilter: PrefilterSummary,
}

impl AnalysisDriver {
    /// Creates a driver with one registry per enabled variant.
    #[must_use]
    pub fn new(config: ValidatedConfig) -> Self {
        let modes = config
            .modes()
            .into_iter()
            .map(|mode| ModeState {
                analysis: V0Analysis::new(&config, mode),
                registry: HistogramRegistry::book(&config, mode),
                summary: ProcessingSummary::default(),
            })
            .collect::<Vec<_>>();
        info!(
            "enabled modes: {}",
            modes
                .iter()
                .map(|m| m.analysis.mode().name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            config,
            batch_size: DEFAULT_BATCH_SIZE,
            modes,
            prefilter: PrefilterSummary::default(),
        }
    }

    /// Set the number of events per batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of events per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Applies the pre-filters to a batch in place.
    ///
    /// Events failing the event selection are dropped; surviving events
    /// keep only the candidates passing the topological cuts.
    pub fn prefilter(&mut self, events: &mut Vec<Event>) {
        let cuts = self.config.prefilter;
        let stats = &mut self.prefilter;
        stats.events_read += events.len() as u64;
        events.retain(|event| event_passes(&cuts, &event.collision));
        stats.events_selected += events.len() as u64;

        for event in events.iter_mut() {
            stats.candidates_read += event.v0s.len() as u64;
            event.v0s.retain(|v0| candidate_passes(&cuts, v0));
            stats.candidates_selected += event.v0s.len() as u64;
        }
    }

    /// Pre-filters and processes one batch with every variant.
    pub fn process_batch(&mut self, mut events: Vec<Event>) {
        self.prefilter(&mut events);
        for state in &mut self.modes {
            let summary = state.analysis.process_events(&events, &state.registry);
            state.summary += summary;
        }
        debug!("processed batch of {} selected events", events.len());
    }

    /// Streams a file through the driver batch by batch.
    ///
    /// # Errors
    /// Returns the first read, parse or validation error; batches already
    /// processed stay in the registries.
    pub fn process_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let reader = EventFileReader::open(&path)?;
        info!("reading {}", reader.path().display());
        for batch in reader.events()?.batches(self.batch_size) {
            self.process_batch(batch?);
        }
        Ok(())
    }

    /// Pre-filter counters so far.
    #[must_use]
    pub fn prefilter_summary(&self) -> PrefilterSummary {
        self.prefilter
    }

    /// Finishes the run.
    #[must_use]
    pub fn finish(self) -> AnalysisOutput {
        let several = self.modes.len() > 1;
        let modes = self
            .modes
            .into_iter()
            .map(|state| {
                let mode = state.analysis.mode();
                let prefix = if several && mode == AnalysisMode::Mc {
                    mode.name().to_string()
                } else {
                    String::new()
                };
                info!(
                    "{}: {} events, {} candidates, {} accumulated",
                    mode.name(),
                    state.summary.events,
                    state.summary.candidates,
                    state.summary.accumulated
                );
                ModeOutput {
                    mode,
                    prefix,
                    registry: state.registry,
                    summary: state.summary,
                }
            })
            .collect();
        AnalysisOutput {
            prefilter: self.prefilter,
            modes,
        }
    }
}
