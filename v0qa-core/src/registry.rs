//! In-memory histogram registry used as the default [`HistogramSink`].

use std::collections::BTreeMap;

use crate::config::{AnalysisMode, ValidatedConfig};
use crate::error::{Error, Result};
use crate::histogram::{AxisSpec, Histogram, HistogramId, HistogramSink, HistogramSnapshot};

/// Axis of the processed-events counter.
#[must_use]
pub fn events_axis() -> AxisSpec {
    AxisSpec::new(10, 0.0, 10.0, "counter")
}

/// Axis of the genuine-signal flag.
#[must_use]
pub fn genuine_flag_axis() -> AxisSpec {
    AxisSpec::new(2, -0.5, 1.5, "true K0s")
}

/// Axes of the TPC signal vs tracking PID hypothesis histogram.
#[must_use]
pub fn tpc_plot_axes() -> Vec<AxisSpec> {
    vec![
        AxisSpec::new(200, -10.0, 10.0, "p/Z (GeV/c)"),
        AxisSpec::new(1000, 0.0, 1000.0, "dE/dx (a.u.)"),
        AxisSpec::new(10, -0.5, 9.5, "PID hypothesis"),
    ]
}

/// The set of histograms booked for one pipeline variant.
///
/// Fills addressed to a histogram that is not booked are dropped.
#[derive(Debug)]
pub struct HistogramRegistry {
    mode: AnalysisMode,
    histograms: BTreeMap<HistogramId, Histogram>,
}

impl HistogramRegistry {
    /// Books the histograms required by `mode` under `config`.
    #[must_use]
    pub fn book(config: &ValidatedConfig, mode: AnalysisMode) -> Self {
        let b = &config.binning;
        let mut histograms = BTreeMap::new();
        let mut dense = |id: HistogramId, axes: Vec<AxisSpec>| {
            histograms.insert(id, Histogram::dense(id, axes));
        };

        dense(HistogramId::Events, vec![events_axis()]);
        dense(HistogramId::MassPt, vec![b.mass.clone(), b.pt.clone()]);
        dense(HistogramId::MassEta, vec![b.mass.clone(), b.eta.clone()]);
        dense(HistogramId::MassPhi, vec![b.mass.clone(), b.phi.clone()]);

        if config.histograms.enable_tpc_plot {
            dense(HistogramId::TpcVsPidHypothesis, tpc_plot_axes());
        }

        if mode == AnalysisMode::Mc {
            dense(HistogramId::MassPosPtRes, vec![b.mass.clone(), b.pt_res.clone()]);
            dense(HistogramId::MassNegPtRes, vec![b.mass.clone(), b.pt_res.clone()]);
            for id in [
                HistogramId::GenPtPosPtRes,
                HistogramId::GenPxPosPxRes,
                HistogramId::GenPyPosPyRes,
                HistogramId::GenPzPosPzRes,
                HistogramId::GenPtNegPtRes,
                HistogramId::GenPxNegPxRes,
                HistogramId::GenPyNegPyRes,
                HistogramId::GenPzNegPzRes,
            ] {
                dense(id, vec![b.pt_res_rel.clone(), b.pt.clone()]);
            }
        }

        if config.histograms.use_multidim_histogram {
            let mut axes = vec![
                b.mass.clone(),
                b.pt.clone(),
                b.eta.clone(),
                b.phi.clone(),
                b.eta_daughters.clone(),
                b.eta_daughters.clone(),
            ];
            if mode == AnalysisMode::Mc {
                axes.push(b.inv_pt_res.clone());
                axes.push(b.inv_pt_res.clone());
                axes.push(genuine_flag_axis());
            }
            histograms.insert(
                HistogramId::MassMultidim,
                Histogram::sparse(HistogramId::MassMultidim, axes),
            );
        }

        Self { mode, histograms }
    }

    /// Pipeline variant this registry was booked for.
    #[must_use]
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Returns a booked histogram.
    #[must_use]
    pub fn get(&self, id: HistogramId) -> Option<&Histogram> {
        self.histograms.get(&id)
    }

    /// Returns true if `id` is booked.
    #[must_use]
    pub fn contains(&self, id: HistogramId) -> bool {
        self.histograms.contains_key(&id)
    }

    /// Booked histograms in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.values()
    }

    /// Number of booked histograms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Returns true if nothing is booked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Count in the cell of histogram `id` containing `values`.
    #[must_use]
    pub fn bin_content(&self, id: HistogramId, values: &[f64]) -> u64 {
        self.get(id).map_or(0, |h| h.content_at(values))
    }

    /// Number of accepted fills of histogram `id`.
    #[must_use]
    pub fn entries(&self, id: HistogramId) -> u64 {
        self.get(id).map_or(0, Histogram::entries)
    }

    /// Adds another registry with the same layout.
    ///
    /// # Errors
    /// Returns [`Error::LayoutMismatch`] if the booked sets or any axes differ.
    pub fn merge(&self, other: &HistogramRegistry) -> Result<()> {
        if self.mode != other.mode
            || !self.histograms.keys().eq(other.histograms.keys())
        {
            return Err(Error::LayoutMismatch(format!(
                "registries booked for '{}' and '{}' hold different histograms",
                self.mode.name(),
                other.mode.name()
            )));
        }
        for (mine, theirs) in self.histograms.values().zip(other.histograms.values()) {
            mine.merge(theirs)?;
        }
        Ok(())
    }

    /// Copies every booked histogram into serialisable form.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HistogramSnapshot> {
        self.iter().map(Histogram::snapshot).collect()
    }
}

impl HistogramSink for HistogramRegistry {
    fn fill(&self, id: HistogramId, values: &[f64]) {
        if let Some(histogram) = self.histograms.get(&id) {
            histogram.fill(values);
        }
    }
}
