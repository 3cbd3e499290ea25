//! Fixed-binning histograms and the accumulation sink trait.
//!
//! Every axis carries an underflow cell (index 0) and an overflow cell
//! (index `bins + 1`). Dense histograms store one atomic counter per cell in
//! row-major order; the multidimensional mass histogram uses sparse storage
//! since almost all of its cells stay empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regular binning of one axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisSpec {
    /// Number of regular bins.
    pub bins: usize,
    /// Lower edge of the first bin.
    pub min: f64,
    /// Upper edge of the last bin.
    pub max: f64,
    /// Axis title.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
}

impl AxisSpec {
    /// Creates an axis.
    pub fn new(bins: usize, min: f64, max: f64, title: impl Into<String>) -> Self {
        Self {
            bins,
            min,
            max,
            title: title.into(),
        }
    }

    /// Checks that the axis is usable.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for zero bins, non-finite edges or
    /// `max <= min`.
    pub fn validate(&self, name: &str) -> Result<()> {
        let reason = if self.bins == 0 {
            Some("number of bins must be positive".to_string())
        } else if !self.min.is_finite() || !self.max.is_finite() {
            Some("edges must be finite".to_string())
        } else if self.max <= self.min {
            Some(format!("max {} must exceed min {}", self.max, self.min))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidBinning {
                axis: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Number of cells including underflow and overflow.
    #[inline]
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.bins + 2
    }

    /// Width of one bin.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Cell index of a value: 0 underflow, `1..=bins` regular, `bins + 1`
    /// overflow. Returns `None` for NaN.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn cell(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        if value < self.min {
            return Some(0);
        }
        if value >= self.max {
            return Some(self.bins + 1);
        }
        let bin = ((value - self.min) / (self.max - self.min) * self.bins as f64) as usize;
        Some(bin.min(self.bins - 1) + 1)
    }

    /// Center of a regular cell (`1..=bins`).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn center(&self, cell: usize) -> f64 {
        self.min + (cell as f64 - 0.5) * self.bin_width()
    }

    /// Bin edges (`bins + 1` values).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn edges(&self) -> Vec<f64> {
        let width = self.bin_width();
        (0..=self.bins)
            .map(|i| self.min + i as f64 * width)
            .collect()
    }
}

/// Every histogram the analysis can book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HistogramId {
    Events,
    MassPt,
    MassEta,
    MassPhi,
    MassMultidim,
    TpcVsPidHypothesis,
    MassPosPtRes,
    MassNegPtRes,
    GenPtPosPtRes,
    GenPxPosPxRes,
    GenPyPosPyRes,
    GenPzPosPzRes,
    GenPtNegPtRes,
    GenPxNegPxRes,
    GenPyNegPyRes,
    GenPzNegPzRes,
}

impl HistogramId {
    /// All identifiers in booking order.
    pub const ALL: [HistogramId; 16] = [
        HistogramId::Events,
        HistogramId::MassPt,
        HistogramId::MassEta,
        HistogramId::MassPhi,
        HistogramId::MassMultidim,
        HistogramId::TpcVsPidHypothesis,
        HistogramId::MassPosPtRes,
        HistogramId::MassNegPtRes,
        HistogramId::GenPtPosPtRes,
        HistogramId::GenPxPosPxRes,
        HistogramId::GenPyPosPyRes,
        HistogramId::GenPzPosPzRes,
        HistogramId::GenPtNegPtRes,
        HistogramId::GenPxNegPxRes,
        HistogramId::GenPyNegPyRes,
        HistogramId::GenPzNegPzRes,
    ];

    /// Output name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Events => "h1_events",
            Self::MassPt => "h2_masspT",
            Self::MassEta => "h2_masseta",
            Self::MassPhi => "h2_massphi",
            Self::MassMultidim => "thn_mass",
            Self::TpcVsPidHypothesis => "h3_tpc_vs_pid_hypothesis",
            Self::MassPosPtRes => "h2_massPosPtRes",
            Self::MassNegPtRes => "h2_massNegPtRes",
            Self::GenPtPosPtRes => "h2_genPtPosPtRes",
            Self::GenPxPosPxRes => "h2_genPxPosPxRes",
            Self::GenPyPosPyRes => "h2_genPyPosPyRes",
            Self::GenPzPosPzRes => "h2_genPzPosPzRes",
            Self::GenPtNegPtRes => "h2_genPtNegPtRes",
            Self::GenPxNegPxRes => "h2_genPxNegPxRes",
            Self::GenPyNegPyRes => "h2_genPyNegPyRes",
            Self::GenPzNegPzRes => "h2_genPzNegPzRes",
        }
    }

    /// Looks up an identifier by output name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

/// Destination of accumulation requests.
///
/// `fill` must be safe to call concurrently and order-independent: the
/// final contents may not depend on the order in which fills arrive.
pub trait HistogramSink: Sync {
    /// Increments the cell containing `values` in histogram `id`.
    fn fill(&self, id: HistogramId, values: &[f64]);
}

enum Storage {
    Dense(Vec<AtomicU64>),
    Sparse(Mutex<HashMap<Vec<usize>, u64>>),
}

/// A histogram with fixed axes.
pub struct Histogram {
    id: HistogramId,
    axes: Vec<AxisSpec>,
    storage: Storage,
    entries: AtomicU64,
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram")
            .field("name", &self.id.name())
            .field("axes", &self.axes)
            .field("sparse", &self.is_sparse())
            .field("entries", &self.entries())
            .finish_non_exhaustive()
    }
}

impl Histogram {
    /// Creates a dense histogram.
    #[must_use]
    pub fn dense(id: HistogramId, axes: Vec<AxisSpec>) -> Self {
        let cells: usize = axes.iter().map(AxisSpec::n_cells).product();
        let counts = (0..cells).map(|_| AtomicU64::new(0)).collect();
        Self {
            id,
            axes,
            storage: Storage::Dense(counts),
            entries: AtomicU64::new(0),
        }
    }

    /// Creates a sparse histogram.
    #[must_use]
    pub fn sparse(id: HistogramId, axes: Vec<AxisSpec>) -> Self {
        Self {
            id,
            axes,
            storage: Storage::Sparse(Mutex::new(HashMap::new())),
            entries: AtomicU64::new(0),
        }
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> HistogramId {
        self.id
    }

    /// Output name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Axes.
    #[must_use]
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    /// Number of dimensions.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// Returns true for sparse storage.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        matches!(self.storage, Storage::Sparse(_))
    }

    /// Number of accepted fills, flow cells included.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    fn cells_of(&self, values: &[f64]) -> Option<Vec<usize>> {
        if values.len() != self.axes.len() {
            return None;
        }
        self.axes
            .iter()
            .zip(values)
            .map(|(axis, &value)| axis.cell(value))
            .collect()
    }

    fn linear_index(&self, cells: &[usize]) -> Option<usize> {
        let mut index = 0usize;
        for (axis, &cell) in self.axes.iter().zip(cells) {
            if cell >= axis.n_cells() {
                return None;
            }
            index = index * axis.n_cells() + cell;
        }
        Some(index)
    }

    fn add_at(&self, cells: Vec<usize>, count: u64) {
        match &self.storage {
            Storage::Dense(counts) => {
                if let Some(index) = self.linear_index(&cells) {
                    counts[index].fetch_add(count, Ordering::Relaxed);
                }
            }
            Storage::Sparse(map) => {
                let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
                *map.entry(cells).or_insert(0) += count;
            }
        }
    }

    /// Increments the cell containing `values`.
    ///
    /// Returns false, leaving the histogram untouched, if the number of
    /// values does not match the dimension or a value is NaN.
    pub fn fill(&self, values: &[f64]) -> bool {
        match self.cells_of(values) {
            Some(cells) => {
                self.add_at(cells, 1);
                self.entries.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Count stored in the cell with the given per-axis indices.
    #[must_use]
    pub fn cell_content(&self, cells: &[usize]) -> u64 {
        if cells.len() != self.axes.len() {
            return 0;
        }
        match &self.storage {
            Storage::Dense(counts) => self
                .linear_index(cells)
                .map_or(0, |index| counts[index].load(Ordering::Relaxed)),
            Storage::Sparse(map) => map
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(cells)
                .copied()
                .unwrap_or(0),
        }
    }

    /// Count stored in the cell containing `values`.
    #[must_use]
    pub fn content_at(&self, values: &[f64]) -> u64 {
        self.cells_of(values)
            .map_or(0, |cells| self.cell_content(&cells))
    }

    /// Sum of all cells, flow cells included.
    #[must_use]
    pub fn total(&self) -> u64 {
        match &self.storage {
            Storage::Dense(counts) => counts.iter().map(|c| c.load(Ordering::Relaxed)).sum(),
            Storage::Sparse(map) => map
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .sum(),
        }
    }

    /// Non-empty cells as `(per-axis indices, count)`, in index order.
    #[must_use]
    pub fn non_empty_cells(&self) -> Vec<(Vec<usize>, u64)> {
        let mut cells = match &self.storage {
            Storage::Dense(counts) => {
                let sizes: Vec<usize> = self.axes.iter().map(AxisSpec::n_cells).collect();
                counts
                    .iter()
                    .enumerate()
                    .filter_map(|(index, count)| {
                        let count = count.load(Ordering::Relaxed);
                        (count > 0).then(|| (unravel(index, &sizes), count))
                    })
                    .collect::<Vec<_>>()
            }
            Storage::Sparse(map) => map
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(cells, &count)| (cells.clone(), count))
                .collect(),
        };
        cells.sort_unstable();
        cells
    }

    /// Adds the contents of another histogram with identical axes.
    ///
    /// # Errors
    /// Returns [`Error::LayoutMismatch`] if the axes differ.
    pub fn merge(&self, other: &Histogram) -> Result<()> {
        if self.id != other.id || self.axes != other.axes {
            return Err(Error::LayoutMismatch(format!(
                "cannot merge '{}' into '{}'",
                other.name(),
                self.name()
            )));
        }
        for (cells, count) in other.non_empty_cells() {
            self.add_at(cells, count);
        }
        self.entries.fetch_add(other.entries(), Ordering::Relaxed);
        Ok(())
    }

    /// Copies the contents into a plain, serialisable form.
    #[must_use]
    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            name: self.name().to_string(),
            axes: self.axes.clone(),
            sparse: self.is_sparse(),
            entries: self.entries(),
            cells: self
                .non_empty_cells()
                .into_iter()
                .map(|(index, count)| HistogramCell { index, count })
                .collect(),
        }
    }
}

fn unravel(mut index: usize, sizes: &[usize]) -> Vec<usize> {
    let mut cells = vec![0; sizes.len()];
    for (cell, &size) in cells.iter_mut().zip(sizes).rev() {
        *cell = index % size;
        index /= size;
    }
    cells
}

/// One non-empty cell of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramCell {
    /// Per-axis cell indices (0 underflow, `bins + 1` overflow).
    pub index: Vec<usize>,
    pub count: u64,
}

/// Plain copy of a histogram's contents.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramSnapshot {
    pub name: String,
    pub axes: Vec<AxisSpec>,
    pub sparse: bool,
    pub entries: u64,
    pub cells: Vec<HistogramCell>,
}

impl HistogramSnapshot {
    /// Regular-bin counts in row-major order, flow cells dropped.
    #[must_use]
    pub fn regular_counts(&self) -> Vec<u64> {
        let shape: Vec<usize> = self.axes.iter().map(|a| a.bins).collect();
        let mut counts = vec![0u64; shape.iter().product()];
        'cells: for cell in &self.cells {
            let mut index = 0usize;
            for (&c, &bins) in cell.index.iter().zip(&shape) {
                if c == 0 || c > bins {
                    continue 'cells;
                }
                index = index * bins + (c - 1);
            }
            counts[index] += cell.count;
        }
        counts
    }
}
