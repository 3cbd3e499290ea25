//! Histogram output files.

use crate::pipeline::AnalysisOutput;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use v0qa_core::histogram::{AxisSpec, HistogramSnapshot};

/// Output format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Hdf5,
}

impl OutputFormat {
    /// Picks the format from a path's extension.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for a missing or unknown extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "h5" | "hdf5" | "nxs" => Ok(Self::Hdf5),
            _ => Err(Error::InvalidFormat(format!(
                "unknown output extension '{ext}' (expected csv, json or h5)"
            ))),
        }
    }
}

/// Histograms of one analysis variant as written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSet {
    /// Variant name (`data` or `mc`).
    pub mode: String,
    /// Name prefix; empty unless several variants ran.
    pub prefix: String,
    pub histograms: Vec<HistogramSnapshot>,
}

impl HistogramSet {
    /// Collects the sets of every variant of a run.
    #[must_use]
    pub fn from_output(output: &AnalysisOutput) -> Vec<Self> {
        output
            .modes
            .iter()
            .map(|m| Self {
                mode: m.mode.name().to_string(),
                prefix: m.prefix.clone(),
                histograms: m.registry.snapshot(),
            })
            .collect()
    }

    /// Output name of a histogram with this set's prefix.
    #[must_use]
    pub fn qualified_name(&self, histogram: &HistogramSnapshot) -> String {
        if self.prefix.is_empty() {
            histogram.name.clone()
        } else {
            format!("{}/{}", self.prefix, histogram.name)
        }
    }
}

/// Writer for histogram output.
pub struct HistogramFileWriter {
    writer: BufWriter<File>,
}

impl HistogramFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes the non-empty cells of every histogram as CSV.
    ///
    /// Columns: histogram name, per-axis cell indices and bin centers (both
    /// `:`-separated), count. Underflow and overflow cells have index 0 and
    /// `bins + 1` and center `-inf` / `inf`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, sets: &[HistogramSet]) -> Result<()> {
        writeln!(self.writer, "histogram,cell,center,count")?;

        for set in sets {
            for histogram in &set.histograms {
                let name = set.qualified_name(histogram);
                for cell in &histogram.cells {
                    let indices = cell
                        .index
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(":");
                    let centers = histogram
                        .axes
                        .iter()
                        .zip(&cell.index)
                        .map(|(axis, &i)| cell_center(axis, i))
                        .collect::<Vec<_>>()
                        .join(":");
                    writeln!(self.writer, "{name},{indices},{centers},{}", cell.count)?;
                }
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes every set as a JSON document.
    ///
    /// # Errors
    /// Returns an error if serialisation or writing fails.
    pub fn write_json(&mut self, sets: &[HistogramSet]) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, sets)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn cell_center(axis: &AxisSpec, index: usize) -> String {
    if index == 0 {
        "-inf".to_string()
    } else if index > axis.bins {
        "inf".to_string()
    } else {
        axis.center(index).to_string()
    }
}

/// Writes a run's histograms in the format implied by the extension.
///
/// # Errors
/// Returns an error for an unknown extension, for HDF5 output without the
/// `hdf5` feature, or if writing fails.
pub fn write_output<P: AsRef<Path>>(path: P, output: &AnalysisOutput) -> Result<()> {
    let path = path.as_ref();
    let sets = HistogramSet::from_output(output);
    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => HistogramFileWriter::create(path)?.write_csv(&sets),
        OutputFormat::Json => HistogramFileWriter::create(path)?.write_json(&sets),
        #[cfg(feature = "hdf5")]
        OutputFormat::Hdf5 => crate::hdf5::write_histograms_hdf5(path, &sets),
        #[cfg(not(feature = "hdf5"))]
        OutputFormat::Hdf5 => Err(Error::InvalidFormat(
            "HDF5 output requires the 'hdf5' feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use v0qa_core::histogram::{Histogram, HistogramId};

    fn set(prefix: &str) -> HistogramSet {
        let h = Histogram::dense(
            HistogramId::MassPt,
            vec![
                AxisSpec::new(2, 0.0, 1.0, "m"),
                AxisSpec::new(2, 0.0, 2.0, "pt"),
            ],
        );
        h.fill(&[0.25, 1.5]);
        h.fill(&[0.25, 1.5]);
        h.fill(&[-1.0, 0.5]);
        HistogramSet {
            mode: "data".to_string(),
            prefix: prefix.to_string(),
            histograms: vec![h.snapshot()],
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.CSV")).unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("a.json")).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("a.h5")).unwrap(), OutputFormat::Hdf5);
        assert!(OutputFormat::from_path(Path::new("a.root")).is_err());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = HistogramFileWriter::create(file.path()).unwrap();
        writer.write_csv(&[set(""), set("mc")]).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("histogram,cell,center,count\n"));
        assert!(content.contains("h2_masspT,0:1,-inf:0.5,1\n"));
        assert!(content.contains("h2_masspT,1:2,0.25:1.5,2\n"));
        assert!(content.contains("mc/h2_masspT,1:2,0.25:1.5,2\n"));
    }

    #[test]
    fn test_write_json() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = HistogramFileWriter::create(file.path()).unwrap();
        let sets = vec![set("")];
        writer.write_json(&sets).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let loaded: Vec<HistogramSet> = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, sets);
        assert_eq!(loaded[0].histograms[0].entries, 3);
    }
}
