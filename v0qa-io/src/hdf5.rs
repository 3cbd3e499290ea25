//! HDF5/NeXus histogram output.
//!
//! Layout: `/entry` (`NXentry`) holds one group per variant that has a
//! prefix, and every histogram is a group named after it. Dense histograms
//! are `NXdata` with a `counts` dataset over the regular bins and one
//! bin-center dataset per axis. The multidimensional histogram is written
//! sparse as an `NXcollection` with `indices` (entries x dimensions, flow
//! cells included) and `counts`.

use crate::writer::HistogramSet;
use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{Array2, ArrayView, ArrayView1, IxDyn};
use std::path::Path;
use std::str::FromStr;
use v0qa_core::histogram::{AxisSpec, HistogramSnapshot};

/// Histogram write configuration.
#[derive(Clone, Debug)]
pub struct HistogramWriteOptions {
    pub compression: Option<u8>,
    pub shuffle: bool,
}

impl Default for HistogramWriteOptions {
    fn default() -> Self {
        Self {
            compression: Some(1),
            shuffle: true,
        }
    }
}

/// Histogram contents loaded back from a file.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredHistogram {
    pub name: String,
    pub sparse: bool,
    pub entries: u64,
    /// Regular-bin shape for dense histograms, `[n, dims]` for sparse ones.
    pub shape: Vec<usize>,
    pub counts: Vec<u64>,
    /// Flattened cell indices (sparse only).
    pub indices: Vec<u64>,
}

/// Writes histogram sets to an HDF5/NeXus file with default options.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_histograms_hdf5<P: AsRef<Path>>(path: P, sets: &[HistogramSet]) -> Result<()> {
    write_histograms_hdf5_with(path, sets, &HistogramWriteOptions::default())
}

/// Writes histogram sets to an HDF5/NeXus file.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_histograms_hdf5_with<P: AsRef<Path>>(
    path: P,
    sets: &[HistogramSet],
    options: &HistogramWriteOptions,
) -> Result<()> {
    let file = File::create(path)?;
    set_attr_str_file(&file, "v0qa_format_version", "0.1")?;

    let entry = file.create_group("entry")?;
    set_attr_str_group(&entry, "NX_class", "NXentry")?;

    for set in sets {
        let parent = if set.prefix.is_empty() {
            entry.clone()
        } else {
            let group = entry.create_group(&set.prefix)?;
            set_attr_str_group(&group, "NX_class", "NXcollection")?;
            group
        };
        set_attr_str_group(&parent, "mode", &set.mode)?;

        for histogram in &set.histograms {
            if histogram.sparse {
                write_sparse(&parent, histogram, options)?;
            } else {
                write_dense(&parent, histogram, options)?;
            }
        }
    }
    Ok(())
}

/// Reads one histogram group back.
///
/// `name` is the path below `/entry`, e.g. `h2_masspT` or `mc/thn_mass`.
///
/// # Errors
/// Returns an error if HDF5 I/O fails or required datasets are missing.
pub fn read_histogram_hdf5<P: AsRef<Path>>(path: P, name: &str) -> Result<StoredHistogram> {
    let file = File::open(path)?;
    let entry = file.group("entry")?;
    let group = entry.group(name)?;

    let entries = group.attr("entries")?.read_scalar::<u64>()?;
    let counts_ds = group.dataset("counts")?;
    let counts = counts_ds.read_raw::<u64>()?;
    let sparse = group.link_exists("indices");

    let (shape, indices) = if sparse {
        let indices_ds = group.dataset("indices")?;
        (indices_ds.shape(), indices_ds.read_raw::<u64>()?)
    } else {
        (counts_ds.shape(), Vec::new())
    };

    Ok(StoredHistogram {
        name: name.to_string(),
        sparse,
        entries,
        shape,
        counts,
        indices,
    })
}

fn write_dense(
    parent: &Group,
    histogram: &HistogramSnapshot,
    options: &HistogramWriteOptions,
) -> Result<()> {
    let group = parent.create_group(&histogram.name)?;
    set_attr_str_group(&group, "NX_class", "NXdata")?;
    set_attr_str_group(&group, "signal", "counts")?;
    group
        .new_attr::<u64>()
        .create("entries")?
        .write_scalar(&histogram.entries)?;

    let axis_names: Vec<String> = (0..histogram.axes.len())
        .map(|i| format!("axis_{i}"))
        .collect();
    let axis_refs: Vec<&str> = axis_names.iter().map(String::as_str).collect();
    set_axes_attr(&group, &axis_refs)?;

    let shape: Vec<usize> = histogram.axes.iter().map(|a| a.bins).collect();
    let counts = histogram.regular_counts();
    let counts_ds = create_fixed_dataset::<u64, _>(
        &group,
        "counts",
        shape.clone(),
        options.compression,
        options.shuffle,
    )?;
    let counts_view = ArrayView::from_shape(IxDyn(&shape), counts.as_slice())
        .map_err(|e| Error::InvalidFormat(format!("counts shape mismatch: {e}")))?;
    counts_ds.write(counts_view)?;

    for (index, (name, axis)) in axis_names.iter().zip(&histogram.axes).enumerate() {
        write_axis(&group, name, axis)?;
        let index = i32::try_from(index)
            .map_err(|_| Error::InvalidFormat("too many axes".to_string()))?;
        set_axis_indices(&group, name, index)?;
    }
    Ok(())
}

fn write_sparse(
    parent: &Group,
    histogram: &HistogramSnapshot,
    options: &HistogramWriteOptions,
) -> Result<()> {
    let group = parent.create_group(&histogram.name)?;
    set_attr_str_group(&group, "NX_class", "NXcollection")?;
    group
        .new_attr::<u64>()
        .create("entries")?
        .write_scalar(&histogram.entries)?;

    let dims = histogram.axes.len();
    let n = histogram.cells.len();
    let flat: Vec<u64> = histogram
        .cells
        .iter()
        .flat_map(|cell| cell.index.iter().map(|&i| i as u64))
        .collect();
    let indices = Array2::from_shape_vec((n, dims), flat)
        .map_err(|e| Error::InvalidFormat(format!("indices shape mismatch: {e}")))?;
    // zero-sized datasets cannot be chunked
    let compression = options.compression.filter(|_| n > 0);
    let indices_ds =
        create_fixed_dataset::<u64, _>(&group, "indices", (n, dims), compression, false)?;
    indices_ds.write(indices.view())?;

    let counts: Vec<u64> = histogram.cells.iter().map(|cell| cell.count).collect();
    let counts_ds =
        create_fixed_dataset::<u64, _>(&group, "counts", (n,), compression, false)?;
    counts_ds.write(ArrayView1::from(counts.as_slice()))?;

    for (i, axis) in histogram.axes.iter().enumerate() {
        write_axis(&group, &format!("axis_{i}"), axis)?;
    }
    Ok(())
}

fn write_axis(group: &Group, name: &str, axis: &AxisSpec) -> Result<()> {
    let centers: Vec<f64> = (1..=axis.bins).map(|cell| axis.center(cell)).collect();
    let ds = create_fixed_dataset::<f64, _>(group, name, (centers.len(),), None, false)?;
    ds.write(ArrayView1::from(centers.as_slice()))?;
    set_attr_str_dataset(&ds, "long_name", &axis.title)?;
    ds.new_attr::<f64>()
        .create("min")?
        .write_scalar(&axis.min)?;
    ds.new_attr::<f64>()
        .create("max")?
        .write_scalar(&axis.max)?;
    Ok(())
}

fn create_fixed_dataset<T: H5Type, S>(
    group: &Group,
    name: &str,
    shape: S,
    compression: Option<u8>,
    shuffle: bool,
) -> Result<Dataset>
where
    S: Into<hdf5::Extents>,
{
    let mut builder = group.new_dataset::<T>().shape(shape);

    if let Some(level) = compression {
        builder = builder.deflate(level);
    }

    if shuffle {
        builder = builder.shuffle();
    }

    Ok(builder.create(name)?)
}

fn set_axes_attr(group: &Group, axes: &[&str]) -> Result<()> {
    let values: Vec<VarLenUnicode> = axes
        .iter()
        .map(|axis| to_var_len_unicode(axis))
        .collect::<Result<Vec<_>>>()?;
    let attr = group
        .new_attr::<VarLenUnicode>()
        .shape((values.len(),))
        .create("axes")?;
    attr.write(ArrayView1::from(values.as_slice()))?;
    Ok(())
}

fn set_axis_indices(group: &Group, name: &str, index: i32) -> Result<()> {
    let attr_name = format!("{name}_indices");
    group
        .new_attr::<i32>()
        .create(attr_name.as_str())?
        .write_scalar(&index)?;
    Ok(())
}

fn set_attr_str_file(file: &File, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_group(group: &Group, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_dataset(dataset: &Dataset, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
