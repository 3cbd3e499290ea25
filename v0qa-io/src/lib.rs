//! v0qa-io: Event files, batch processing and histogram output.
//!
//! This crate reads JSON-lines event files, drives the analysis over them
//! in parallel batches, and writes the resulting histograms as CSV, JSON or
//! (with the `hdf5` feature) HDF5/NeXus.
//!

mod config;
mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod pipeline;
mod reader;
mod writer;

pub use config::{config_to_json, load_config, save_config};
pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{read_histogram_hdf5, write_histograms_hdf5, HistogramWriteOptions};
pub use pipeline::{
    AnalysisDriver, AnalysisOutput, ModeOutput, PrefilterSummary, DEFAULT_BATCH_SIZE,
};
pub use reader::{parse_event, write_events, EventBatches, EventFileReader, EventStream, FileSummary};
pub use writer::{write_output, HistogramFileWriter, HistogramSet, OutputFormat};
