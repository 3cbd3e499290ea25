//! Configuration files.

use crate::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use v0qa_core::config::AnalysisConfig;

/// Loads an analysis configuration from a JSON file.
///
/// Missing keys take their default values.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Saves an analysis configuration as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_config<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Renders a configuration as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialisation fails.
pub fn config_to_json(config: &AnalysisConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}
