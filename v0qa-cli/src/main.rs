//! V0 resolution analysis CLI.
//!
//! Reads JSON-lines event files, runs the data and/or MC pipelines and
//! writes the booked histograms as CSV, JSON or HDF5.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use v0qa_core::{AnalysisConfig, AnalysisMode};
use v0qa_io::{config_to_json, load_config, write_output, AnalysisDriver, EventFileReader};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    V0qaIo(#[from] v0qa_io::Error),

    #[error("Configuration error: {0}")]
    Core(#[from] v0qa_core::Error),
}

/// Which pipelines to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Reconstructed data only
    Data,
    /// Simulated data with truth matching
    Mc,
    /// Both pipelines over the same input
    Both,
}

impl Mode {
    fn switches(self) -> (bool, bool) {
        match self {
            Mode::Data => (true, false),
            Mode::Mc => (false, true),
            Mode::Both => (true, true),
        }
    }
}

/// K0-short reconstruction-resolution analysis.
#[derive(Parser)]
#[command(name = "v0qa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis over event files and write histograms
    Process {
        /// Input event file(s), one JSON event per line
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output file path (.csv, .json or .h5)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration file; missing keys take defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pipelines to run (overrides the configuration)
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Fill the multidimensional mass histogram
        #[arg(long)]
        multidim: bool,

        /// Fill the TPC signal vs PID hypothesis histogram
        #[arg(long)]
        tpc_plot: bool,

        /// Recompute the mass from the daughter tracks
        #[arg(long)]
        mass_from_daughters: bool,

        /// Events per processing batch
        #[arg(long, default_value_t = v0qa_io::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,
    },

    /// Print the default configuration as JSON
    Config,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            mode,
            multidim,
            tpc_plot,
            mass_from_daughters,
            batch_size,
            verbose,
        } => {
            init_logging(verbose);

            let mut settings = match &config {
                Some(path) => {
                    info!("loading configuration from {}", path.display());
                    load_config(path)?
                }
                None => AnalysisConfig::default(),
            };
            if let Some(mode) = mode {
                let (data, mc) = mode.switches();
                settings = settings.with_modes(data, mc);
            }
            if multidim {
                settings = settings.with_multidim_histogram(true);
            }
            if tpc_plot {
                settings = settings.with_tpc_plot(true);
            }
            if mass_from_daughters {
                settings = settings.with_mass_from_daughters(true);
            }
            let validated = settings.validate()?;

            let start = Instant::now();
            let mut driver = AnalysisDriver::new(validated).with_batch_size(batch_size);
            for path in &input {
                driver.process_file(path)?;
            }
            let result = driver.finish();
            write_output(&output, &result)?;
            let elapsed = start.elapsed();

            println!(
                "Processed {} files in {:.2}s",
                input.len(),
                elapsed.as_secs_f64()
            );
            let prefilter = result.prefilter;
            println!(
                "Events: {} read, {} selected",
                prefilter.events_read, prefilter.events_selected
            );
            println!(
                "Candidates: {} read, {} selected",
                prefilter.candidates_read, prefilter.candidates_selected
            );
            for mode_output in &result.modes {
                let s = mode_output.summary;
                println!(
                    "[{}] accumulated {} of {} candidates ({} rejected, {} unmatched, {} malformed)",
                    mode_output.mode.name(),
                    s.accumulated,
                    s.candidates,
                    s.rejected,
                    s.unmatched,
                    s.malformed
                );
                if mode_output.mode == AnalysisMode::Mc
                    && s.candidates > 0
                    && s.unmatched == s.candidates
                {
                    warn!("no candidate had matching truth; is the input simulated?");
                }
            }
            println!("Wrote {}", output.display());
        }

        Commands::Info { input } => {
            let reader = EventFileReader::open(&input)?;
            let summary = reader.summary()?;
            let file_size = std::fs::metadata(&input)?.len();

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );
            println!("Events: {}", summary.events);
            println!("Tracks: {}", summary.tracks);
            println!("V0 candidates: {}", summary.candidates);
            println!("Events with truth: {}", summary.truth_events);
        }

        Commands::Config => {
            println!("{}", config_to_json(&AnalysisConfig::default())?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_process_arguments() {
        let cli = Cli::parse_from([
            "v0qa", "process", "a.jsonl", "b.jsonl", "-o", "out.csv", "--mode", "both",
            "--multidim",
        ]);
        match cli.command {
            Commands::Process {
                input,
                mode,
                multidim,
                tpc_plot,
                batch_size,
                ..
            } => {
                assert_eq!(input.len(), 2);
                assert!(matches!(mode, Some(Mode::Both)));
                assert!(multidim);
                assert!(!tpc_plot);
                assert_eq!(batch_size, v0qa_io::DEFAULT_BATCH_SIZE);
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_mode_switches() {
        assert_eq!(Mode::Data.switches(), (true, false));
        assert_eq!(Mode::Mc.switches(), (false, true));
        assert_eq!(Mode::Both.switches(), (true, true));
    }
}
