//! JSON-lines event files.
//!
//! One event per line: the collision with its track, V0 and (optionally)
//! truth tables. Blank lines are ignored. Every event is checked for
//! dangling cross references as it is read.

use crate::{Error, Result};
use log::warn;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use v0qa_core::event::Event;

/// Parses and validates one event record.
///
/// # Errors
/// Returns [`Error::Json`] for malformed JSON and [`Error::CoreError`] for
/// dangling track or truth references.
pub fn parse_event(line: &str) -> Result<Event> {
    let event: Event = serde_json::from_str(line)?;
    event.validate()?;
    Ok(event)
}

/// Reader for JSON-lines event files.
#[derive(Debug, Clone)]
pub struct EventFileReader {
    path: PathBuf,
}

impl EventFileReader {
    /// Opens an event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        File::open(&path)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Streams the events of the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn events(&self) -> Result<EventStream<BufReader<File>>> {
        let file = File::open(&self.path)?;
        Ok(EventStream::new(BufReader::new(file)))
    }

    /// Reads every event into memory.
    ///
    /// # Errors
    /// Returns the first read, parse or validation error.
    pub fn read_all(&self) -> Result<Vec<Event>> {
        self.events()?.collect()
    }

    /// Counts events, tracks and candidates without keeping them.
    ///
    /// # Errors
    /// Returns the first read, parse or validation error.
    pub fn summary(&self) -> Result<FileSummary> {
        let mut summary = FileSummary::default();
        for event in self.events()? {
            summary.add(&event?);
        }
        Ok(summary)
    }
}

/// Iterator over the events of a JSON-lines source.
pub struct EventStream<R: BufRead> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> EventStream<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Groups the stream into batches of at most `size` events.
    #[must_use]
    pub fn batches(self, size: usize) -> EventBatches<R> {
        EventBatches {
            stream: self,
            size: size.max(1),
        }
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.lines.next()?;
            self.line += 1;
            let line = match next {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("unreadable event on line {}: {e}", self.line);
                    return Some(Err(Error::InvalidFormat(format!("line {}: {e}", self.line))));
                }
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_event(&line).map_err(|e| {
                warn!("malformed event on line {}: {e}", self.line);
                match e {
                    Error::Json(e) => Error::InvalidFormat(format!("line {}: {e}", self.line)),
                    other => other,
                }
            }));
        }
    }
}

/// Iterator over event batches.
pub struct EventBatches<R: BufRead> {
    stream: EventStream<R>,
    size: usize,
}

impl<R: BufRead> Iterator for EventBatches<R> {
    type Item = Result<Vec<Event>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.stream.next() {
                Some(Ok(event)) => batch.push(event),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Table sizes of an event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileSummary {
    pub events: usize,
    pub tracks: usize,
    pub candidates: usize,
    /// Events carrying simulated truth.
    pub truth_events: usize,
}

impl FileSummary {
    fn add(&mut self, event: &Event) {
        self.events += 1;
        self.tracks += event.tracks.len();
        self.candidates += event.v0s.len();
        if event.has_truth() {
            self.truth_events += 1;
        }
    }
}

/// Writes events as JSON lines.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_events<P: AsRef<Path>>(path: P, events: &[Event]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
