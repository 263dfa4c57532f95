//! Durable backlog of readings that could not be delivered
//!
//! ## Model
//!
//! The backlog is an ordered log of independent lines. Each line is normally
//! one JSON-encoded [`Reading`]:
//!
//! ```json
//! {"temperature":21.5,"humidity":48.0,"pressure":0.0,"timestamp":1700000000000}
//! ```
//!
//! A line that does not parse is a [`BacklogEntry::Malformed`] record. It is
//! never retried as a delivery and never deleted; it is carried over verbatim
//! on every rewrite so the bytes stay available for inspection.
//!
//! ## Operations
//!
//! - `append`: add one reading at the end, durable when the call returns
//! - `flush`: try every well-formed entry oldest first, then atomically replace
//!   the backlog with what is still undelivered plus all malformed lines
//!
//! Order is append order, which is also the retry order. Nothing bounds the
//! size of the backlog; a collector that stays down lets it grow.
//!
//! ## Backends
//!
//! - [`FileBacklog`]: JSON Lines file with write-side-file-then-rename rewrites
//! - [`MemoryBacklog`]: RAM only, for tests and hosts without storage

use std::fmt;
use std::io;

use thiserror_no_std::Error;

use crate::ports::DeliveryResult;
use crate::reading::Reading;

pub mod file;
pub mod memory;

pub use file::{FileBacklog, StagedRewrite};
pub use memory::MemoryBacklog;

/// Errors from the storage layer
#[derive(Error, Debug)]
pub enum BacklogError {
    /// The underlying storage failed
    #[error("Backlog I/O error: {0}")]
    Io(io::Error),

    /// A reading could not be encoded
    #[error("Backlog encoding error: {0}")]
    Encode(serde_json::Error),
}

impl From<io::Error> for BacklogError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for BacklogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

/// One stored line, without its newline
///
/// Lines are raw bytes: a corrupt record need not be valid UTF-8 and is
/// written back exactly as it was read.
pub type Line = Vec<u8>;

/// One backlog line, classified
#[derive(Debug, Clone, PartialEq)]
pub enum BacklogEntry {
    /// A reading waiting for delivery
    Record(Reading),
    /// A line that does not parse, kept byte for byte
    Malformed(Line),
}

impl BacklogEntry {
    /// Classify one stored line
    pub fn parse(line: &[u8]) -> Self {
        match serde_json::from_slice::<Reading>(line) {
            Ok(reading) => Self::Record(reading),
            Err(_) => Self::Malformed(line.to_vec()),
        }
    }

    /// Encode a reading as a single backlog line (no newline)
    pub fn encode(reading: &Reading) -> Result<Line, BacklogError> {
        Ok(serde_json::to_vec(reading)?)
    }

    /// Whether a stored line carries nothing
    pub fn is_blank(line: &[u8]) -> bool {
        line.iter().all(u8::is_ascii_whitespace)
    }

    /// Whether this line parsed
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

/// Counts from one flush pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries the collector confirmed, dropped from the backlog
    pub delivered: usize,
    /// Well-formed entries that failed and stay queued
    pub kept: usize,
    /// Unparseable lines carried over verbatim
    pub malformed: usize,
}

impl FlushReport {
    /// Entries left in the backlog after the pass
    pub fn remaining(&self) -> usize {
        self.kept + self.malformed
    }
}

impl fmt::Display for FlushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered={} kept={} malformed={}",
            self.delivered, self.kept, self.malformed
        )
    }
}

/// Ordered log with durable append and atomic replace-all
///
/// Implementations store opaque lines. Blank lines carry nothing and are not
/// returned by [`DurableLog::lines`].
pub trait DurableLog {
    /// Add one line at the end. It must survive a crash right after return.
    fn append_line(&mut self, line: &[u8]) -> Result<(), BacklogError>;

    /// All non-blank lines, oldest first. An absent backlog has none.
    fn lines(&self) -> Result<Vec<Line>, BacklogError>;

    /// Replace the whole log in one step. An empty set leaves the backlog
    /// absent. Until this returns, the previous content is the truth.
    fn replace_all(&mut self, lines: &[Line]) -> Result<(), BacklogError>;

    /// Queue a reading
    fn append(&mut self, reading: &Reading) -> Result<(), BacklogError> {
        let line = BacklogEntry::encode(reading)?;
        self.append_line(&line)
    }

    /// Current content, classified
    fn entries(&self) -> Result<Vec<BacklogEntry>, BacklogError> {
        Ok(self.lines()?.iter().map(|line| BacklogEntry::parse(line)).collect())
    }

    /// Retry every well-formed entry, oldest first
    ///
    /// A failed delivery only keeps that entry queued; the pass always runs to
    /// the end. The backlog is rewritten only if something was delivered.
    fn flush<F>(&mut self, mut deliver: F) -> Result<FlushReport, BacklogError>
    where
        F: FnMut(&Reading) -> DeliveryResult,
        Self: Sized,
    {
        let lines = self.lines()?;
        let mut report = FlushReport::default();
        if lines.is_empty() {
            return Ok(report);
        }

        let mut remaining = Vec::with_capacity(lines.len());
        for line in lines {
            match BacklogEntry::parse(&line) {
                BacklogEntry::Record(reading) => match deliver(&reading) {
                    DeliveryResult::Delivered => report.delivered += 1,
                    failed => {
                        log::debug!(
                            "backlog entry at {} stays queued: {}",
                            reading.timestamp,
                            failed
                        );
                        report.kept += 1;
                        remaining.push(line);
                    }
                },
                BacklogEntry::Malformed(_) => {
                    report.malformed += 1;
                    remaining.push(line);
                }
            }
        }

        if report.malformed > 0 {
            log::warn!("backlog holds {} malformed line(s), kept verbatim", report.malformed);
        }

        if report.delivered > 0 {
            self.replace_all(&remaining)?;
        }

        Ok(report)
    }
}
