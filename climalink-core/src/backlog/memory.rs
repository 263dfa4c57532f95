//! Memory-based backlog for testing
//!
//! Same contract as the file backlog, minus surviving a restart. Useful for:
//! - Unit testing the coordinator
//! - Hosts without writable storage

use super::{BacklogEntry, BacklogError, DurableLog, Line};

/// RAM-only backlog
///
/// ## Example
///
/// ```rust
/// use climalink_core::{DurableLog, MemoryBacklog, Reading};
/// use climalink_core::ports::DeliveryResult;
///
/// let mut backlog = MemoryBacklog::new();
/// backlog.append(&Reading::new(20.0, 50.0, 1)).unwrap();
/// backlog.append(&Reading::new(21.0, 51.0, 2)).unwrap();
///
/// let report = backlog
///     .flush(|r| if r.timestamp == 1 { DeliveryResult::Delivered } else {
///         DeliveryResult::TransportFailed("offline".into())
///     })
///     .unwrap();
/// assert_eq!((report.delivered, report.kept), (1, 1));
/// assert_eq!(backlog.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryBacklog {
    lines: Vec<Line>,
    rewrites: usize,
}

impl MemoryBacklog {
    /// Create an empty backlog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backlog holding these lines, oldest first
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Line>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            rewrites: 0,
        }
    }

    /// Number of stored lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// How many times the content was replaced
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }
}

impl DurableLog for MemoryBacklog {
    fn append_line(&mut self, line: &[u8]) -> Result<(), BacklogError> {
        self.lines.push(line.to_vec());
        Ok(())
    }

    fn lines(&self) -> Result<Vec<Line>, BacklogError> {
        Ok(self
            .lines
            .iter()
            .filter(|line| !BacklogEntry::is_blank(line))
            .cloned()
            .collect())
    }

    fn replace_all(&mut self, lines: &[Line]) -> Result<(), BacklogError> {
        self.lines = lines.to_vec();
        self.rewrites += 1;
        Ok(())
    }
}
