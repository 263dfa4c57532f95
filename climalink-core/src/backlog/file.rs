//! File-backed backlog
//!
//! JSON Lines file, one reading per line, appended in place and fsync'd on
//! every append.
//!
//! ## Rewrites
//!
//! A flush never edits the backlog file. It goes through two steps:
//!
//! 1. [`FileBacklog::stage_rewrite`] writes the new content to the side file
//!    `<backlog>.rewrite` and fsyncs it.
//! 2. [`FileBacklog::commit`] renames the side file over the backlog and
//!    fsyncs the directory. An empty rewrite removes the backlog instead.
//!
//! A crash between the two steps leaves the old backlog untouched. The stale
//! side file is discarded the next time the backlog is opened, so nothing is
//! lost and nothing is replayed twice.
//!
//! ## Torn appends
//!
//! If the process dies in the middle of an append the file ends without a
//! newline. The next append terminates that fragment first, so it becomes one
//! malformed line instead of swallowing the new record.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{BacklogEntry, BacklogError, DurableLog, Line};

/// Suffix of the side file used during rewrites
const REWRITE_SUFFIX: &str = ".rewrite";

/// Backlog stored as a JSON Lines file
///
/// ## Example
///
/// ```rust,no_run
/// use climalink_core::{DurableLog, FileBacklog, Reading};
/// use climalink_core::ports::DeliveryResult;
///
/// let mut backlog = FileBacklog::new("/var/lib/climalink/backlog.jsonl");
/// backlog.append(&Reading::new(21.0, 45.0, 1_700_000_000_000))?;
///
/// let report = backlog.flush(|_reading| DeliveryResult::Delivered)?;
/// assert_eq!(report.delivered, 1);
/// # Ok::<(), climalink_core::backlog::BacklogError>(())
/// ```
#[derive(Debug)]
pub struct FileBacklog {
    path: PathBuf,
    side_path: PathBuf,
}

/// A rewrite written to the side file but not yet swapped in
///
/// Dropping it without [`FileBacklog::commit`] is the same as crashing before
/// the swap: the old backlog stays in force.
#[derive(Debug)]
#[must_use = "a staged rewrite has no effect until committed"]
pub struct StagedRewrite {
    action: Swap,
}

#[derive(Debug)]
enum Swap {
    /// Rename this side file over the backlog
    Replace(PathBuf),
    /// Nothing left, remove the backlog
    Remove,
}

impl FileBacklog {
    /// Open the backlog at `path`
    ///
    /// Nothing is created until the first append. A side file left over from
    /// an interrupted rewrite is discarded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let side_path = side_path_for(&path);

        if side_path.exists() {
            log::warn!(
                "discarding interrupted backlog rewrite {}",
                side_path.display()
            );
            if let Err(err) = fs::remove_file(&side_path) {
                log::error!("could not remove {}: {}", side_path.display(), err);
            }
        }

        Self { path, side_path }
    }

    /// Location of the backlog file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the side file used during rewrites
    pub fn side_path(&self) -> &Path {
        &self.side_path
    }

    /// Whether the backlog file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the replacement content to the side file
    pub fn stage_rewrite(&self, lines: &[Line]) -> Result<StagedRewrite, BacklogError> {
        if lines.is_empty() {
            return Ok(StagedRewrite {
                action: Swap::Remove,
            });
        }

        ensure_parent_dir(&self.side_path)?;
        let mut content = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            content.extend_from_slice(line);
            content.push(b'\n');
        }

        let mut file = File::create(&self.side_path)?;
        file.write_all(&content)?;
        file.sync_all()?;

        Ok(StagedRewrite {
            action: Swap::Replace(self.side_path.clone()),
        })
    }

    /// Swap a staged rewrite in as the backlog of record
    pub fn commit(&mut self, staged: StagedRewrite) -> Result<(), BacklogError> {
        match staged.action {
            Swap::Replace(side_path) => {
                fs::rename(&side_path, &self.path)?;
            }
            Swap::Remove => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                }
                if self.side_path.exists() {
                    fs::remove_file(&self.side_path)?;
                }
            }
        }
        sync_parent_dir(&self.path)?;
        Ok(())
    }

    /// Terminate a torn last line left by an interrupted append
    fn needs_separator(file: &mut File) -> io::Result<bool> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(false);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }
}

impl DurableLog for FileBacklog {
    fn append_line(&mut self, line: &[u8]) -> Result<(), BacklogError> {
        ensure_parent_dir(&self.path)?;
        let created = !self.path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut record = Vec::with_capacity(line.len() + 2);
        if Self::needs_separator(&mut file)? {
            log::warn!("backlog {} ends in a torn line", self.path.display());
            record.push(b'\n');
        }
        record.extend_from_slice(line);
        record.push(b'\n');

        // Append mode: the write lands at the end whatever the read position
        file.write_all(&record)?;
        file.sync_data()?;

        if created {
            sync_parent_dir(&self.path)?;
        }
        Ok(())
    }

    fn lines(&self) -> Result<Vec<Line>, BacklogError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(bytes
            .split(|&b| b == b'\n')
            .filter(|line| !BacklogEntry::is_blank(line))
            .map(<[u8]>::to_vec)
            .collect())
    }

    fn replace_all(&mut self, lines: &[Line]) -> Result<(), BacklogError> {
        let staged = self.stage_rewrite(lines)?;
        self.commit(staged)
    }
}

fn side_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("backlog"));
    name.push(REWRITE_SUFFIX);
    path.with_file_name(name)
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Make a rename or create in the parent directory durable
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
