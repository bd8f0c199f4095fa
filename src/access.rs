//! Read-only access to extracted workspaces.
//!
//! Every operation resolves `base/<id>` first. A missing workspace is an
//! empty result for enumeration and search, and [`ReadError::NotFound`] for
//! direct reads.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ReadError;
use crate::safety::PathGuard;
use crate::workspace::WorkspaceId;

/// Why a file was left out of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file does not contain the query.
    NoMatch,
    /// The file is larger than the per-file read cap.
    TooLarge,
    /// The file could not be opened or read.
    Unreadable,
}

/// Per-file result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file contains the query.
    Included(String),
    /// The file was excluded.
    Skipped {
        /// Relative path of the file.
        path: String,
        /// Why it was excluded.
        reason: SkipReason,
    },
}

impl FileOutcome {
    /// Relative path of the file this outcome describes.
    pub fn path(&self) -> &str {
        match self {
            Self::Included(path) => path,
            Self::Skipped { path, .. } => path,
        }
    }

    /// Returns `true` for [`FileOutcome::Included`].
    pub fn is_included(&self) -> bool {
        matches!(self, Self::Included(_))
    }
}

/// Sandboxed list/read/search over workspaces under one base directory.
#[derive(Debug, Clone)]
pub struct WorkspaceAccessor {
    base: PathBuf,
    max_readable_file_bytes: u64,
}

impl WorkspaceAccessor {
    /// Creates an accessor for workspaces under `base`.
    pub fn new(base: impl Into<PathBuf>, max_readable_file_bytes: u64) -> Self {
        Self {
            base: base.into(),
            max_readable_file_bytes,
        }
    }

    /// Returns the per-file read cap.
    pub fn max_readable_file_bytes(&self) -> u64 {
        self.max_readable_file_bytes
    }

    fn workspace_guard(&self, id: &WorkspaceId) -> Option<PathGuard> {
        let root = id.root_in(&self.base);
        if !root.is_dir() {
            return None;
        }
        PathGuard::new(root).ok()
    }

    /// Lists every regular file in the workspace as a `/`-separated
    /// relative path.
    ///
    /// Symbolic links are not followed and are not listed. Entries are
    /// sorted by file name at every directory level.
    pub fn list(&self, id: &WorkspaceId) -> Vec<String> {
        match self.workspace_guard(id) {
            Some(guard) => list_files(guard.root()),
            None => Vec::new(),
        }
    }

    /// Reads a file as text, replacing invalid UTF-8 with U+FFFD.
    ///
    /// # Errors
    ///
    /// - [`ReadError::InvalidPath`] if the path is malformed, escapes the
    ///   workspace or names the workspace root
    /// - [`ReadError::NotFound`] if the workspace or file is missing, or the
    ///   target is not a regular file
    /// - [`ReadError::TooLarge`] if the file exceeds the read cap; no bytes
    ///   are read in that case
    pub fn read(&self, id: &WorkspaceId, relative_path: &str) -> Result<String, ReadError> {
        let not_found = || ReadError::NotFound {
            path: relative_path.to_string(),
        };
        let guard = self.workspace_guard(id).ok_or_else(not_found)?;

        let target = guard.resolve(relative_path).map_err(|e| {
            log::debug!("Rejected read path '{}': {}", relative_path, e);
            ReadError::InvalidPath {
                path: relative_path.to_string(),
            }
        })?;
        if target == guard.root() {
            return Err(ReadError::InvalidPath {
                path: relative_path.to_string(),
            });
        }

        let meta = match fs::metadata(&target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(ReadError::Io(e)),
        };
        if !meta.is_file() {
            return Err(not_found());
        }
        if meta.len() > self.max_readable_file_bytes {
            return Err(ReadError::TooLarge {
                size: meta.len(),
                limit: self.max_readable_file_bytes,
            });
        }

        let bytes = read_capped(&target, self.max_readable_file_bytes)?
            .ok_or(ReadError::TooLarge {
                size: meta.len(),
                limit: self.max_readable_file_bytes,
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Returns the paths of files containing `query` as a literal substring.
    ///
    /// The result is a subsequence of [`list`](Self::list).
    pub fn search(&self, id: &WorkspaceId, query: &str) -> Vec<String> {
        self.search_outcomes(id, query)
            .into_iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Included(path) => Some(path),
                FileOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    /// Returns one [`FileOutcome`] per listed file, in list order.
    pub fn search_outcomes(&self, id: &WorkspaceId, query: &str) -> Vec<FileOutcome> {
        let Some(guard) = self.workspace_guard(id) else {
            return Vec::new();
        };

        list_files(guard.root())
            .into_iter()
            .map(|path| {
                let reason = match self.scan(guard.root(), &path, query) {
                    Ok(true) => return FileOutcome::Included(path),
                    Ok(false) => SkipReason::NoMatch,
                    Err(reason) => reason,
                };
                if reason != SkipReason::NoMatch {
                    log::debug!("Search skipped '{}': {:?}", path, reason);
                }
                FileOutcome::Skipped { path, reason }
            })
            .collect()
    }

    fn scan(&self, root: &Path, relative: &str, query: &str) -> Result<bool, SkipReason> {
        let path = root.join(relative);
        let len = fs::symlink_metadata(&path)
            .map_err(|_| SkipReason::Unreadable)?
            .len();
        if len > self.max_readable_file_bytes {
            return Err(SkipReason::TooLarge);
        }
        let bytes = read_capped(&path, self.max_readable_file_bytes)
            .map_err(|_| SkipReason::Unreadable)?
            .ok_or(SkipReason::TooLarge)?;
        Ok(String::from_utf8_lossy(&bytes).contains(query))
    }
}

/// Reads at most `cap` bytes; `None` if the file turned out to be longer.
fn read_capped(path: &Path, cap: u64) -> io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(cap.saturating_add(1))
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > cap {
        return Ok(None);
    }
    Ok(Some(bytes))
}

fn list_files(root: &Path) -> Vec<String> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            Some(parts.join("/"))
        })
        .collect()
}
