//! Error types for workspace operations.
//!
//! Every public operation has its own error enum so callers can match on the
//! exact failure kind instead of inspecting a catch-all error:
//!
//! | Operation | Error type |
//! |-----------|------------|
//! | [`WorkspaceManager::extract`] | [`ExtractError`] |
//! | [`WorkspaceManager::read`] | [`ReadError`] |
//! | [`WorkspaceManager::evict`] | [`EvictError`] |
//! | [`ResourceBudget::accept`] | [`BudgetExceeded`] |
//! | [`EntryName::parse`] | [`EntryNameError`] |
//! | [`WorkspaceId::from_str`] | [`InvalidWorkspaceId`] |
//!
//! `list` and `search` never fail: a missing workspace yields an empty
//! result and unreadable files are skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipspace::{ExtractError, WorkspaceConfig, WorkspaceManager};
//!
//! fn upload(manager: &WorkspaceManager, bytes: &[u8]) -> String {
//!     match manager.extract(bytes) {
//!         Ok(id) => id.to_string(),
//!         Err(e) if e.is_security_error() => format!("rejected: {}", e),
//!         Err(e @ (ExtractError::TooLarge { .. } | ExtractError::TooManyEntries { .. })) => {
//!             format!("over limits: {}", e)
//!         }
//!         Err(e) => format!("failed: {}", e),
//!     }
//! }
//! # let _ = upload;
//! ```
//!
//! [`WorkspaceManager::extract`]: crate::WorkspaceManager::extract
//! [`WorkspaceManager::read`]: crate::WorkspaceManager::read
//! [`WorkspaceManager::evict`]: crate::WorkspaceManager::evict
//! [`ResourceBudget::accept`]: crate::ResourceBudget::accept
//! [`EntryName::parse`]: crate::EntryName::parse
//! [`WorkspaceId::from_str`]: crate::WorkspaceId

use std::io;

/// A resource ceiling was crossed during one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BudgetExceeded {
    /// More non-directory entries than `max_entries`.
    #[error("archive contains more than {limit} files (entry {count})")]
    TooManyEntries {
        /// Entry count at the moment the ceiling was crossed.
        count: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// Cumulative declared size above `max_total_bytes`.
    #[error("extracted data would reach {total} bytes, exceeding limit of {limit} bytes")]
    TooLarge {
        /// Running total including the rejected entry.
        total: u64,
        /// Configured ceiling.
        limit: u64,
    },
}

/// Why an untrusted archive entry name was refused before resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EntryNameError {
    /// Name has no normal segment (`""`, `"."`, `"./"`, `"//"`).
    #[error("empty entry name")]
    Empty,
    /// Name contains a NUL byte.
    #[error("entry name contains NUL byte")]
    NulByte,
    /// Name starts with `/` or `\`.
    #[error("absolute entry name not allowed")]
    Absolute,
    /// Name starts with a drive letter such as `C:`.
    #[error("drive-letter prefix not allowed")]
    DrivePrefix,
    /// Name is longer than the supported maximum.
    #[error("entry name exceeds maximum length of {max} bytes")]
    TooLong {
        /// Maximum supported length.
        max: usize,
    },
}

/// Why a path could not be resolved inside a workspace root.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PathRejection {
    /// The untrusted segment was malformed before any resolution happened.
    #[error(transparent)]
    InvalidName(#[from] EntryNameError),

    /// The resolved path leaves the root (`..`, absolute or symlink escape).
    #[error("path escapes workspace root")]
    Escapes,

    /// A component could not be resolved (dangling link, permission error).
    #[error("path could not be resolved: {0}")]
    Unresolvable(#[source] io::Error),
}

/// The main error type for [`WorkspaceManager::extract`].
///
/// Every variant except [`CorruptArchive`][Self::CorruptArchive] raised while
/// parsing the central directory is reported after the partially built
/// workspace has been removed and unregistered.
///
/// | Category | Variants |
/// |----------|----------|
/// | Limits | [`TooLarge`][Self::TooLarge], [`TooManyEntries`][Self::TooManyEntries] |
/// | Security | [`UnsafePath`][Self::UnsafePath] |
/// | Format | [`CorruptArchive`][Self::CorruptArchive] |
/// | Process | [`Io`][Self::Io] |
///
/// [`WorkspaceManager::extract`]: crate::WorkspaceManager::extract
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The archive payload or its cumulative declared contents are too large.
    ///
    /// `entry_index` is `None` when the raw payload itself was rejected
    /// before any entry was read.
    #[error("archive too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Offending size (payload length or running total).
        size: u64,
        /// Configured `max_total_bytes`.
        limit: u64,
        /// Entry that pushed the total over the limit, if any.
        entry_index: Option<usize>,
    },

    /// The archive holds more files than `max_entries`.
    #[error("archive contains more than {limit} files")]
    TooManyEntries {
        /// Configured `max_entries`.
        limit: usize,
        /// Index of the first entry over the limit.
        entry_index: usize,
    },

    /// Path traversal or symlink escape attempt.
    ///
    /// This is a **security error**: the archive contains an entry whose
    /// name would land outside the workspace root, or a link the
    /// configured [`LinkPolicy`](crate::LinkPolicy) refuses.
    #[error("unsafe path in entry {entry_index}: {path} ({reason})")]
    UnsafePath {
        /// Index of the offending entry.
        entry_index: usize,
        /// The raw entry name.
        path: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The ZIP container could not be parsed or an entry failed to decode.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Process-level failure while materializing the workspace
    /// (disk full, permission denied).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractError {
    /// Returns `true` for path traversal and link escape rejections.
    pub fn is_security_error(&self) -> bool {
        matches!(self, ExtractError::UnsafePath { .. })
    }

    /// Returns `true` if a configured ceiling was crossed.
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(
            self,
            ExtractError::TooLarge { .. } | ExtractError::TooManyEntries { .. }
        )
    }

    /// Returns `true` if the archive data itself is malformed.
    pub fn is_corruption(&self) -> bool {
        matches!(self, ExtractError::CorruptArchive(_))
    }

    pub(crate) fn from_budget(err: BudgetExceeded, entry_index: usize) -> Self {
        match err {
            BudgetExceeded::TooManyEntries { limit, .. } => {
                ExtractError::TooManyEntries { limit, entry_index }
            }
            BudgetExceeded::TooLarge { total, limit } => ExtractError::TooLarge {
                size: total,
                limit,
                entry_index: Some(entry_index),
            },
        }
    }

    pub(crate) fn unsafe_path(
        entry_index: usize,
        path: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        ExtractError::UnsafePath {
            entry_index,
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ExtractError {
    // The archive lives in memory, so reader I/O errors only come from
    // truncated or inconsistent data.
    fn from(err: zip::result::ZipError) -> Self {
        ExtractError::CorruptArchive(err.to_string())
    }
}

/// Error type for [`WorkspaceManager::read`](crate::WorkspaceManager::read).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The requested path is malformed or resolves outside the workspace.
    #[error("invalid path: {path}")]
    InvalidPath {
        /// The path as requested.
        path: String,
    },

    /// The workspace or the file does not exist.
    #[error("file not found: {path}")]
    NotFound {
        /// The path as requested.
        path: String,
    },

    /// The file is larger than `max_readable_file_bytes`. No bytes were read.
    #[error("file too large to read: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// File size on disk.
        size: u64,
        /// Configured `max_readable_file_bytes`.
        limit: u64,
    },

    /// Unexpected I/O failure while reading an existing file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error type for [`WorkspaceManager::evict`](crate::WorkspaceManager::evict).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EvictError {
    /// The workspace is neither registered nor present on disk.
    #[error("workspace not found: {0}")]
    NotFound(String),

    /// Removing the workspace directory failed.
    #[error("failed to remove workspace: {0}")]
    Io(#[from] io::Error),
}

/// A string that is not a canonical workspace identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid workspace id: {0:?}")]
pub struct InvalidWorkspaceId(pub String);
