//! Workspace configuration.
//!
//! One [`WorkspaceConfig`] value parameterizes the whole pipeline: the
//! upfront payload check, the extraction budget and the read cap all come
//! from the same struct, so their ceilings can never drift apart.

use std::path::{Path, PathBuf};

use crate::extract::LinkPolicy;

/// Default maximum number of files in one archive.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default ceiling for the archive payload and for the cumulative
/// declared size of its entries (500 MiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 500 * 1024 * 1024;

/// Default maximum size of a file returned by `read` or scanned by `search`.
pub const DEFAULT_MAX_READABLE_FILE_BYTES: u64 = 300_000;

/// Name of the directory created under the system temp dir when no base
/// directory is configured.
pub const DEFAULT_BASE_DIR_NAME: &str = "workspaces";

/// Configuration for a [`WorkspaceManager`](crate::WorkspaceManager).
///
/// | Option | `standard()` / `default()` | `extended()` |
/// |--------|----------------------------|--------------|
/// | `max_entries` | 10,000 | 10,000 |
/// | `max_total_bytes` | 500 MiB | 1000 MiB |
/// | `max_readable_file_bytes` | 300,000 | 200,000 |
/// | `workspace_base_directory` | `<tmp>/workspaces` | `<tmp>/workspaces` |
/// | `link_policy` | `StoreAsFile` | `StoreAsFile` |
///
/// # Example
///
/// ```rust
/// use zipspace::WorkspaceConfig;
///
/// let config = WorkspaceConfig::default()
///     .max_entries(500)
///     .max_total_bytes(64 * 1024 * 1024)
///     .workspace_base_directory("/srv/uploads");
/// assert_eq!(config.max_entries, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Maximum number of non-directory entries per archive.
    pub max_entries: usize,
    /// Ceiling for the raw payload and the summed declared entry sizes.
    pub max_total_bytes: u64,
    /// Per-file cap for `read` and `search`.
    pub max_readable_file_bytes: u64,
    /// Absolute directory holding one subdirectory per workspace.
    pub workspace_base_directory: PathBuf,
    /// How symbolic link entries are handled.
    pub link_policy: LinkPolicy,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl WorkspaceConfig {
    /// Creates a configuration with the standard profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard deployment profile: 500 MiB total, 300,000-byte reads.
    pub fn standard() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_readable_file_bytes: DEFAULT_MAX_READABLE_FILE_BYTES,
            workspace_base_directory: std::env::temp_dir().join(DEFAULT_BASE_DIR_NAME),
            link_policy: LinkPolicy::default(),
        }
    }

    /// The extended deployment profile: 1000 MiB total, 200,000-byte reads.
    pub fn extended() -> Self {
        Self {
            max_total_bytes: 1000 * 1024 * 1024,
            max_readable_file_bytes: 200_000,
            ..Self::standard()
        }
    }

    /// Sets the maximum number of files.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the payload and cumulative size ceiling.
    pub fn max_total_bytes(mut self, max: u64) -> Self {
        self.max_total_bytes = max;
        self
    }

    /// Sets the per-file read cap.
    pub fn max_readable_file_bytes(mut self, max: u64) -> Self {
        self.max_readable_file_bytes = max;
        self
    }

    /// Sets the base directory for workspaces.
    pub fn workspace_base_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.workspace_base_directory = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the symbolic link policy.
    pub fn link_policy(mut self, policy: LinkPolicy) -> Self {
        self.link_policy = policy;
        self
    }
}
