//! Workspace identity and metadata.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use uuid::Uuid;

use crate::error::InvalidWorkspaceId;

/// Opaque identifier of a workspace: a random 128-bit UUID.
///
/// The string form is the canonical hyphenated UUID. Parsing accepts only
/// that form, so an id coming from a caller can never smuggle separators or
/// `..` into the workspace path.
///
/// # Examples
///
/// ```
/// use zipspace::WorkspaceId;
///
/// let id = WorkspaceId::new();
/// let parsed: WorkspaceId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
///
/// assert!("../../etc".parse::<WorkspaceId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspaceId(Uuid);

impl WorkspaceId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Directory name of this workspace under the base directory.
    pub(crate) fn dir_name(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Root directory of this workspace under `base`.
    pub fn root_in(&self, base: &Path) -> PathBuf {
        base.join(self.dir_name())
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for WorkspaceId {
    type Err = InvalidWorkspaceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the canonical 36-character form; no braces, URNs or simple form.
        if s.len() != 36 {
            return Err(InvalidWorkspaceId(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| InvalidWorkspaceId(s.to_string()))
    }
}

/// A live workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Identifier handed to callers.
    pub id: WorkspaceId,
    /// Canonical root directory.
    pub root: PathBuf,
    /// When the root directory was created.
    pub created_at: SystemTime,
}
