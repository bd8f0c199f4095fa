//! Symbolic link entries.
//!
//! By default a link entry is written as a regular file holding its target
//! text. With [`LinkPolicy::ValidateTargets`] a real link is created only
//! when its target is relative and, traced from the link's real location,
//! never climbs above the workspace root. Created links are traced again
//! through the finished tree before the workspace is committed.

use std::io;
use std::path::{Component, Path};

use crate::error::ExtractError;

/// Policy for handling symbolic link entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Write the entry as a regular file whose content is the link target.
    #[default]
    StoreAsFile,
    /// Reject any archive containing a symbolic link.
    Forbid,
    /// Create links whose targets stay inside the workspace.
    ///
    /// Links are not regular files, so they do not appear in listings.
    ValidateTargets,
}

/// Validates that a link target doesn't escape the workspace root.
///
/// `parent_depth` is the number of directories between the root and the
/// directory that will contain the link, measured on the resolved path
/// rather than the archive name, so `a/b/../link` counts as depth 1.
///
/// Rejects:
/// - empty targets and targets containing NUL
/// - absolute targets (`/x`, `\x`) and drive-letter targets (`C:\x`)
/// - targets whose `..` segments climb above the root
pub(crate) fn validate_symlink_target(
    entry_index: usize,
    entry_name: &str,
    parent_depth: usize,
    target: &str,
) -> Result<(), ExtractError> {
    let reject = |reason: &str| ExtractError::unsafe_path(entry_index, entry_name, reason);

    if target.is_empty() || target.contains('\0') {
        return Err(reject("invalid link target"));
    }

    let target = target.replace('\\', "/");
    if target.starts_with('/') {
        return Err(reject("absolute link target"));
    }
    let bytes = target.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(reject("drive-letter link target"));
    }

    // Trace through the target, tracking depth relative to the root.
    let mut depth = parent_depth as i64;
    for component in Path::new(&target).components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(reject("link target escapes workspace"));
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject("absolute link target"));
            }
        }
    }

    Ok(())
}

/// Creates a symbolic link at `link_path` pointing to `target`.
#[cfg(unix)]
pub(crate) fn create_symlink(link_path: &Path, target: &str) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link_path)
}

/// Creates a symbolic link at `link_path` pointing to `target`.
#[cfg(not(unix))]
pub(crate) fn create_symlink(_link_path: &Path, _target: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
