//! Registry of live workspaces.
//!
//! The registry only answers one question: which workspaces must be removed
//! when the owner shuts down. It is a set of ids behind the [`WorkspaceSet`]
//! trait so hosts can plug in their own concurrency-safe storage.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::workspace::WorkspaceId;

/// A concurrency-safe set of workspace ids.
pub trait WorkspaceSet: Send + Sync {
    /// Adds an id. Returns `false` if it was already present.
    fn insert(&self, id: WorkspaceId) -> bool;

    /// Removes an id. Returns `false` if it was absent.
    fn remove(&self, id: &WorkspaceId) -> bool;

    /// Returns `true` if the id is present.
    fn contains(&self, id: &WorkspaceId) -> bool;

    /// Returns a point-in-time copy of all ids, sorted.
    fn snapshot(&self) -> Vec<WorkspaceId>;

    /// Returns the number of ids.
    fn len(&self) -> usize;

    /// Returns `true` if there are no ids.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquires a mutex lock, recovering from poisoned state if necessary.
///
/// The guarded tables hold plain ids and timestamps; a panic while holding
/// the lock cannot leave them logically inconsistent.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Workspace table mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Default [`WorkspaceSet`]: a `HashSet` behind a `Mutex`.
#[derive(Debug, Default)]
pub struct MutexSet {
    inner: Mutex<HashSet<WorkspaceId>>,
}

impl MutexSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkspaceSet for MutexSet {
    fn insert(&self, id: WorkspaceId) -> bool {
        lock_or_recover(&self.inner).insert(id)
    }

    fn remove(&self, id: &WorkspaceId) -> bool {
        lock_or_recover(&self.inner).remove(id)
    }

    fn contains(&self, id: &WorkspaceId) -> bool {
        lock_or_recover(&self.inner).contains(id)
    }

    fn snapshot(&self) -> Vec<WorkspaceId> {
        let mut ids: Vec<_> = lock_or_recover(&self.inner).iter().copied().collect();
        ids.sort();
        ids
    }

    fn len(&self) -> usize {
        lock_or_recover(&self.inner).len()
    }
}

/// Outcome of a bulk cleanup.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Workspaces whose directories were removed (or already gone).
    pub removed: usize,
    /// Workspaces whose removal failed, with the error.
    pub failed: Vec<(WorkspaceId, io::Error)>,
}

impl CleanupReport {
    /// Returns `true` if every workspace was removed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process-wide table of live workspace ids.
///
/// Owned by a [`WorkspaceManager`](crate::WorkspaceManager); shutdown
/// cleanup is the explicit [`cleanup_all`](Self::cleanup_all) call.
pub struct WorkspaceRegistry {
    set: Box<dyn WorkspaceSet>,
}

impl Default for WorkspaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorkspaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceRegistry")
            .field("len", &self.set.len())
            .finish_non_exhaustive()
    }
}

impl WorkspaceRegistry {
    /// Creates a registry backed by a [`MutexSet`].
    pub fn new() -> Self {
        Self::with_set(MutexSet::new())
    }

    /// Creates a registry backed by a custom set.
    pub fn with_set(set: impl WorkspaceSet + 'static) -> Self {
        Self { set: Box::new(set) }
    }

    /// Registers a workspace as eligible for cleanup.
    pub fn register(&self, id: WorkspaceId) -> bool {
        self.set.insert(id)
    }

    /// Unregisters a workspace.
    pub fn unregister(&self, id: &WorkspaceId) -> bool {
        self.set.remove(id)
    }

    /// Returns `true` if the workspace is registered.
    pub fn is_registered(&self, id: &WorkspaceId) -> bool {
        self.set.contains(id)
    }

    /// Returns all registered ids, sorted.
    pub fn ids(&self) -> Vec<WorkspaceId> {
        self.set.snapshot()
    }

    /// Returns the number of registered workspaces.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if no workspace is registered.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Removes every registered workspace under `base` and clears the set.
    ///
    /// Best-effort: a failing removal is logged and recorded in the report,
    /// and cleanup continues with the remaining workspaces. Failed ids are
    /// unregistered as well, since nothing would retry them.
    pub fn cleanup_all(&self, base: &Path) -> CleanupReport {
        let mut report = CleanupReport::default();

        for id in self.set.snapshot() {
            match remove_workspace_dir(&id.root_in(base)) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    log::warn!("Failed to remove workspace '{}': {}", id, e);
                    report.failed.push((id, e));
                }
            }
            self.set.remove(&id);
        }

        log::info!(
            "Workspace cleanup finished: {} removed, {} failed",
            report.removed,
            report.failed.len()
        );
        report
    }
}

/// Recursively removes a workspace directory; an absent directory is fine.
pub(crate) fn remove_workspace_dir(root: &Path) -> io::Result<()> {
    match fs::remove_dir_all(root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
