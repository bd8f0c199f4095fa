//! Workspace directories that roll back unless committed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::registry::{WorkspaceRegistry, remove_workspace_dir};
use crate::workspace::{Workspace, WorkspaceId};

/// A freshly allocated, registered workspace root under construction.
///
/// Dropping a `StagedWorkspace` without calling [`commit`](Self::commit)
/// removes the directory tree and unregisters the id, so every early
/// return from an extraction leaves neither residue nor a dangling
/// registry entry.
pub(crate) struct StagedWorkspace<'a> {
    id: WorkspaceId,
    root: PathBuf,
    created_at: SystemTime,
    registry: &'a WorkspaceRegistry,
    committed: bool,
}

impl<'a> StagedWorkspace<'a> {
    /// Creates `base/<new id>` exclusively and registers it.
    pub(crate) fn create(base: &Path, registry: &'a WorkspaceRegistry) -> io::Result<Self> {
        let id = WorkspaceId::new();
        let root = id.root_in(base);
        // `create_dir`, not `create_dir_all`: an existing directory is never reused.
        fs::create_dir(&root)?;
        registry.register(id);

        let mut staged = Self {
            id,
            root,
            created_at: SystemTime::now(),
            registry,
            committed: false,
        };
        // On failure `staged` drops here and rolls back.
        staged.root = fs::canonicalize(&staged.root)?;
        Ok(staged)
    }

    pub(crate) fn id(&self) -> WorkspaceId {
        self.id
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Keeps the workspace.
    pub(crate) fn commit(mut self) -> Workspace {
        self.committed = true;
        Workspace {
            id: self.id,
            root: self.root.clone(),
            created_at: self.created_at,
        }
    }
}

impl Drop for StagedWorkspace<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = remove_workspace_dir(&self.root) {
            log::warn!(
                "Failed to roll back workspace '{}' at '{}': {}",
                self.id,
                self.root.display(),
                e
            );
        }
        self.registry.unregister(&self.id);
        log::debug!("Rolled back workspace '{}'", self.id);
    }
}
