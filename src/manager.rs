//! The public entry point: [`WorkspaceManager`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::access::{FileOutcome, WorkspaceAccessor};
use crate::config::WorkspaceConfig;
use crate::error::{EvictError, ExtractError, ReadError};
use crate::extract::{ArchiveExtractor, Extraction};
use crate::registry::{CleanupReport, WorkspaceRegistry, lock_or_recover, remove_workspace_dir};
use crate::workspace::{Workspace, WorkspaceId};

/// Owns the workspace base directory, the registry and the configuration.
///
/// All operations take `&self`; the manager is `Send + Sync` and can be
/// shared across threads behind an `Arc`.
///
/// # Example
///
/// ```rust,no_run
/// use zipspace::{WorkspaceConfig, WorkspaceManager};
///
/// let manager = WorkspaceManager::new(WorkspaceConfig::default())?;
/// let id = manager.extract(&std::fs::read("upload.zip")?)?;
///
/// for path in manager.search(&id, "TODO") {
///     println!("{}: {} bytes", path, manager.read(&id, &path)?.len());
/// }
///
/// manager.shutdown();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct WorkspaceManager {
    config: WorkspaceConfig,
    base: PathBuf,
    registry: WorkspaceRegistry,
    accessor: WorkspaceAccessor,
    /// Creation times recorded when each workspace was staged.
    created: Mutex<HashMap<WorkspaceId, SystemTime>>,
}

impl WorkspaceManager {
    /// Creates a manager, creating the base directory if needed.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::InvalidInput`] if the configured base
    /// directory is relative, or with the underlying error if it cannot be
    /// created or canonicalized.
    pub fn new(config: WorkspaceConfig) -> io::Result<Self> {
        Self::with_registry(config, WorkspaceRegistry::new())
    }

    /// Creates a manager with a caller-supplied registry.
    pub fn with_registry(config: WorkspaceConfig, registry: WorkspaceRegistry) -> io::Result<Self> {
        let base = &config.workspace_base_directory;
        if !base.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "workspace base directory must be absolute: {}",
                    base.display()
                ),
            ));
        }
        fs::create_dir_all(base)?;
        let base = fs::canonicalize(base)?;
        let accessor = WorkspaceAccessor::new(&base, config.max_readable_file_bytes);

        Ok(Self {
            config,
            base,
            registry,
            accessor,
            created: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Returns the canonical base directory.
    pub fn base_directory(&self) -> &Path {
        &self.base
    }

    /// Returns the registry.
    pub fn registry(&self) -> &WorkspaceRegistry {
        &self.registry
    }

    /// Extracts an archive into a new workspace and returns its id.
    ///
    /// See [`ArchiveExtractor::extract`] for the failure modes.
    pub fn extract(&self, archive_bytes: &[u8]) -> Result<WorkspaceId, ExtractError> {
        self.extract_with_report(archive_bytes)
            .map(|extraction| extraction.workspace.id)
    }

    /// Like [`extract`](Self::extract), also returning extraction statistics.
    pub fn extract_with_report(&self, archive_bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let extraction =
            ArchiveExtractor::new(&self.config, &self.base, &self.registry).extract(archive_bytes)?;
        lock_or_recover(&self.created)
            .insert(extraction.workspace.id, extraction.workspace.created_at);
        Ok(extraction)
    }

    /// Lists the workspace's files. Empty if the workspace does not exist.
    pub fn list(&self, id: &WorkspaceId) -> Vec<String> {
        self.accessor.list(id)
    }

    /// Reads one file as text.
    pub fn read(&self, id: &WorkspaceId, relative_path: &str) -> Result<String, ReadError> {
        self.accessor.read(id, relative_path)
    }

    /// Returns the files containing `query`.
    pub fn search(&self, id: &WorkspaceId, query: &str) -> Vec<String> {
        self.accessor.search(id, query)
    }

    /// Returns the per-file search outcomes.
    pub fn search_outcomes(&self, id: &WorkspaceId, query: &str) -> Vec<FileOutcome> {
        self.accessor.search_outcomes(id, query)
    }

    /// Looks up a registered workspace.
    ///
    /// Returns `None` if the id is not registered or its root is gone.
    /// `created_at` is the time the workspace was staged. For workspaces
    /// registered by an [`ArchiveExtractor`] driven outside this manager it
    /// is approximated from the root's file system timestamps.
    pub fn workspace(&self, id: &WorkspaceId) -> Option<Workspace> {
        if !self.registry.is_registered(id) {
            return None;
        }
        let root = id.root_in(&self.base);
        let meta = fs::metadata(&root).ok().filter(|m| m.is_dir())?;
        let recorded = lock_or_recover(&self.created).get(id).copied();
        let created_at = recorded.unwrap_or_else(|| {
            meta.created()
                .or_else(|_| meta.modified())
                .unwrap_or(UNIX_EPOCH)
        });
        Some(Workspace {
            id: *id,
            root,
            created_at,
        })
    }

    /// Returns the ids of all registered workspaces, sorted.
    pub fn active(&self) -> Vec<WorkspaceId> {
        self.registry.ids()
    }

    /// Removes one workspace and unregisters it.
    ///
    /// # Errors
    ///
    /// - [`EvictError::NotFound`] if the id is neither registered nor
    ///   present on disk
    /// - [`EvictError::Io`] if the directory could not be removed; the id
    ///   stays registered so [`shutdown`](Self::shutdown) retries it
    pub fn evict(&self, id: &WorkspaceId) -> Result<(), EvictError> {
        let root = id.root_in(&self.base);
        let registered = self.registry.is_registered(id);
        if !registered && fs::symlink_metadata(&root).is_err() {
            return Err(EvictError::NotFound(id.to_string()));
        }

        remove_workspace_dir(&root).inspect_err(|e| {
            log::warn!("Failed to evict workspace '{}': {}", id, e);
        })?;
        self.registry.unregister(id);
        lock_or_recover(&self.created).remove(id);
        log::info!("Evicted workspace '{}'", id);
        Ok(())
    }

    /// Removes every registered workspace. Best-effort; see
    /// [`WorkspaceRegistry::cleanup_all`].
    pub fn shutdown(&self) -> CleanupReport {
        let report = self.registry.cleanup_all(&self.base);
        lock_or_recover(&self.created).clear();
        report
    }
}
