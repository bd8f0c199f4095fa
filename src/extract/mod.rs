//! ZIP extraction into fresh workspaces.
//!
//! [`ArchiveExtractor`] turns an untrusted in-memory ZIP payload into a new
//! workspace directory. Entries are processed strictly in archive order:
//!
//! 1. The payload length is checked against `max_total_bytes`.
//! 2. The central directory is parsed; failure is [`ExtractError::CorruptArchive`]
//!    and nothing is allocated.
//! 3. A new workspace root is created exclusively and registered.
//! 4. Each entry is charged against the [`ResourceBudget`], its name is
//!    resolved with the [`PathGuard`], and its bytes are streamed to disk
//!    through a [`LimitedReader`] capped at the declared size.
//! 5. Symbolic links created under [`LinkPolicy::ValidateTargets`] are
//!    traced once more through the finished tree.
//!
//! Any failure drops the staged workspace, which removes the directory and
//! unregisters the id.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipspace::{ArchiveExtractor, WorkspaceConfig, WorkspaceRegistry};
//!
//! let config = WorkspaceConfig::default();
//! std::fs::create_dir_all(&config.workspace_base_directory)?;
//! let registry = WorkspaceRegistry::new();
//! let extractor = ArchiveExtractor::new(&config, &config.workspace_base_directory, &registry);
//!
//! let bytes = std::fs::read("upload.zip")?;
//! let extraction = extractor.extract(&bytes)?;
//! println!(
//!     "{}: {} files, {} bytes",
//!     extraction.workspace.id,
//!     extraction.report.files_written,
//!     extraction.report.bytes_written
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod links;
mod staging;

use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::budget::ResourceBudget;
use crate::config::WorkspaceConfig;
use crate::entry_name::{EntryName, MAX_NAME_LENGTH};
use crate::error::ExtractError;
use crate::registry::WorkspaceRegistry;
use crate::safety::{LimitedReader, PathGuard, SizeMismatch};
use crate::workspace::Workspace;

pub use links::LinkPolicy;

use links::{create_symlink, validate_symlink_target};
use staging::StagedWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
    /// The entry data is the link target.
    Symlink,
}

/// A link created during extraction, re-traced before commit.
#[derive(Debug)]
struct PlantedLink {
    index: usize,
    raw_name: String,
    path: PathBuf,
    parent: PathBuf,
    target: String,
}

/// Statistics for one successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Regular files written (including overwrites).
    pub files_written: usize,
    /// Directories created by directory markers.
    pub directories_created: usize,
    /// Symbolic links created.
    pub symlinks_created: usize,
    /// Bytes written to disk.
    pub bytes_written: u64,
    /// Entries that replaced an earlier entry with the same resolved path.
    pub duplicates_overwritten: usize,
}

/// A committed workspace together with its extraction statistics.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The new workspace.
    pub workspace: Workspace,
    /// What was written.
    pub report: ExtractReport,
}

/// Extracts ZIP payloads into new workspaces under a base directory.
#[derive(Debug)]
pub struct ArchiveExtractor<'a> {
    config: &'a WorkspaceConfig,
    base: &'a Path,
    registry: &'a WorkspaceRegistry,
}

impl<'a> ArchiveExtractor<'a> {
    /// Creates an extractor. `base` must exist.
    pub fn new(config: &'a WorkspaceConfig, base: &'a Path, registry: &'a WorkspaceRegistry) -> Self {
        Self {
            config,
            base,
            registry,
        }
    }

    /// Extracts `archive_bytes` into a new workspace.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::TooLarge`] if the payload or the summed declared
    ///   entry sizes exceed `max_total_bytes`
    /// - [`ExtractError::TooManyEntries`] if there are more than
    ///   `max_entries` files
    /// - [`ExtractError::UnsafePath`] for traversal, absolute or empty
    ///   names, and links refused by the [`LinkPolicy`]
    /// - [`ExtractError::CorruptArchive`] if the container or an entry
    ///   cannot be decoded
    /// - [`ExtractError::Io`] for file system failures
    ///
    /// On every error the partially built workspace is removed.
    pub fn extract(&self, archive_bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let mut budget = ResourceBudget::from_config(self.config);
        budget.check_input(archive_bytes.len() as u64)?;

        let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

        let staged = StagedWorkspace::create(self.base, self.registry)?;
        let guard = PathGuard::new(staged.root())?;
        let mut report = ExtractReport::default();
        let mut links = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let raw_name = entry.name().to_string();
            let declared = entry.size();
            let kind = if entry.is_dir() || raw_name.ends_with('\\') {
                EntryKind::Directory
            } else if entry.is_symlink() {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };

            let mut ctx = EntryContext {
                guard: &guard,
                index,
                raw_name: &raw_name,
                report: &mut report,
                links: &mut links,
            };
            match (kind, self.config.link_policy) {
                (EntryKind::Directory, _) => ctx.create_directory()?,
                (EntryKind::File, _) | (EntryKind::Symlink, LinkPolicy::StoreAsFile) => {
                    charge(&mut budget, index, declared)?;
                    ctx.write_file(&mut entry, declared)?;
                }
                (EntryKind::Symlink, policy) => {
                    charge(&mut budget, index, declared)?;
                    ctx.create_link(&mut entry, declared, policy)?;
                }
            }
        }

        // A later link can change where an earlier link's `..` lands.
        for link in &links {
            guard
                .resolve_link_target(&link.parent, &link.target)
                .map_err(|e| {
                    log::warn!(
                        "Rejected unsafe link {} '{}': {}",
                        link.index,
                        link.raw_name,
                        e
                    );
                    ExtractError::unsafe_path(link.index, &link.raw_name, e)
                })?;
        }

        log::info!(
            "Extracted workspace '{}': {} files, {} directories, {} bytes",
            staged.id(),
            report.files_written,
            report.directories_created,
            report.bytes_written
        );

        Ok(Extraction {
            workspace: staged.commit(),
            report,
        })
    }
}

fn charge(budget: &mut ResourceBudget, index: usize, declared: u64) -> Result<(), ExtractError> {
    budget
        .accept(declared)
        .map_err(|e| ExtractError::from_budget(e, index))
}

/// Per-entry state shared by the three materialization paths.
struct EntryContext<'a> {
    guard: &'a PathGuard,
    index: usize,
    raw_name: &'a str,
    report: &'a mut ExtractReport,
    links: &'a mut Vec<PlantedLink>,
}

impl EntryContext<'_> {
    fn reject(&self, reason: impl std::fmt::Display) -> ExtractError {
        log::warn!(
            "Rejected unsafe entry {} '{}': {}",
            self.index,
            self.raw_name,
            reason
        );
        ExtractError::unsafe_path(self.index, self.raw_name, reason)
    }

    fn parse_name(&self) -> Result<EntryName, ExtractError> {
        EntryName::parse(self.raw_name).map_err(|e| self.reject(e))
    }

    /// Resolves the entry to a path strictly below the root.
    fn resolve_target(&self, name: &EntryName) -> Result<PathBuf, ExtractError> {
        let target = self.guard.resolve_name(name).map_err(|e| self.reject(e))?;
        if target == self.guard.root() {
            return Err(self.reject("entry resolves to workspace root"));
        }
        Ok(target)
    }

    fn create_directory(&mut self) -> Result<(), ExtractError> {
        let name = self.parse_name()?;
        let target = self.guard.resolve_name(&name).map_err(|e| self.reject(e))?;
        if !target.is_dir() {
            fs::create_dir_all(&target)?;
            self.report.directories_created += 1;
            log::debug!("Created directory '{}'", name);
        }
        Ok(())
    }

    fn write_file(&mut self, entry: &mut impl Read, declared: u64) -> Result<(), ExtractError> {
        let name = self.parse_name()?;
        let target = self.resolve_target(&name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let replaced = fs::symlink_metadata(&target).is_ok();
        let mut file = File::create(&target)?;
        let mut limited = LimitedReader::new(entry).max_entry_bytes(declared);
        let written = io::copy(&mut limited, &mut file).map_err(|e| self.copy_error(e))?;

        if replaced {
            self.report.duplicates_overwritten += 1;
            log::debug!("Entry {} '{}' overwrote an earlier entry", self.index, name);
        }
        self.report.files_written += 1;
        self.report.bytes_written += written;
        Ok(())
    }

    fn create_link(
        &mut self,
        entry: &mut impl Read,
        declared: u64,
        policy: LinkPolicy,
    ) -> Result<(), ExtractError> {
        if policy != LinkPolicy::ValidateTargets {
            return Err(self.reject("symbolic links are not allowed"));
        }

        let name = self.parse_name()?;
        let segments: Vec<&str> = name.segments().collect();
        let Some((file_name, parent_segments)) = segments.split_last() else {
            return Err(self.reject("link name must end in a file name"));
        };
        if *file_name == ".." {
            return Err(self.reject("link name must end in a file name"));
        }

        // Resolve the containing directory only; the link itself is not followed.
        let parent = if parent_segments.is_empty() {
            self.guard.root().to_path_buf()
        } else {
            self.guard
                .resolve(&parent_segments.join("/"))
                .map_err(|e| self.reject(e))?
        };
        let link_path = parent.join(file_name);
        if !self.guard.contains(&link_path) || link_path == self.guard.root() {
            return Err(self.reject("link resolves outside workspace"));
        }

        let mut raw_target = Vec::new();
        LimitedReader::new(entry)
            .max_entry_bytes(declared.min(MAX_NAME_LENGTH as u64))
            .read_to_end(&mut raw_target)
            .map_err(|e| self.copy_error(e))?;
        let target = String::from_utf8(raw_target)
            .map_err(|_| self.reject("link target is not valid UTF-8"))?
            .replace('\\', "/");

        let depth = parent
            .strip_prefix(self.guard.root())
            .map(|rel| rel.components().count())
            .unwrap_or(0);
        validate_symlink_target(self.index, self.raw_name, depth, &target).inspect_err(|e| {
            log::warn!("Rejected unsafe link {} '{}': {}", self.index, self.raw_name, e);
        })?;
        // The text stays inside; now follow the links already on disk.
        self.guard
            .resolve_link_target(&parent, &target)
            .map_err(|e| self.reject(e))?;

        fs::create_dir_all(&parent)?;
        if let Ok(meta) = fs::symlink_metadata(&link_path) {
            if meta.is_dir() {
                return Err(self.reject("link would replace a directory"));
            }
            fs::remove_file(&link_path)?;
            self.links.retain(|link| link.path != link_path);
            self.report.duplicates_overwritten += 1;
        }
        create_symlink(&link_path, &target).map_err(|e| match e.kind() {
            io::ErrorKind::Unsupported => self.reject(e),
            _ => ExtractError::Io(e),
        })?;

        self.links.push(PlantedLink {
            index: self.index,
            raw_name: self.raw_name.to_string(),
            path: link_path,
            parent,
            target,
        });
        self.report.symlinks_created += 1;
        Ok(())
    }

    /// Splits copy failures into archive corruption and process errors.
    fn copy_error(&self, err: io::Error) -> ExtractError {
        if let Some(mismatch) = err.get_ref().and_then(|e| e.downcast_ref::<SizeMismatch>()) {
            return ExtractError::CorruptArchive(format!(
                "entry {} '{}': {}",
                self.index, self.raw_name, mismatch
            ));
        }
        match err.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                ExtractError::CorruptArchive(format!(
                    "entry {} '{}': {}",
                    self.index, self.raw_name, err
                ))
            }
            _ => ExtractError::Io(err),
        }
    }
}
