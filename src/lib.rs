//! # zipspace
//!
//! Disposable, sandboxed workspaces extracted from untrusted ZIP archives.
//!
//! A [`WorkspaceManager`] turns an uploaded archive into a fresh directory
//! under a configured base directory and hands back an opaque
//! [`WorkspaceId`]. The workspace can then be listed, read and searched
//! without any path ever resolving outside its root.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zipspace::{WorkspaceConfig, WorkspaceManager};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = WorkspaceManager::new(
//!         WorkspaceConfig::default().workspace_base_directory("/srv/workspaces"),
//!     )?;
//!
//!     let id = manager.extract(&std::fs::read("upload.zip")?)?;
//!     for path in manager.list(&id) {
//!         println!("{}", path);
//!     }
//!     println!("{}", manager.read(&id, "README.md")?);
//!     println!("{:?}", manager.search(&id, "fn main"));
//!
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate-compressed entries |
//! | `bzip2` | Yes | BZip2-compressed entries |
//! | `zstd` | No | Zstandard-compressed entries |
//! | `lzma` | No | LZMA-compressed entries |
//!
//! Stored (uncompressed) entries are always supported. An entry using a
//! disabled method fails extraction with [`ExtractError::CorruptArchive`].
//!
//! ## Safety and Resource Limits
//!
//! Extraction is built around a few guarantees:
//!
//! - **Path containment**: every entry name is resolved component by
//!   component against the canonical workspace root by [`PathGuard`];
//!   `..` climbing out, absolute names and planted symbolic links are
//!   refused with [`ExtractError::UnsafePath`]
//! - **Resource limits**: the raw payload, the number of files and the
//!   summed declared sizes are checked by [`ResourceBudget`] before any
//!   byte is written, and each entry is cut off if it inflates past the
//!   size it declared
//! - **Rollback**: a failed extraction removes its workspace directory and
//!   registry entry, leaving no residue
//! - **Links**: symbolic link entries become regular files holding the
//!   target text unless [`LinkPolicy`] says otherwise
//!
//! ```rust
//! use zipspace::{LinkPolicy, WorkspaceConfig};
//!
//! let config = WorkspaceConfig::default()
//!     .max_entries(1_000)
//!     .max_total_bytes(100 * 1024 * 1024)
//!     .link_policy(LinkPolicy::Forbid);
//! assert_eq!(config.max_readable_file_bytes, 300_000);
//! ```
//!
//! ## Lifecycle
//!
//! Workspaces live until [`WorkspaceManager::evict`] removes one, or
//! [`WorkspaceManager::shutdown`] removes every workspace the manager
//! created. Shutdown is an explicit call and is best-effort.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger. Security rejections and cleanup failures are logged
//! at `warn`, workspace summaries at `info`, per-entry decisions at `debug`.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod access;
mod budget;
mod config;
mod entry_name;
pub mod error;
mod extract;
mod manager;
mod registry;
pub mod safety;
mod workspace;

pub use error::{
    BudgetExceeded, EntryNameError, EvictError, ExtractError, InvalidWorkspaceId, PathRejection,
    ReadError,
};

pub use config::{
    DEFAULT_BASE_DIR_NAME, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_READABLE_FILE_BYTES,
    DEFAULT_MAX_TOTAL_BYTES, WorkspaceConfig,
};
pub use manager::WorkspaceManager;
pub use workspace::{Workspace, WorkspaceId};

// Re-export extraction API
pub use extract::{ArchiveExtractor, ExtractReport, Extraction, LinkPolicy};

// Re-export access API
pub use access::{FileOutcome, SkipReason, WorkspaceAccessor};

// Re-export registry API
pub use registry::{CleanupReport, MutexSet, WorkspaceRegistry, WorkspaceSet};

// Re-export safety utilities
pub use budget::ResourceBudget;
pub use entry_name::{EntryName, MAX_NAME_LENGTH};
pub use safety::{LimitedReader, PathGuard, SizeMismatch};
