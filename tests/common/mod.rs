//! Shared test utilities for integration tests.
//!
//! Archives are built in memory with `zip::ZipWriter`; every test gets its
//! own temporary base directory.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;
use zipspace::{WorkspaceConfig, WorkspaceManager};

/// One entry to put into a test archive.
#[derive(Debug, Clone)]
pub enum TestEntry<'a> {
    /// A regular file with contents.
    File(&'a str, &'a [u8]),
    /// A directory marker (`name` should end with `/`).
    Dir(&'a str),
    /// A symbolic link `name -> target`.
    Symlink(&'a str, &'a str),
}

/// Options for stored (uncompressed) entries.
pub fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
}

/// Builds an archive from mixed entries using `options` for every entry.
pub fn build_archive_with(options: SimpleFileOptions, entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match entry {
            TestEntry::File(name, data) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            TestEntry::Dir(name) => writer.add_directory(*name, options).unwrap(),
            TestEntry::Symlink(name, target) => {
                writer.add_symlink(*name, *target, options).unwrap()
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Builds a stored archive from mixed entries.
pub fn build_archive(entries: &[TestEntry<'_>]) -> Vec<u8> {
    build_archive_with(stored(), entries)
}

/// Builds a stored archive containing only files.
///
/// # Example
///
/// ```ignore
/// let bytes = create_archive(&[("file.txt", b"content" as &[u8])]);
/// ```
pub fn create_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let entries: Vec<_> = files
        .iter()
        .map(|(name, data)| TestEntry::File(name, data))
        .collect();
    build_archive(&entries)
}

/// A manager rooted in a fresh temporary directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn manager_with(config: WorkspaceConfig) -> (TempDir, WorkspaceManager) {
    let dir = TempDir::new().unwrap();
    let config = config.workspace_base_directory(dir.path().join("workspaces"));
    let manager = WorkspaceManager::new(config).unwrap();
    (dir, manager)
}

/// A manager with the default configuration.
pub fn manager() -> (TempDir, WorkspaceManager) {
    manager_with(WorkspaceConfig::default())
}

/// Number of entries directly under `dir`.
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Extracts the error from a Result, panicking if it's Ok.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}
