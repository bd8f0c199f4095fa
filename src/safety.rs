//! Path containment and read limits.
//!
//! This module holds the single safety primitive every other component
//! relies on: [`PathGuard`], which resolves untrusted relative paths against
//! a canonical workspace root and refuses anything that lands outside it.
//! It also provides [`LimitedReader`], which stops an entry from inflating
//! past the size its header declared.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::entry_name::EntryName;
use crate::error::PathRejection;

/// Returns `true` iff `candidate` is `root` or lies beneath it.
///
/// Both paths must already be canonical. The comparison is component-wise,
/// so `/srv/ws-evil` is not inside `/srv/ws`.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
/// use zipspace::safety::contains;
///
/// assert!(contains(Path::new("/srv/ws"), Path::new("/srv/ws/a.txt")));
/// assert!(contains(Path::new("/srv/ws"), Path::new("/srv/ws")));
/// assert!(!contains(Path::new("/srv/ws"), Path::new("/srv/ws-evil/a.txt")));
/// assert!(!contains(Path::new("/srv/ws"), Path::new("/srv")));
/// ```
pub fn contains(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Resolves untrusted relative paths strictly inside a root directory.
///
/// Resolution walks the untrusted path one segment at a time starting from
/// the canonical root. Every segment that exists on disk and is a symbolic
/// link is canonicalized immediately, and the running path is checked
/// against the root after every step. This rejects:
///
/// - absolute names and drive prefixes (refused by [`EntryName`])
/// - `..` sequences that climb above the root, even transiently
/// - links planted earlier (by a previous archive entry or otherwise) that
///   redirect a later path outside the root
///
/// Any error while resolving a component is a rejection.
///
/// # Examples
///
/// ```rust,no_run
/// use zipspace::PathGuard;
///
/// let guard = PathGuard::new("/srv/workspaces/1b4e28ba-2fa1-11d2-883f-0016d3cca427")?;
/// assert!(guard.resolve("docs/readme.md").is_ok());
/// assert!(guard.resolve("../../etc/passwd").is_err());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Creates a guard for `root`, canonicalizing it.
    ///
    /// # Errors
    ///
    /// Fails if the root does not exist or cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: fs::canonicalize(root)?,
        })
    }

    /// Returns the canonical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` iff the canonical `candidate` is inside the root.
    pub fn contains(&self, candidate: &Path) -> bool {
        contains(&self.root, candidate)
    }

    /// Parses and resolves an untrusted relative path.
    ///
    /// # Errors
    ///
    /// - [`PathRejection::InvalidName`] for malformed names
    /// - [`PathRejection::Escapes`] if any step leaves the root
    /// - [`PathRejection::Unresolvable`] if a component cannot be resolved
    pub fn resolve(&self, untrusted: &str) -> Result<PathBuf, PathRejection> {
        let name = EntryName::parse(untrusted)?;
        self.resolve_name(&name)
    }

    /// Resolves an already parsed entry name.
    ///
    /// The returned path may equal the root (`a/..`); callers that need a
    /// proper descendant check for that themselves.
    pub fn resolve_name(&self, name: &EntryName) -> Result<PathBuf, PathRejection> {
        self.walk(self.root.clone(), name.segments())
    }

    /// Traces a relative link `target` from the canonical directory `start`.
    ///
    /// Existing links along the way are followed, so a `..` after a link
    /// steps out of wherever that link really points. `start` must be the
    /// root or lie inside it.
    ///
    /// # Errors
    ///
    /// - [`PathRejection::Escapes`] if `start` or any step is outside the root
    /// - [`PathRejection::Unresolvable`] if a link along the way cannot be
    ///   canonicalized
    pub fn resolve_link_target(&self, start: &Path, target: &str) -> Result<PathBuf, PathRejection> {
        if !self.contains(start) {
            return Err(PathRejection::Escapes);
        }
        let segments = target.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".");
        self.walk(start.to_path_buf(), segments)
    }

    fn walk<'s>(
        &self,
        mut current: PathBuf,
        segments: impl Iterator<Item = &'s str>,
    ) -> Result<PathBuf, PathRejection> {
        for segment in segments {
            if segment == ".." {
                // `current` is canonical, so popping is a real parent step.
                if !current.pop() || !self.contains(&current) {
                    return Err(PathRejection::Escapes);
                }
                continue;
            }

            current.push(segment);
            match fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    current = fs::canonicalize(&current).map_err(PathRejection::Unresolvable)?;
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(PathRejection::Unresolvable(e)),
            }

            if !self.contains(&current) {
                return Err(PathRejection::Escapes);
            }
        }

        Ok(current)
    }
}

/// Marker error carried inside the `io::Error` returned by
/// [`LimitedReader`] when an entry inflates past its declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("entry produced {produced} bytes, more than the declared {declared}")]
pub struct SizeMismatch {
    /// Size from the entry header.
    pub declared: u64,
    /// Bytes produced when the overflow was detected.
    pub produced: u64,
}

/// A reader wrapper that refuses to produce more than a fixed byte count.
///
/// Budgets are charged with the sizes entry headers declare. An entry whose
/// decoder yields more than that is lying about its size, so the copy is
/// stopped with an [`io::ErrorKind::InvalidData`] error wrapping
/// [`SizeMismatch`].
pub struct LimitedReader<R> {
    inner: R,
    /// Maximum bytes this entry can produce.
    max_entry_bytes: u64,
    /// Bytes read from this entry so far.
    bytes_read: u64,
}

impl<R> LimitedReader<R> {
    /// Creates a new limited reader with no limit.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_entry_bytes: u64::MAX,
            bytes_read: 0,
        }
    }

    /// Sets the maximum bytes for this entry.
    pub fn max_entry_bytes(mut self, max: u64) -> Self {
        self.max_entry_bytes = max;
        self
    }

    /// Returns the number of bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Ok(0);
        }

        self.bytes_read += n as u64;
        if self.bytes_read > self.max_entry_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                SizeMismatch {
                    declared: self.max_entry_bytes,
                    produced: self.bytes_read,
                },
            ));
        }

        Ok(n)
    }
}

impl<R> std::fmt::Debug for LimitedReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitedReader")
            .field("max_entry_bytes", &self.max_entry_bytes)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn guard() -> (TempDir, PathGuard) {
        let dir = TempDir::new().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        (dir, guard)
    }

    #[test]
    fn test_contains_is_component_wise() {
        let root = Path::new("/srv/ws");
        assert!(contains(root, Path::new("/srv/ws")));
        assert!(contains(root, Path::new("/srv/ws/a/b")));
        assert!(!contains(root, Path::new("/srv/ws2/a")));
        assert!(!contains(root, Path::new("/srv")));
    }

    #[test]
    fn test_resolve_normal_path() {
        let (_dir, guard) = guard();
        let resolved = guard.resolve("foo/bar.txt").unwrap();
        assert_eq!(resolved, guard.root().join("foo").join("bar.txt"));
    }

    #[test]
    fn test_resolve_inner_parent_dir() {
        let (_dir, guard) = guard();
        let resolved = guard.resolve("foo/../bar.txt").unwrap();
        assert_eq!(resolved, guard.root().join("bar.txt"));
    }

    #[test]
    fn test_resolve_to_root() {
        let (_dir, guard) = guard();
        assert_eq!(guard.resolve("foo/..").unwrap(), guard.root());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, guard) = guard();
        assert!(matches!(
            guard.resolve("../../etc/passwd"),
            Err(PathRejection::Escapes)
        ));
        assert!(matches!(guard.resolve(".."), Err(PathRejection::Escapes)));
    }

    #[test]
    fn test_resolve_rejects_transient_escape() {
        let (dir, guard) = guard();
        let name = dir.path().file_name().unwrap().to_str().unwrap().to_string();
        // Leaves the root and comes back: still refused.
        let sneaky = format!("../{}/a.txt", name);
        assert!(matches!(guard.resolve(&sneaky), Err(PathRejection::Escapes)));
    }

    #[test]
    fn test_resolve_rejects_absolute() {
        let (_dir, guard) = guard();
        assert!(matches!(
            guard.resolve("/etc/passwd"),
            Err(PathRejection::InvalidName(_))
        ));
        assert!(matches!(
            guard.resolve("C:\\Windows\\system.ini"),
            Err(PathRejection::InvalidName(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (dir, guard) = guard();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        assert!(matches!(
            guard.resolve("link/evil.txt"),
            Err(PathRejection::Escapes)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_internal_symlink() {
        let (dir, guard) = guard();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink("real", dir.path().join("alias")).unwrap();

        let resolved = guard.resolve("alias/file.txt").unwrap();
        assert_eq!(resolved, guard.root().join("real").join("file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_dangling_symlink() {
        let (dir, guard) = guard();
        std::os::unix::fs::symlink("missing-target", dir.path().join("dangling")).unwrap();

        assert!(matches!(
            guard.resolve("dangling"),
            Err(PathRejection::Unresolvable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_target_traced_through_earlier_links() {
        let (_dir, guard) = guard();
        let root = guard.root().to_path_buf();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::os::unix::fs::symlink("../..", root.join("a/b/l1")).unwrap();

        // Textually `a/b/c/../l1/..` is `a/b`, but `l1` is the root.
        assert!(matches!(
            guard.resolve_link_target(&root.join("a/b/c"), "../l1/.."),
            Err(PathRejection::Escapes)
        ));
        assert_eq!(
            guard.resolve_link_target(&root.join("a/b/c"), "../l1/a").unwrap(),
            root.join("a")
        );
    }

    #[test]
    fn test_link_target_start_outside_root() {
        let (_dir, guard) = guard();
        let parent = guard.root().parent().unwrap().to_path_buf();
        assert!(matches!(
            guard.resolve_link_target(&parent, "x"),
            Err(PathRejection::Escapes)
        ));
    }

    #[test]
    fn test_limited_reader_under_limit() {
        let data = vec![0u8; 100];
        let mut reader = LimitedReader::new(Cursor::new(data)).max_entry_bytes(100);

        let mut buf = Vec::new();
        assert!(reader.read_to_end(&mut buf).is_ok());
        assert_eq!(buf.len(), 100);
        assert_eq!(reader.bytes_read(), 100);
    }

    #[test]
    fn test_limited_reader_exceeds_declared_size() {
        let data = vec![0u8; 200];
        let mut reader = LimitedReader::new(Cursor::new(data)).max_entry_bytes(100);

        let mut buf = Vec::new();
        let err = reader.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let mismatch = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<SizeMismatch>())
            .unwrap();
        assert_eq!(mismatch.declared, 100);
        assert!(mismatch.produced > 100);
    }

    #[test]
    fn test_limited_reader_zero_limit() {
        let mut reader = LimitedReader::new(Cursor::new(vec![1u8])).max_entry_bytes(0);
        let mut buf = Vec::new();
        assert!(reader.read_to_end(&mut buf).is_err());
    }
}
