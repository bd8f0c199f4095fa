//! Untrusted archive entry names.

use std::fmt;

use crate::error::EntryNameError;

/// Maximum length for entry names (in bytes).
///
/// 32 KiB is well above any file system path limit (Linux `PATH_MAX` is
/// 4 KiB) and keeps hostile names from inflating allocations.
pub const MAX_NAME_LENGTH: usize = 32768;

/// A syntactically checked archive entry name.
///
/// `EntryName` normalizes `\` separators to `/` and rejects names that can
/// never be resolved relative to a workspace root:
/// - NUL bytes
/// - absolute names (`/etc/passwd`, `\share`)
/// - drive-letter prefixes (`C:`, `c:foo`)
/// - names with no normal segment (`""`, `"."`, `"./"`, `"//"`)
///
/// `..` segments are kept. Whether they climb out of the root is decided by
/// [`PathGuard::resolve`](crate::PathGuard::resolve), which sees the real
/// file system, so `docs/../readme.txt` is accepted and `../readme.txt` is
/// not.
///
/// # Examples
///
/// ```
/// use zipspace::EntryName;
///
/// let name = EntryName::parse("docs\\guide.md").unwrap();
/// assert_eq!(name.as_str(), "docs/guide.md");
///
/// assert!(EntryName::parse("/etc/passwd").is_err());
/// assert!(EntryName::parse("C:/Windows").is_err());
/// assert!(EntryName::parse("./").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName {
    normalized: String,
    directory_marker: bool,
}

impl EntryName {
    /// Parses and normalizes a raw entry name.
    ///
    /// # Errors
    ///
    /// Returns an [`EntryNameError`] describing the first rule violated.
    pub fn parse(raw: &str) -> Result<Self, EntryNameError> {
        if raw.contains('\0') {
            return Err(EntryNameError::NulByte);
        }
        if raw.len() > MAX_NAME_LENGTH {
            return Err(EntryNameError::TooLong {
                max: MAX_NAME_LENGTH,
            });
        }

        let normalized = raw.replace('\\', "/");

        if normalized.starts_with('/') {
            return Err(EntryNameError::Absolute);
        }
        if has_drive_prefix(&normalized) {
            return Err(EntryNameError::DrivePrefix);
        }

        let directory_marker = normalized.ends_with('/');
        let name = Self {
            normalized,
            directory_marker,
        };
        if name.segments().next().is_none() {
            return Err(EntryNameError::Empty);
        }
        Ok(name)
    }

    /// Returns the normalized name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Returns `true` if the raw name ended with a separator.
    pub fn is_directory_marker(&self) -> bool {
        self.directory_marker
    }

    /// Iterates the meaningful segments: normal names and `..`.
    ///
    /// Empty and `.` segments carry no meaning and are skipped.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// `C:`, `c:foo`, `Z:/x`: an ASCII letter followed by a colon.
fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
