//! Asset path rules.
//!
//! Paths are ASCII, `/`-separated and case-sensitive, always start with `/`
//! and never end with one. The first segment may not collide with the
//! numeric object identifiers that the standard LWM2M namespace reserves.

use crate::error::StoreError;

/// Maximum length of an asset path, in bytes.
pub const MAX_PATH_BYTES: usize = 511;

/// First-level segments that belong to the standard object namespace.
pub const RESERVED_SEGMENTS: &[&str] = &[
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10241", "10242", "10243",
];

/// Checks that `path` is a well-formed, non-reserved asset path.
///
/// # Errors
///
/// [`StoreError::InvalidPath`] describing the first rule the path breaks.
pub fn validate(path: &str) -> Result<(), StoreError> {
    if !path.starts_with('/') {
        return Err(StoreError::invalid_path(path, "must start with '/'"));
    }
    if path.len() == 1 {
        return Err(StoreError::invalid_path(path, "empty path"));
    }
    if path.ends_with('/') {
        return Err(StoreError::invalid_path(path, "trailing '/'"));
    }
    if path.len() > MAX_PATH_BYTES {
        return Err(StoreError::invalid_path(path, "path too long"));
    }
    if !path.is_ascii() {
        return Err(StoreError::invalid_path(path, "non-ASCII path"));
    }
    if segments(path).any(str::is_empty) {
        return Err(StoreError::invalid_path(path, "empty segment"));
    }
    if segments(path).next().is_some_and(|first| RESERVED_SEGMENTS.contains(&first)) {
        return Err(StoreError::invalid_path(path, "reserved first segment"));
    }
    Ok(())
}

/// Iterates the segments after the leading `/`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Returns the segment at `level`, where level 1 is the first segment.
#[must_use]
pub fn segment(path: &str, level: usize) -> Option<&str> {
    level.checked_sub(1).and_then(|idx| segments(path).nth(idx))
}

/// Number of `/` separators in `path`.
#[must_use]
pub fn depth(path: &str) -> usize {
    path.bytes().filter(|b| *b == b'/').count()
}

/// Returns `true` if `child` lies strictly below `parent`.
///
/// ```
/// use avdata_store::path::is_subpath;
///
/// assert!(is_subpath("/a", "/a/b"));
/// assert!(!is_subpath("/a", "/ab"));
/// assert!(!is_subpath("/a", "/a"));
/// ```
#[must_use]
pub fn is_subpath(parent: &str, child: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}
