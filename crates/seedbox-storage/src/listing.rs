//! Directory listing and file metadata shapes.

use std::path::PathBuf;

use serde::Serialize;

/// A sub-directory in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Path relative to the sandbox root.
    pub path: String,
}

/// A regular file in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Entry name.
    pub name: String,
    /// Path relative to the sandbox root.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Guessed content type.
    pub mime: String,
}

/// Contents of one sandbox directory, each group sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirListing {
    /// Normalized path of the listed directory (`""` for the root).
    pub cwd: String,
    /// Parent of `cwd`, or `None` at the root.
    pub parent: Option<String>,
    /// Sub-directories.
    pub dirs: Vec<DirEntry>,
    /// Files.
    pub files: Vec<FileEntry>,
}

/// A resolved regular file ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Absolute, confined filesystem path.
    pub absolute: PathBuf,
    /// Path relative to the sandbox root.
    pub relative: String,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Guessed content type.
    pub mime: String,
}
