// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Discovery and hashing of contract sources.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use alloy::primitives::{keccak256, B256};
use glob::{glob, Pattern};
use serde::{Deserialize, Serialize};

const SOURCE_EXTENSION: &str = "sol";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("sources directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("invalid glob pattern {0}: {1}")]
    GlobPattern(String, #[source] glob::PatternError),
    #[error("error reading glob result: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("failed to read source {0}: {1}")]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("source path {0} is not valid utf-8")]
    NonUtf8Path(PathBuf),
}

/// A single source file identified by its path relative to the sources root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceFile {
    /// Relative path using `/` separators, used as the compiler's source unit name.
    pub path: String,
    pub hash: B256,
    #[serde(skip)]
    pub content: String,
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.hash == other.hash
    }
}

impl Eq for SourceFile {}

/// Ordered set of sources under one root. Two sets are equal when every path and hash match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSet {
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Hash every `.sol` file below `root`.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self, SourceError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SourceError::MissingDirectory(root.to_path_buf()));
        }

        let mut paths = source_paths(root)?;
        paths.sort();

        // Read the file contents in another thread and hash them in this one.
        let (tx, rx) = mpsc::channel();
        let reader_paths = paths.clone();
        thread::spawn(move || {
            for path in reader_paths {
                let contents =
                    fs::read_to_string(&path).map_err(|err| SourceError::FileRead(path, err));
                if tx.send(contents).is_err() {
                    break;
                }
            }
        });

        let mut files = Vec::with_capacity(paths.len());
        for (path, contents) in paths.iter().zip(rx) {
            let content = contents?;
            let relative = relative_name(root, path)?;
            debug!(@grey, "source: {relative}");
            files.push(SourceFile {
                path: relative,
                hash: keccak256(content.as_bytes()),
                content,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { files })
    }

    pub fn from_files(mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        Self { files }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            hash: keccak256(content.as_bytes()),
            content,
        }
    }
}

fn source_paths(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let pattern = format!(
        "{}/**/*.{SOURCE_EXTENSION}",
        Pattern::escape(&root.to_string_lossy())
    );
    let mut paths = Vec::new();
    for entry in glob(&pattern).map_err(|err| SourceError::GlobPattern(pattern.clone(), err))? {
        let path = entry?;
        if path.is_file() && !is_ignored(root, &path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

// Hidden directories and vendored packages never hold project sources.
fn is_ignored(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|relative| {
            relative.components().any(|c| {
                let c = c.as_os_str().to_string_lossy();
                c.starts_with('.') || c == "node_modules"
            })
        })
        .unwrap_or(false)
}

fn relative_name(root: &Path, path: &Path) -> Result<String, SourceError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .map(str::to_owned)
                .ok_or_else(|| SourceError::NonUtf8Path(path.to_path_buf()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}
