use std::{ffi::OsStr, fs, io, path::Path};

use walkdir::WalkDir;

use crate::source::SourceFile;

/// File extension of source files. Files with any other extension are
/// ignored by discovery.
pub const SOURCE_EXTENSION: &str = "li";

/// Recursively discovers and reads all source files under `root`.
///
/// Paths in the returned files are relative to `root`, and the list is
/// sorted by path, so compilation order (and hence generated output) does
/// not depend on the order in which the file system yields entries.
pub fn read_source_files(root: &Path) -> Result<Vec<SourceFile>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound {
            path: root.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(OsStr::to_str) != Some(SOURCE_EXTENSION) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let bytes = fs::read(path).map_err(|source| DiscoveryError::Io {
            path: relative.display().to_string(),
            source,
        })?;
        let contents = String::from_utf8(bytes).map_err(|_| DiscoveryError::InvalidUtf8 {
            path: relative.display().to_string(),
        })?;

        tracing::debug!(path = %relative.display(), bytes = contents.len(), "loaded source file");
        files.push(SourceFile::new(relative, contents));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("source directory `{path}` does not exist")]
    RootNotFound { path: String },
    #[error("failed to walk source directory")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("file `{path}` is not valid UTF-8")]
    InvalidUtf8 { path: String },
}
