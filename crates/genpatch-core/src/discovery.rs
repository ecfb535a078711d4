//! Descriptor discovery and artifact naming.
//!
//! Discovery lists a single directory (no recursion) and keeps the regular
//! files whose names end with the descriptor suffix. Results are sorted by
//! file name so two runs over the same directory behave identically.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{GenPatchError, Result};

/// A schema input found in the descriptor directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DescriptorFile {
    /// File name, including the descriptor suffix.
    name: String,
    /// Full path to the descriptor.
    path: PathBuf,
}

impl DescriptorFile {
    /// Creates a descriptor from a path. Returns `None` if the path has no
    /// UTF-8 file name.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name().and_then(OsStr::to_str)?.to_string();
        Some(Self { name, path })
    }

    /// Returns the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.name
    }

    /// Returns the full path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory containing the descriptor.
    #[must_use]
    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Returns the file name with `descriptor_suffix` removed.
    #[must_use]
    pub fn stem<'a>(&'a self, descriptor_suffix: &str) -> &'a str {
        self.name
            .strip_suffix(descriptor_suffix)
            .unwrap_or(&self.name)
    }
}

/// Lists the descriptors in `dir` whose names end with `descriptor_suffix`.
///
/// Only regular files are returned, sorted by file name. Entries whose name is
/// exactly the suffix or is not valid UTF-8 are skipped.
///
/// # Errors
///
/// Returns [`GenPatchError::Discovery`] if `dir` does not exist, is not a
/// directory, or cannot be listed.
pub fn discover(dir: impl AsRef<Path>, descriptor_suffix: &str) -> Result<Vec<DescriptorFile>> {
    let dir = dir.as_ref();
    let discovery_err = |source: std::io::Error| GenPatchError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let entries = fs::read_dir(dir).map_err(discovery_err)?;
    let mut descriptors = Vec::new();

    for entry in entries {
        let path = entry.map_err(discovery_err)?.path();

        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            debug!(entry = %path.display(), "Skipping entry with non UTF-8 name");
            continue;
        };
        if name.len() <= descriptor_suffix.len() || !name.ends_with(descriptor_suffix) {
            continue;
        }
        if !path.is_file() {
            debug!(entry = %path.display(), "Skipping non-file entry");
            continue;
        }

        if let Some(descriptor) = DescriptorFile::from_path(path) {
            descriptors.push(descriptor);
        }
    }

    descriptors.sort();

    info!(
        dir = %dir.display(),
        descriptors = descriptors.len(),
        "Discovery complete"
    );
    Ok(descriptors)
}

/// Derives artifact file names for every descriptor, preserving order.
///
/// ```rust
/// use genpatch_core::{derive_artifact_names, DescriptorFile};
///
/// let descriptors: Vec<_> = DescriptorFile::from_path("ameva.proto").into_iter().collect();
/// assert_eq!(derive_artifact_names(&descriptors, ".proto", ".pb.h"), vec!["ameva.pb.h"]);
/// ```
#[must_use]
pub fn derive_artifact_names(
    descriptors: &[DescriptorFile],
    descriptor_suffix: &str,
    artifact_suffix: &str,
) -> Vec<String> {
    descriptors
        .iter()
        .map(|d| format!("{}{artifact_suffix}", d.stem(descriptor_suffix)))
        .collect()
}
