//! Text patches applied to generated artifacts.
//!
//! A [`PatchSpec`] describes a set of literal lines to prepend to a generated
//! file and a set to append after it. [`patch_artifact`] applies a spec to a
//! file on disk by writing a sibling temporary file and renaming it over the
//! original, so the artifact is either fully patched or left untouched.
//!
//! # Example
//!
//! ```rust
//! use genpatch_core::PatchSpec;
//!
//! let spec = PatchSpec::feature_gate("WITH_PROTO", ".pb.cc");
//! let patched = spec.apply(b"int x;\n");
//!
//! assert_eq!(patched, b"#if WITH_PROTO\nint x;\n#endif // WITH_PROTO\n");
//! assert_eq!(spec.strip(&patched), Some(&b"int x;\n"[..]));
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{GenPatchError, Result};

/// Literal text fragments wrapped around one kind of generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Suffix that names this artifact kind (e.g. `.pb.h`).
    pub artifact_suffix: String,
    /// Lines written before the generated content.
    #[serde(default)]
    pub prefix: Vec<String>,
    /// Lines written after the generated content.
    #[serde(default)]
    pub suffix: Vec<String>,
}

impl PatchSpec {
    /// Creates an empty spec for artifacts ending in `artifact_suffix`.
    #[must_use]
    pub fn new(artifact_suffix: impl Into<String>) -> Self {
        Self {
            artifact_suffix: artifact_suffix.into(),
            prefix: Vec::new(),
            suffix: Vec::new(),
        }
    }

    /// Appends a line to the prefix.
    #[must_use]
    pub fn with_prefix_line(mut self, line: impl Into<String>) -> Self {
        self.prefix.push(line.into());
        self
    }

    /// Appends a line to the suffix.
    #[must_use]
    pub fn with_suffix_line(mut self, line: impl Into<String>) -> Self {
        self.suffix.push(line.into());
        self
    }

    /// Builds a wrapper that compiles the artifact only when `flag` is set.
    ///
    /// ```rust
    /// use genpatch_core::PatchSpec;
    ///
    /// let spec = PatchSpec::feature_gate("SL_WITH_PROTO_MSGS", ".pb.cc");
    /// assert_eq!(spec.prefix, vec!["#if SL_WITH_PROTO_MSGS"]);
    /// assert_eq!(spec.suffix, vec!["#endif // SL_WITH_PROTO_MSGS"]);
    /// ```
    #[must_use]
    pub fn feature_gate(flag: &str, artifact_suffix: impl Into<String>) -> Self {
        let flag = flag.trim();
        Self::new(artifact_suffix)
            .with_prefix_line(format!("#if {flag}"))
            .with_suffix_line(format!("#endif // {flag}"))
    }

    /// Returns true when the spec adds nothing to an artifact.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Prefix lines rendered as bytes, each terminated by `\n`.
    #[must_use]
    pub fn prefix_bytes(&self) -> Vec<u8> {
        render_lines(&self.prefix)
    }

    /// Suffix lines rendered as bytes, each terminated by `\n`.
    #[must_use]
    pub fn suffix_bytes(&self) -> Vec<u8> {
        render_lines(&self.suffix)
    }

    /// Returns `content` wrapped in this spec's prefix and suffix.
    #[must_use]
    pub fn apply(&self, content: &[u8]) -> Vec<u8> {
        let prefix = self.prefix_bytes();
        let suffix = self.suffix_bytes();
        let mut out = Vec::with_capacity(prefix.len() + content.len() + suffix.len());
        out.extend_from_slice(&prefix);
        out.extend_from_slice(content);
        out.extend_from_slice(&suffix);
        out
    }

    /// Returns the content between this spec's prefix and suffix, or `None`
    /// if `content` does not carry both.
    #[must_use]
    pub fn strip<'a>(&self, content: &'a [u8]) -> Option<&'a [u8]> {
        let prefix = self.prefix_bytes();
        let suffix = self.suffix_bytes();
        if content.len() < prefix.len() + suffix.len() {
            return None;
        }
        content
            .strip_prefix(prefix.as_slice())
            .and_then(|rest| rest.strip_suffix(suffix.as_slice()))
    }

    /// Returns true if `content` already carries this spec's prefix and suffix.
    #[must_use]
    pub fn is_applied(&self, content: &[u8]) -> bool {
        !self.is_noop() && self.strip(content).is_some()
    }

    /// Counts how many times this spec has been wrapped around `content`.
    ///
    /// Patching is not idempotent, so a value above one means the artifact
    /// was patched again without being regenerated.
    #[must_use]
    pub fn applied_count(&self, content: &[u8]) -> usize {
        if self.is_noop() {
            return 0;
        }
        let mut count = 0;
        let mut rest = content;
        while let Some(inner) = self.strip(rest) {
            count += 1;
            rest = inner;
        }
        count
    }
}

fn render_lines(lines: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }
    out
}

/// Rewrites `path` in place with `spec`'s prefix and suffix around its
/// current content.
///
/// The new content is written to a temporary file in the artifact's own
/// directory, the original permission bits are copied onto it, and it is
/// then renamed over the original. If any step before the rename fails the
/// temporary file is removed and the original is left as it was.
///
/// Applying the same spec twice wraps the content twice.
///
/// # Errors
///
/// Returns [`GenPatchError::Patch`] if the artifact is missing or unreadable,
/// if the temporary file cannot be created or written, or if the final
/// rename fails.
pub fn patch_artifact(path: impl AsRef<Path>, spec: &PatchSpec) -> Result<()> {
    let path = path.as_ref();
    let patch_err = |source: io::Error| GenPatchError::Patch {
        path: path.to_path_buf(),
        source,
    };

    let mut original = File::open(path).map_err(patch_err)?;
    let permissions = original.metadata().map_err(patch_err)?.permissions();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(patch_err)?;
    debug!(artifact = %path.display(), temp = %temp.path().display(), "Writing patched artifact");

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        writer.write_all(&spec.prefix_bytes()).map_err(patch_err)?;
        io::copy(&mut original, &mut writer).map_err(patch_err)?;
        writer.write_all(&spec.suffix_bytes()).map_err(patch_err)?;
        writer.flush().map_err(patch_err)?;
    }
    drop(original);

    temp.as_file()
        .set_permissions(permissions)
        .map_err(patch_err)?;
    temp.persist(path).map_err(|e| patch_err(e.error))?;

    info!(
        artifact = %path.display(),
        prefix_lines = spec.prefix.len(),
        suffix_lines = spec.suffix.len(),
        "Patched artifact"
    );
    Ok(())
}

/// Reads an artifact and reports how many times `spec` has been applied to it.
///
/// Returns `Ok(None)` if the artifact does not exist.
///
/// # Errors
///
/// Returns [`GenPatchError::Patch`] if the artifact exists but cannot be read.
pub fn inspect_artifact(path: impl AsRef<Path>, spec: &PatchSpec) -> Result<Option<usize>> {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(content) => Ok(Some(spec.applied_count(&content))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GenPatchError::Patch {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header_spec() -> PatchSpec {
        PatchSpec::new(".pb.h")
            .with_prefix_line("#pragma warning(disable : 4125)")
            .with_prefix_line("#pragma once")
    }

    #[test]
    fn test_apply_prefix_only() {
        let spec = header_spec();
        let patched = spec.apply(b"class A {};\n");
        assert_eq!(
            patched,
            b"#pragma warning(disable : 4125)\n#pragma once\nclass A {};\n"
        );
    }

    #[test]
    fn test_strip_recovers_content() {
        let spec = PatchSpec::feature_gate("FLAG", ".pb.cc");
        let patched = spec.apply(b"body");
        assert_eq!(spec.strip(&patched), Some(&b"body"[..]));
        assert_eq!(spec.strip(b"body"), None);
    }

    #[test]
    fn test_strip_rejects_overlapping_prefix_and_suffix() {
        let spec = PatchSpec::new(".x")
            .with_prefix_line("X")
            .with_suffix_line("X");
        assert_eq!(spec.strip(b"X\n"), None);
        assert_eq!(spec.strip(b"X\nX\n"), Some(&b""[..]));
    }

    #[test]
    fn test_applied_count() {
        let spec = header_spec();
        let once = spec.apply(b"int x;\n");
        let twice = spec.apply(&once);

        assert_eq!(spec.applied_count(b"int x;\n"), 0);
        assert_eq!(spec.applied_count(&once), 1);
        assert_eq!(spec.applied_count(&twice), 2);
        assert!(spec.is_applied(&once));
    }

    #[test]
    fn test_noop_spec_never_reports_applied() {
        let spec = PatchSpec::new(".pb.h");
        assert!(spec.is_noop());
        assert!(!spec.is_applied(b"anything"));
        assert_eq!(spec.applied_count(b"anything"), 0);
    }

    #[test]
    fn test_patch_artifact_rewrites_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pb.h");
        fs::write(&path, "// generated\n").unwrap();

        patch_artifact(&path, &header_spec()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "#pragma warning(disable : 4125)\n#pragma once\n// generated\n"
        );

        // No temporary files left behind.
        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_patch_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.pb.h");

        let err = patch_artifact(&path, &header_spec()).unwrap_err();
        assert!(matches!(err, GenPatchError::Patch { .. }));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_patch_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pb.cc");
        fs::write(&path, "int x;\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        patch_artifact(&path, &PatchSpec::feature_gate("FLAG", ".pb.cc")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_patch_read_only_directory_keeps_original() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("generated");
        fs::create_dir(&dir).unwrap();
        let path = dir.join("a.pb.h");
        fs::write(&path, "// generated\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory modes.
        if File::create(dir.join("writable")).is_ok() {
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = patch_artifact(&path, &header_spec());
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(GenPatchError::Patch { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "// generated\n");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_patch_unreadable_artifact_keeps_original() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pb.cc");
        fs::write(&path, "int x;\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users ignore file modes.
        if File::open(&path).is_ok() {
            return;
        }

        let result = patch_artifact(&path, &PatchSpec::feature_gate("FLAG", ".pb.cc"));
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(result, Err(GenPatchError::Patch { .. })));
        assert_eq!(mode, 0o000);
        assert_eq!(fs::read_to_string(&path).unwrap(), "int x;\n");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_inspect_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pb.h");
        let spec = header_spec();

        assert_eq!(inspect_artifact(&path, &spec).unwrap(), None);

        fs::write(&path, "x\n").unwrap();
        assert_eq!(inspect_artifact(&path, &spec).unwrap(), Some(0));

        patch_artifact(&path, &spec).unwrap();
        assert_eq!(inspect_artifact(&path, &spec).unwrap(), Some(1));
    }
}
