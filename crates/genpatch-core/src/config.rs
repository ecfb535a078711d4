//! Pipeline configuration.
//!
//! All text fragments and naming conventions live in [`PipelineConfig`], an
//! immutable value handed to the pipeline at construction. The defaults
//! target `protoc --cpp_out` output consumed by an Unreal Engine module.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenPatchError, Result};
use crate::patch::PatchSpec;

/// File name looked up in the working directory when no configuration path is given.
pub const CONFIG_FILE_NAME: &str = "genpatch.yaml";

/// Build flag that gates generated definitions by default.
pub const DEFAULT_FEATURE_FLAG: &str = "SL_WITH_PROTO_MSGS";

/// Category of generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Interface-like output (`.pb.h`).
    Declaration,
    /// Implementation-like output (`.pb.cc`).
    Definition,
}

impl ArtifactKind {
    /// Returns a short lowercase label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Declaration => "declaration",
            Self::Definition => "definition",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which artifacts the generator produces and the pipeline patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Only declaration artifacts are patched.
    DeclarationOnly,
    /// Declaration and definition artifacts are both patched.
    #[default]
    WithDefinitions,
}

impl Variant {
    /// Artifact kinds patched by this variant, in patch order.
    #[must_use]
    pub const fn artifact_kinds(self) -> &'static [ArtifactKind] {
        match self {
            Self::DeclarationOnly => &[ArtifactKind::Declaration],
            Self::WithDefinitions => &[ArtifactKind::Declaration, ArtifactKind::Definition],
        }
    }
}

/// How the external generator is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generator binary. Bare names are looked up on `PATH`; relative paths
    /// resolve against the working directory genpatch was started in.
    pub program: String,
    /// Output language, used as `--<language>_out=<dir>`.
    pub language: String,
    /// Extra arguments placed before the output flag.
    pub extra_args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "protoc".to_string(),
            language: "cpp".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Creates a generator configuration for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Sets the output language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Adds an extra argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

/// Configuration for a pipeline run.
///
/// # Examples
///
/// ```rust
/// use genpatch_core::{ArtifactKind, PipelineConfig, Variant};
///
/// let config = PipelineConfig::default().with_variant(Variant::DeclarationOnly);
/// assert_eq!(config.descriptor_suffix, ".proto");
/// assert_eq!(config.spec(ArtifactKind::Declaration).artifact_suffix, ".pb.h");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Suffix identifying descriptor files.
    pub descriptor_suffix: String,
    /// Generator invocation.
    pub generator: GeneratorConfig,
    /// Patch applied to declaration artifacts.
    pub declaration: PatchSpec,
    /// Patch applied to definition artifacts.
    pub definition: PatchSpec,
    /// Which artifacts are patched.
    pub variant: Variant,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            descriptor_suffix: ".proto".to_string(),
            generator: GeneratorConfig::default(),
            declaration: PatchSpec::new(".pb.h")
                .with_prefix_line("#pragma warning(disable : 4125)")
                .with_prefix_line("#pragma once"),
            definition: PatchSpec::feature_gate(DEFAULT_FEATURE_FLAG, ".pb.cc"),
            variant: Variant::default(),
        }
    }
}

impl PipelineConfig {
    /// Sets the descriptor suffix.
    #[must_use]
    pub fn with_descriptor_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.descriptor_suffix = suffix.into();
        self
    }

    /// Sets the generator invocation.
    #[must_use]
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Sets the declaration patch.
    #[must_use]
    pub fn with_declaration(mut self, spec: PatchSpec) -> Self {
        self.declaration = spec;
        self
    }

    /// Sets the definition patch.
    #[must_use]
    pub fn with_definition(mut self, spec: PatchSpec) -> Self {
        self.definition = spec;
        self
    }

    /// Replaces the definition wrapper with one gated on `flag`, keeping the
    /// current definition suffix.
    #[must_use]
    pub fn with_feature_flag(mut self, flag: &str) -> Self {
        let suffix = std::mem::take(&mut self.definition.artifact_suffix);
        self.definition = PatchSpec::feature_gate(flag, suffix);
        self
    }

    /// Sets the variant.
    #[must_use]
    pub const fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Returns the patch spec for an artifact kind.
    #[must_use]
    pub const fn spec(&self, kind: ArtifactKind) -> &PatchSpec {
        match kind {
            ArtifactKind::Declaration => &self.declaration,
            ArtifactKind::Definition => &self.definition,
        }
    }

    /// Loads a configuration from a YAML file. Keys that are absent keep
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns [`GenPatchError::Config`] if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| GenPatchError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| GenPatchError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Checks that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`GenPatchError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(GenPatchError::InvalidConfig { message });

        if self.descriptor_suffix.is_empty() {
            return invalid("descriptor suffix is empty".to_string());
        }
        if self.generator.program.is_empty() {
            return invalid("generator program is empty".to_string());
        }
        if self.generator.language.is_empty() {
            return invalid("generator language is empty".to_string());
        }

        for &kind in self.variant.artifact_kinds() {
            let suffix = &self.spec(kind).artifact_suffix;
            if suffix.is_empty() {
                return invalid(format!("{kind} artifact suffix is empty"));
            }
            if *suffix == self.descriptor_suffix {
                return invalid(format!(
                    "{kind} artifact suffix `{suffix}` matches the descriptor suffix"
                ));
            }
        }

        for &kind in self.variant.artifact_kinds() {
            let spec = self.spec(kind);
            if let Some(line) = spec
                .prefix
                .iter()
                .chain(&spec.suffix)
                .find(|line| is_bare_directive(line))
            {
                return invalid(format!(
                    "{kind} patch line `{line}` is missing its feature flag"
                ));
            }
        }

        if self.variant == Variant::WithDefinitions
            && self.declaration.artifact_suffix == self.definition.artifact_suffix
        {
            return invalid(format!(
                "declaration and definition artifacts share the suffix `{}`",
                self.declaration.artifact_suffix
            ));
        }

        Ok(())
    }
}

/// Returns true for a conditional directive left without its condition, as
/// produced by an empty feature flag.
fn is_bare_directive(line: &str) -> bool {
    matches!(
        line.trim(),
        "#if" | "#ifdef" | "#ifndef" | "#elif" | "#endif //"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.variant, Variant::WithDefinitions);
        assert_eq!(
            config.declaration.prefix,
            vec!["#pragma warning(disable : 4125)", "#pragma once"]
        );
        assert!(config.declaration.suffix.is_empty());
        assert_eq!(config.definition.prefix, vec!["#if SL_WITH_PROTO_MSGS"]);
        assert_eq!(
            config.definition.suffix,
            vec!["#endif // SL_WITH_PROTO_MSGS"]
        );
    }

    #[test]
    fn test_variant_artifact_kinds() {
        assert_eq!(
            Variant::DeclarationOnly.artifact_kinds(),
            &[ArtifactKind::Declaration]
        );
        assert_eq!(
            Variant::WithDefinitions.artifact_kinds(),
            &[ArtifactKind::Declaration, ArtifactKind::Definition]
        );
    }

    #[test]
    fn test_with_feature_flag_keeps_suffix() {
        let config = PipelineConfig::default().with_feature_flag("WITH_MSGS");
        assert_eq!(config.definition.artifact_suffix, ".pb.cc");
        assert_eq!(config.definition.prefix, vec!["#if WITH_MSGS"]);
        assert_eq!(config.definition.suffix, vec!["#endif // WITH_MSGS"]);
    }

    #[test]
    fn test_validate_rejects_empty_descriptor_suffix() {
        let config = PipelineConfig::default().with_descriptor_suffix("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("descriptor suffix is empty"));
    }

    #[test]
    fn test_validate_rejects_shared_suffix() {
        let config = PipelineConfig::default().with_definition(PatchSpec::new(".pb.h"));
        assert!(config.validate().is_err());

        // Definitions are not patched in the declaration-only variant.
        let config = config.with_variant(Variant::DeclarationOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_feature_flag() {
        for flag in ["", "   "] {
            let config = PipelineConfig::default().with_feature_flag(flag);
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("missing its feature flag"),
                "unexpected error: {err}"
            );
        }

        // Definitions are not patched in the declaration-only variant.
        let config = PipelineConfig::default()
            .with_feature_flag("")
            .with_variant(Variant::DeclarationOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_artifact_matching_descriptor() {
        let config = PipelineConfig::default().with_declaration(PatchSpec::new(".proto"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r"
variant: declaration_only
generator:
  program: /opt/protobuf/bin/protoc
definition:
  artifact_suffix: .pb.cpp
  prefix: ['#if WITH_PROTO']
  suffix: ['#endif']
",
        )
        .unwrap();

        let config = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.variant, Variant::DeclarationOnly);
        assert_eq!(config.generator.program, "/opt/protobuf/bin/protoc");
        assert_eq!(config.generator.language, "cpp");
        assert_eq!(config.descriptor_suffix, ".proto");
        assert_eq!(config.definition.artifact_suffix, ".pb.cpp");
        assert_eq!(config.declaration, PipelineConfig::default().declaration);
    }

    #[test]
    fn test_from_yaml_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.yaml");
        assert!(matches!(
            PipelineConfig::from_yaml_file(&missing),
            Err(GenPatchError::Config { .. })
        ));

        let bad = temp_dir.path().join("bad.yaml");
        fs::write(&bad, "variant: [not, a, variant]\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_yaml_file(&bad),
            Err(GenPatchError::Config { .. })
        ));
    }
}
