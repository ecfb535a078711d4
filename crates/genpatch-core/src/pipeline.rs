//! The generate-then-patch pipeline.
//!
//! A run is strictly sequential:
//!
//! 1. Discover descriptors in the target directory
//! 2. Invoke the generator once per descriptor
//! 3. Patch every declaration artifact
//! 4. Patch every definition artifact (two-artifact variant only)
//!
//! The first error aborts the run. Generation for all descriptors finishes
//! before any artifact is patched, so a generator failure leaves every
//! artifact of the run unpatched.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{ArtifactKind, PipelineConfig};
use crate::discovery::{self, DescriptorFile};
use crate::error::Result;
use crate::generator::{Generator, ProtocGenerator};
use crate::patch;

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Descriptors passed to the generator, in processing order.
    pub descriptors: Vec<PathBuf>,
    /// Artifacts patched, in processing order.
    pub patched: Vec<PathBuf>,
}

/// Patch state of one expected artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// The artifact does not exist.
    Missing,
    /// The artifact exists without the patch.
    Unpatched,
    /// The artifact carries the patch exactly once.
    Patched,
    /// The artifact carries the patch more than once.
    PatchedRepeatedly(usize),
}

impl ArtifactStatus {
    const fn from_count(count: Option<usize>) -> Self {
        match count {
            None => Self::Missing,
            Some(0) => Self::Unpatched,
            Some(1) => Self::Patched,
            Some(n) => Self::PatchedRepeatedly(n),
        }
    }

    /// Returns true if the artifact needs a fresh generate-and-patch run.
    #[must_use]
    pub const fn needs_run(self) -> bool {
        matches!(self, Self::Missing | Self::Unpatched)
    }
}

/// Report entry produced by [`GenPatchPipeline::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    /// Expected artifact path.
    pub path: PathBuf,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Observed patch state.
    pub status: ArtifactStatus,
}

/// Discovers descriptors, runs the generator and patches its output.
///
/// # Examples
///
/// ```rust,ignore
/// use genpatch_core::{GenPatchPipeline, PipelineConfig};
///
/// let pipeline = GenPatchPipeline::with_protoc(PipelineConfig::default())?;
/// let summary = pipeline.run("Source/Proto")?;
/// println!("Patched {} artifacts", summary.patched.len());
/// ```
#[derive(Debug)]
pub struct GenPatchPipeline<G> {
    config: PipelineConfig,
    generator: G,
}

impl GenPatchPipeline<ProtocGenerator> {
    /// Creates a pipeline that runs the configured protoc binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_protoc(config: PipelineConfig) -> Result<Self> {
        let generator = ProtocGenerator::new(config.generator.clone());
        Self::new(config, generator)
    }
}

impl<G: Generator> GenPatchPipeline<G> {
    /// Creates a pipeline with a custom generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PipelineConfig, generator: G) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, generator })
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the generator.
    #[must_use]
    pub const fn generator(&self) -> &G {
        &self.generator
    }

    /// Lists descriptors in `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns a discovery error if `dir` cannot be listed.
    pub fn discover(&self, dir: impl AsRef<Path>) -> Result<Vec<DescriptorFile>> {
        discovery::discover(dir, &self.config.descriptor_suffix)
    }

    /// Derives the artifact names of `kind` for each descriptor.
    #[must_use]
    pub fn derive_artifact_names(
        &self,
        descriptors: &[DescriptorFile],
        kind: ArtifactKind,
    ) -> Vec<String> {
        discovery::derive_artifact_names(
            descriptors,
            &self.config.descriptor_suffix,
            &self.config.spec(kind).artifact_suffix,
        )
    }

    /// Runs the generator for one descriptor, writing next to it.
    ///
    /// # Errors
    ///
    /// Returns a generation error if the generator cannot start or fails.
    pub fn generate(&self, descriptor: &DescriptorFile) -> Result<()> {
        info!(descriptor = %descriptor.path().display(), "Generating");
        self.generator
            .generate(descriptor.path(), descriptor.directory())
    }

    /// Applies the patch configured for `kind` to one artifact.
    ///
    /// # Errors
    ///
    /// Returns a patch error if the artifact cannot be rewritten.
    pub fn patch(&self, artifact: impl AsRef<Path>, kind: ArtifactKind) -> Result<()> {
        patch::patch_artifact(artifact, self.config.spec(kind))
    }

    /// Runs discovery, generation and patching over `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first discovery, generation or patch error encountered.
    /// Work already done stays on disk; nothing after the failure runs.
    pub fn run(&self, dir: impl AsRef<Path>) -> Result<RunSummary> {
        let dir = dir.as_ref();
        info!(dir = %dir.display(), variant = ?self.config.variant, "Starting run");

        let descriptors = self.discover(dir)?;
        let mut summary = RunSummary::default();

        for descriptor in &descriptors {
            self.generate(descriptor)?;
            summary.descriptors.push(descriptor.path().to_path_buf());
        }

        for &kind in self.config.variant.artifact_kinds() {
            for name in self.derive_artifact_names(&descriptors, kind) {
                let artifact = dir.join(name);
                self.patch(&artifact, kind)?;
                summary.patched.push(artifact);
            }
        }

        info!(
            descriptors = summary.descriptors.len(),
            patched = summary.patched.len(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Reports the patch state of every artifact a run over `dir` would touch.
    ///
    /// Nothing is generated or written.
    ///
    /// # Errors
    ///
    /// Returns a discovery error if `dir` cannot be listed, or a patch error if
    /// an existing artifact cannot be read.
    pub fn check(&self, dir: impl AsRef<Path>) -> Result<Vec<ArtifactReport>> {
        let dir = dir.as_ref();
        let descriptors = self.discover(dir)?;
        let mut reports = Vec::new();

        for &kind in self.config.variant.artifact_kinds() {
            let spec = self.config.spec(kind);
            for name in self.derive_artifact_names(&descriptors, kind) {
                let path = dir.join(name);
                let status = ArtifactStatus::from_count(patch::inspect_artifact(&path, spec)?);
                reports.push(ArtifactReport { path, kind, status });
            }
        }

        Ok(reports)
    }
}
