//! # Genpatch Core
//!
//! Generate-then-patch pipeline for protocol buffer C++ output.
//!
//! `protoc --cpp_out` emits code that an engine module cannot compile as-is.
//! This crate runs the generator over a directory of descriptors and wraps
//! each generated file in a few fixed lines:
//!
//! - Declaration artifacts (`.pb.h`) get a warning suppression and an include
//!   guard prepended
//! - Definition artifacts (`.pb.cc`) get wrapped in a feature-flag `#if`/`#endif`
//!
//! Each artifact is rewritten through a sibling temporary file that is renamed
//! over the original, and its permission bits are kept.
//!
//! ## Example
//!
//! ```rust,ignore
//! use genpatch_core::{GenPatchPipeline, PipelineConfig, Variant};
//!
//! let config = PipelineConfig::default().with_variant(Variant::WithDefinitions);
//! let pipeline = GenPatchPipeline::with_protoc(config)?;
//!
//! let summary = pipeline.run("Source/USemLog/Proto")?;
//! println!("Patched {} artifacts", summary.patched.len());
//! ```
//!
//! ## Custom generators
//!
//! Anything implementing [`Generator`] can stand in for `protoc`:
//!
//! ```rust
//! use std::path::Path;
//! use genpatch_core::{Generator, Result};
//!
//! struct NoopGenerator;
//!
//! impl Generator for NoopGenerator {
//!     fn generate(&self, _descriptor: &Path, _output_dir: &Path) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod patch;
pub mod pipeline;


pub use config::{
    ArtifactKind, GeneratorConfig, PipelineConfig, Variant, CONFIG_FILE_NAME,
    DEFAULT_FEATURE_FLAG,
};
pub use discovery::{derive_artifact_names, discover, DescriptorFile};
pub use error::{GenPatchError, Result};
pub use generator::{Generator, ProtocGenerator};
pub use patch::{inspect_artifact, patch_artifact, PatchSpec};
pub use pipeline::{ArtifactReport, ArtifactStatus, GenPatchPipeline, RunSummary};
