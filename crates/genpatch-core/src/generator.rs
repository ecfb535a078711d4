//! External code generator invocation.
//!
//! The pipeline only needs one capability from a generator: given a
//! descriptor and an output directory, write the artifacts or fail. The
//! [`Generator`] trait captures that, and [`ProtocGenerator`] implements it by
//! running `protoc` as a blocking subprocess.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{GenPatchError, Result};

/// Produces generated artifacts from a descriptor.
pub trait Generator {
    /// Generates the artifacts for `descriptor` into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns a generation error if the generator cannot be started or
    /// rejects the descriptor.
    fn generate(&self, descriptor: &Path, output_dir: &Path) -> Result<()>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, descriptor: &Path, output_dir: &Path) -> Result<()> {
        (**self).generate(descriptor, output_dir)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, descriptor: &Path, output_dir: &Path) -> Result<()> {
        (**self).generate(descriptor, output_dir)
    }
}

/// Runs the protocol buffer compiler as a subprocess.
///
/// The process runs inside `output_dir`, which is also protoc's default
/// import path, and receives `<extra args> --<lang>_out=. <descriptor name>`.
/// Its stdout and stderr are inherited.
///
/// A relative `program` containing a path separator is resolved against the
/// caller's working directory. `extra_args` are passed through untouched, so
/// relative paths in them resolve against `output_dir`.
#[derive(Debug, Clone, Default)]
pub struct ProtocGenerator {
    config: GeneratorConfig,
}

impl ProtocGenerator {
    /// Creates a generator from its configuration.
    #[must_use]
    pub const fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the program to launch.
    ///
    /// Bare names such as `protoc` are left for `PATH` lookup. Relative paths
    /// are joined onto the current working directory, since the child runs
    /// inside the descriptor directory.
    #[must_use]
    pub fn program(&self) -> PathBuf {
        let program = Path::new(&self.config.program);
        let has_separator = program.components().count() > 1;
        if program.is_relative() && has_separator {
            if let Ok(cwd) = env::current_dir() {
                return cwd.join(program);
            }
        }
        program.to_path_buf()
    }

    /// Builds the command that generates `descriptor` into `output_dir`.
    #[must_use]
    pub fn command(&self, descriptor: &Path, output_dir: &Path) -> Command {
        let input: &OsStr = if descriptor.parent() == Some(output_dir) {
            descriptor.file_name().unwrap_or(descriptor.as_os_str())
        } else {
            descriptor.as_os_str()
        };

        let mut command = Command::new(self.program());
        command
            .current_dir(output_dir)
            .args(&self.config.extra_args)
            .arg(format!("--{}_out=.", self.config.language))
            .arg(input);
        command
    }
}

impl Generator for ProtocGenerator {
    fn generate(&self, descriptor: &Path, output_dir: &Path) -> Result<()> {
        let mut command = self.command(descriptor, output_dir);
        debug!(command = ?command, "Launching generator");

        let status = command.status().map_err(|e| GenPatchError::GeneratorLaunch {
            program: self.config.program.clone(),
            source: e,
        })?;

        if !status.success() {
            return Err(GenPatchError::GeneratorFailed {
                descriptor: descriptor.to_path_buf(),
                status,
            });
        }

        info!(descriptor = %descriptor.display(), "Generated artifacts");
        Ok(())
    }
}
