//! Error types for the generate-then-patch pipeline.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, GenPatchError>;

/// Errors that can occur while discovering, generating or patching.
///
/// Every variant is fatal: the pipeline stops at the first error it sees.
#[derive(Error, Debug)]
pub enum GenPatchError {
    /// The descriptor directory could not be listed.
    #[error("Failed to read descriptor directory {path}: {source}")]
    Discovery {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The external generator could not be started.
    #[error("Failed to launch generator `{program}`: {source}")]
    GeneratorLaunch {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The external generator rejected a descriptor.
    #[error("Generator failed for {descriptor} ({status})")]
    GeneratorFailed {
        /// Descriptor passed to the generator.
        descriptor: PathBuf,
        /// Exit status reported by the generator.
        status: ExitStatus,
    },

    /// A generated artifact could not be rewritten.
    #[error("Failed to patch artifact {path}: {source}")]
    Patch {
        /// Artifact being patched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be loaded.
    #[error("Failed to load configuration {path}: {message}")]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration values are unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl GenPatchError {
    /// Returns the process exit status that should report this error.
    ///
    /// Generator failures propagate the generator's own exit code when it
    /// has one; everything else maps to `1`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::GeneratorFailed { status, .. } => status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }

    /// Returns true for errors raised by the external generator.
    #[must_use]
    pub const fn is_generation(&self) -> bool {
        matches!(
            self,
            Self::GeneratorLaunch { .. } | Self::GeneratorFailed { .. }
        )
    }
}
