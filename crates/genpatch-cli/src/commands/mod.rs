//! CLI commands and argument parsing.

pub mod check;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use genpatch_core::{PipelineConfig, Variant, CONFIG_FILE_NAME};
use tracing::debug;

/// Genpatch - generate protobuf C++ code and patch it for engine builds
#[derive(Parser)]
#[command(name = "genpatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate and patch artifacts for every descriptor in a directory
    Run(run::RunArgs),

    /// Report which expected artifacts are missing or unpatched
    Check(check::CheckArgs),

    /// Print version information
    Version,
}

/// Options shared by commands that build a pipeline.
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Directory containing the descriptor files
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Configuration file (defaults to genpatch.yaml in the directory, if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Generator binary
    #[arg(long, env = "GENPATCH_PROTOC")]
    pub protoc: Option<String>,

    /// Generator output language
    #[arg(long)]
    pub lang: Option<String>,

    /// Only patch declaration artifacts
    #[arg(long)]
    pub headers_only: bool,

    /// Build flag gating definition artifacts
    #[arg(long)]
    pub feature_flag: Option<String>,
}

impl PipelineArgs {
    /// Resolves the configuration: defaults, then the config file, then flags.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match self.config_file() {
            Some(path) => {
                debug!(config = %path.display(), "Loading configuration");
                PipelineConfig::from_yaml_file(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if self.protoc.is_some() || self.lang.is_some() {
            let mut generator = config.generator.clone();
            if let Some(program) = &self.protoc {
                generator.program.clone_from(program);
            }
            if let Some(language) = &self.lang {
                generator = generator.with_language(language);
            }
            config = config.with_generator(generator);
        }
        if let Some(flag) = &self.feature_flag {
            config = config.with_feature_flag(flag);
        }
        if self.headers_only {
            config = config.with_variant(Variant::DeclarationOnly);
        }

        Ok(config)
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let candidate = self.path.join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        })
    }
}
