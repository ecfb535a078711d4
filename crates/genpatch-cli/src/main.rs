//! Genpatch CLI - runs protoc over a directory and patches its C++ output.

use std::process::ExitCode;

use clap::Parser;
use genpatch_core::GenPatchError;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "genpatch=debug,genpatch_core=debug"
    } else {
        "genpatch=info,genpatch_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(&args),
        Commands::Check(args) => commands::check::run(&args),
        Commands::Version => {
            println!("genpatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "genpatch failed");
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Maps an error to the process exit status, propagating generator exit codes.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GenPatchError>())
        .map_or(1, GenPatchError::exit_code)
}
