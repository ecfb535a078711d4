//! Check command implementation.

use anyhow::Result;
use clap::Args;
use tracing::info;

use genpatch_core::{ArtifactStatus, GenPatchPipeline};

use super::PipelineArgs;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Runs the check command.
pub fn run(args: &CheckArgs) -> Result<()> {
    let config = args.pipeline.load_config()?;
    info!(path = ?args.pipeline.path, "Checking artifacts");

    let pipeline = GenPatchPipeline::with_protoc(config)?;
    let reports = pipeline.check(&args.pipeline.path)?;

    let mut pending = 0;
    for report in &reports {
        let label = match report.status {
            ArtifactStatus::Patched => "✓ patched".to_string(),
            ArtifactStatus::PatchedRepeatedly(n) => format!("⚠ patched {n} times"),
            ArtifactStatus::Unpatched => "✗ unpatched".to_string(),
            ArtifactStatus::Missing => "✗ missing".to_string(),
        };
        if report.status.needs_run() {
            pending += 1;
        }
        println!("{label:<20} {} ({})", report.path.display(), report.kind);
    }

    if pending > 0 {
        anyhow::bail!("{pending} artifact(s) missing or unpatched");
    }

    println!("\nChecked {} artifact(s)", reports.len());
    Ok(())
}
