//! Run command implementation.

use anyhow::Result;
use clap::Args;
use tracing::info;

use genpatch_core::GenPatchPipeline;

use super::PipelineArgs;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Runs the run command.
pub fn run(args: &RunArgs) -> Result<()> {
    let config = args.pipeline.load_config()?;
    let pipeline = GenPatchPipeline::with_protoc(config)?;
    info!(
        path = ?args.pipeline.path,
        generator = %pipeline.generator().program().display(),
        language = %pipeline.generator().config().language,
        "Running pipeline"
    );

    let summary = pipeline.run(&args.pipeline.path)?;

    if summary.descriptors.is_empty() {
        println!(
            "No descriptors matching '*{}' found in {}",
            pipeline.config().descriptor_suffix,
            args.pipeline.path.display()
        );
        return Ok(());
    }

    for artifact in &summary.patched {
        println!("✓ {}", artifact.display());
    }
    println!(
        "\nGenerated {} descriptor(s), patched {} artifact(s)",
        summary.descriptors.len(),
        summary.patched.len()
    );
    Ok(())
}
