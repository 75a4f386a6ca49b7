use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use uv_cropper::config::{CliArgs, PipelineConfig};
use uv_cropper::pipeline::Pipeline;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("uv_cropper=debug")
    } else {
        EnvFilter::new("uv_cropper=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: PipelineConfig = args.into();

    match Pipeline::run(&config) {
        Ok(report) => {
            println!(
                "Done: {}/{} assets, {} variants in {:.2}s",
                report.succeeded(),
                report.succeeded() + report.failed.len(),
                report.variants,
                report.duration.as_secs_f64()
            );
            if report.succeeded() == 0 && !report.failed.is_empty() {
                anyhow::bail!("every asset failed");
            }
            Ok(())
        }
        Err(e) => {
            error!(%e, "Pipeline failed");
            Err(anyhow::anyhow!(e)).context("uv-cropper pipeline failed")
        }
    }
}
