//! Mirror binary: configure from the environment, run one pass over
//! the registry, exit non-zero only when the registry listing itself
//! is unavailable.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vocmirror::{MirrorConfig, MirrorPipeline};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match MirrorConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };
    info!(
        output = %config.output_root.display(),
        workers = config.workers,
        registry = %config.registry_base,
        "starting mirror run"
    );

    let pipeline = match MirrorPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!(error = %err, "could not build the pipeline");
            std::process::exit(1);
        }
    };

    match pipeline.run().await {
        Ok(summary) => {
            info!(
                total = summary.total,
                succeeded = summary.succeeded,
                skipped = summary.skipped,
                failed = summary.failed,
                "mirror complete"
            );
        }
        Err(err) => {
            error!(error = %err, "mirror run failed");
            std::process::exit(1);
        }
    }
}
