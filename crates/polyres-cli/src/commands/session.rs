//! Long-lived resolution session.
//!
//! Reads `<origin> <specifier>` lines from stdin and prints one result per
//! line. Interactive sessions hot-reload path mappings while running.

use super::resolve::{describe, resolve_one};
use super::{absolutize, build_config, PipelineArgs, TargetArgs};
use miette::{IntoDiagnostic, Result};
use polyres_core::{MemoryResolutionCache, ResolverPipeline};
use polyres_watch::start_path_mapping_watch;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

pub fn run(
    cwd: &Path,
    export: bool,
    target: &TargetArgs,
    args: &PipelineArgs,
    json: bool,
) -> Result<()> {
    let config = build_config(cwd, args)?.with_exporting(export);
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime.block_on(serve(cwd, config, target, json))
}

async fn serve(
    cwd: &Path,
    config: polyres_core::Config,
    target: &TargetArgs,
    json: bool,
) -> Result<()> {
    let pipeline = ResolverPipeline::builder(config.clone())
        .cache(Box::new(MemoryResolutionCache::new()))
        .build()
        .into_diagnostic()?;

    let watcher = start_path_mapping_watch(&config, pipeline.path_mappings().clone())
        .into_diagnostic()?;
    info!(
        root = %config.project_root.display(),
        watching = watcher.is_some(),
        "Session started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.into_diagnostic()? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((origin, specifier)) = line.split_once(char::is_whitespace) else {
                    warn!("Expected `<origin> <specifier>`, got: {}", line);
                    continue;
                };

                let origin = absolutize(cwd, Path::new(origin));
                let output = resolve_one(&pipeline, target, origin, specifier.trim());
                if json {
                    println!("{}", serde_json::to_string(&output).into_diagnostic()?);
                } else {
                    println!("{} -> {}", output.specifier, describe(&output));
                }
            }
        }
    }

    if let Some(watcher) = watcher {
        watcher.stop().into_diagnostic()?;
    }
    Ok(())
}
