use super::{build_config, PipelineArgs};
use miette::{IntoDiagnostic, Result};
use polyres_core::{Platform, ResolverPipeline};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PolyfillEntry {
    id: String,
    /// Virtual module contents; `None` for host-provided files.
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
}

pub fn run(
    cwd: &Path,
    platform: Option<String>,
    host: &[String],
    args: &PipelineArgs,
    json: bool,
) -> Result<()> {
    let config = build_config(cwd, args)?;
    let pipeline = ResolverPipeline::new(config).into_diagnostic()?;
    let platform = platform.as_deref().map(Platform::from);

    let entries: Vec<PolyfillEntry> = pipeline
        .polyfills(platform.as_ref(), host)
        .into_iter()
        .map(|id| PolyfillEntry {
            contents: pipeline
                .read_virtual(Path::new(&id))
                .map(|contents| contents.to_string()),
            id,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
    } else {
        for entry in &entries {
            println!("{}", entry.id.replace('\0', "\\0"));
        }
    }
    Ok(())
}
