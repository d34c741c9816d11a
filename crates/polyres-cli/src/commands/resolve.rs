use super::{absolutize, build_config, PipelineArgs, TargetArgs};
use miette::{miette, IntoDiagnostic, Result};
use polyres_core::version::RESOLUTION_SCHEMA_VERSION;
use polyres_core::{Platform, Resolution, ResolveError, ResolverPipeline};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolution result for JSON output.
#[derive(Serialize)]
pub struct ResolveOutput {
    pub schema_version: u32,
    pub ok: bool,
    pub origin: PathBuf,
    pub specifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// Contents of a virtual module result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
}

#[derive(Serialize)]
pub struct ErrorOutput {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tried: Vec<PathBuf>,
}

impl From<&ResolveError> for ErrorOutput {
    fn from(e: &ResolveError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            tried: e.tried().to_vec(),
        }
    }
}

/// Resolve one edge and package the outcome for output.
pub fn resolve_one(
    pipeline: &ResolverPipeline,
    target: &TargetArgs,
    origin: PathBuf,
    specifier: &str,
) -> ResolveOutput {
    let platform = target.platform();
    let context = target.context(origin.clone());
    let result = pipeline.resolve(&context, specifier, platform.as_ref());

    let mut output = ResolveOutput {
        schema_version: RESOLUTION_SCHEMA_VERSION,
        ok: result.is_ok(),
        origin,
        specifier: specifier.to_string(),
        platform,
        resolution: None,
        contents: None,
        error: None,
    };
    match result {
        Ok(resolution) => {
            output.contents = resolution
                .file_path()
                .and_then(|path| pipeline.read_virtual(path))
                .map(|contents| contents.to_string());
            output.resolution = Some(resolution);
        }
        Err(e) => output.error = Some(ErrorOutput::from(&e)),
    }
    output
}

/// Human-readable single line.
pub fn describe(output: &ResolveOutput) -> String {
    match (&output.resolution, &output.error) {
        (Some(Resolution::SourceFile { file_path }), _) => {
            // Virtual ids start with NUL; show them escaped.
            format!("{}", file_path.display()).replace('\0', "\\0")
        }
        (Some(Resolution::AssetFiles { file_paths }), _) => file_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        (Some(Resolution::Empty), _) => "(empty)".to_string(),
        (None, Some(error)) => format!("error[{}]: {}", error.code, error.message),
        (None, None) => String::new(),
    }
}

pub fn run(
    cwd: &Path,
    specifier: &str,
    from: Option<PathBuf>,
    target: &TargetArgs,
    args: &PipelineArgs,
    json: bool,
) -> Result<()> {
    let config = build_config(cwd, args)?;
    let origin = from.map_or_else(
        || config.project_root.join("index.js"),
        |from| absolutize(cwd, &from),
    );
    let pipeline = ResolverPipeline::new(config).into_diagnostic()?;

    let output = resolve_one(&pipeline, target, origin, specifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        if !output.ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    if output.ok {
        println!("{}", describe(&output));
        if let Some(contents) = &output.contents {
            println!("{contents}");
        }
        Ok(())
    } else {
        Err(miette!("{}", describe(&output)))
    }
}
