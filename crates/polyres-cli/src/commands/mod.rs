pub mod polyfills;
pub mod resolve;
pub mod session;
pub mod version;

use clap::Args;
use miette::{IntoDiagnostic, Result};
use polyres_core::paths::project_root;
use polyres_core::{Config, Environment, Platform, ResolutionContext};
use std::path::{Path, PathBuf};

/// Options that shape the pipeline (override the `POLYRES_*` environment).
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Disable tsconfig/jsconfig path mapping
    #[arg(long)]
    pub no_tsconfig_paths: bool,

    /// Redirect renderer internals to the canary build on native platforms
    #[arg(long)]
    pub react_canary: bool,

    /// Keep the default main fields on every platform
    #[arg(long)]
    pub no_main_field_override: bool,

    /// Replacement for the web asset registry module
    #[arg(long, value_name = "FILE")]
    pub asset_registry: Option<PathBuf>,

    /// Directory of web shims keyed by dependency-relative name
    #[arg(long, value_name = "DIR")]
    pub shims_dir: Option<PathBuf>,

    /// Directory of canary files keyed by dependency-relative name
    #[arg(long, value_name = "DIR")]
    pub canary_dir: Option<PathBuf>,
}

/// Target of a resolution request.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Target platform (e.g. ios, android, web)
    #[arg(long, short)]
    pub platform: Option<String>,

    /// Bundle environment: client, node or react-server
    #[arg(long = "env", value_name = "ENV", value_parser = parse_environment)]
    pub environment: Option<Environment>,

    /// Development bundle
    #[arg(long)]
    pub dev: bool,
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    Environment::parse(value)
        .ok_or_else(|| format!("unknown environment '{value}' (expected client, node or react-server)"))
}

impl TargetArgs {
    pub fn platform(&self) -> Option<Platform> {
        self.platform.as_deref().map(Platform::from)
    }

    pub fn context(&self, origin: PathBuf) -> ResolutionContext {
        ResolutionContext::new(origin)
            .with_environment(self.environment)
            .with_dev(self.dev)
    }
}

/// Build the pipeline config: project root from `cwd`, environment
/// variables, then command-line flags.
pub fn build_config(cwd: &Path, args: &PipelineArgs) -> Result<Config> {
    let cwd = if cwd.is_absolute() {
        cwd.to_path_buf()
    } else {
        std::env::current_dir().into_diagnostic()?.join(cwd)
    };
    let root = project_root(&cwd).unwrap_or_else(|| cwd.clone());

    let mut config = Config::from_env(root);
    if args.no_tsconfig_paths {
        config.tsconfig_paths = false;
    }
    if args.react_canary {
        config.react_canary = true;
    }
    if args.no_main_field_override {
        config.main_field_override = false;
    }
    if let Some(path) = &args.asset_registry {
        config.asset_registry_path = Some(absolutize(&cwd, path));
    }
    if let Some(dir) = &args.shims_dir {
        config.shims_dir = Some(absolutize(&cwd, dir));
    }
    if let Some(dir) = &args.canary_dir {
        config.canary_dir = Some(absolutize(&cwd, dir));
    }
    Ok(config)
}

pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
