#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "polyres")]
#[command(author, version, about = "Multi-platform module resolution for React Native bundles", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve one import
    Resolve {
        /// Import specifier (e.g. "react-native", "./App", "node:fs")
        specifier: String,

        /// File the import appears in (default: <project root>/index.js)
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        #[command(flatten)]
        target: commands::TargetArgs,

        #[command(flatten)]
        pipeline: commands::PipelineArgs,
    },

    /// Resolve `<origin> <specifier>` lines from stdin until EOF or Ctrl-C
    Session {
        /// Treat the session as an export (no config watching)
        #[arg(long)]
        export: bool,

        #[command(flatten)]
        target: commands::TargetArgs,

        #[command(flatten)]
        pipeline: commands::PipelineArgs,
    },

    /// Print the polyfill list for a platform
    Polyfills {
        /// Target platform
        #[arg(long, short)]
        platform: Option<String>,

        /// Host polyfills to prepend on non-web platforms
        #[arg(long = "host", value_name = "ID")]
        host: Vec<String>,

        #[command(flatten)]
        pipeline: commands::PipelineArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Version output is never mixed with logs.
    if !matches!(cli.command, Commands::Version) {
        logging::init(cli.verbose, cli.json);
    }

    match cli.command {
        Commands::Version => commands::version::run(cli.json),
        Commands::Resolve {
            specifier,
            from,
            target,
            pipeline,
        } => commands::resolve::run(&cwd, &specifier, from, &target, &pipeline, cli.json),
        Commands::Session {
            export,
            target,
            pipeline,
        } => commands::session::run(&cwd, export, &target, &pipeline, cli.json),
        Commands::Polyfills {
            platform,
            host,
            pipeline,
        } => commands::polyfills::run(&cwd, platform, &host, &pipeline, cli.json),
    }
}
