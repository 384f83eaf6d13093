//! Deminify CLI - JavaScript stack trace deminifier

use anyhow::Context;
use clap::{Parser, Subcommand};
use deminify_core::config;
use deminify_core::{
    name_only_stack_trace_deminifier, render, stack_trace_deminifier, DeminifyOptions,
    DirectoryArtifacts, OutputFormat,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deminify")]
#[command(about = "Deminify JavaScript stack traces using source maps")]
#[command(version = env!("DEMINIFY_VERSION"))]
struct Cli {
    /// Log artifact loading and per-frame failures to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deminify a stack trace read from a file or stdin
    Trace {
        /// File holding the stack trace (default: stdin)
        file: Option<PathBuf>,

        /// Directory holding the minified scripts and their source maps
        /// (overrides config file; default: the trace file's directory)
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Resolve minified function names only, without source maps
        #[arg(long)]
        name_only: bool,

        /// Deminify frames in parallel
        #[arg(long)]
        parallel: bool,

        /// Output format (overrides config file)
        #[arg(long)]
        format: Option<Format>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Trace {
            file,
            artifacts,
            name_only,
            parallel,
            format,
            config: config_path,
        } => {
            let project_root = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            if let Some(path) = &resolved.config_path {
                tracing::debug!(path = %path.display(), "Using config");
            }

            // CLI flags override config file values
            let artifacts_dir = artifacts
                .or(resolved.artifacts_dir)
                .or_else(|| file.as_deref().and_then(Path::parent).map(Path::to_path_buf))
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(project_root);
            let name_only = name_only || resolved.name_only;
            let parallel = parallel || resolved.parallel;
            let format = format.map(OutputFormat::from).unwrap_or(resolved.format);

            if !artifacts_dir.is_dir() {
                anyhow::bail!("Artifacts directory does not exist: {}", artifacts_dir.display());
            }

            let stack_trace = read_stack_trace(file.as_deref())?;

            let provider = Arc::new(DirectoryArtifacts::new(artifacts_dir));
            let deminifier = if name_only {
                name_only_stack_trace_deminifier(provider)
            } else {
                stack_trace_deminifier(provider.clone(), provider)
            };
            let deminifier = deminifier.with_options(DeminifyOptions { parallel });

            let result = deminifier.deminify_stack_trace(&stack_trace);
            if result.minified_stack_frames.is_empty() {
                eprintln!("Warning: no stack frames recognized in input");
            }

            print!("{}", render(&result, format));
            if format == OutputFormat::Json {
                println!();
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                match config::load_and_resolve(&project_root, path.as_deref()) {
                    Ok(resolved) => match resolved.config_path {
                        Some(p) => println!("Config valid: {}", p.display()),
                        None => println!("No config file found. Using defaults."),
                    },
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                match &resolved.config_path {
                    Some(p) => println!("  Source: {}", p.display()),
                    None => println!("  Source: defaults (no config file found)"),
                }
                match &resolved.artifacts_dir {
                    Some(dir) => println!("  Artifacts: {}", dir.display()),
                    None => println!("  Artifacts: (trace file directory)"),
                }
                println!("  Name only: {}", resolved.name_only);
                println!("  Parallel: {}", resolved.parallel);
                println!("  Format: {:?}", resolved.format);
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "deminify_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn read_stack_trace(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stack trace: {}", path.display())),
        _ => {
            let mut stack_trace = String::new();
            std::io::stdin()
                .read_to_string(&mut stack_trace)
                .context("failed to read stack trace from stdin")?;
            Ok(stack_trace)
        }
    }
}
