//! autosuite CLI - record interactive calls into a unittest module

mod demo;
mod parse;
mod shell;

use std::path::PathBuf;

use anyhow::{Context, Result};
use autosuite_core::prelude::*;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autosuite")]
#[command(about = "Turn interactive calls into regression tests", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to autosuite.toml and AUTOSUITE_* variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive recording shell over the demo library
    Shell {
        /// Default file for `:suite`
        #[arg(short, long, env = "AUTOSUITE_OUTPUT")]
        output: Option<PathBuf>,

        /// Start with recording switched off
        #[arg(long)]
        paused: bool,
    },
    /// Print the effective configuration
    Config,
    /// Version information
    Version,
}

fn load_config(path: Option<&PathBuf>) -> Result<AutosuiteConfig> {
    let config = match path {
        Some(path) => AutosuiteConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AutosuiteConfig::load()?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with generated source on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("autosuite {}", env!("CARGO_PKG_VERSION"));
            println!("autosuite-core {}", autosuite_core::VERSION);
        }
        Commands::Config => {
            let config = load_config(cli.config.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Shell { output, paused } => {
            let mut config = load_config(cli.config.as_ref())?;
            if output.is_some() {
                config.suite.output = output;
            }
            if paused {
                config.recorder.enabled = false;
            }

            let registry = ModuleRegistry::new();
            demo::register(&registry)?;

            println!("autosuite {} (:help for commands)", env!("CARGO_PKG_VERSION"));
            let mut shell = shell::Shell::new(Session::new(config), registry);
            shell.run()?;
        }
    }

    Ok(())
}
