mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    exec, inspect, resolve, validate, ExecArgs, InspectArgs, ResolveArgs, ValidateArgs,
};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quire CLI - inspect and edit rich-text documents
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to quire.config.json in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a document's tree with positions
    Inspect(InspectArgs),

    /// Describe a position in a document
    Resolve(ResolveArgs),

    /// Check documents against the schema
    Validate(ValidateArgs),

    /// Apply an edit to a document
    Exec(ExecArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        init_tracing(&config.log_level);

        match cli.command {
            Command::Inspect(args) => inspect(args, &config),
            Command::Resolve(args) => resolve(args, &config),
            Command::Validate(args) => validate(args, &config),
            Command::Exec(args) => exec(args, &config),
        }
    });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_file(path),
        None => {
            let cwd = std::env::current_dir()?.display().to_string();
            Config::load(&cwd)
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
