use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_model::{Node, Schema};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document JSON file or directory of documents
    pub input: PathBuf,

    /// Show documents without problems too
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn validate(args: ValidateArgs, config: &Config) -> Result<()> {
    let schema = config.schema()?;

    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        find_json_files(&args.input)
    } else {
        return Err(anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    println!("🔍 {} {} documents", "Validating".green().bold(), files.len());
    println!();

    let mut invalid = 0;
    for file in &files {
        let problems = validate_file(file, &schema);
        if problems.is_empty() {
            if args.verbose {
                println!("{} {}", "✓".green(), file.display());
            }
            continue;
        }

        invalid += 1;
        println!("{} {}", "✗".red(), file.display());
        for problem in problems {
            println!("    {} {}", "error".red().bold(), problem);
        }
    }

    println!();
    if invalid > 0 {
        return Err(anyhow!("{} of {} documents are invalid", invalid, files.len()));
    }
    println!("✨ {} No issues found!", "Done".green().bold());
    Ok(())
}

/// Problems found in one file, empty when it is valid
fn validate_file(path: &Path, schema: &Schema) -> Vec<String> {
    debug!(file = %path.display(), "validating");

    let value = match fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| Ok(serde_json::from_str::<serde_json::Value>(&content)?))
    {
        Ok(value) => value,
        Err(err) => return vec![err.to_string()],
    };

    let doc = match Node::from_value(schema, &value) {
        Ok(doc) => doc,
        Err(err) => return vec![err.to_string()],
    };

    schema
        .check_content(&doc)
        .into_iter()
        .map(|violation| {
            format!(
                "{} is not allowed in {} (at {})",
                violation.child, violation.parent, violation.pos
            )
        })
        .collect()
}

fn find_json_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false))
        .collect()
}
