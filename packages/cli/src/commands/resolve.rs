use crate::commands::read_doc;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_model::Node;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Position to resolve
    pub pos: usize,
}

pub fn resolve(args: ResolveArgs, config: &Config) -> Result<()> {
    let schema = config.schema()?;
    let doc = read_doc(&args.input, &schema)?;
    let resolved = doc.resolve(args.pos)?;

    println!("{} {}", "Position".bold(), resolved.pos());
    println!("   Depth:         {}", resolved.depth());
    println!("   Parent:        {}", resolved.parent().node_type().name());
    println!("   Parent offset: {}", resolved.parent_offset());

    for depth in 0..=resolved.depth() {
        let Some(node) = resolved.node(depth) else {
            continue;
        };
        println!(
            "   {} {} {}..{} (index {})",
            format!("[{}]", depth).dimmed(),
            node.node_type().name(),
            resolved.start(depth),
            resolved.end(depth),
            resolved.index(depth)
        );
    }

    println!("   Before:        {}", describe(resolved.node_before()));
    println!("   After:         {}", describe(resolved.node_after()));

    let marks: Vec<String> = resolved
        .marks()
        .iter()
        .map(|mark| mark.mark_type().name().to_string())
        .collect();
    if !marks.is_empty() {
        println!("   Marks:         {}", marks.join(", ").yellow());
    }
    if resolved.is_at_start() {
        println!("   {} at start of parent", "✓".green());
    }
    if resolved.is_at_end() {
        println!("   {} at end of parent", "✓".green());
    }

    Ok(())
}

fn describe(node: Option<Node>) -> String {
    match node {
        Some(node) => format!("{:?}", node),
        None => "-".dimmed().to_string(),
    }
}
