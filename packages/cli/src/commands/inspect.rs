use crate::commands::read_doc;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_model::{walk_node, Node, Visitor};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn inspect(args: InspectArgs, config: &Config) -> Result<()> {
    let schema = config.schema()?;
    let doc = read_doc(&args.input, &schema)?;

    match args.format.as_str() {
        "json" => {
            let summary = serde_json::json!({
                "size": doc.content().size(),
                "childCount": doc.child_count(),
                "textContent": doc.text_content(),
                "doc": doc.to_value(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => {
            println!(
                "{} {}",
                doc.node_type().name().bold(),
                format!("(size {})", doc.content().size()).dimmed()
            );
            let mut printer = TreePrinter { depth: 0 };
            walk_node(&mut printer, &doc, 0);
        }
        other => return Err(anyhow!("Unknown format: {}. Use: text or json", other)),
    }

    Ok(())
}

/// Prints one line per node, indented by depth and prefixed with its position
struct TreePrinter {
    depth: usize,
}

impl TreePrinter {
    fn line(&self, pos: usize, label: String) {
        println!("{:>5}  {}{}", pos.to_string().cyan(), "  ".repeat(self.depth), label);
    }
}

impl Visitor for TreePrinter {
    fn visit_node(&mut self, node: &Node, pos: usize) {
        let size = format!("(size {})", node.node_size());
        self.line(pos, format!("{} {}", node.node_type().name(), size.dimmed()));
        self.depth += 1;
        walk_node(self, node, pos);
        self.depth -= 1;
    }

    fn visit_text(&mut self, text: &Node, pos: usize) {
        let marks: Vec<&str> = text.marks().iter().map(|mark| mark.mark_type().name()).collect();
        let label = format!("{:?}", text.text().unwrap_or_default());
        if marks.is_empty() {
            self.line(pos, label.green().to_string());
        } else {
            self.line(pos, format!("{} [{}]", label.green(), marks.join(", ").yellow()));
        }
    }
}
