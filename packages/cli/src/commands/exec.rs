use crate::commands::read_doc;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_model::{Attrs, Schema};
use quire_state::{toggle_mark, Editor, EditorState, EditorStateConfig, Selection};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Start of the range to edit
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// End of the range to edit (defaults to --from)
    #[arg(long)]
    pub to: Option<usize>,

    /// Replace the range with this text
    #[arg(long)]
    pub text: Option<String>,

    /// Add a mark (by name) over the edited range
    #[arg(long)]
    pub mark: Option<String>,

    /// Run a named command with the range selected
    #[arg(short, long)]
    pub command: Option<String>,

    /// Write the resulting document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn exec(args: ExecArgs, config: &Config) -> Result<()> {
    let schema = config.schema()?;
    let doc = read_doc(&args.input, &schema)?;
    let to = args.to.unwrap_or(args.from);

    let selection = Selection::text(&doc, args.from, to)?;
    let state = EditorState::create(
        EditorStateConfig::new()
            .schema(schema.clone())
            .doc(doc)
            .selection(selection),
    )?;
    let mut editor = Editor::with_history_depth(state, config.history_depth);
    register_mark_commands(&mut editor, &schema);

    let mut end = to;
    if let Some(text) = &args.text {
        let mut tr = editor.state().tr();
        tr.insert_text_range(args.from, to, text)?;
        editor.dispatch(tr)?;
        end = args.from + text.chars().count();
    }

    if let Some(name) = &args.mark {
        let mark = schema.mark(name, Attrs::new())?;
        let mut tr = editor.state().tr();
        tr.mark_text(args.from, end, &mark);
        editor.dispatch(tr)?;
    }

    if let Some(name) = &args.command {
        let selection = Selection::text(editor.state().doc(), args.from, end)?;
        let mut tr = editor.state().tr();
        tr.set_selection(selection);
        editor.dispatch(tr)?;

        if !editor.execute(name)? {
            let known: Vec<&str> = editor.commands().names().collect();
            return Err(anyhow!(
                "Command {} did not apply. Known commands: {}",
                name,
                known.join(", ")
            ));
        }
    }

    debug!(
        undo_levels = editor.history().undo_levels(),
        version = editor.state().version(),
        "exec finished"
    );

    let json = serde_json::to_string_pretty(&editor.state().doc().to_value())?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            println!(
                "{} {} ({} changes)",
                "✓".green(),
                path.display(),
                editor.history().undo_levels()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Register `toggle_<mark>` for every mark type in the schema
fn register_mark_commands(editor: &mut Editor, schema: &Schema) {
    for mark_type in schema.mark_types() {
        editor.commands_mut().register(
            format!("toggle_{}", mark_type.name()),
            toggle_mark(mark_type.name()),
        );
    }
}
