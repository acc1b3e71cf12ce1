//! # Commands
//!
//! A command looks at a state and, if it applies, hands a transaction to the
//! dispatch callback. Called without a callback it only reports whether it
//! would apply, which lets toolbars check availability.
//!
//! ```rust,ignore
//! let registry = CommandRegistry::default();
//! let mut dispatched = Vec::new();
//! registry.execute("selectAll", &state, Some(&mut |tr: Transaction| dispatched.push(tr)));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use quire_model::{Attrs, Node};
use tracing::debug;

use crate::selection::Selection;
use crate::state::EditorState;
use crate::transaction::Transaction;

/// Callback receiving the transaction a command built
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

pub type Command =
    Arc<dyn Fn(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool + Send + Sync>;

/// Commands by name
#[derive(Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    /// Registry with no commands
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Registry with `selectAll`, `deleteSelection` and `clearStoredMarks`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("selectAll", select_all());
        registry.register("deleteSelection", delete_selection());
        registry.register("clearStoredMarks", clear_stored_marks());
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, command: Command) {
        self.commands.insert(name.into(), command);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Run the named command. Unknown names return `false`.
    pub fn execute(&self, name: &str, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        match self.commands.get(name) {
            Some(command) => {
                let applied = command(state, dispatch);
                debug!(command = name, applied, "executed command");
                applied
            }
            None => {
                debug!(command = name, "unknown command");
                false
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

/// Wrap a closure as a [`Command`]
pub fn command<F>(f: F) -> Command
where
    F: Fn(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hand `tr` to `dispatch` if the transaction applies cleanly
fn finish(state: &EditorState, tr: Transaction, dispatch: Option<Dispatch<'_>>) -> bool {
    if tr.apply_to(state).is_err() {
        return false;
    }
    if let Some(dispatch) = dispatch {
        dispatch(tr);
    }
    true
}

/// Select the whole document
pub fn select_all() -> Command {
    command(|state, dispatch| {
        let Ok(selection) = Selection::all(state.doc()) else {
            return false;
        };
        let mut tr = state.tr();
        tr.set_selection(selection);
        finish(state, tr, dispatch)
    })
}

/// Delete the selected range. Does nothing for an empty selection.
///
/// Deleting the whole document leaves one empty paragraph behind so there is
/// still somewhere to type.
pub fn delete_selection() -> Command {
    command(|state, dispatch| {
        let selection = state.selection();
        if selection.empty() {
            return false;
        }
        let mut tr = state.tr();
        let whole_doc = selection.from() == 0 && selection.to() == state.doc().content().size();
        match empty_block(state).filter(|_| whole_doc) {
            Some(block) => tr.replace(selection.from(), selection.to(), block),
            None => tr.delete(selection.from(), selection.to()),
        };
        finish(state, tr, dispatch)
    })
}

/// An empty paragraph, if the schema lets one sit directly in the document
fn empty_block(state: &EditorState) -> Option<Node> {
    let schema = state.schema();
    let top = schema.top_node_type().ok()?;
    let paragraph = schema.paragraph(vec![]).ok()?;
    schema
        .allows_node_type(top, paragraph.node_type())
        .then_some(paragraph)
}

/// Replace the selection with `text`.
///
/// The selection must sit inside one textblock. A range spanning two
/// paragraphs is not joined, so the command does not apply there.
pub fn insert_text(text: impl Into<String>) -> Command {
    let text = text.into();
    command(move |state, dispatch| {
        let selection = state.selection();
        let mut tr = state.tr();
        if tr
            .insert_text_range(selection.from(), selection.to(), &text)
            .is_err()
        {
            return false;
        }
        finish(state, tr, dispatch)
    })
}

/// Toggle a mark without attributes.
///
/// On a cursor this toggles the stored marks. On a range it removes the mark
/// when any text in the range has it and adds it otherwise.
pub fn toggle_mark(mark_type: impl Into<String>) -> Command {
    let name = mark_type.into();
    command(move |state, dispatch| {
        let Ok(mark_type) = state.schema().mark_type(&name) else {
            return false;
        };
        let Ok(mark) = mark_type.create(Attrs::new()) else {
            return false;
        };
        let selection = state.selection();
        let mut tr = state.tr();

        if selection.empty() {
            let active = match state.stored_marks() {
                Some(marks) => marks.contains_type(mark_type),
                None => state
                    .doc()
                    .resolve(selection.from())
                    .map(|pos| pos.marks().contains_type(mark_type))
                    .unwrap_or(false),
            };
            if active {
                tr.remove_stored_mark(mark_type);
            } else {
                tr.add_stored_mark(&mark);
            }
        } else if state
            .doc()
            .range_has_mark(selection.from(), selection.to(), mark_type)
        {
            tr.unmark_text(selection.from(), selection.to(), mark_type);
        } else {
            tr.mark_text(selection.from(), selection.to(), &mark);
        }

        finish(state, tr, dispatch)
    })
}

/// Drop the stored marks. Does nothing when there are none.
pub fn clear_stored_marks() -> Command {
    command(|state, dispatch| {
        if state.stored_marks().is_none() {
            return false;
        }
        let mut tr = state.tr();
        tr.set_stored_marks(None);
        finish(state, tr, dispatch)
    })
}
