//! # Quire State
//!
//! Editor state, transactions and everything built on top of them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Schema, Node, Fragment, Slice        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ steps: Replace / AddMark / RemoveMark       │
//! │  - validate against the schema              │
//! │  - produce a StepMap for position mapping   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transaction: ordered steps + overrides      │
//! │  - all steps apply, or none do              │
//! │  - old selection mapped through the steps   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ state: immutable snapshot (doc, selection,  │
//! │        stored marks, plugins, version)      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: current state + history + commands  │
//! │         + change listeners                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **States never change**: every edit returns a new state
//! 2. **Structural sharing**: untouched subtrees are the same allocation
//! 3. **Atomic transactions**: a failing step leaves the old state intact
//! 4. **Snapshots for undo**: history stores states, not inverse steps
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_state::{Editor, EditorState, EditorStateConfig};
//!
//! let state = EditorState::create(EditorStateConfig::new())?;
//! let mut editor = Editor::new(state);
//!
//! let mut tr = editor.state().tr();
//! tr.insert_text(0, "Hello")?;
//! editor.dispatch(tr)?;
//!
//! editor.undo();
//! ```

mod commands;
mod editor;
mod errors;
mod history;
mod mapping;
mod plugin;
mod selection;
mod state;
mod steps;
mod transaction;

pub use commands::{
    clear_stored_marks, command, delete_selection, insert_text, select_all, toggle_mark, Command,
    CommandRegistry, Dispatch,
};
pub use editor::{Editor, ListenerId, HISTORY_META};
pub use errors::{StateError, StateResult};
pub use history::{History, HistoryEntry, DEFAULT_DEPTH};
pub use mapping::{Assoc, MapRange, Mapping, StepMap};
pub use plugin::{Plugin, ReadOnly};
pub use selection::{NodeSelection, Selection, SelectionJson, TextSelection};
pub use state::{EditorState, EditorStateConfig, StateJson, StateUpdate};
pub use steps::{Step, StepError, StepResult};
pub use transaction::{Transaction, ADD_TO_HISTORY};

// Re-export the model for convenience
pub use quire_model as model;
