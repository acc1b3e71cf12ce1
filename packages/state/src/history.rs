//! # Undo/Redo History
//!
//! Tracks earlier states and enables undo/redo.
//!
//! ## Design
//!
//! - States are immutable, so history stores snapshots instead of inverse steps
//! - Undo swaps the current state for the latest snapshot and keeps the
//!   current one for redo
//! - New entries clear the redo stack
//! - Supports batches (several transactions undone as one step)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//!
//! history.record(&state);
//! let state = state.apply(&tr)?;
//!
//! let previous = history.undo(&state);
//! ```

use std::collections::VecDeque;

use tracing::debug;

use crate::state::EditorState;

/// Default number of undo levels
pub const DEFAULT_DEPTH: usize = 100;

/// A snapshot to return to
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// State to restore
    pub state: EditorState,

    /// Optional description of the change this entry undoes
    pub description: Option<String>,
}

impl HistoryEntry {
    pub fn new(state: EditorState) -> Self {
        Self {
            state,
            description: None,
        }
    }
}

/// Undo/redo stacks of state snapshots
#[derive(Debug)]
pub struct History {
    /// Snapshots taken before each change, oldest first
    undo_stack: VecDeque<HistoryEntry>,

    /// Snapshots of undone changes (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Oldest snapshots are dropped past this depth; 0 keeps everything
    max_levels: usize,

    /// `Some` while a batch is open, holding its first snapshot once recorded
    current_batch: Option<Option<HistoryEntry>>,

    /// Description for the batch being built
    batch_description: Option<String>,
}

impl History {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_DEPTH)
    }

    /// Create a history with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
            batch_description: None,
        }
    }

    /// Record the state a change is about to replace
    pub fn record(&mut self, before: &EditorState) {
        if let Some(batch) = &mut self.current_batch {
            // only the state before the first change of a batch matters
            batch.get_or_insert_with(|| HistoryEntry::new(before.clone()));
            return;
        }
        self.push_entry(HistoryEntry::new(before.clone()));
    }

    /// Start a batch of changes (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(None);
        self.batch_description = None;
    }

    /// End the current batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        let description = self.batch_description.take();
        if let Some(Some(mut entry)) = self.current_batch.take() {
            entry.description = description;
            self.push_entry(entry);
        }
    }

    /// Name the open batch. Ignored outside a batch.
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if self.current_batch.is_some() {
            self.batch_description = Some(description.into());
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.pop_front();
        }

        // a new change invalidates the undone future
        self.redo_stack.clear();
        debug!(undo_levels = self.undo_stack.len(), "recorded history entry");
    }

    /// Step back from `current`. Returns the state to restore, if any.
    pub fn undo(&mut self, current: &EditorState) -> Option<EditorState> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(HistoryEntry {
            state: current.clone(),
            description: entry.description.clone(),
        });
        debug!(version = entry.state.version(), "undo");
        Some(entry.state)
    }

    /// Step forward from `current`. Returns the state to restore, if any.
    pub fn redo(&mut self, current: &EditorState) -> Option<EditorState> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push_back(HistoryEntry {
            state: current.clone(),
            description: entry.description.clone(),
        });
        debug!(version = entry.state.version(), "redo");
        Some(entry.state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget every snapshot and any open batch
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
        self.batch_description = None;
    }

    /// Description of the entry `undo` would restore
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .back()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last()?.description.as_deref()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
