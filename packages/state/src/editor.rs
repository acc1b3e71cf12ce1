//! # Editor Session
//!
//! Owns the current state of one editing session, its undo history, its
//! commands and the listeners that want to hear about every change.
//!
//! Listeners run after the new state is installed. A listener only sees the
//! state and transaction; it cannot dispatch from inside the callback.
//! Transactions produced in reaction to a change are dispatched by the
//! caller once [`Editor::dispatch`] returns.

use tracing::debug;

use crate::commands::CommandRegistry;
use crate::errors::StateResult;
use crate::history::History;
use crate::state::EditorState;
use crate::transaction::{Transaction, ADD_TO_HISTORY};

/// Handle returned by [`Editor::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorState, &Transaction)>;

/// Meta key set on the transactions listeners receive after undo/redo
pub const HISTORY_META: &str = "history";

pub struct Editor {
    state: EditorState,
    history: History,
    commands: CommandRegistry,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Editor {
    pub fn new(state: EditorState) -> Self {
        Self::with_history(state, History::new())
    }

    /// Editor keeping at most `depth` undo levels
    pub fn with_history_depth(state: EditorState, depth: usize) -> Self {
        Self::with_history(state, History::with_max_levels(depth))
    }

    fn with_history(state: EditorState, history: History) -> Self {
        Self {
            state,
            history,
            commands: CommandRegistry::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    /// Call `listener` after every dispatched change
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&EditorState, &Transaction) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the listener was already gone
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Apply `tr` to the current state and make the result current.
    ///
    /// Document changes are recorded in the history unless the transaction
    /// carries `addToHistory: false`. A transaction rejected by a plugin is
    /// dropped without notifying listeners.
    pub fn dispatch(&mut self, tr: Transaction) -> StateResult<()> {
        let Some(next) = self.state.try_apply(&tr)? else {
            return Ok(());
        };
        if tr.doc_changed() && tr.add_to_history() {
            self.history.record(&self.state);
        }

        debug!(
            from = self.state.version(),
            to = next.version(),
            listeners = self.listeners.len(),
            "dispatched transaction"
        );
        self.state = next;
        self.notify(&tr);
        Ok(())
    }

    /// Run a registered command against the current state.
    ///
    /// Returns whether the command applied.
    pub fn execute(&mut self, name: &str) -> StateResult<bool> {
        let mut dispatched = Vec::new();
        let applied = self
            .commands
            .execute(name, &self.state, Some(&mut |tr: Transaction| dispatched.push(tr)));

        for tr in dispatched {
            self.dispatch(tr)?;
        }
        Ok(applied)
    }

    /// Restore the state before the last recorded change
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.state) {
            Some(state) => {
                self.restore(state, "undo");
                true
            }
            None => false,
        }
    }

    /// Restore the state the last undo stepped away from
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.state) {
            Some(state) => {
                self.restore(state, "redo");
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, state: EditorState, kind: &str) {
        self.state = state;
        let mut tr = self.state.tr();
        tr.set_meta(HISTORY_META, kind).set_meta(ADD_TO_HISTORY, false);
        self.notify(&tr);
    }

    fn notify(&mut self, tr: &Transaction) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state, tr);
        }
    }
}
