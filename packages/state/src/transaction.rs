//! # Transactions
//!
//! An ordered batch of steps plus direct overrides of the selection, the
//! stored marks or the whole document.
//!
//! Builder methods record steps and also track the document they produce so
//! that callers can read [`Transaction::doc`] and [`Transaction::mapping`]
//! while building. [`Transaction::apply`] replays the steps against the
//! starting state and is the only place a failure is reported.

use std::collections::BTreeMap;

use quire_model::{Mark, MarkSet, MarkType, Node, Slice};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{StateError, StateResult};
use crate::mapping::Mapping;
use crate::selection::Selection;
use crate::state::{EditorState, StateUpdate};
use crate::steps::Step;

/// Meta key that keeps a transaction out of the undo history when `false`
pub const ADD_TO_HISTORY: &str = "addToHistory";

#[derive(Debug, Clone)]
pub struct Transaction {
    before: EditorState,
    steps: Vec<Step>,
    meta: BTreeMap<String, Value>,
    staged: StateUpdate,

    /// Document after the steps recorded so far
    doc: Node,
    mapping: Mapping,
    /// Set once a step fails to apply while building
    broken: bool,
}

impl Transaction {
    pub fn new(before: EditorState) -> Self {
        let doc = before.doc().clone();
        Self {
            before,
            steps: Vec::new(),
            meta: BTreeMap::new(),
            staged: StateUpdate::default(),
            doc,
            mapping: Mapping::new(),
            broken: false,
        }
    }

    pub fn before(&self) -> &EditorState {
        &self.before
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Document produced by the steps so far
    pub fn doc(&self) -> &Node {
        self.staged.doc.as_ref().unwrap_or(&self.doc)
    }

    /// Position mapping of the steps so far
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty() || self.staged.doc.is_some()
    }

    pub fn selection_set(&self) -> bool {
        self.staged.selection.is_some()
    }

    /// Record a step
    pub fn step(&mut self, step: Step) -> &mut Self {
        if !self.broken {
            match step.apply_to_doc(&self.doc, self.before.schema()) {
                Ok(doc) => {
                    self.mapping.append_map(step.get_map(&self.doc, &doc));
                    self.doc = doc;
                }
                Err(err) => {
                    debug!(step = step.name(), %err, "step does not apply to tracked document");
                    self.broken = true;
                }
            }
        }
        self.steps.push(step);
        self
    }

    /// Replace `from..to` with `content`
    pub fn replace(&mut self, from: usize, to: usize, content: impl Into<Slice>) -> &mut Self {
        self.step(Step::Replace {
            from,
            to,
            slice: content.into(),
        })
    }

    pub fn delete(&mut self, from: usize, to: usize) -> &mut Self {
        self.replace(from, to, Slice::empty())
    }

    /// Insert `text` at `pos`, carrying the stored marks if any
    pub fn insert_text(&mut self, pos: usize, text: &str) -> StateResult<&mut Self> {
        self.insert_text_range(pos, pos, text)
    }

    /// Replace `from..to` with `text`, carrying the stored marks if any
    pub fn insert_text_range(
        &mut self,
        from: usize,
        to: usize,
        text: &str,
    ) -> StateResult<&mut Self> {
        if text.is_empty() {
            return Ok(self.delete(from, to));
        }
        let marks = self.current_stored_marks().cloned().unwrap_or_default();
        let node = self.before.schema().text_with_marks(text, marks)?;
        Ok(self.replace(from, to, node))
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> &mut Self {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: MarkType) -> &mut Self {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type,
        })
    }

    /// Add `mark` to all text in `from..to`, at any depth.
    ///
    /// Mark steps only reach text directly under the document, so this
    /// rewrites each covered piece of text with a replace step instead. Text
    /// nodes are split at the range ends.
    pub fn mark_text(&mut self, from: usize, to: usize, mark: &Mark) -> &mut Self {
        self.restyle_text(from, to, |marks| mark.add_to_set(marks))
    }

    /// Remove marks of `mark_type` from all text in `from..to`, at any depth
    pub fn unmark_text(&mut self, from: usize, to: usize, mark_type: &MarkType) -> &mut Self {
        self.restyle_text(from, to, |marks| marks.without_type(mark_type))
    }

    fn restyle_text<F>(&mut self, from: usize, to: usize, restyle: F) -> &mut Self
    where
        F: Fn(&MarkSet) -> MarkSet,
    {
        let mut pieces = Vec::new();
        self.doc.nodes_between(from, to, |node, pos| {
            if node.is_text() {
                let start = from.max(pos);
                let end = to.min(pos + node.node_size());
                if let Some(piece) = node.cut(start - pos, end.saturating_sub(pos)) {
                    pieces.push((start, end, piece));
                }
            }
            true
        });

        // restyling keeps every text length, so collected positions stay valid
        for (start, end, piece) in pieces {
            let marks = restyle(piece.marks());
            if !marks.ptr_eq(piece.marks()) {
                self.replace(start, end, piece.mark(marks));
            }
        }
        self
    }

    /// Replace the whole document, bypassing steps
    pub fn set_doc(&mut self, doc: Node) -> &mut Self {
        self.staged.doc = Some(doc);
        self
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.staged.selection = Some(selection);
        self
    }

    pub fn set_stored_marks(&mut self, marks: Option<MarkSet>) -> &mut Self {
        self.staged.stored_marks = Some(marks);
        self
    }

    pub fn add_stored_mark(&mut self, mark: &Mark) -> &mut Self {
        let current = self.current_stored_marks().cloned().unwrap_or_default();
        self.set_stored_marks(Some(mark.add_to_set(&current)))
    }

    pub fn remove_stored_mark(&mut self, mark_type: &MarkType) -> &mut Self {
        let current = self.current_stored_marks().cloned().unwrap_or_default();
        self.set_stored_marks(Some(current.without_type(mark_type)))
    }

    fn current_stored_marks(&self) -> Option<&MarkSet> {
        match &self.staged.stored_marks {
            Some(staged) => staged.as_ref(),
            None => self.before.stored_marks(),
        }
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Whether the transaction should be recorded in the undo history
    pub fn add_to_history(&self) -> bool {
        self.get_meta(ADD_TO_HISTORY) != Some(&Value::Bool(false))
    }

    /// Apply to the state the transaction was started from
    pub fn apply(&self) -> StateResult<EditorState> {
        self.apply_to(&self.before)
    }

    /// Fold the steps over `before`, then apply the staged overrides.
    ///
    /// The first failing step aborts the whole transaction; `before` is
    /// never modified. Without a staged selection the previous one is mapped
    /// through the steps.
    pub fn apply_to(&self, before: &EditorState) -> StateResult<EditorState> {
        let mut state = before.clone();
        let mut mapping = Mapping::new();

        for (index, step) in self.steps.iter().enumerate() {
            let next = step.apply(&state).map_err(|err| {
                warn!(step = step.name(), index, %err, "transaction failed");
                StateError::TransactionFailed(err.to_string())
            })?;
            mapping.append_map(step.get_map(state.doc(), next.doc()));
            state = next;
        }

        let mut update = self.staged.clone();
        if update.selection.is_none() && !self.steps.is_empty() {
            let doc = update.doc.as_ref().unwrap_or(state.doc());
            update.selection = Some(before.selection().map(doc, &mapping)?);
        }
        if update.is_empty() {
            return Ok(state);
        }

        let state = state.update(update);
        debug!(
            steps = self.steps.len(),
            version = state.version(),
            "applied transaction"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EditorStateConfig;
    use quire_model::{Attrs, Fragment, Schema};

    fn state(text: &str) -> EditorState {
        let schema = Schema::basic();
        let doc = schema
            .doc(vec![schema.paragraph(vec![schema.text(text).unwrap()]).unwrap()])
            .unwrap();
        EditorState::create(EditorStateConfig::new().schema(schema).doc(doc)).unwrap()
    }

    #[test]
    fn test_insert_text() {
        let state = state("Hello");
        let mut tr = state.tr();
        tr.insert_text(5, "!").unwrap();

        assert!(tr.doc_changed());
        assert_eq!(tr.doc().text_content(), "Hello!");

        let next = tr.apply().unwrap();
        assert_eq!(next.doc().text_content(), "Hello!");
        assert_eq!(state.doc().text_content(), "Hello");
    }

    #[test]
    fn test_replace_with_fragment() {
        let state = state("Hello World");
        let schema = state.schema().clone();
        let mut tr = state.tr();
        tr.replace(0, 5, Fragment::from(vec![schema.text("Goodbye").unwrap()]));

        assert_eq!(tr.apply().unwrap().doc().text_content(), "Goodbye World");
    }

    #[test]
    fn test_selection_is_mapped_through_steps() {
        let state = state("Hello");
        let cursor = Selection::text(state.doc(), 3, 3).unwrap();
        let state = state.update(StateUpdate::new().selection(cursor));

        let mut tr = state.tr();
        tr.insert_text(0, ">> ").unwrap();
        assert_eq!(tr.mapping().map(3, Default::default()), 6);

        let next = tr.apply().unwrap();
        assert_eq!(next.selection().from(), 6);
    }

    #[test]
    fn test_staged_selection_wins() {
        let state = state("Hello");
        let mut tr = state.tr();
        tr.insert_text(0, "x").unwrap();
        let selection = Selection::all(tr.doc()).unwrap();
        tr.set_selection(selection.clone());

        assert_eq!(tr.apply().unwrap().selection(), &selection);
    }

    #[test]
    fn test_failed_step_aborts_transaction() {
        let state = state("Hello");
        let mut tr = state.tr();
        tr.insert_text(5, "!").unwrap();
        tr.delete(40, 50);

        let err = tr.apply().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transaction failed: Range 40..50 is outside the document (size 7)"
        );
        assert_eq!(state.doc().text_content(), "Hello");
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn test_empty_transaction_keeps_state() {
        let state = state("Hello");
        let next = state.tr().apply().unwrap();
        assert_eq!(next.version(), state.version());
        assert!(next.doc().ptr_eq(state.doc()));
    }

    #[test]
    fn test_each_step_bumps_version_once_plus_final_update() {
        let state = state("Hello");
        let mut tr = state.tr();
        tr.insert_text(0, "a").unwrap();
        tr.insert_text(0, "b").unwrap();
        assert_eq!(tr.apply().unwrap().version(), 3);
    }

    #[test]
    fn test_stored_marks() {
        let state = state("Hello");
        let strong = state.schema().mark("strong", Attrs::new()).unwrap();

        let mut tr = state.tr();
        tr.add_stored_mark(&strong);
        tr.insert_text(5, "!").unwrap();
        let next = tr.apply().unwrap();

        let paragraph = next.doc().child(0).unwrap();
        assert_eq!(paragraph.child_count(), 2);
        assert!(strong.is_in_set(paragraph.child(1).unwrap().marks()));
        assert_eq!(next.stored_marks().map(MarkSet::len), Some(1));

        let mut tr = next.tr();
        tr.remove_stored_mark(strong.mark_type());
        assert!(tr.apply().unwrap().stored_marks().unwrap().is_empty());
    }

    #[test]
    fn test_mark_text_reaches_nested_text() {
        let schema = Schema::basic();
        let doc = schema
            .doc(vec![
                schema.paragraph(vec![schema.text("Hello").unwrap()]).unwrap(),
                schema.paragraph(vec![schema.text("World").unwrap()]).unwrap(),
            ])
            .unwrap();
        let state = EditorState::create(EditorStateConfig::new().schema(schema).doc(doc)).unwrap();
        let em = state.schema().mark("em", Attrs::new()).unwrap();

        // a mark step alone leaves text inside paragraphs untouched
        let mut tr = state.tr();
        tr.add_mark(0, 12, em.clone());
        assert_eq!(tr.apply().unwrap().doc(), state.doc());

        let mut tr = state.tr();
        tr.mark_text(3, 9, &em);
        assert_eq!(tr.steps().len(), 2);
        let next = tr.apply().unwrap();

        let first = next.doc().child(0).unwrap();
        assert_eq!(first.child_count(), 2);
        assert_eq!(first.child(1).unwrap().text(), Some("lo"));
        assert!(em.is_in_set(first.child(1).unwrap().marks()));

        let second = next.doc().child(1).unwrap();
        assert_eq!(second.child(0).unwrap().text(), Some("Wor"));
        assert!(em.is_in_set(second.child(0).unwrap().marks()));
        assert_eq!(next.doc().text_content(), "HelloWorld");

        let mut tr = next.tr();
        tr.unmark_text(0, 12, em.mark_type());
        assert_eq!(tr.apply().unwrap().doc(), state.doc());
    }

    #[test]
    fn test_meta() {
        let state = state("Hello");
        let mut tr = state.tr();
        assert!(tr.add_to_history());
        tr.set_meta(ADD_TO_HISTORY, false).set_meta("origin", "paste");

        assert!(!tr.add_to_history());
        assert_eq!(tr.get_meta("origin"), Some(&Value::from("paste")));
        assert_eq!(tr.get_meta("missing"), None);
    }

    #[test]
    fn test_set_doc() {
        let state = state("Hello");
        let schema = state.schema().clone();
        let replacement = schema.doc(vec![schema.paragraph(vec![]).unwrap()]).unwrap();

        let mut tr = state.tr();
        tr.set_doc(replacement.clone());
        assert!(tr.doc_changed());

        let next = tr.apply().unwrap();
        assert!(next.doc().ptr_eq(&replacement));
        assert_eq!(next.version(), 1);
    }
}
