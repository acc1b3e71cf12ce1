//! # Plugins
//!
//! Plugins hook into transaction application.
//!
//! ## Design
//!
//! - `filter_transaction` can veto a transaction before it is applied
//! - `append_transaction` can follow an applied transaction with one more,
//!   built against the new state. Appended transactions get a single pass;
//!   they do not trigger further appends

use crate::state::EditorState;
use crate::transaction::Transaction;

pub trait Plugin: Send + Sync {
    /// Unique name of the plugin
    fn key(&self) -> &str;

    /// Return `false` to reject `tr`
    fn filter_transaction(&self, _tr: &Transaction, _state: &EditorState) -> bool {
        true
    }

    /// Transaction to apply after `trs` turned `old_state` into `new_state`
    fn append_transaction(
        &self,
        _trs: &[Transaction],
        _old_state: &EditorState,
        _new_state: &EditorState,
    ) -> Option<Transaction> {
        None
    }
}

/// Rejects every transaction that changes the document.
///
/// Selection and stored mark changes still go through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnly;

impl Plugin for ReadOnly {
    fn key(&self) -> &str {
        "readOnly"
    }

    fn filter_transaction(&self, tr: &Transaction, _state: &EditorState) -> bool {
        !tr.doc_changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::state::EditorStateConfig;
    use quire_model::{Node, Schema};

    fn doc(schema: &Schema, text: &str) -> Node {
        schema
            .doc(vec![schema.paragraph(vec![schema.text(text).unwrap()]).unwrap()])
            .unwrap()
    }

    /// Keeps the document from ever exceeding a number of characters
    struct MaxLength(usize);

    impl Plugin for MaxLength {
        fn key(&self) -> &str {
            "maxLength"
        }

        fn append_transaction(
            &self,
            _trs: &[Transaction],
            _old_state: &EditorState,
            new_state: &EditorState,
        ) -> Option<Transaction> {
            let length = new_state.doc().text_content().chars().count();
            if length <= self.0 {
                return None;
            }
            let mut tr = new_state.tr();
            // single paragraph: text positions equal character offsets
            tr.delete(self.0, length);
            Some(tr)
        }
    }

    #[test]
    fn test_read_only_blocks_edits() {
        let schema = Schema::basic();
        let state = EditorState::create(
            EditorStateConfig::new()
                .doc(doc(&schema, "Hello"))
                .schema(schema)
                .plugin(ReadOnly),
        )
        .unwrap();

        let mut tr = state.tr();
        tr.insert_text(0, "x").unwrap();
        let next = state.apply(&tr).unwrap();
        assert_eq!(next.doc().text_content(), "Hello");
        assert_eq!(next.version(), state.version());

        let mut tr = state.tr();
        tr.set_selection(Selection::all(state.doc()).unwrap());
        let next = state.apply(&tr).unwrap();
        assert_eq!(next.selection().to(), 6);
    }

    #[test]
    fn test_append_transaction() {
        let schema = Schema::basic();
        let state = EditorState::create(
            EditorStateConfig::new()
                .doc(doc(&schema, "Hello"))
                .schema(schema)
                .plugin(MaxLength(6)),
        )
        .unwrap();

        let mut tr = state.tr();
        tr.insert_text(5, " World").unwrap();
        let next = state.apply(&tr).unwrap();
        assert_eq!(next.doc().text_content(), "Hello ");
        assert!(next.plugin("maxLength").is_some());
    }
}
