//! # Steps
//!
//! Atomic, typed document changes. A step either produces the next state or
//! fails with a reason; it never leaves a partial result behind.
//!
//! ## Step semantics
//!
//! ### AddMark / RemoveMark
//! - Range must lie inside the document
//! - Only text nodes carry marks. A mark step over a range that holds no text
//!   directly at its level leaves the document unchanged
//!
//! ### Replace
//! - Range must lie inside the document
//! - Every top-level node of the inserted content must be allowed by the
//!   container that holds the whole range
//! - Inserted content goes in as is; open slice boundaries are not rebuilt

use quire_model::{Mark, MarkType, ModelError, Node, Schema, Slice};
use thiserror::Error;
use tracing::debug;

use crate::mapping::StepMap;
use crate::state::{EditorState, StateUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Add a mark to the text in `from..to`
    AddMark { from: usize, to: usize, mark: Mark },

    /// Remove marks of a type from the text in `from..to`
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkType,
    },

    /// Replace `from..to` with the slice's content
    Replace { from: usize, to: usize, slice: Slice },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Range {from}..{to} is outside the document (size {size})")]
    OutOfRange { from: usize, to: usize, size: usize },

    #[error("{child} is not allowed in {parent}")]
    NotAllowed { parent: String, child: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type StepResult<T> = Result<T, StepError>;

impl Step {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Step::AddMark { .. } => "addMark",
            Step::RemoveMark { .. } => "removeMark",
            Step::Replace { .. } => "replace",
        }
    }

    pub fn from(&self) -> usize {
        match self {
            Step::AddMark { from, .. }
            | Step::RemoveMark { from, .. }
            | Step::Replace { from, .. } => *from,
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Step::AddMark { to, .. } | Step::RemoveMark { to, .. } | Step::Replace { to, .. } => {
                *to
            }
        }
    }

    /// Apply the step to a state, producing the next state
    pub fn apply(&self, state: &EditorState) -> StepResult<EditorState> {
        let doc = self.apply_to_doc(state.doc(), state.schema())?;
        debug!(
            step = self.name(),
            from = self.from(),
            to = self.to(),
            version = state.version(),
            "applied step"
        );
        Ok(state.update(StateUpdate::new().doc(doc)))
    }

    /// Apply the step to a bare document
    pub fn apply_to_doc(&self, doc: &Node, schema: &Schema) -> StepResult<Node> {
        self.validate(doc, schema)?;

        match self {
            Step::AddMark { from, to, mark } => Ok(doc.add_mark(*from, *to, mark)),
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => Ok(doc.remove_mark(*from, *to, mark_type)),
            Step::Replace { from, to, slice } => Ok(doc.replace(*from, *to, &slice.content)),
        }
    }

    /// Check that the step can be applied to `doc`
    pub fn validate(&self, doc: &Node, schema: &Schema) -> StepResult<()> {
        let (from, to) = (self.from(), self.to());
        let size = doc.content().size();
        if from > to || to > size {
            return Err(StepError::OutOfRange { from, to, size });
        }

        if let Step::Replace { slice, .. } = self {
            let start = doc.resolve(from)?;
            let parent = start
                .node(start.shared_depth(to))
                .unwrap_or_else(|| doc.clone());
            for child in slice.content.iter() {
                if !schema.allows_node_type(parent.node_type(), child.node_type()) {
                    return Err(StepError::NotAllowed {
                        parent: parent.node_type().name().to_string(),
                        child: child.node_type().name().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Position map of this step, given the documents before and after it.
    ///
    /// Mark steps never move positions. A replace maps `from..to` onto the
    /// range its result occupies.
    pub fn get_map(&self, before: &Node, after: &Node) -> StepMap {
        match self {
            Step::AddMark { .. } | Step::RemoveMark { .. } => StepMap::empty(),
            Step::Replace { from, to, .. } => {
                let old_size = to - from;
                let new_size = (old_size + after.content().size())
                    .saturating_sub(before.content().size());
                StepMap::replace(*from, old_size, new_size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Attrs, Fragment};

    fn setup() -> (Schema, Node) {
        let schema = Schema::basic();
        let doc = schema
            .doc(vec![
                schema.paragraph(vec![schema.text("Hello").unwrap()]).unwrap(),
                schema.paragraph(vec![schema.text("World").unwrap()]).unwrap(),
            ])
            .unwrap();
        (schema, doc)
    }

    #[test]
    fn test_replace_inside_paragraph() {
        let (schema, doc) = setup();
        let step = Step::Replace {
            from: 5,
            to: 5,
            slice: Slice::from(schema.text("!").unwrap()),
        };

        let after = step.apply_to_doc(&doc, &schema).unwrap();
        assert_eq!(after.text_content(), "Hello!World");
        assert_eq!(step.get_map(&doc, &after), StepMap::replace(5, 0, 1));
    }

    #[test]
    fn test_replace_out_of_range() {
        let (schema, doc) = setup();
        let step = Step::Replace {
            from: 10,
            to: 20,
            slice: Slice::empty(),
        };
        assert_eq!(
            step.apply_to_doc(&doc, &schema).unwrap_err().to_string(),
            "Range 10..20 is outside the document (size 12)"
        );
    }

    #[test]
    fn test_replace_rejects_disallowed_content() {
        let (schema, doc) = setup();
        let step = Step::Replace {
            from: 2,
            to: 2,
            slice: Slice::from(schema.paragraph(vec![]).unwrap()),
        };
        assert_eq!(
            step.apply_to_doc(&doc, &schema).unwrap_err(),
            StepError::NotAllowed {
                parent: "paragraph".to_string(),
                child: "paragraph".to_string(),
            }
        );
    }

    #[test]
    fn test_cross_paragraph_delete_maps_exactly() {
        let (schema, doc) = setup();
        let step = Step::Replace {
            from: 3,
            to: 8,
            slice: Slice::from(Fragment::empty()),
        };

        let after = step.apply_to_doc(&doc, &schema).unwrap();
        assert_eq!(after.text_content(), "Helrld");

        // "l" of "World" sat at 9 and now sits right after "r"
        let map = step.get_map(&doc, &after);
        assert_eq!(map.map(9, Default::default()), 5);
        assert_eq!(after.node_at(5).unwrap().text(), Some("rld"));
    }

    #[test]
    fn test_add_mark_step_leaves_containers_alone() {
        let (schema, doc) = setup();
        let strong = schema.mark("strong", Attrs::new()).unwrap();
        let step = Step::AddMark {
            from: 0,
            to: 5,
            mark: strong,
        };

        let after = step.apply_to_doc(&doc, &schema).unwrap();
        assert!(after.ptr_eq(&doc));
        assert_eq!(step.get_map(&doc, &after), StepMap::empty());
    }
}
