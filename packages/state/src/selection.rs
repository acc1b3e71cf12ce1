//! # Selections
//!
//! A selection is either a text range between two positions or a single
//! non-text node. Both are expressed over [`ResolvedPos`] values and are
//! dispatched through the [`Selection`] enum.

use quire_model::{Node, ResolvedPos};
use serde::{Deserialize, Serialize};

use crate::errors::{StateError, StateResult};
use crate::mapping::{Assoc, Mapping};

/// Cursor or range between an anchor and a head
#[derive(Debug, Clone, PartialEq)]
pub struct TextSelection {
    anchor: ResolvedPos,
    head: ResolvedPos,
}

impl TextSelection {
    /// Selection from `anchor` to `head`, collapsed when no head is given
    pub fn new(anchor: ResolvedPos, head: Option<ResolvedPos>) -> Self {
        let head = head.unwrap_or_else(|| anchor.clone());
        Self { anchor, head }
    }

    /// Resolve both ends in `doc`
    pub fn create(doc: &Node, anchor: usize, head: usize) -> StateResult<Self> {
        Ok(Self::new(doc.resolve(anchor)?, Some(doc.resolve(head)?)))
    }

    pub fn anchor(&self) -> usize {
        self.anchor.pos()
    }

    pub fn head(&self) -> usize {
        self.head.pos()
    }

    pub fn from(&self) -> usize {
        self.anchor().min(self.head())
    }

    pub fn to(&self) -> usize {
        self.anchor().max(self.head())
    }

    /// Resolved lower end
    pub fn resolved_from(&self) -> &ResolvedPos {
        if self.anchor() <= self.head() {
            &self.anchor
        } else {
            &self.head
        }
    }

    pub fn empty(&self) -> bool {
        self.from() == self.to()
    }

    /// Map both ends through `mapping` into `doc` and collapse to the lesser one
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> StateResult<TextSelection> {
        let size = doc.content().size();
        let anchor = mapping.map(self.anchor(), Assoc::After).min(size);
        let head = mapping.map(self.head(), Assoc::After).min(size);
        let pos = doc.resolve(anchor.min(head))?;
        Ok(TextSelection::new(pos, None))
    }
}

/// Selection of exactly one non-text node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSelection {
    anchor: ResolvedPos,
    node: Node,
}

impl NodeSelection {
    /// Select the non-text node at `pos`
    pub fn create(doc: &Node, pos: usize) -> StateResult<Self> {
        let node = doc
            .node_at(pos)
            .filter(|node| !node.is_text())
            .cloned()
            .ok_or(StateError::NoNodeAt(pos))?;
        Ok(Self {
            anchor: doc.resolve(pos)?,
            node,
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn from(&self) -> usize {
        self.anchor.pos()
    }

    pub fn to(&self) -> usize {
        self.from() + self.node.node_size()
    }

    pub fn empty(&self) -> bool {
        false
    }

    /// Keep the node selected if a node still sits at the mapped position,
    /// otherwise fall back to a cursor there
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> StateResult<Selection> {
        let pos = mapping.map(self.from(), Assoc::After).min(doc.content().size());
        match NodeSelection::create(doc, pos) {
            Ok(selection) => Ok(Selection::Node(selection)),
            Err(_) => Ok(Selection::Text(TextSelection::new(doc.resolve(pos)?, None))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Text(TextSelection),
    Node(NodeSelection),
}

/// Serialized selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectionJson {
    Text { anchor: usize, head: usize },
    Node { anchor: usize },
}

impl Selection {
    /// Collapsed cursor at the first position of `doc`
    pub fn at_start(doc: &Node) -> StateResult<Selection> {
        Ok(Selection::Text(TextSelection::new(doc.resolve(0)?, None)))
    }

    /// Range over the whole document
    pub fn all(doc: &Node) -> StateResult<Selection> {
        Ok(Selection::Text(TextSelection::create(
            doc,
            0,
            doc.content().size(),
        )?))
    }

    pub fn text(doc: &Node, anchor: usize, head: usize) -> StateResult<Selection> {
        Ok(Selection::Text(TextSelection::create(doc, anchor, head)?))
    }

    pub fn node(doc: &Node, pos: usize) -> StateResult<Selection> {
        Ok(Selection::Node(NodeSelection::create(doc, pos)?))
    }

    pub fn from(&self) -> usize {
        match self {
            Selection::Text(selection) => selection.from(),
            Selection::Node(selection) => selection.from(),
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Selection::Text(selection) => selection.to(),
            Selection::Node(selection) => selection.to(),
        }
    }

    pub fn empty(&self) -> bool {
        match self {
            Selection::Text(selection) => selection.empty(),
            Selection::Node(selection) => selection.empty(),
        }
    }

    pub fn map(&self, doc: &Node, mapping: &Mapping) -> StateResult<Selection> {
        match self {
            Selection::Text(selection) => Ok(Selection::Text(selection.map(doc, mapping)?)),
            Selection::Node(selection) => selection.map(doc, mapping),
        }
    }

    pub fn to_json(&self) -> SelectionJson {
        match self {
            Selection::Text(selection) => SelectionJson::Text {
                anchor: selection.anchor(),
                head: selection.head(),
            },
            Selection::Node(selection) => SelectionJson::Node {
                anchor: selection.from(),
            },
        }
    }

    pub fn from_json(doc: &Node, json: &SelectionJson) -> StateResult<Selection> {
        match json {
            SelectionJson::Text { anchor, head } => Selection::text(doc, *anchor, *head),
            SelectionJson::Node { anchor } => Selection::node(doc, *anchor),
        }
    }
}

impl From<TextSelection> for Selection {
    fn from(selection: TextSelection) -> Self {
        Selection::Text(selection)
    }
}

impl From<NodeSelection> for Selection {
    fn from(selection: NodeSelection) -> Self {
        Selection::Node(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StepMap;
    use quire_model::{Attrs, Schema};
    use serde_json::json;

    fn doc(schema: &Schema) -> Node {
        schema
            .doc(vec![schema.paragraph(vec![schema.text("Hello").unwrap()]).unwrap()])
            .unwrap()
    }

    #[test]
    fn test_text_selection_range() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let selection = TextSelection::create(&doc, 4, 1).unwrap();
        assert_eq!(selection.from(), 1);
        assert_eq!(selection.to(), 4);
        assert!(!selection.empty());
        assert_eq!(selection.resolved_from().pos(), 1);

        assert!(TextSelection::create(&doc, 2, 2).unwrap().empty());
    }

    #[test]
    fn test_text_selection_map_collapses_to_lesser_end() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let selection = TextSelection::create(&doc, 1, 4).unwrap();

        let mapping = Mapping::from(StepMap::replace(0, 0, 1));
        let bang = quire_model::Fragment::from_node(schema.text("!").unwrap());
        let edited = doc.replace(0, 0, &bang);
        let mapped = selection.map(&edited, &mapping).unwrap();

        assert!(mapped.empty());
        assert_eq!(mapped.from(), 2);
    }

    #[test]
    fn test_text_selection_map_clamps_to_document() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let selection = TextSelection::create(&doc, 5, 5).unwrap();

        let shorter = schema
            .doc(vec![schema.paragraph(vec![schema.text("Hi").unwrap()]).unwrap()])
            .unwrap();
        let mapped = selection.map(&shorter, &Mapping::new()).unwrap();
        assert_eq!(mapped.from(), 3);
    }

    #[test]
    fn test_node_selection() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let selection = NodeSelection::create(&doc, 0).unwrap();
        assert_eq!(selection.node().node_type().name(), "paragraph");
        assert_eq!(selection.from(), 0);
        assert_eq!(selection.to(), 6);
        assert!(!selection.empty());
    }

    #[test]
    fn test_node_selection_requires_a_node() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        assert_eq!(
            NodeSelection::create(&doc, 6).unwrap_err().to_string(),
            "No node at position 6"
        );
        // text is not selectable as a node
        assert_eq!(
            NodeSelection::create(&doc, 2).unwrap_err(),
            StateError::NoNodeAt(2)
        );
    }

    #[test]
    fn test_node_selection_of_inline_atom() {
        let schema = Schema::basic();
        let mut attrs = Attrs::new();
        attrs.insert("src".to_string(), json!("cat.png"));
        let doc = schema
            .doc(vec![schema
                .paragraph(vec![
                    schema.text("ab").unwrap(),
                    schema.node("image", attrs, vec![]).unwrap(),
                ])
                .unwrap()])
            .unwrap();

        let selection = Selection::node(&doc, 2).unwrap();
        assert_eq!(selection.from(), 2);
        assert_eq!(selection.to(), 3);
    }

    #[test]
    fn test_node_selection_map_falls_back_to_cursor() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let selection = NodeSelection::create(&doc, 0).unwrap();

        let kept = selection.map(&doc, &Mapping::new()).unwrap();
        assert!(matches!(kept, Selection::Node(_)));

        let emptied = schema.doc(vec![]).unwrap();
        let mapped = selection
            .map(&emptied, &Mapping::from(StepMap::replace(0, 6, 0)))
            .unwrap();
        assert!(matches!(mapped, Selection::Text(_)));
        assert_eq!(mapped.from(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        for selection in [
            Selection::text(&doc, 1, 3).unwrap(),
            Selection::node(&doc, 0).unwrap(),
        ] {
            let json = serde_json::to_value(selection.to_json()).unwrap();
            let parsed: SelectionJson = serde_json::from_value(json).unwrap();
            assert_eq!(Selection::from_json(&doc, &parsed).unwrap(), selection);
        }

        assert_eq!(
            serde_json::to_value(Selection::text(&doc, 1, 3).unwrap().to_json()).unwrap(),
            json!({ "type": "text", "anchor": 1, "head": 3 })
        );
    }

    #[test]
    fn test_all_spans_document() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let all = Selection::all(&doc).unwrap();
        assert_eq!((all.from(), all.to()), (0, 6));
    }
}
