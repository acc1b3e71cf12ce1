//! # Nodes
//!
//! Immutable tree elements. A node is a cheap handle; cloning it shares the
//! whole subtree. Edits build new nodes along the path to the root and reuse
//! everything else.
//!
//! ## Sizes
//!
//! - text node: one position per character
//! - any other node: `1 + content.size`, the extra unit being its close boundary
//!
//! ## Known limitations
//!
//! - [`Node::add_mark`] and [`Node::remove_mark`] only change text nodes. Called
//!   on a container they return the container untouched; marks are not pushed
//!   down into descendants.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::fragment::Fragment;
use crate::json::{NodeJson, TEXT_ATTR};
use crate::mark::{Mark, MarkSet};
use crate::resolved_pos::ResolvedPos;
use crate::schema::{Attrs, MarkType, NodeType, Schema};
use crate::slice::Slice;
use crate::visitor::{walk_node, Visitor};
use crate::{ModelError, ModelResult};

struct NodeData {
    node_type: NodeType,
    attrs: Attrs,
    content: Fragment,
    marks: MarkSet,
    text: Option<String>,
    size: usize,
}

#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn new(
        node_type: NodeType,
        attrs: Attrs,
        content: Fragment,
        marks: MarkSet,
    ) -> Self {
        let size = 1 + content.size();
        Self(Arc::new(NodeData {
            node_type,
            attrs,
            content,
            marks,
            text: None,
            size,
        }))
    }

    pub(crate) fn new_text(node_type: NodeType, text: String, marks: MarkSet) -> Self {
        let size = text.chars().count();
        Self(Arc::new(NodeData {
            node_type,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            marks,
            text: Some(text),
            size,
        }))
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &MarkSet {
        &self.0.marks
    }

    /// The text of a text node, `None` for anything else
    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn node_size(&self) -> usize {
        self.0.size
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.content.child_count() == 0
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> ModelResult<&Node> {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    /// True if both handles point at the same node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => self.0.content.text_content(),
        }
    }

    /// Same text node type and mark set
    pub(crate) fn same_markup_text(&self, other: &Node) -> bool {
        self.is_text()
            && other.is_text()
            && self.node_type() == other.node_type()
            && self.marks() == other.marks()
    }

    /// Text node with the same type and marks but different text
    pub fn with_text(&self, text: impl Into<String>) -> Node {
        Node::new_text(self.0.node_type.clone(), text.into(), self.0.marks.clone())
    }

    /// Node with the same type, attrs and marks but different content
    pub fn with_content(&self, content: Fragment) -> Node {
        if content.ptr_eq(&self.0.content) {
            return self.clone();
        }
        Node::new(
            self.0.node_type.clone(),
            self.0.attrs.clone(),
            content,
            self.0.marks.clone(),
        )
    }

    /// Node with a different mark set
    pub fn mark(&self, marks: MarkSet) -> Node {
        if marks.ptr_eq(&self.0.marks) {
            return self.clone();
        }
        Self(Arc::new(NodeData {
            node_type: self.0.node_type.clone(),
            attrs: self.0.attrs.clone(),
            content: self.0.content.clone(),
            marks,
            text: self.0.text.clone(),
            size: self.0.size,
        }))
    }

    /// Replace `from..to` with `fragment`.
    ///
    /// A text node splices in the fragment's text. Other nodes replace inside
    /// their content.
    pub fn replace(&self, from: usize, to: usize, fragment: &Fragment) -> Node {
        match &self.0.text {
            Some(text) => {
                let len = self.0.size;
                let (from, to) = (from.min(len), to.min(len).max(from.min(len)));
                let spliced = format!(
                    "{}{}{}",
                    char_slice(text, 0, from),
                    fragment.text_content(),
                    char_slice(text, to, len)
                );
                self.with_text(spliced)
            }
            None => self.with_content(self.0.content.replace(from, to, fragment)),
        }
    }

    /// The part of this node between `from` and `to`.
    ///
    /// Text nodes are sliced and yield `None` when nothing is left. Other nodes
    /// return themselves for a full range and cut into their content otherwise.
    pub fn cut(&self, from: usize, to: usize) -> Option<Node> {
        match &self.0.text {
            Some(text) => {
                let len = self.0.size;
                let to = to.min(len);
                if from >= to {
                    return None;
                }
                if from == 0 && to == len {
                    return Some(self.clone());
                }
                Some(self.with_text(char_slice(text, from, to)))
            }
            None => {
                if from == 0 && to >= self.0.size {
                    return Some(self.clone());
                }
                let inner = self.0.content.size();
                Some(self.with_content(self.0.content.cut(from.min(inner), to.min(inner))))
            }
        }
    }

    /// The node at `pos`, relative to the start of this node's content.
    ///
    /// A child starting exactly at `pos` is returned as is. Otherwise the
    /// search descends into the child covering `pos`; text nodes answer for
    /// every position inside them.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        if self.is_text() {
            return (pos <= self.0.size).then_some(self);
        }
        if let Some((child, _)) = self.0.content.child_starting_at(pos) {
            return Some(child);
        }
        let (child, offset) = self.0.content.find_child_at(pos)?;
        child.node_at(pos - offset)
    }

    /// Add `mark` to this node if it is text overlapping `from..to`
    pub fn add_mark(&self, from: usize, to: usize, mark: &Mark) -> Node {
        if !self.is_text() || !self.overlaps(from, to) {
            return self.clone();
        }
        self.mark(mark.add_to_set(&self.0.marks))
    }

    /// Remove marks of `mark_type` from this node if it is text overlapping `from..to`
    pub fn remove_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> Node {
        if !self.is_text() || !self.overlaps(from, to) {
            return self.clone();
        }
        self.mark(self.0.marks.without_type(mark_type))
    }

    fn overlaps(&self, from: usize, to: usize) -> bool {
        from <= to && from < self.0.size && to > 0
    }

    /// Concatenate two nodes of the same type
    pub fn join(&self, other: &Node) -> ModelResult<Node> {
        if self.node_type() != other.node_type() {
            return Err(ModelError::CannotJoin);
        }
        match (&self.0.text, &other.0.text) {
            (Some(a), Some(b)) => Ok(self.with_text(format!("{a}{b}"))),
            (None, None) => Ok(self.with_content(self.0.content.append_fragment(&other.0.content))),
            _ => Err(ModelError::CannotJoin),
        }
    }

    /// Resolve a position inside this node
    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// Content between two positions, with the depth of each open boundary
    pub fn slice(&self, from: usize, to: usize) -> ModelResult<Slice> {
        let start = self.resolve(from)?;
        let end = self.resolve(to)?;
        if from >= to {
            return Ok(Slice::empty());
        }
        Ok(Slice::new(
            self.0.content.cut(from, to),
            start.depth(),
            end.depth(),
        ))
    }

    /// Call `f` for every descendant overlapping `from..to`, with its start
    /// position. Returning `false` skips the node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut visitor = NodesBetween { from, to, f };
        walk_node(&mut visitor, self, 0);
    }

    /// Call `f` for every descendant
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.nodes_between(0, self.0.content.size(), f)
    }

    /// Whether any node in `from..to` carries a mark of `mark_type`
    pub fn range_has_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> bool {
        let mut found = false;
        self.nodes_between(from, to, |node, _| {
            if mark_type.is_in_set(node.marks()).is_some() {
                found = true;
            }
            !found
        });
        found
    }

    pub fn to_json(&self) -> NodeJson {
        let mut attrs = self.0.attrs.clone();
        if let Some(text) = &self.0.text {
            attrs.insert(TEXT_ATTR.to_string(), Value::String(text.clone()));
        }
        NodeJson {
            node_type: self.0.node_type.name().to_string(),
            attrs,
            content: self.0.content.iter().map(Node::to_json).collect(),
            marks: self.0.marks.to_json(),
        }
    }

    pub fn from_json(schema: &Schema, json: &NodeJson) -> ModelResult<Node> {
        let node_type = schema.node_type(&json.node_type)?;
        let marks = MarkSet::from_json(schema, &json.marks)?;

        if node_type.is_text() {
            let text = json
                .attrs
                .get(TEXT_ATTR)
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::invalid_json("text node without attrs.text"))?;
            return Ok(Node::new_text(node_type.clone(), text.to_string(), marks));
        }

        let content = json
            .content
            .iter()
            .map(|child| Node::from_json(schema, child))
            .collect::<ModelResult<Vec<_>>>()?;
        node_type.create(json.attrs.clone(), Fragment::from(content), marks)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.to_json()).unwrap_or(Value::Null)
    }

    pub fn from_value(schema: &Schema, value: &Value) -> ModelResult<Node> {
        let json: NodeJson = serde_json::from_value(value.clone())?;
        Node::from_json(schema, &json)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.node_type == other.0.node_type
                && self.0.text == other.0.text
                && self.0.attrs == other.0.attrs
                && self.0.content == other.0.content
                && self.0.marks == other.0.marks)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = match &self.0.text {
            Some(text) => format!("{text:?}"),
            None if self.is_leaf() => self.0.node_type.name().to_string(),
            None => {
                let children: Vec<String> =
                    self.0.content.iter().map(|child| format!("{child:?}")).collect();
                format!("{}({})", self.0.node_type.name(), children.join(", "))
            }
        };
        for mark in self.0.marks.iter().rev() {
            body = format!("{}({body})", mark.mark_type().name());
        }
        f.write_str(&body)
    }
}

struct NodesBetween<F> {
    from: usize,
    to: usize,
    f: F,
}

impl<F> NodesBetween<F>
where
    F: FnMut(&Node, usize) -> bool,
{
    fn hits(&self, start: usize, end: usize) -> bool {
        if self.from == self.to {
            start <= self.from && self.from < end
        } else {
            start < self.to && end > self.from
        }
    }
}

impl<F> Visitor for NodesBetween<F>
where
    F: FnMut(&Node, usize) -> bool,
{
    fn visit_node(&mut self, node: &Node, pos: usize) {
        if self.hits(pos, pos + node.node_size()) && (self.f)(node, pos) {
            walk_node(self, node, pos);
        }
    }

    fn visit_text(&mut self, text: &Node, pos: usize) {
        if self.hits(pos, pos + text.node_size()) {
            (self.f)(text, pos);
        }
    }
}

/// Slice of `text` between two character offsets
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let start = byte_offset(text, from);
    let end = byte_offset(text, to).max(start);
    &text[start..end]
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::basic()
    }

    fn doc(schema: &Schema, paragraphs: &[&str]) -> Node {
        schema
            .doc(
                paragraphs
                    .iter()
                    .map(|text| schema.paragraph(vec![schema.text(*text).unwrap()]).unwrap())
                    .collect(),
            )
            .unwrap()
    }

    #[test]
    fn test_sizes() {
        let schema = schema();
        let text = schema.text("Hello").unwrap();
        assert_eq!(text.node_size(), 5);

        let paragraph = schema.paragraph(vec![text]).unwrap();
        assert_eq!(paragraph.node_size(), 1 + paragraph.content().size());
        assert_eq!(paragraph.node_size(), 6);

        let empty = schema.paragraph(vec![]).unwrap();
        assert_eq!(empty.node_size(), 1);
        assert!(empty.is_leaf());
    }

    #[test]
    fn test_text_size_counts_characters() {
        let schema = schema();
        let text = schema.text("héllo ✓").unwrap();
        assert_eq!(text.node_size(), 7);
        assert_eq!(text.cut(1, 5).unwrap().text(), Some("éllo"));
    }

    #[test]
    fn test_text_content_concatenates() {
        let schema = schema();
        let doc = doc(&schema, &["Hello", "World"]);
        assert_eq!(doc.text_content(), "HelloWorld");
    }

    #[test]
    fn test_text_replace_splices() {
        let schema = schema();
        let text = schema.text("Hello World").unwrap();
        let goodbye = Fragment::from_node(schema.text("Goodbye").unwrap());
        assert_eq!(text.replace(0, 5, &goodbye).text(), Some("Goodbye World"));
    }

    #[test]
    fn test_cut_text_to_nothing() {
        let schema = schema();
        let text = schema.text("abc").unwrap();
        assert!(text.cut(2, 2).is_none());
        assert!(text.cut(0, 3).unwrap().ptr_eq(&text));
    }

    #[test]
    fn test_partial_cut_of_container_recurses() {
        let schema = schema();
        let paragraph = schema.paragraph(vec![schema.text("Hello").unwrap()]).unwrap();

        assert!(paragraph.cut(0, 6).unwrap().ptr_eq(&paragraph));
        let cut = paragraph.cut(1, 4).unwrap();
        assert_eq!(cut.node_type().name(), "paragraph");
        assert_eq!(cut.text_content(), "ell");
    }

    #[test]
    fn test_node_at() {
        let schema = schema();
        let doc = doc(&schema, &["Hello", "World"]);

        assert_eq!(doc.node_at(0).unwrap().node_type().name(), "paragraph");
        assert_eq!(doc.node_at(6).unwrap().text_content(), "World");
        assert!(doc.node_at(2).unwrap().is_text());
        assert!(doc.node_at(12).is_none());
    }

    #[test]
    fn test_join_text() {
        let schema = schema();
        let foo = schema.text("foo").unwrap();
        let bar = schema.text("bar").unwrap();
        assert_eq!(foo.join(&bar).unwrap().text_content(), "foobar");
    }

    #[test]
    fn test_join_containers() {
        let schema = schema();
        let a = schema.paragraph(vec![schema.text("a").unwrap()]).unwrap();
        let b = schema.paragraph(vec![schema.text("b").unwrap()]).unwrap();
        let joined = a.join(&b).unwrap();
        assert_eq!(joined.child_count(), 1);
        assert_eq!(joined.text_content(), "ab");
    }

    #[test]
    fn test_join_incompatible() {
        let schema = schema();
        let text = schema.text("foo").unwrap();
        let paragraph = schema.paragraph(vec![]).unwrap();
        assert_eq!(
            text.join(&paragraph).unwrap_err().to_string(),
            "Cannot join incompatible nodes"
        );
    }

    #[test]
    fn test_add_mark_on_text() {
        let schema = schema();
        let strong = schema.mark("strong", Attrs::new()).unwrap();
        let text = schema.text("bold").unwrap();

        let marked = text.add_mark(0, 4, &strong);
        assert!(strong.is_in_set(marked.marks()));
        assert!(marked.remove_mark(0, 4, strong.mark_type()).marks().is_empty());
    }

    #[test]
    fn test_add_mark_on_container_is_a_no_op() {
        let schema = schema();
        let strong = schema.mark("strong", Attrs::new()).unwrap();
        let doc = doc(&schema, &["Hello"]);

        let result = doc.add_mark(0, 5, &strong);
        assert!(result.ptr_eq(&doc));
        assert!(!doc.range_has_mark(0, 5, strong.mark_type()));
    }

    #[test]
    fn test_equality_is_structural() {
        let schema = schema();
        assert_eq!(doc(&schema, &["a", "b"]), doc(&schema, &["a", "b"]));
        assert_ne!(doc(&schema, &["a", "b"]), doc(&schema, &["a", "c"]));
    }

    #[test]
    fn test_json_round_trip() {
        let schema = schema();
        let em = schema.mark("em", Attrs::new()).unwrap();
        let mut level = Attrs::new();
        level.insert("level".to_string(), Value::from(2));
        let doc = schema
            .doc(vec![
                schema
                    .node("heading", level, vec![schema.text("Title").unwrap()])
                    .unwrap(),
                schema
                    .paragraph(vec![
                        schema.text("plain ").unwrap(),
                        schema.text_with_marks("stressed", MarkSet::from(vec![em])).unwrap(),
                    ])
                    .unwrap(),
            ])
            .unwrap();

        let restored = Node::from_value(&schema, &doc.to_value()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_from_json_unknown_type() {
        let schema = schema();
        let err = Node::from_value(&schema, &serde_json::json!({ "type": "table" })).unwrap_err();
        assert_eq!(err.to_string(), "Unknown node type: table");
    }

    #[test]
    fn test_nodes_between() {
        let schema = schema();
        let doc = doc(&schema, &["Hello", "World"]);
        let mut seen = Vec::new();
        doc.nodes_between(7, 9, |node, pos| {
            seen.push((node.node_type().name().to_string(), pos));
            true
        });
        assert_eq!(
            seen,
            vec![("paragraph".to_string(), 6), ("text".to_string(), 6)]
        );
    }

    #[test]
    fn test_slice_records_open_depths() {
        let schema = schema();
        let doc = doc(&schema, &["Hello", "World"]);
        let slice = doc.slice(2, 9).unwrap();
        assert_eq!(slice.open_start, 1);
        assert_eq!(slice.open_end, 1);
        assert_eq!(slice.content.text_content(), "lloWor");
        assert_eq!(slice.size(), 7);

        let first = doc.slice(0, 5).unwrap();
        assert_eq!(first.size(), 5);
        assert!(first
            .content
            .child(0)
            .unwrap()
            .ptr_eq(doc.child(0).unwrap()));
    }
}
