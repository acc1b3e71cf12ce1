//! # Resolved positions
//!
//! A linear offset resolved against a document into a depth and an offset
//! inside its innermost container.
//!
//! Only `pos`, `depth` and `parent_offset` are stored. Ancestors, indices and
//! start offsets are recomputed from the root on every query, so each call
//! costs O(depth).

use tracing::warn;

use crate::mark::MarkSet;
use crate::node::Node;
use crate::{ModelError, ModelResult};

/// Descent is cut off past this depth
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pos: usize,
    depth: usize,
    parent_offset: usize,
    doc: Node,
}

/// One level of the root-to-position path
struct Level {
    node: Node,
    /// Absolute position where the node's content starts
    start: usize,
}

impl ResolvedPos {
    /// Resolve `pos` in `doc`, failing when it lies outside `0..=doc.content.size`
    pub fn resolve(doc: &Node, pos: usize) -> ModelResult<ResolvedPos> {
        if pos > doc.content().size() {
            return Err(ModelError::PositionOutOfRange(pos));
        }
        let path = path(doc, pos);
        let depth = path.len() - 1;
        let parent_offset = pos - path[depth].start;
        Ok(ResolvedPos {
            pos,
            depth,
            parent_offset,
            doc: doc.clone(),
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of containers entered below the document
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Offset of the position inside its innermost container
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    fn path(&self) -> Vec<Level> {
        path(&self.doc, self.pos)
    }

    /// Ancestor at `depth` (0 is the document)
    pub fn node(&self, depth: usize) -> Option<Node> {
        self.path().into_iter().nth(depth).map(|level| level.node)
    }

    /// Innermost container holding the position
    pub fn parent(&self) -> Node {
        self.node(self.depth).unwrap_or_else(|| self.doc.clone())
    }

    /// Absolute position where the content of the ancestor at `depth` starts
    pub fn start(&self, depth: usize) -> usize {
        self.path().get(depth).map_or(0, |level| level.start)
    }

    /// Absolute position where the content of the ancestor at `depth` ends
    pub fn end(&self, depth: usize) -> usize {
        self.path()
            .get(depth)
            .map_or(0, |level| level.start + level.node.content().size())
    }

    /// Index of the child of the ancestor at `depth` the position sits in or
    /// before. Equals the child count at the end of the content.
    pub fn index(&self, depth: usize) -> usize {
        let path = self.path();
        let Some(level) = path.get(depth) else {
            return 0;
        };
        let rel = self.pos - level.start;
        let index = level
            .node
            .content()
            .iter_offsets()
            .position(|(child, offset)| {
                if child.is_text() || child.node_type().is_atom() {
                    offset + child.node_size() > rel
                } else {
                    offset + child.content().size() >= rel
                }
            })
            .unwrap_or_else(|| level.node.child_count());
        index
    }

    /// Deepest depth whose container holds both this position and `other`
    pub fn shared_depth(&self, other: usize) -> usize {
        let other = other.min(self.doc.content().size());
        self.path()
            .iter()
            .zip(path(&self.doc, other).iter())
            .take_while(|(ours, theirs)| ours.start == theirs.start)
            .count()
            .saturating_sub(1)
    }

    pub fn is_at_start(&self) -> bool {
        self.parent_offset == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.parent_offset == self.parent().content().size()
    }

    /// Node directly after the position. Inside a text node this is the rest
    /// of the text.
    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let rel = self.parent_offset;
        let found = parent
            .content()
            .iter_offsets()
            .find_map(|(child, offset)| {
                let end = offset + child.node_size();
                if offset == rel {
                    Some(child.clone())
                } else if child.is_text() && offset < rel && rel < end {
                    child.cut(rel - offset, end - offset)
                } else {
                    None
                }
            });
        found
    }

    /// Node directly before the position. Inside a text node this is the
    /// text up to the position.
    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let rel = self.parent_offset;
        let found = parent
            .content()
            .iter_offsets()
            .find_map(|(child, offset)| {
                let end = offset + child.node_size();
                if end == rel {
                    Some(child.clone())
                } else if child.is_text() && offset < rel && rel < end {
                    child.cut(0, rel - offset)
                } else {
                    None
                }
            });
        found
    }

    /// Marks of the text the position touches, preferring the text before it
    pub fn marks(&self) -> MarkSet {
        let touching = if self.parent_offset == 0 {
            self.node_after()
        } else {
            self.node_before()
                .filter(Node::is_text)
                .or_else(|| self.node_after())
        };
        touching
            .filter(Node::is_text)
            .map(|node| node.marks().clone())
            .unwrap_or_default()
    }
}

impl PartialEq for ResolvedPos {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.doc == other.doc
    }
}

/// Containers from the root down to the one holding `pos`
fn path(doc: &Node, pos: usize) -> Vec<Level> {
    let mut levels = vec![Level {
        node: doc.clone(),
        start: 0,
    }];

    loop {
        let Some(level) = levels.last() else {
            break;
        };
        if levels.len() > MAX_DEPTH {
            warn!(pos, depth = MAX_DEPTH, "position resolution exceeded max depth");
            break;
        }
        let rel = pos - level.start;
        let inner = level
            .node
            .content()
            .iter_offsets()
            .find(|(child, offset)| {
                !child.is_text()
                    && !child.node_type().is_atom()
                    && *offset <= rel
                    && rel <= offset + child.content().size()
            })
            .map(|(child, offset)| Level {
                node: child.clone(),
                start: level.start + offset,
            });
        match inner {
            Some(next) => levels.push(next),
            None => break,
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attrs, Schema};

    fn doc(schema: &Schema) -> Node {
        let strong = schema.mark("strong", Attrs::new()).unwrap();
        schema
            .doc(vec![
                schema
                    .paragraph(vec![
                        schema.text("He").unwrap(),
                        schema
                            .text_with_marks("llo", MarkSet::from(vec![strong]))
                            .unwrap(),
                    ])
                    .unwrap(),
                schema
                    .node("blockquote", Attrs::new(), vec![schema
                        .paragraph(vec![schema.text("World").unwrap()])
                        .unwrap()])
                    .unwrap(),
            ])
            .unwrap()
    }

    #[test]
    fn test_bounds() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let size = doc.content().size();

        assert!(ResolvedPos::resolve(&doc, 0).is_ok());
        assert!(ResolvedPos::resolve(&doc, size).is_ok());
        assert_eq!(
            ResolvedPos::resolve(&doc, size + 1).unwrap_err().to_string(),
            format!("Position {} out of range", size + 1)
        );
    }

    #[test]
    fn test_depth_and_parent() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let inside = doc.resolve(3).unwrap();
        assert_eq!(inside.depth(), 1);
        assert_eq!(inside.parent_offset(), 3);
        assert_eq!(inside.parent().node_type().name(), "paragraph");
        assert_eq!(inside.node(0).unwrap(), doc);

        // paragraph is 6 wide, the blockquote's paragraph content starts at 6
        let nested = doc.resolve(8).unwrap();
        assert_eq!(nested.depth(), 2);
        assert_eq!(nested.parent_offset(), 2);
        assert_eq!(nested.start(2), 6);
        assert_eq!(nested.end(2), 11);
        assert_eq!(nested.node(1).unwrap().node_type().name(), "blockquote");
        assert!(nested.node(3).is_none());
    }

    #[test]
    fn test_start_and_end_of_parent() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let start = doc.resolve(0).unwrap();
        assert!(start.is_at_start());
        assert!(!start.is_at_end());

        let end = doc.resolve(5).unwrap();
        assert_eq!(end.depth(), 1);
        assert!(end.is_at_end());
    }

    #[test]
    fn test_nodes_around_position() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let pos = doc.resolve(1).unwrap();
        assert_eq!(pos.node_before().unwrap().text(), Some("H"));
        assert_eq!(pos.node_after().unwrap().text(), Some("e"));

        let between = doc.resolve(2).unwrap();
        assert_eq!(between.node_before().unwrap().text(), Some("He"));
        assert_eq!(between.node_after().unwrap().text(), Some("llo"));
        assert_eq!(between.index(1), 1);
    }

    #[test]
    fn test_end_of_nested_content() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let end = doc.resolve(11).unwrap();
        assert_eq!(end.depth(), 2);
        assert_eq!(end.index(2), 1);
        assert_eq!(end.node_before().unwrap().text(), Some("World"));
        assert!(end.node_after().is_none());
    }

    #[test]
    fn test_marks_prefer_text_before() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        assert!(doc.resolve(2).unwrap().marks().is_empty());
        assert_eq!(doc.resolve(4).unwrap().marks().len(), 1);
        assert!(doc.resolve(0).unwrap().marks().is_empty());
    }

    #[test]
    fn test_shared_depth() {
        let schema = Schema::basic();
        let doc = doc(&schema);

        let pos = doc.resolve(7).unwrap();
        assert_eq!(pos.shared_depth(9), 2);
        assert_eq!(pos.shared_depth(3), 0);
        assert_eq!(pos.shared_depth(12), 1);
    }

    #[test]
    fn test_path_is_recomputed_per_query() {
        let schema = Schema::basic();
        let doc = doc(&schema);
        let pos = doc.resolve(8).unwrap();
        assert!(pos.parent().ptr_eq(&pos.parent()));
    }
}
