use crate::mark::Mark;
use crate::node::Node;

/// Visitor pattern for traversing a document tree immutably
///
/// The default implementations walk the entire tree. Override specific
/// visit_* methods to act on nodes. Positions passed in are the start of the
/// visited node, counted from the start of the root's content.
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &Node, pos: usize) {
        walk_node(self, node, pos);
    }

    fn visit_text(&mut self, _text: &Node, _pos: usize) {
        // Leaf node, no children to walk
    }

    fn visit_mark(&mut self, _mark: &Mark, _pos: usize) {
        // Leaf value, no children to walk
    }
}

/// Visit every child of `node`, whose content starts at `pos`
pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node, pos: usize) {
    for (child, offset) in node.content().iter_offsets() {
        let child_pos = pos + offset;
        for mark in child.marks() {
            visitor.visit_mark(mark, child_pos);
        }
        if child.is_text() {
            visitor.visit_text(child, child_pos);
        } else {
            visitor.visit_node(child, child_pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attrs, Schema};
    use crate::MarkSet;

    #[derive(Default)]
    struct Collector {
        nodes: Vec<(String, usize)>,
        marks: Vec<(String, usize)>,
    }

    impl Visitor for Collector {
        fn visit_node(&mut self, node: &Node, pos: usize) {
            self.nodes.push((node.node_type().name().to_string(), pos));
            walk_node(self, node, pos);
        }

        fn visit_text(&mut self, text: &Node, pos: usize) {
            self.nodes.push((text.text_content(), pos));
        }

        fn visit_mark(&mut self, mark: &Mark, pos: usize) {
            self.marks.push((mark.mark_type().name().to_string(), pos));
        }
    }

    #[test]
    fn test_walk_reports_positions_in_document_order() {
        let schema = Schema::basic();
        let strong = schema.mark("strong", Attrs::new()).unwrap();
        let doc = schema
            .doc(vec![
                schema.paragraph(vec![schema.text("ab").unwrap()]).unwrap(),
                schema
                    .paragraph(vec![
                        schema.text("c").unwrap(),
                        schema
                            .text_with_marks("d", MarkSet::from(vec![strong]))
                            .unwrap(),
                    ])
                    .unwrap(),
            ])
            .unwrap();

        let mut collector = Collector::default();
        walk_node(&mut collector, &doc, 0);

        assert_eq!(
            collector.nodes,
            vec![
                ("paragraph".to_string(), 0),
                ("ab".to_string(), 0),
                ("paragraph".to_string(), 3),
                ("c".to_string(), 3),
                ("d".to_string(), 4),
            ]
        );
        assert_eq!(collector.marks, vec![("strong".to_string(), 4)]);
    }
}
