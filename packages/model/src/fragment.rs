//! # Fragments
//!
//! An immutable run of sibling nodes. Every operation returns a new fragment;
//! untouched children are shared, never copied.
//!
//! Offsets inside a fragment run from `0` to `size`. A text child covers as
//! many positions as it has characters. A non-text child at offset `o` keeps
//! its content at `o..=o + content.size` and closes one position later.

use std::fmt;
use std::sync::Arc;

use crate::node::Node;
use crate::{ModelError, ModelResult};

#[derive(Clone)]
pub struct Fragment {
    content: Arc<[Node]>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self {
            content: Arc::from(Vec::new()),
            size: 0,
        }
    }

    pub fn from_node(node: Node) -> Self {
        Self::from(vec![node])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn child(&self, index: usize) -> ModelResult<&Node> {
        self.content
            .get(index)
            .ok_or(ModelError::IndexOutOfBounds(index))
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    /// Iterate children with their start offsets
    pub fn iter_offsets(&self) -> impl Iterator<Item = (&Node, usize)> {
        self.content.iter().scan(0, |offset, child| {
            let start = *offset;
            *offset += child.node_size();
            Some((child, start))
        })
    }

    /// True if both fragments share the same child allocation
    pub fn ptr_eq(&self, other: &Fragment) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }

    pub fn text_content(&self) -> String {
        self.iter().map(Node::text_content).collect()
    }

    /// First child whose `[offset, offset + node_size]` contains `pos`.
    ///
    /// Both ends are inclusive, so at a shared boundary the earlier child wins.
    pub fn find_child_at(&self, pos: usize) -> Option<(&Node, usize)> {
        self.iter_offsets()
            .find(|(child, offset)| *offset <= pos && pos <= offset + child.node_size())
    }

    /// Child starting exactly at `pos`
    pub fn child_starting_at(&self, pos: usize) -> Option<(&Node, usize)> {
        self.iter_offsets()
            .take_while(|(_, offset)| *offset <= pos)
            .find(|(_, offset)| *offset == pos)
            .map(|(child, _)| (child, pos))
    }

    /// Index and offset of the first container child whose content holds both
    /// `from` and `to`. Text and atom children never qualify.
    pub(crate) fn enclosing_child(&self, from: usize, to: usize) -> Option<(usize, usize)> {
        self.iter_offsets()
            .enumerate()
            .find(|(_, (child, offset))| {
                !child.is_text()
                    && !child.node_type().is_atom()
                    && *offset <= from
                    && to <= offset + child.content().size()
            })
            .map(|(index, (_, offset))| (index, offset))
    }

    /// Content between `from` and `to`.
    ///
    /// Returns `self` (same allocation) when the range covers everything.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        let to = to.min(self.size);
        if from == 0 && to == self.size {
            return self.clone();
        }
        if from >= to {
            return Fragment::empty();
        }

        let mut result = Vec::new();
        for (child, pos) in self.iter_offsets() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end <= from {
                continue;
            }
            if pos >= from && end <= to {
                result.push(child.clone());
            } else if let Some(cut) = child.cut(from.saturating_sub(pos), end.min(to) - pos) {
                result.push(cut);
            }
        }
        Fragment::from(result)
    }

    /// Replace `from..to` with `fragment`.
    ///
    /// When both ends sit inside the same container child the replacement
    /// happens inside that child; otherwise the fragment is spliced in here.
    pub fn replace(&self, from: usize, to: usize, fragment: &Fragment) -> Fragment {
        if let Some((index, offset)) = self.enclosing_child(from, to) {
            let child = &self.content[index];
            let replaced = child.replace(from - offset, to - offset, fragment);
            return self.replace_child(index, replaced);
        }
        self.cut(0, from)
            .append_fragment(fragment)
            .append_fragment(&self.cut(to, self.size))
    }

    /// Copy of this fragment with the child at `index` swapped out
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut content = self.content.to_vec();
        if let Some(slot) = content.get_mut(index) {
            *slot = node;
        }
        Fragment::from(content)
    }

    pub fn append(&self, node: Node) -> Fragment {
        self.append_fragment(&Fragment::from_node(node))
    }

    /// Concatenate two fragments, merging adjacent text with equal marks
    pub fn append_fragment(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut content = self.content.to_vec();
        let mut rest = other.iter();
        if let (Some(last), Some(first)) = (self.last_child(), other.first_child()) {
            if last.same_markup_text(first) {
                let merged = format!(
                    "{}{}",
                    last.text().unwrap_or_default(),
                    first.text().unwrap_or_default()
                );
                let end = content.len() - 1;
                content[end] = last.with_text(merged);
                rest.next();
            }
        }
        content.extend(rest.cloned());
        Fragment::from(content)
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(content: Vec<Node>) -> Self {
        let size = content.iter().map(Node::node_size).sum();
        Self {
            content: content.into(),
            size,
        }
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Self::from_node(node)
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.content.len() == other.content.len()
                && self.iter().zip(other.iter()).all(|(a, b)| a == b))
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
