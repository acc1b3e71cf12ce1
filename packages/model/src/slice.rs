use crate::fragment::Fragment;
use crate::node::Node;

/// Content cut out of a document, with the number of ancestor levels left
/// open at each side.
///
/// Grafting an open slice back into a tree at a different depth is not
/// supported; consumers insert `content` as is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice {
    pub content: Fragment,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Width of the range the slice was cut from.
    ///
    /// Nodes open at the end were cut before their close boundary, so that
    /// unit is not counted.
    pub fn size(&self) -> usize {
        self.content.size().saturating_sub(self.open_end)
    }
}

impl From<Fragment> for Slice {
    fn from(content: Fragment) -> Self {
        Self::new(content, 0, 0)
    }
}

impl From<Node> for Slice {
    fn from(node: Node) -> Self {
        Self::from(Fragment::from_node(node))
    }
}
