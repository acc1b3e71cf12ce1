//! # Quire document model
//!
//! Immutable rich-text document trees addressed by linear positions.
//!
//! ```text
//! doc
//! ├── paragraph            content 0..=5, closes at 5
//! │   └── "Hello"          0..5
//! └── paragraph            content 6..=11, closes at 11
//!     └── "World"          6..11
//! ```
//!
//! Every non-text node takes one position for its close boundary, so its size
//! is `1 + content.size`. Text takes one position per character.

pub mod error;
pub mod fragment;
pub mod json;
pub mod mark;
pub mod node;
pub mod resolved_pos;
pub mod result;
pub mod schema;
pub mod slice;
pub mod visitor;

pub use error::*;
pub use fragment::Fragment;
pub use json::{MarkJson, NodeJson};
pub use mark::{Mark, MarkSet};
pub use node::Node;
pub use resolved_pos::ResolvedPos;
pub use result::*;
pub use schema::{
    AttributeSpec, Attrs, ContentViolation, Excludes, MarkSpec, MarkType, NodeSpec, NodeType,
    Schema, SchemaSpec,
};
pub use slice::Slice;
pub use visitor::*;
