//! Serialized document format.
//!
//! ```json
//! { "type": "paragraph", "content": [
//!     { "type": "text", "attrs": { "text": "Hi" }, "marks": [{ "type": "em" }] }
//! ] }
//! ```
//!
//! Omitted `attrs`, `content` and `marks` mean empty. Empty ones are omitted
//! on output. Text nodes carry their text in `attrs.text`.

use serde::{Deserialize, Serialize};

use crate::schema::Attrs;

/// Attribute key holding a text node's text
pub const TEXT_ATTR: &str = "text";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeJson {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<NodeJson>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<MarkJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkJson {
    #[serde(rename = "type")]
    pub mark_type: String,

    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}
