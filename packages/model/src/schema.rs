//! # Schema
//!
//! Registry of node and mark types, built once from a [`SchemaSpec`].
//!
//! Types are handed out as cheap handles. Two handles refer to the same type
//! only if they came from the same schema; equality is by identity, not name.
//!
//! ## Content expressions
//!
//! A node spec's `content` string is a whitespace-separated list of tokens.
//! Every token is an independent alternative:
//!
//! - `text` allows text nodes
//! - `inline` allows inline nodes
//! - `block` allows block nodes
//! - anything else allows the node type with exactly that name
//!
//! Trailing quantifiers (`+`, `*`, `?`) are accepted and ignored. There is no
//! sequencing, counting or alternation beyond this.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fragment::Fragment;
use crate::mark::{Mark, MarkSet};
use crate::node::Node;
use crate::visitor::{walk_node, Visitor};
use crate::{ModelError, ModelResult};

/// Attribute map carried by nodes and marks
pub type Attrs = BTreeMap<String, Value>;

/// Specification of a single attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Value used when the attribute is not supplied. No default means required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl AttributeSpec {
    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }

    pub fn required() -> Self {
        Self { default: None }
    }
}

/// Specification of a node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Content expression, e.g. `"inline"` or `"paragraph heading"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default)]
    pub inline: bool,

    #[serde(default)]
    pub is_text: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttributeSpec>,
}

/// Names of the marks (or mark groups) a mark type excludes.
///
/// Accepts either a single string (whitespace separated) or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Excludes {
    One(String),
    Many(Vec<String>),
}

impl Excludes {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Excludes::One(names) => names.split_whitespace().any(|n| n == name),
            Excludes::Many(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Specification of a mark type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttributeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Excludes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Full schema description, as found in configuration files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSpec>,

    #[serde(default)]
    pub marks: BTreeMap<String, MarkSpec>,

    /// Name of the root node type (defaults to `doc`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_node: Option<String>,
}

fn compute_attrs(specs: &BTreeMap<String, AttributeSpec>, given: Attrs) -> ModelResult<Attrs> {
    let mut attrs = given;
    for (name, spec) in specs {
        if attrs.contains_key(name) {
            continue;
        }
        match &spec.default {
            Some(value) => {
                attrs.insert(name.clone(), value.clone());
            }
            None => return Err(ModelError::MissingAttribute(name.clone())),
        }
    }
    Ok(attrs)
}

struct NodeTypeData {
    name: String,
    spec: NodeSpec,
}

/// Handle to a node type owned by a [`Schema`]
#[derive(Clone)]
pub struct NodeType(Arc<NodeTypeData>);

impl NodeType {
    fn new(name: String, spec: NodeSpec) -> Self {
        Self(Arc::new(NodeTypeData { name, spec }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.0.spec
    }

    /// Content expression, empty when the type holds no content
    pub fn content_expr(&self) -> &str {
        self.0.spec.content.as_deref().unwrap_or("")
    }

    pub fn is_text(&self) -> bool {
        self.0.spec.is_text
    }

    pub fn is_inline(&self) -> bool {
        self.0.spec.inline
    }

    pub fn is_block(&self) -> bool {
        !self.0.spec.inline && !self.0.spec.is_text
    }

    /// True for non-text types that can never hold content
    pub fn is_atom(&self) -> bool {
        !self.is_text() && self.content_expr().trim().is_empty()
    }

    /// Fill in attribute defaults, failing on missing required attributes
    pub fn compute_attrs(&self, attrs: Attrs) -> ModelResult<Attrs> {
        compute_attrs(&self.0.spec.attrs, attrs)
    }

    /// Create a non-text node of this type
    pub fn create(&self, attrs: Attrs, content: Fragment, marks: MarkSet) -> ModelResult<Node> {
        let attrs = self.compute_attrs(attrs)?;
        Ok(Node::new(self.clone(), attrs, content, marks))
    }

    pub fn ptr_eq(&self, other: &NodeType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

struct MarkTypeData {
    name: String,
    spec: MarkSpec,
}

/// Handle to a mark type owned by a [`Schema`]
#[derive(Clone)]
pub struct MarkType(Arc<MarkTypeData>);

impl MarkType {
    fn new(name: String, spec: MarkSpec) -> Self {
        Self(Arc::new(MarkTypeData { name, spec }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.0.spec
    }

    /// Create a mark of this type, filling attribute defaults
    pub fn create(&self, attrs: Attrs) -> ModelResult<Mark> {
        let attrs = compute_attrs(&self.0.spec.attrs, attrs)?;
        Ok(Mark::new(self.clone(), attrs))
    }

    /// True if this type's `excludes` names `other` or its group
    pub fn excludes(&self, other: &MarkType) -> bool {
        let Some(excludes) = &self.0.spec.excludes else {
            return false;
        };
        excludes.contains(other.name())
            || other
                .spec()
                .group
                .as_deref()
                .is_some_and(|group| excludes.contains(group))
    }

    /// First mark of this type in `set`, if any
    pub fn is_in_set<'a>(&self, set: &'a MarkSet) -> Option<&'a Mark> {
        set.iter().find(|mark| mark.mark_type() == self)
    }

    pub fn ptr_eq(&self, other: &MarkType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name())
    }
}

struct SchemaData {
    spec: SchemaSpec,
    nodes: HashMap<String, NodeType>,
    marks: HashMap<String, MarkType>,
    top_node: String,
}

/// Document schema
#[derive(Clone)]
pub struct Schema(Arc<SchemaData>);

impl Schema {
    /// Build a schema from its spec.
    ///
    /// Missing `text`/`doc`/`paragraph` types are not an error here; the
    /// convenience accessors fail when they are used.
    pub fn new(spec: SchemaSpec) -> Self {
        let nodes = spec
            .nodes
            .iter()
            .map(|(name, node_spec)| (name.clone(), NodeType::new(name.clone(), node_spec.clone())))
            .collect();
        let marks = spec
            .marks
            .iter()
            .map(|(name, mark_spec)| (name.clone(), MarkType::new(name.clone(), mark_spec.clone())))
            .collect();
        let top_node = spec.top_node.clone().unwrap_or_else(|| "doc".to_string());

        Self(Arc::new(SchemaData {
            spec,
            nodes,
            marks,
            top_node,
        }))
    }

    pub fn spec(&self) -> &SchemaSpec {
        &self.0.spec
    }

    pub fn node_type(&self, name: &str) -> ModelResult<&NodeType> {
        self.0
            .nodes
            .get(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))
    }

    pub fn mark_type(&self, name: &str) -> ModelResult<&MarkType> {
        self.0
            .marks
            .get(name)
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.0.nodes.values()
    }

    pub fn mark_types(&self) -> impl Iterator<Item = &MarkType> {
        self.0.marks.values()
    }

    pub fn top_node_type(&self) -> ModelResult<&NodeType> {
        self.node_type(&self.0.top_node)
    }

    /// Create an unmarked text node
    pub fn text(&self, text: impl Into<String>) -> ModelResult<Node> {
        self.text_with_marks(text, MarkSet::empty())
    }

    pub fn text_with_marks(&self, text: impl Into<String>, marks: MarkSet) -> ModelResult<Node> {
        let node_type = self.node_type("text")?;
        Ok(Node::new_text(node_type.clone(), text.into(), marks))
    }

    /// Create a top-level document node
    pub fn doc(&self, content: Vec<Node>) -> ModelResult<Node> {
        self.top_node_type()?
            .create(Attrs::new(), Fragment::from(content), MarkSet::empty())
    }

    pub fn paragraph(&self, content: Vec<Node>) -> ModelResult<Node> {
        self.node("paragraph", Attrs::new(), content)
    }

    /// Create any non-text node by type name
    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> ModelResult<Node> {
        self.node_type(name)?
            .create(attrs, Fragment::from(content), MarkSet::empty())
    }

    /// Create a mark by type name
    pub fn mark(&self, name: &str, attrs: Attrs) -> ModelResult<Mark> {
        self.mark_type(name)?.create(attrs)
    }

    /// Whether `parent`'s content expression admits `child`
    pub fn allows_node_type(&self, parent: &NodeType, child: &NodeType) -> bool {
        parent.content_expr().split_whitespace().any(|token| {
            let token = token.trim_end_matches(['+', '*', '?']);
            match token {
                "text" => child.is_text(),
                "inline" => child.is_inline(),
                "block" => child.is_block(),
                name => name == child.name(),
            }
        })
    }

    /// Check every parent/child pair in `node` against the content rules.
    ///
    /// Returns the violations found, in document order.
    pub fn check_content(&self, node: &Node) -> Vec<ContentViolation> {
        let mut checker = ContentChecker {
            schema: self,
            violations: Vec::new(),
        };
        checker.visit_node(node, 0);
        checker.violations
    }

    /// The schema used when no configuration is supplied.
    ///
    /// Built once per process, so every caller gets the same type handles.
    pub fn basic() -> Self {
        static BASIC: OnceLock<Schema> = OnceLock::new();
        BASIC.get_or_init(|| Schema::new(basic_spec())).clone()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<_> = self.0.nodes.keys().collect();
        nodes.sort();
        let mut marks: Vec<_> = self.0.marks.keys().collect();
        marks.sort();
        f.debug_struct("Schema")
            .field("nodes", &nodes)
            .field("marks", &marks)
            .finish()
    }
}

/// A child that its parent's content expression does not allow
#[derive(Debug, Clone, PartialEq)]
pub struct ContentViolation {
    /// Position where the offending child starts
    pub pos: usize,
    pub parent: String,
    pub child: String,
}

struct ContentChecker<'a> {
    schema: &'a Schema,
    violations: Vec<ContentViolation>,
}

impl Visitor for ContentChecker<'_> {
    fn visit_node(&mut self, node: &Node, pos: usize) {
        let mut offset = pos;
        for child in node.content().iter() {
            if !self.schema.allows_node_type(node.node_type(), child.node_type()) {
                self.violations.push(ContentViolation {
                    pos: offset,
                    parent: node.node_type().name().to_string(),
                    child: child.node_type().name().to_string(),
                });
            }
            offset += child.node_size();
        }
        walk_node(self, node, pos);
    }
}

fn node_spec(content: Option<&str>, group: Option<&str>, inline: bool) -> NodeSpec {
    NodeSpec {
        content: content.map(str::to_string),
        group: group.map(str::to_string),
        inline,
        ..NodeSpec::default()
    }
}

fn basic_spec() -> SchemaSpec {
    let mut nodes = BTreeMap::new();
    nodes.insert("doc".to_string(), node_spec(Some("block+"), None, false));
    nodes.insert("paragraph".to_string(), node_spec(Some("inline*"), Some("block"), false));
    nodes.insert("blockquote".to_string(), node_spec(Some("block+"), Some("block"), false));
    nodes.insert("horizontal_rule".to_string(), node_spec(None, Some("block"), false));

    let mut heading = node_spec(Some("inline*"), Some("block"), false);
    heading
        .attrs
        .insert("level".to_string(), AttributeSpec::with_default(1));
    nodes.insert("heading".to_string(), heading);

    nodes.insert(
        "text".to_string(),
        NodeSpec {
            group: Some("inline".to_string()),
            inline: true,
            is_text: true,
            ..NodeSpec::default()
        },
    );
    nodes.insert("hard_break".to_string(), node_spec(None, Some("inline"), true));

    let mut image = node_spec(None, Some("inline"), true);
    image.attrs.insert("src".to_string(), AttributeSpec::required());
    image
        .attrs
        .insert("alt".to_string(), AttributeSpec::with_default(Value::Null));
    nodes.insert("image".to_string(), image);

    let mut marks = BTreeMap::new();
    marks.insert("strong".to_string(), MarkSpec::default());
    marks.insert("em".to_string(), MarkSpec::default());
    marks.insert(
        "code".to_string(),
        MarkSpec {
            excludes: Some(Excludes::Many(vec![
                "strong".to_string(),
                "em".to_string(),
                "link".to_string(),
            ])),
            ..MarkSpec::default()
        },
    );
    let mut link = MarkSpec::default();
    link.attrs.insert("href".to_string(), AttributeSpec::required());
    link.attrs
        .insert("title".to_string(), AttributeSpec::with_default(Value::Null));
    marks.insert("link".to_string(), link);

    SchemaSpec {
        nodes,
        marks,
        top_node: Some("doc".to_string()),
    }
}
