//! # Editor state
//!
//! An immutable snapshot of an editing session. Every change produces a new
//! state; earlier states stay valid and can be kept around for undo or
//! inspection.

use std::fmt;
use std::sync::Arc;

use quire_model::{MarkJson, MarkSet, Node, NodeJson, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{StateError, StateResult};
use crate::plugin::Plugin;
use crate::selection::{Selection, SelectionJson};
use crate::transaction::Transaction;

/// Inputs for [`EditorState::create`]. Everything is optional.
#[derive(Clone, Default)]
pub struct EditorStateConfig {
    /// Defaults to [`Schema::basic`]
    pub schema: Option<Schema>,

    /// Defaults to a document holding one empty paragraph
    pub doc: Option<Node>,

    /// Defaults to a cursor at the start of the document
    pub selection: Option<Selection>,

    pub plugins: Vec<Arc<dyn Plugin>>,

    pub stored_marks: Option<MarkSet>,
}

impl EditorStateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn doc(mut self, doc: Node) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn stored_marks(mut self, marks: MarkSet) -> Self {
        self.stored_marks = Some(marks);
        self
    }
}

/// Fields to change in [`EditorState::update`]. Unset fields carry over.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub doc: Option<Node>,
    pub selection: Option<Selection>,
    /// `Some(None)` clears the stored marks
    pub stored_marks: Option<Option<MarkSet>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc(mut self, doc: Node) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn stored_marks(mut self, marks: Option<MarkSet>) -> Self {
        self.stored_marks = Some(marks);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_none() && self.selection.is_none() && self.stored_marks.is_none()
    }
}

#[derive(Clone)]
pub struct EditorState {
    doc: Node,
    schema: Schema,
    selection: Selection,
    plugins: Arc<[Arc<dyn Plugin>]>,
    version: u64,
    stored_marks: Option<MarkSet>,
}

/// Serialized state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateJson {
    pub doc: NodeJson,
    pub selection: SelectionJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_marks: Option<Vec<MarkJson>>,
}

impl EditorState {
    /// Build the first state of a session (version 0)
    pub fn create(config: EditorStateConfig) -> StateResult<EditorState> {
        let schema = config.schema.unwrap_or_else(Schema::basic);
        let doc = match config.doc {
            Some(doc) => doc,
            None => schema.doc(vec![schema.paragraph(vec![])?])?,
        };
        let selection = match config.selection {
            Some(selection) => selection,
            None => Selection::at_start(&doc)?,
        };
        if selection.to() > doc.content().size() {
            return Err(StateError::InvalidSelection(format!(
                "{}..{} is outside a document of size {}",
                selection.from(),
                selection.to(),
                doc.content().size()
            )));
        }

        Ok(EditorState {
            doc,
            schema,
            selection,
            plugins: config.plugins.into(),
            version: 0,
            stored_marks: config.stored_marks,
        })
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn plugin(&self, key: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|plugin| plugin.key() == key)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    /// New state with the given fields replaced and the version bumped
    pub fn update(&self, update: StateUpdate) -> EditorState {
        EditorState {
            doc: update.doc.unwrap_or_else(|| self.doc.clone()),
            schema: self.schema.clone(),
            selection: update.selection.unwrap_or_else(|| self.selection.clone()),
            plugins: self.plugins.clone(),
            version: self.version + 1,
            stored_marks: update
                .stored_marks
                .unwrap_or_else(|| self.stored_marks.clone()),
        }
    }

    /// Start a transaction against this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self.clone())
    }

    /// Whether every plugin accepts `tr`
    pub fn filter_transaction(&self, tr: &Transaction) -> bool {
        match self
            .plugins
            .iter()
            .find(|plugin| !plugin.filter_transaction(tr, self))
        {
            Some(plugin) => {
                warn!(plugin = plugin.key(), "transaction filtered");
                false
            }
            None => true,
        }
    }

    /// Apply a transaction, then any transactions plugins append to it.
    ///
    /// A transaction rejected by a plugin leaves the state as it is.
    pub fn apply(&self, tr: &Transaction) -> StateResult<EditorState> {
        Ok(self.try_apply(tr)?.unwrap_or_else(|| self.clone()))
    }

    /// Like [`EditorState::apply`], but `None` when a plugin rejects `tr`
    pub(crate) fn try_apply(&self, tr: &Transaction) -> StateResult<Option<EditorState>> {
        if !self.filter_transaction(tr) {
            return Ok(None);
        }
        let mut state = tr.apply_to(self)?;

        let applied = [tr.clone()];
        for plugin in self.plugins.iter() {
            if let Some(appended) = plugin.append_transaction(&applied, self, &state) {
                if state.filter_transaction(&appended) {
                    debug!(plugin = plugin.key(), "applying appended transaction");
                    state = appended.apply_to(&state)?;
                }
            }
        }

        Ok(Some(state))
    }

    pub fn to_json(&self) -> StateJson {
        StateJson {
            doc: self.doc.to_json(),
            selection: self.selection.to_json(),
            stored_marks: self.stored_marks.as_ref().map(MarkSet::to_json),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.to_json()).unwrap_or(Value::Null)
    }

    /// Rebuild a state from JSON. Schema and plugins come from `config`.
    pub fn from_json(config: EditorStateConfig, json: &StateJson) -> StateResult<EditorState> {
        let schema = config.schema.clone().unwrap_or_else(Schema::basic);
        let doc = Node::from_json(&schema, &json.doc)?;
        let selection = Selection::from_json(&doc, &json.selection)?;
        let stored_marks = json
            .stored_marks
            .as_deref()
            .map(|marks| MarkSet::from_json(&schema, marks))
            .transpose()?;

        EditorState::create(EditorStateConfig {
            schema: Some(schema),
            doc: Some(doc),
            selection: Some(selection),
            plugins: config.plugins,
            stored_marks,
        })
    }

    pub fn from_value(config: EditorStateConfig, value: &Value) -> StateResult<EditorState> {
        let json: StateJson = serde_json::from_value(value.clone())?;
        EditorState::from_json(config, &json)
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|plugin| plugin.key()).collect();
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("stored_marks", &self.stored_marks)
            .field("plugins", &plugins)
            .finish()
    }
}
