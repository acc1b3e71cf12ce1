pub mod exec;
pub mod inspect;
pub mod resolve;
pub mod validate;

pub use exec::{exec, ExecArgs};
pub use inspect::{inspect, InspectArgs};
pub use resolve::{resolve, ResolveArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use quire_model::{Node, Schema};
use std::path::Path;

/// Read a JSON document from disk
pub(crate) fn read_doc(path: &Path, schema: &Schema) -> Result<Node> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    Ok(Node::from_value(schema, &value)?)
}
