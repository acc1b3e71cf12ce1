use anyhow::Context;
use quire_model::{Schema, SchemaSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Schema to load documents with (defaults to the basic schema)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSource>,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of undo levels kept by `exec`
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Directory relative schema paths resolve against
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Either a schema written inline or a path to a JSON schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    Path(String),
    Inline(SchemaSpec),
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_history_depth() -> usize {
    100
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            // Return default config if none exists
            Ok(Config {
                base_dir: PathBuf::from(cwd),
                ..Config::default()
            })
        }
    }

    /// Load config from an explicit file
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Build the configured schema
    pub fn schema(&self) -> anyhow::Result<Schema> {
        match &self.schema {
            None => Ok(Schema::basic()),
            Some(SchemaSource::Inline(spec)) => Ok(Schema::new(spec.clone())),
            Some(SchemaSource::Path(path)) => {
                let path = self.base_dir.join(path);
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read schema {}", path.display()))?;
                let spec: SchemaSpec = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid schema {}", path.display()))?;
                Ok(Schema::new(spec))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            log_level: default_log_level(),
            history_depth: default_history_depth(),
            base_dir: PathBuf::new(),
        }
    }
}
