use folio_editor::SchemaConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// File extensions picked up when a directory is given
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Document schema. Missing keys fall back to the built-in schema.
    #[serde(default)]
    pub schema: SchemaConfig,
}

fn default_extensions() -> Vec<String> {
    vec!["html".to_string(), "htm".to_string()]
}

impl Config {
    /// Load config from an explicit path, or from the working directory
    pub fn load(cwd: &Path, path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else if path.is_some() {
            Err(anyhow::anyhow!(
                "Config file does not exist: {}",
                config_path.display()
            ))
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.schema.block_tag = config.schema.block_tag.to_ascii_uppercase();
        config.schema.widget_tag = config.schema.widget_tag.to_ascii_uppercase();
        Ok(config)
    }

    /// Whether `path` has one of the configured extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            schema: SchemaConfig::default(),
        }
    }
}
