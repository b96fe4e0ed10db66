//! Configuration management for model generation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (modelgen.toml)
//! - Environment variables (MODELGEN__*)
//!
//! ## Example config file (modelgen.toml):
//! ```toml
//! [input]
//! dir = "schema"
//! suffix = ".zod.json"
//!
//! [output]
//! dir = "schema/models"
//! suffix = ".generated.js"
//! timestamps = true
//!
//! [indexes]
//! text_fields = ["title", "description"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelgenConfig {
    /// Where definition files are discovered
    #[serde(default)]
    pub input: InputConfig,

    /// Where generated modules are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Index inference settings
    #[serde(default)]
    pub indexes: IndexConfig,
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding one definition file per entity
    #[serde(default = "default_input_dir")]
    pub dir: PathBuf,

    /// File name suffix; the entity name is the part before it
    #[serde(default = "default_input_suffix")]
    pub suffix: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated modules are written into
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Suffix appended to the lowercase entity name
    #[serde(default = "default_output_suffix")]
    pub suffix: String,

    /// Emit the `timestamps` schema option and stamp inserted documents
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

/// Index inference configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Top-level fields combined into the collection's text index
    #[serde(default)]
    pub text_fields: Vec<String>,
}

// Default value functions
fn default_input_dir() -> PathBuf {
    PathBuf::from("schema")
}

fn default_input_suffix() -> String {
    ".zod.json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("schema/models")
}

fn default_output_suffix() -> String {
    ".generated.js".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: default_input_dir(),
            suffix: default_input_suffix(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            suffix: default_output_suffix(),
            timestamps: true,
        }
    }
}

impl ModelgenConfig {
    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["modelgen.toml", ".modelgen.toml", "config/modelgen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "modelgen") {
            let xdg_config = config_dir.config_dir().join("modelgen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MODELGEN__OUTPUT__DIR=... style overrides
        builder = builder.add_source(
            Environment::with_prefix("MODELGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("indexes.text_fields"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Configuration rooted at explicit directories, ignoring files and environment
    pub fn with_dirs(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.input.dir = input.into();
        config.output.dir = output.into();
        config
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_toml()?)
    }

    pub fn to_toml(&self) -> std::io::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Output file path for an entity
    pub fn output_path(&self, entity: &str) -> PathBuf {
        self.output
            .dir
            .join(format!("{}{}", entity.to_lowercase(), self.output.suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelgenConfig::default();
        assert_eq!(config.input.suffix, ".zod.json");
        assert_eq!(config.output.suffix, ".generated.js");
        assert!(config.output.timestamps);
        assert!(config.indexes.text_fields.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = ModelgenConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[indexes]"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[output]\ndir = \"out\"\n\n[indexes]\ntext_fields = [\"title\"]\n",
        )
        .unwrap();

        let config = ModelgenConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.suffix, ".generated.js");
        assert_eq!(config.indexes.text_fields, vec!["title".to_string()]);
    }

    #[test]
    fn test_output_path_lowercases_entity() {
        let config = ModelgenConfig::with_dirs("in", "out");
        assert_eq!(config.output_path("EbookUser"), PathBuf::from("out/ebookuser.generated.js"));
    }
}
