//! Schema Loading
//!
//! Discovers definition files in the input directory, picks the primary
//! schema object from each and normalizes it into an `EntitySchema`.
//!
//! Loading is partial-success: a file that fails to load is reported and
//! skipped, and its siblings still load.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::InputConfig;
use crate::descriptor::{EntitySchema, TypeNode};
use crate::error::{ModelgenError, Result};

/// A definition file that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub entity: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one discovery pass produced
#[derive(Debug, Clone, Default)]
pub struct LoadedSchemas {
    pub schemas: Vec<EntitySchema>,
    pub failures: Vec<LoadFailure>,
}

/// Find `<entity><suffix>` files directly inside `dir`, sorted by file name
pub fn discover(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(ModelgenError::Load {
            path: dir.to_path_buf(),
            reason: "input directory not found".to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match file_name.strip_suffix(suffix) {
            Some(entity) if !entity.is_empty() => {
                found.push((entity.to_string(), path.to_path_buf()));
            }
            _ => debug!(file = file_name, "skipping non-definition file"),
        }
    }

    Ok(found)
}

/// Load every definition file in the configured input directory
pub fn load_schemas(input: &InputConfig) -> Result<LoadedSchemas> {
    let mut loaded = LoadedSchemas::default();

    for (entity, path) in discover(&input.dir, &input.suffix)? {
        match load_file(&entity, &path) {
            Ok(schema) => {
                debug!(entity = %entity, fields = schema.fields.len(), "loaded schema");
                loaded.schemas.push(schema);
            }
            Err(e) => {
                warn!(
                    entity = %entity,
                    path = %path.display(),
                    error = %e,
                    "skipping definition file"
                );
                loaded.failures.push(LoadFailure {
                    entity,
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        loaded = loaded.schemas.len(),
        failed = loaded.failures.len(),
        dir = %input.dir.display(),
        "schema discovery complete"
    );
    Ok(loaded)
}

/// Load one definition file
pub fn load_file(entity: &str, path: &Path) -> Result<EntitySchema> {
    let content = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content).map_err(|e| ModelgenError::Load {
        path: path.to_path_buf(),
        reason: format!("invalid JSON: {}", e),
    })?;
    load_definition(entity, &json).map_err(|e| match e {
        ModelgenError::Load { .. } => e,
        other => ModelgenError::Load {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

/// Build an entity schema from a parsed definition document
pub fn load_definition(entity: &str, json: &Value) -> Result<EntitySchema> {
    let primary = primary_node(json).ok_or_else(|| ModelgenError::Load {
        path: PathBuf::from(entity),
        reason: "no schema object exported".to_string(),
    })?;
    let node = TypeNode::from_value(primary)?;
    EntitySchema::from_node(entity, &node)
}

/// The document itself when it is a node, otherwise its first exported node
fn primary_node(json: &Value) -> Option<&Value> {
    if TypeNode::is_node(json) {
        return Some(json);
    }
    json.as_object()?.values().find(|v| TypeNode::is_node(v))
}
