//! Generation Pipeline
//!
//! Ties the stages together: load definition files, translate, infer indexes,
//! then hand the result to a sink (module files on disk, live models, or a
//! drift comparison against what is already on disk).
//!
//! Failures are isolated per entity. One entity failing to load, write or
//! construct never prevents its siblings from being processed.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use similar::TextDiff;
use tracing::{error, info, warn};

use crate::checksum::Checksum;
use crate::codegen::{model_name, render_module, EmitOptions, GeneratedModule};
use crate::config::ModelgenConfig;
use crate::descriptor::EntitySchema;
use crate::diagnostics::Diagnostics;
use crate::error::{ModelgenError, Result};
use crate::indexes::{infer_indexes, IndexSpec};
use crate::loader::{load_file, load_schemas, LoadFailure};
use crate::registry::ModelRegistry;
use crate::translate::{translate, Translation};

// =============================================================================
// Reports
// =============================================================================

/// What happened to one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Module written to disk
    Written { path: PathBuf, checksum: Checksum },
    /// Live model registered
    Built,
    /// Emission or model construction failed
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct EntityReport {
    pub entity: String,
    pub model_name: String,
    pub outcome: Outcome,
    pub diagnostics: Diagnostics,
}

impl EntityReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Result of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub load_failures: Vec<LoadFailure>,
    pub entities: Vec<EntityReport>,
}

impl GenerationReport {
    /// Whether any entity failed to load, emit or construct
    pub fn has_fatal(&self) -> bool {
        !self.load_failures.is_empty() || self.entities.iter().any(EntityReport::is_failed)
    }

    pub fn success_count(&self) -> usize {
        self.entities.iter().filter(|e| !e.is_failed()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.load_failures.len() + self.entities.iter().filter(|e| e.is_failed()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entities.iter().map(|e| e.diagnostics.warning_count()).sum()
    }

    pub fn entity(&self, entity: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.entity == entity)
    }

    /// Operator-facing report: one line per entity, its diagnostics, a summary
    pub fn render(&self) -> String {
        let mut out = String::new();

        for failure in &self.load_failures {
            let _ = writeln!(out, "❌ {} - {}", failure.entity, failure.reason);
        }

        for entity in &self.entities {
            match &entity.outcome {
                Outcome::Written { path, checksum } => {
                    let _ = writeln!(
                        out,
                        "✅ {} -> {} ({})",
                        entity.model_name,
                        path.display(),
                        checksum.short()
                    );
                }
                Outcome::Built => {
                    let _ = writeln!(out, "✅ {} - model registered", entity.model_name);
                }
                Outcome::Failed(reason) => {
                    let _ = writeln!(out, "❌ {} - {}", entity.model_name, reason);
                }
            }
            for item in entity.diagnostics.warnings() {
                let _ = writeln!(out, "   ⚠️  {}", item);
            }
            for item in entity.diagnostics.infos() {
                let _ = writeln!(out, "   ℹ️  {}", item);
            }
        }

        let _ = writeln!(
            out,
            "\n{} succeeded, {} warning(s), {} failed",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        );
        out
    }
}

/// Drift state of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    UpToDate,
    Missing,
    Changed { diff: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftEntry {
    pub entity: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: DriftStatus,
}

/// Comparison of freshly rendered modules against files on disk
#[derive(Debug, Clone, Default)]
pub struct DriftReport {
    pub load_failures: Vec<LoadFailure>,
    pub entries: Vec<DriftEntry>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        self.entries.iter().any(|e| e.status != DriftStatus::UpToDate)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &DriftEntry> {
        self.entries.iter().filter(|e| e.status != DriftStatus::UpToDate)
    }

    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();

        for failure in &self.load_failures {
            let _ = writeln!(out, "❌ {} - {}", failure.entity, failure.reason);
        }

        for entry in &self.entries {
            match &entry.status {
                DriftStatus::UpToDate => {
                    if verbose {
                        let _ = writeln!(out, "✅ {} - up to date", entry.entity);
                    }
                }
                DriftStatus::Missing => {
                    let path = entry.path.display();
                    let _ = writeln!(out, "❌ {} - {} not generated", entry.entity, path);
                }
                DriftStatus::Changed { diff } => {
                    let path = entry.path.display();
                    let _ = writeln!(out, "⚠️  {} - {} is stale", entry.entity, path);
                    if verbose {
                        out.push_str(diff);
                    }
                }
            }
        }

        if self.has_drift() {
            let _ = writeln!(out, "\n❌ {} module(s) out of date", self.drifted().count());
        } else {
            let _ = writeln!(out, "\n✅ No drift detected - modules are in sync");
        }
        out
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Everything derived from one entity schema
#[derive(Debug, Clone)]
pub struct RenderedEntity {
    pub translation: Translation,
    pub indexes: Vec<IndexSpec>,
    pub module: GeneratedModule,
}

fn emit_options(config: &ModelgenConfig) -> EmitOptions {
    EmitOptions {
        timestamps: config.output.timestamps,
    }
}

/// Translate an entity and render its module in memory
pub fn render_entity(schema: &EntitySchema, config: &ModelgenConfig) -> RenderedEntity {
    let translation = translate(schema);
    let indexes = infer_indexes(&translation.schema, &config.indexes);
    let code = render_module(&schema.name, &translation.schema, &indexes, &emit_options(config));
    let module = GeneratedModule::new(&schema.name, config.output_path(&schema.name), code);

    RenderedEntity {
        translation,
        indexes,
        module,
    }
}

/// Load and render a single entity by name
pub fn render_named(config: &ModelgenConfig, entity: &str) -> Result<RenderedEntity> {
    let path = config.input.dir.join(format!("{}{}", entity, config.input.suffix));
    if !path.is_file() {
        return Err(ModelgenError::EntityNotFound(entity.to_string()));
    }
    let schema = load_file(entity, &path)?;
    Ok(render_entity(&schema, config))
}

/// Generate one module file per loadable definition file
pub fn generate_files(config: &ModelgenConfig) -> Result<GenerationReport> {
    let loaded = load_schemas(&config.input)?;
    let mut report = GenerationReport {
        load_failures: loaded.failures,
        entities: Vec::new(),
    };

    for schema in &loaded.schemas {
        let rendered = render_entity(schema, config);
        let module = &rendered.module;

        let outcome = match module.write() {
            Ok(()) => {
                info!(
                    entity = %schema.name,
                    path = %module.path.display(),
                    checksum = module.checksum.short(),
                    "wrote module"
                );
                Outcome::Written {
                    path: module.path.clone(),
                    checksum: module.checksum.clone(),
                }
            }
            Err(e) => {
                error!(entity = %schema.name, error = %e, "emission failed");
                Outcome::Failed(e.to_string())
            }
        };

        report.entities.push(EntityReport {
            entity: schema.name.clone(),
            model_name: module.model_name.clone(),
            outcome,
            diagnostics: rendered.translation.diagnostics,
        });
    }

    Ok(report)
}

/// Build live models for every loadable definition file
pub fn build_models(config: &ModelgenConfig) -> Result<(ModelRegistry, GenerationReport)> {
    let loaded = load_schemas(&config.input)?;
    let mut registry = ModelRegistry::with_options(emit_options(config));
    let mut report = GenerationReport {
        load_failures: loaded.failures,
        entities: Vec::new(),
    };

    for schema in loaded.schemas {
        let Translation {
            schema: translated,
            diagnostics,
        } = translate(&schema);
        let indexes = infer_indexes(&translated, &config.indexes);

        let outcome = match registry.register(&schema.name, translated, indexes) {
            Ok(_) => Outcome::Built,
            Err(e) => {
                error!(entity = %schema.name, error = %e, "model construction failed");
                Outcome::Failed(e.to_string())
            }
        };

        report.entities.push(EntityReport {
            model_name: model_name(&schema.name),
            entity: schema.name,
            outcome,
            diagnostics,
        });
    }

    Ok((registry, report))
}

/// Compare freshly rendered modules against the files on disk
pub fn check_drift(config: &ModelgenConfig) -> Result<DriftReport> {
    let loaded = load_schemas(&config.input)?;
    let mut report = DriftReport {
        load_failures: loaded.failures,
        entries: Vec::new(),
    };

    for schema in &loaded.schemas {
        let module = render_entity(schema, config).module;

        let status = match fs::read_to_string(&module.path) {
            Ok(on_disk) if module.checksum.verify(&on_disk) => DriftStatus::UpToDate,
            Ok(on_disk) => {
                let diff = TextDiff::from_lines(&on_disk, &module.code)
                    .unified_diff()
                    .context_radius(3)
                    .header("on disk", "generated")
                    .to_string();
                warn!(entity = %schema.name, path = %module.path.display(), "module is stale");
                DriftStatus::Changed { diff }
            }
            Err(_) => {
                warn!(entity = %schema.name, path = %module.path.display(), "module missing");
                DriftStatus::Missing
            }
        };

        report.entries.push(DriftEntry {
            entity: schema.name.clone(),
            path: module.path,
            status,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_definitions(dir: &Path) {
        fs::write(
            dir.join("books.zod.json"),
            r#"{ "booksSchema": { "type": "object", "shape": {
                "title": { "type": "string", "checks": [{ "kind": "min", "value": 1 }] },
                "extra": { "type": "union", "options": [
                    { "type": "string" },
                    { "type": "number" }
                ] }
            } } }"#,
        )
        .unwrap();
        fs::write(
            dir.join("users.zod.json"),
            r#"{ "type": "object", "shape": {
                "email": { "type": "string", "checks": [{ "kind": "email" }] },
                "coords": { "type": "tuple" }
            } }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_generate_then_check() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("schema");
        fs::create_dir_all(&input).unwrap();
        write_definitions(&input);
        let config = ModelgenConfig::with_dirs(&input, dir.path().join("models"));

        let before = check_drift(&config).unwrap();
        assert!(before.has_drift());
        assert!(before.entries.iter().all(|e| e.status == DriftStatus::Missing));

        let report = generate_files(&config).unwrap();
        assert!(!report.has_fatal());
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.warning_count(), 1);
        assert!(dir.path().join("models/books.generated.js").is_file());

        let after = check_drift(&config).unwrap();
        assert!(!after.has_drift());
    }

    #[test]
    fn test_hand_edit_detected() {
        let dir = tempdir().unwrap();
        write_definitions(dir.path());
        let config = ModelgenConfig::with_dirs(dir.path(), dir.path().join("out"));
        generate_files(&config).unwrap();

        let path = config.output_path("users");
        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("required: true", "required: false");
        fs::write(&path, edited).unwrap();

        let drift = check_drift(&config).unwrap();
        let entry = drift.drifted().next().unwrap();
        assert_eq!(entry.entity, "users");
        match &entry.status {
            DriftStatus::Changed { diff } => assert!(diff.contains("+  email")),
            other => panic!("Expected Changed, got {:?}", other),
        }
    }

    #[test]
    fn test_render_lists_entities_and_summary() {
        let dir = tempdir().unwrap();
        write_definitions(dir.path());
        fs::write(dir.path().join("broken.zod.json"), "[").unwrap();
        let config = ModelgenConfig::with_dirs(dir.path(), dir.path().join("out"));

        let report = generate_files(&config).unwrap();
        assert!(report.has_fatal());
        let text = report.render();
        assert!(text.contains("❌ broken"));
        assert!(text.contains("✅ Books"));
        assert!(text.contains("W001"));
        assert!(text.contains("I001"));
        assert!(text.contains("2 succeeded, 1 warning(s), 1 failed"));
    }

    #[test]
    fn test_build_models() {
        let dir = tempdir().unwrap();
        write_definitions(dir.path());
        let config = ModelgenConfig::with_dirs(dir.path(), dir.path().join("out"));

        let (registry, report) = build_models(&config).unwrap();
        assert!(!report.has_fatal());
        assert_eq!(registry.names(), vec!["Books", "Users"]);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_render_named_unknown_entity() {
        let dir = tempdir().unwrap();
        let config = ModelgenConfig::with_dirs(dir.path(), dir.path().join("out"));
        assert!(matches!(
            render_named(&config, "ghosts"),
            Err(ModelgenError::EntityNotFound(_))
        ));
    }
}
