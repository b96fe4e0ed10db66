//! modelgen
//!
//! Translates declarative validation-schema definitions into document-model
//! definitions: generated Mongoose model modules, MongoDB collection
//! validators, and live in-memory models.
//!
//! ## Features
//!
//! - **Faithful Translation**: Field order, constraints, defaults and nesting survive intact
//! - **Explicit Fallbacks**: Unions and unmodeled kinds are reported, never silently lost
//! - **Index Inference**: Conventional fields (`email`, `status`, `createdAt`, ...) get indexes
//! - **Drift Checking**: SHA256 checksums and unified diffs against generated files
//!
//! ## Architecture
//!
//! ```text
//! <entity>.zod.json ─▶ loader ─▶ EntitySchema ─▶ translate ─▶ TranslatedSchema
//!                                                                  │
//!                    ┌───────────────────┬─────────────────────────┤
//!                    ▼                   ▼                         ▼
//!            codegen::mongoose   codegen::validator        registry::Model
//!          <entity>.generated.js    $jsonSchema          validate / insert
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod indexes;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod translate;
pub mod unwrap;

pub use checksum::Checksum;
pub use codegen::{render_module, render_validator, EmitOptions, GeneratedModule};
pub use config::ModelgenConfig;
pub use descriptor::{EntitySchema, FieldDescriptor, FieldKind, TypeNode};
pub use diagnostics::{DiagnosticCode, Diagnostics};
pub use error::{ModelgenError, Result, ValidationError};
pub use indexes::{infer_indexes, IndexDirection, IndexSpec};
pub use pipeline::{build_models, check_drift, generate_files, DriftReport, GenerationReport};
pub use registry::{Model, ModelRegistry};
pub use translate::{translate, FieldSpec, TargetType, TranslatedSchema};
