//! Model Registry
//!
//! Builds live, in-memory document models from translated schemas. A model
//! enforces the same rules the emitted module declares: required fields,
//! types, enum membership, numeric bounds, string lengths and patterns.
//!
//! The registry is a plain owned value; nothing here is process-global.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::codegen::{model_name, EmitOptions};
use crate::error::{FieldError, ModelgenError, Result, ValidationError};
use crate::indexes::{IndexDirection, IndexSpec};
use crate::translate::{FieldSpec, TargetType, TranslatedField, TranslatedSchema};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";
const ID: &str = "_id";

// =============================================================================
// Registry
// =============================================================================

/// Live models keyed by model name, in registration order
#[derive(Debug, Default)]
pub struct ModelRegistry {
    options: EmitOptions,
    models: Vec<Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EmitOptions) -> Self {
        Self {
            options,
            models: Vec::new(),
        }
    }

    /// Construct and register the model for `entity`
    pub fn register(
        &mut self,
        entity: &str,
        schema: TranslatedSchema,
        indexes: Vec<IndexSpec>,
    ) -> Result<&mut Model> {
        let name = model_name(entity);
        if self.model(&name).is_some() {
            return Err(ModelgenError::construction(&name, "model already registered"));
        }

        let model = Model::build(&name, entity, schema, indexes, self.options)?;
        info!(
            model = %model.name,
            fields = model.schema.fields.len(),
            indexes = model.indexes.len(),
            "registered model"
        );

        let position = self.models.len();
        self.models.push(model);
        Ok(&mut self.models[position])
    }

    /// Look up a model by its name (`Books`)
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// =============================================================================
// Model
// =============================================================================

/// A live model: schema, indexes and the documents inserted so far
#[derive(Debug)]
pub struct Model {
    name: String,
    collection: String,
    schema: TranslatedSchema,
    indexes: Vec<IndexSpec>,
    timestamps: bool,
    /// Compiled `match` patterns, keyed by source
    patterns: HashMap<String, Regex>,
    documents: Vec<Value>,
    /// field -> JSON-encoded value -> document positions
    index_maps: HashMap<String, HashMap<String, Vec<usize>>>,
    next_id: u64,
}

impl Model {
    fn build(
        name: &str,
        entity: &str,
        schema: TranslatedSchema,
        indexes: Vec<IndexSpec>,
        options: EmitOptions,
    ) -> Result<Self> {
        let mut patterns = HashMap::new();
        compile_patterns(name, &schema.fields, "", &mut patterns)?;

        let mut index_maps = HashMap::new();
        for index in &indexes {
            if !schema.has_field(&index.field) {
                return Err(ModelgenError::construction(
                    name,
                    format!("index on unknown field '{}'", index.field),
                ));
            }
            if index.direction != IndexDirection::Text {
                index_maps.insert(index.field.clone(), HashMap::new());
            }
        }

        Ok(Self {
            name: name.to_string(),
            collection: entity.to_string(),
            schema,
            indexes,
            timestamps: options.timestamps,
            patterns,
            documents: Vec::new(),
            index_maps,
            next_id: 1,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn schema(&self) -> &TranslatedSchema {
        &self.schema
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Validate a document, returning it normalized
    ///
    /// Defaults are applied for missing fields and undeclared keys are dropped.
    /// Every failing path is reported, not just the first.
    pub fn validate(&self, doc: &Value) -> std::result::Result<Value, ValidationError> {
        self.validate_document(doc).map(Value::Object)
    }

    /// Validate and store a document
    ///
    /// Assigns `_id` unless the document carries one, and stamps
    /// `createdAt`/`updatedAt` when timestamps are enabled. A carried `_id`
    /// must not collide with a stored document.
    pub fn insert(&mut self, doc: &Value) -> std::result::Result<&Value, ValidationError> {
        let fields = self.validate_document(doc)?;

        let id = match doc.get(ID) {
            Some(id) if !id.is_null() => id.clone(),
            _ => Value::from(self.next_id),
        };
        if self.documents.iter().any(|stored| stored.get(ID) == Some(&id)) {
            return Err(ValidationError {
                model: self.name.clone(),
                errors: vec![FieldError {
                    path: ID.to_string(),
                    message: format!("duplicate key {}", id),
                }],
            });
        }
        if let Some(n) = id.as_u64().filter(|n| *n >= self.next_id) {
            self.next_id = n + 1;
        }

        let mut stored = Map::new();
        stored.insert(ID.to_string(), id);
        stored.extend(fields);

        if self.timestamps {
            let now = Value::String(Utc::now().to_rfc3339());
            for key in [CREATED_AT, UPDATED_AT] {
                if !stored.contains_key(key) {
                    let carried = doc.get(key).filter(|v| !v.is_null()).cloned();
                    stored.insert(key.to_string(), carried.unwrap_or_else(|| now.clone()));
                }
            }
        }

        let position = self.documents.len();
        for (field, map) in self.index_maps.iter_mut() {
            if let Some(value) = stored.get(field) {
                map.entry(value.to_string()).or_default().push(position);
            }
        }
        self.documents.push(Value::Object(stored));

        Ok(&self.documents[position])
    }

    /// Documents whose top-level `field` equals `value`
    pub fn find(&self, field: &str, value: &Value) -> Vec<&Value> {
        match self.index_maps.get(field) {
            Some(map) => map
                .get(&value.to_string())
                .map(|positions| positions.iter().map(|&p| &self.documents[p]).collect())
                .unwrap_or_default(),
            None => self
                .documents
                .iter()
                .filter(|doc| doc.get(field) == Some(value))
                .collect(),
        }
    }

    /// Case-insensitive substring search over the text-indexed fields
    pub fn text_search(&self, term: &str) -> Vec<&Value> {
        let term = term.to_lowercase();
        let fields: Vec<&str> = self
            .indexes
            .iter()
            .filter(|i| i.direction == IndexDirection::Text)
            .map(|i| i.field.as_str())
            .collect();
        if fields.is_empty() || term.is_empty() {
            return Vec::new();
        }

        self.documents
            .iter()
            .filter(|doc| {
                fields.iter().any(|field| {
                    doc.get(*field)
                        .and_then(Value::as_str)
                        .map_or(false, |text| text.to_lowercase().contains(&term))
                })
            })
            .collect()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate_document(
        &self,
        doc: &Value,
    ) -> std::result::Result<Map<String, Value>, ValidationError> {
        let mut errors = Vec::new();

        let normalized = match doc.as_object() {
            Some(object) => self.validate_object(&self.schema.fields, object, "", &mut errors),
            None => {
                let message = format!("expected object, got {}", json_type(doc));
                push_error(&mut errors, "$root", message);
                Map::new()
            }
        };

        if errors.is_empty() {
            Ok(normalized)
        } else {
            debug!(model = %self.name, errors = errors.len(), "document rejected");
            Err(ValidationError {
                model: self.name.clone(),
                errors,
            })
        }
    }

    fn validate_object(
        &self,
        fields: &[TranslatedField],
        object: &Map<String, Value>,
        prefix: &str,
        errors: &mut Vec<FieldError>,
    ) -> Map<String, Value> {
        let mut normalized = Map::new();

        for field in fields {
            let path = make_path(prefix, &field.name);
            match object.get(&field.name) {
                None | Some(Value::Null) if field.spec.required => {
                    push_error(errors, &path, "is required");
                }
                Some(Value::String(s))
                    if s.is_empty() && field.spec.required && field.spec.ty == TargetType::String =>
                {
                    push_error(errors, &path, "is required");
                }
                None => {
                    if let Some(default) = &field.spec.default {
                        normalized.insert(field.name.clone(), default.clone());
                    }
                }
                Some(Value::Null) => {
                    normalized.insert(field.name.clone(), Value::Null);
                }
                Some(value) => {
                    let value = self.validate_value(&field.spec, value, &path, errors);
                    normalized.insert(field.name.clone(), value);
                }
            }
        }

        normalized
    }

    fn validate_value(
        &self,
        spec: &FieldSpec,
        value: &Value,
        path: &str,
        errors: &mut Vec<FieldError>,
    ) -> Value {
        match (&spec.ty, value) {
            (TargetType::Mixed, _) => {}
            (TargetType::String, Value::String(s)) => {
                let length = s.chars().count() as u64;
                if let Some(min) = spec.min_length.filter(|min| length < *min) {
                    let message = format!("is shorter than the minimum allowed length ({})", min);
                    push_error(errors, path, message);
                }
                if let Some(max) = spec.max_length.filter(|max| length > *max) {
                    let message = format!("is longer than the maximum allowed length ({})", max);
                    push_error(errors, path, message);
                }
                if let Some(pattern) = &spec.pattern {
                    if let Some(regex) = self.patterns.get(pattern) {
                        if !regex.is_match(s) {
                            push_error(errors, path, format!("does not match /{}/", pattern));
                        }
                    }
                }
            }
            (TargetType::Number, Value::Number(number)) => {
                let n = number.as_f64().unwrap_or(f64::NAN);
                let bound = |b: &serde_json::Number| b.as_f64().unwrap_or(f64::NAN);
                if let Some(min) = spec.min.as_ref().filter(|min| n < bound(*min)) {
                    let message = format!("is less than minimum allowed value ({})", min);
                    push_error(errors, path, message);
                }
                if let Some(max) = spec.max.as_ref().filter(|max| n > bound(*max)) {
                    let message = format!("is more than maximum allowed value ({})", max);
                    push_error(errors, path, message);
                }
                if spec.integer && number.is_f64() && n.fract() != 0.0 {
                    push_error(errors, path, "is not an integer");
                }
            }
            (TargetType::Boolean, Value::Bool(_)) => {}
            (TargetType::Date, v) if is_date(v) => {}
            (TargetType::Array(element), Value::Array(items)) => {
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = format!("{}.{}", path, i);
                        if item.is_null() {
                            return Value::Null;
                        }
                        self.validate_value(element, item, &item_path, errors)
                    })
                    .collect();
                return Value::Array(items);
            }
            (TargetType::Object(fields), Value::Object(object)) => {
                return Value::Object(self.validate_object(fields, object, path, errors));
            }
            (ty, v) => {
                push_error(errors, path, format!("expected {}, got {}", ty.tag(), json_type(v)));
                return value.clone();
            }
        }

        if let Some(allowed) = &spec.enum_values {
            if !allowed.contains(value) {
                push_error(errors, path, format!("{} is not a valid enum value", value));
            }
        }

        value.clone()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn compile_patterns(
    model: &str,
    fields: &[TranslatedField],
    prefix: &str,
    patterns: &mut HashMap<String, Regex>,
) -> Result<()> {
    for field in fields {
        let path = make_path(prefix, &field.name);
        compile_spec(model, &field.spec, &path, patterns)?;
    }
    Ok(())
}

fn compile_spec(
    model: &str,
    spec: &FieldSpec,
    path: &str,
    patterns: &mut HashMap<String, Regex>,
) -> Result<()> {
    if let Some(pattern) = &spec.pattern {
        if !patterns.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| {
                let message = format!("invalid match pattern at {}: {}", path, e);
                ModelgenError::construction(model, message)
            })?;
            patterns.insert(pattern.clone(), regex);
        }
    }
    match &spec.ty {
        TargetType::Object(fields) => compile_patterns(model, fields, path, patterns),
        TargetType::Array(element) => {
            compile_spec(model, element, &format!("{}.$", path), patterns)
        }
        _ => Ok(()),
    }
}

fn push_error(errors: &mut Vec<FieldError>, path: &str, message: impl Into<String>) {
    errors.push(FieldError {
        path: path.to_string(),
        message: message.into(),
    });
}

fn make_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// RFC 3339 timestamps, `YYYY-MM-DD` dates and epoch milliseconds
fn is_date(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            DateTime::parse_from_rfc3339(s).is_ok()
                || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
