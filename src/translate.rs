//! Schema Translation
//!
//! Maps normalized entity schemas into the document-model vocabulary
//! (`String`, `Number`, `Boolean`, `Date`, `Mixed`, arrays and inline
//! sub-documents). The resulting `TranslatedSchema` is the single intermediate
//! representation consumed by every sink: the module emitter, the collection
//! validator and the live model registry.
//!
//! Translation is pure. Fallbacks are recorded as diagnostics, never errors.

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::descriptor::{EntitySchema, FieldDescriptor, FieldKind};
use crate::diagnostics::Diagnostics;

/// Pattern attached to string fields carrying an email check
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

// =============================================================================
// Target Vocabulary
// =============================================================================

/// Document-model type of a translated field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of")]
pub enum TargetType {
    String,
    Number,
    Boolean,
    Date,
    /// Any value
    Mixed,
    Array(Box<FieldSpec>),
    Object(Vec<TranslatedField>),
}

impl TargetType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Mixed => "Mixed",
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
        }
    }

    /// Whether `value` is a plausible default for this type
    pub fn accepts_default(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Mixed, _) => true,
            (Self::String, v) => v.is_string(),
            (Self::Number, v) => v.is_number(),
            (Self::Boolean, v) => v.is_boolean(),
            (Self::Date, v) => v.is_string() || v.is_number(),
            (Self::Array(_), v) => v.is_array(),
            (Self::Object(_), v) => v.is_object(),
        }
    }
}

/// Type, constraints and modifiers of one translated field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub ty: TargetType,
    pub required: bool,
    /// `None` means no default; `Some(false)`, `Some(0)` and `Some("")` are real defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub integer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl FieldSpec {
    pub fn new(ty: TargetType, required: bool) -> Self {
        Self {
            ty,
            required,
            default: None,
            min: None,
            max: None,
            integer: false,
            min_length: None,
            max_length: None,
            pattern: None,
            enum_values: None,
        }
    }

    /// Element spec when this is an array field
    pub fn element(&self) -> Option<&FieldSpec> {
        match &self.ty {
            TargetType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Nested fields when this is a sub-document, or an array of them
    pub fn nested_fields(&self) -> Option<&[TranslatedField]> {
        match &self.ty {
            TargetType::Object(fields) => Some(fields),
            TargetType::Array(element) => element.nested_fields(),
            _ => None,
        }
    }
}

/// A named translated field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedField {
    pub name: String,
    #[serde(flatten)]
    pub spec: FieldSpec,
}

/// Target-vocabulary equivalent of an `EntitySchema`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedSchema {
    pub name: String,
    pub fields: Vec<TranslatedField>,
}

impl TranslatedSchema {
    pub fn field(&self, name: &str) -> Option<&TranslatedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

// =============================================================================
// Translation
// =============================================================================

/// Output of translating one entity
#[derive(Debug, Clone)]
pub struct Translation {
    pub schema: TranslatedSchema,
    pub diagnostics: Diagnostics,
}

/// Translate an entity schema into the document-model vocabulary
pub fn translate(entity: &EntitySchema) -> Translation {
    let mut translator = Translator {
        entity: &entity.name,
        diagnostics: Diagnostics::new(),
    };
    let fields = translator.translate_fields(&entity.fields, "");
    debug!(entity = %entity.name, fields = fields.len(), "translated schema");

    Translation {
        schema: TranslatedSchema {
            name: entity.name.clone(),
            fields,
        },
        diagnostics: translator.diagnostics,
    }
}

struct Translator<'a> {
    entity: &'a str,
    diagnostics: Diagnostics,
}

impl Translator<'_> {
    fn translate_fields(
        &mut self,
        fields: &[FieldDescriptor],
        parent: &str,
    ) -> Vec<TranslatedField> {
        fields
            .iter()
            .map(|field| {
                let path = join_path(parent, &field.name);
                TranslatedField {
                    name: field.name.clone(),
                    spec: self.translate_field(field, &path),
                }
            })
            .collect()
    }

    fn translate_field(&mut self, field: &FieldDescriptor, path: &str) -> FieldSpec {
        let mut spec = FieldSpec::new(TargetType::Mixed, field.is_required());
        spec.default = field.default_value.clone();

        match &field.kind {
            FieldKind::String(c) => {
                spec.ty = TargetType::String;
                spec.min_length = c.min_length;
                spec.max_length = c.max_length;
                spec.pattern = if c.email {
                    Some(EMAIL_PATTERN.to_string())
                } else {
                    c.pattern.clone()
                };
            }
            FieldKind::Number(c) => {
                spec.ty = TargetType::Number;
                spec.min = c.min.clone();
                spec.max = c.max.clone();
                spec.integer = c.integer;
            }
            FieldKind::Boolean => spec.ty = TargetType::Boolean,
            FieldKind::Date => spec.ty = TargetType::Date,
            FieldKind::Enum { members } => {
                if members.is_empty() {
                    self.diagnostics.empty_enum(self.entity, path);
                }
                spec.ty = TargetType::String;
                spec.enum_values = Some(members.iter().cloned().map(Value::String).collect());
            }
            FieldKind::Literal { value } => {
                spec.ty = match value {
                    Value::String(_) => TargetType::String,
                    Value::Number(_) => TargetType::Number,
                    Value::Bool(_) => TargetType::Boolean,
                    _ => TargetType::Mixed,
                };
                spec.enum_values = Some(vec![value.clone()]);
            }
            FieldKind::Array { element } => {
                let element_path = join_path(path, &element.name);
                spec.ty = TargetType::Array(Box::new(self.translate_field(element, &element_path)));
            }
            FieldKind::Object { fields } => {
                spec.ty = TargetType::Object(self.translate_fields(fields, path));
            }
            FieldKind::Union { options } => {
                // Branches are not enumerated; any value is accepted
                debug!(entity = self.entity, field = path, "union stored as Mixed");
                self.diagnostics.union_fallback(self.entity, path, options.len());
            }
            FieldKind::Unmodeled { type_name } => {
                warn!(
                    entity = self.entity,
                    field = path,
                    type_name = type_name.as_str(),
                    "unhandled type, falling back to String"
                );
                self.diagnostics.unhandled(self.entity, path, type_name);
                spec.ty = TargetType::String;
            }
        }

        if let Some(default) = &spec.default {
            if !spec.ty.accepts_default(default) {
                self.diagnostics.default_mismatch(self.entity, path, spec.ty.tag());
            }
        }

        spec
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.starts_with('[') {
        format!("{}{}", parent, name)
    } else {
        format!("{}.{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NumberConstraints, StringConstraints, TypeNode};
    use crate::diagnostics::DiagnosticCode;
    use serde_json::json;

    fn entity(fields: Vec<(&str, TypeNode)>) -> EntitySchema {
        EntitySchema::from_node("things", &TypeNode::object(fields)).unwrap()
    }

    fn number(n: i64) -> Option<Number> {
        Some(Number::from(n))
    }

    #[test]
    fn test_scalar_constraints_carried_verbatim() {
        let schema = entity(vec![
            (
                "title",
                TypeNode::string_with(StringConstraints {
                    min_length: Some(1),
                    max_length: Some(200),
                    ..Default::default()
                }),
            ),
            (
                "pages",
                TypeNode::number_with(NumberConstraints {
                    min: number(1),
                    max: number(10000),
                    integer: true,
                })
                .optional(),
            ),
            ("published", TypeNode::boolean()),
            ("released", TypeNode::date().nullable()),
        ]);
        let t = translate(&schema).schema;

        let title = &t.field("title").unwrap().spec;
        assert_eq!(title.ty, TargetType::String);
        assert_eq!(title.min_length, Some(1));
        assert_eq!(title.max_length, Some(200));
        assert!(title.required);

        let pages = &t.field("pages").unwrap().spec;
        assert_eq!(pages.ty, TargetType::Number);
        assert_eq!(pages.min, number(1));
        assert_eq!(pages.max, number(10000));
        assert!(pages.integer);
        assert!(!pages.required);
        assert!(!title.integer);

        assert_eq!(t.field("published").unwrap().spec.ty, TargetType::Boolean);
        let released = &t.field("released").unwrap().spec;
        assert_eq!(released.ty, TargetType::Date);
        assert!(!released.required);
    }

    #[test]
    fn test_email_pattern_attached() {
        let schema = entity(vec![(
            "email",
            TypeNode::string_with(StringConstraints {
                email: true,
                ..Default::default()
            }),
        )]);
        let t = translate(&schema).schema;
        assert_eq!(t.fields[0].spec.pattern.as_deref(), Some(EMAIL_PATTERN));
    }

    #[test]
    fn test_enum_order_preserved() {
        let schema = entity(vec![("grade", TypeNode::enumeration(["a", "b", "c"]))]);
        let t = translate(&schema).schema;
        let spec = &t.fields[0].spec;
        assert_eq!(spec.ty, TargetType::String);
        assert_eq!(spec.enum_values, Some(vec![json!("a"), json!("b"), json!("c")]));
    }

    #[test]
    fn test_literal_typed_by_value() {
        let schema = entity(vec![
            ("kind", TypeNode::literal("book")),
            ("version", TypeNode::literal(2)),
        ]);
        let t = translate(&schema).schema;
        assert_eq!(t.fields[0].spec.ty, TargetType::String);
        assert_eq!(t.fields[0].spec.enum_values, Some(vec![json!("book")]));
        assert_eq!(t.fields[1].spec.ty, TargetType::Number);
        assert_eq!(t.fields[1].spec.enum_values, Some(vec![json!(2)]));
    }

    #[test]
    fn test_falsy_defaults_are_distinguishable() {
        let schema = entity(vec![
            ("featured", TypeNode::boolean().with_default(false)),
            ("views", TypeNode::number().with_default(0)),
            ("note", TypeNode::string().with_default("")),
            ("plain", TypeNode::string()),
        ]);
        let t = translate(&schema).schema;
        assert_eq!(t.fields[0].spec.default, Some(json!(false)));
        assert_eq!(t.fields[1].spec.default, Some(json!(0)));
        assert_eq!(t.fields[2].spec.default, Some(json!("")));
        assert_eq!(t.fields[3].spec.default, None);
        assert!(t.fields[..3].iter().all(|f| !f.spec.required));
    }

    #[test]
    fn test_array_of_objects_keeps_element_schema() {
        let schema = entity(vec![(
            "attachments",
            TypeNode::array(TypeNode::object(vec![
                ("filename", TypeNode::string()),
                ("size", TypeNode::number()),
            ])),
        )]);
        let t = translate(&schema).schema;

        let element = t.fields[0].spec.element().unwrap();
        match &element.ty {
            TargetType::Object(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "filename");
                assert_eq!(fields[0].spec.ty, TargetType::String);
                assert_eq!(fields[1].name, "size");
                assert_eq!(fields[1].spec.ty, TargetType::Number);
            }
            other => panic!("Expected Object element, got {:?}", other),
        }
    }

    #[test]
    fn test_array_of_primitives() {
        let schema = entity(vec![(
            "tags",
            TypeNode::array(TypeNode::string_with(StringConstraints {
                max_length: Some(30),
                ..Default::default()
            }))
            .optional(),
        )]);
        let t = translate(&schema).schema;
        let element = t.fields[0].spec.element().unwrap();
        assert_eq!(element.ty, TargetType::String);
        assert_eq!(element.max_length, Some(30));
        assert!(!t.fields[0].spec.required);
    }

    #[test]
    fn test_nested_object_order_and_depth() {
        let schema = entity(vec![(
            "address",
            TypeNode::object(vec![
                ("street", TypeNode::string()),
                (
                    "geo",
                    TypeNode::object(vec![
                        ("lat", TypeNode::number()),
                        ("lng", TypeNode::number()),
                    ]),
                ),
            ])
            .optional(),
        )]);
        let t = translate(&schema).schema;
        let address = t.fields[0].spec.nested_fields().unwrap();
        assert_eq!(address[0].name, "street");
        let geo = address[1].spec.nested_fields().unwrap();
        assert_eq!(geo.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["lat", "lng"]);
    }

    /// Unions are deliberately stored as Mixed rather than enumerating their branches
    #[test]
    fn test_union_falls_back_to_mixed() {
        let schema = entity(vec![(
            "score",
            TypeNode::union(vec![TypeNode::string(), TypeNode::number()]),
        )]);
        let translation = translate(&schema);
        assert_eq!(translation.schema.fields[0].spec.ty, TargetType::Mixed);

        let diags = &translation.diagnostics;
        assert_eq!(diags.with_code(DiagnosticCode::UnionFallback).count(), 1);
        assert_eq!(diags.unhandled_types().count(), 0);
    }

    #[test]
    fn test_unmodeled_kind_warns_with_entity_and_field() {
        let schema = entity(vec![(
            "meta",
            TypeNode::object(vec![("coords", TypeNode::unmodeled("tuple"))]),
        )]);
        let translation = translate(&schema);
        let coords = &translation.schema.fields[0].spec.nested_fields().unwrap()[0];
        assert_eq!(coords.spec.ty, TargetType::String);

        let warning = translation.diagnostics.unhandled_types().next().unwrap();
        assert_eq!(warning.entity, "things");
        assert_eq!(warning.field_path, "meta.coords");
        assert!(warning.message.contains("tuple"));
        assert_eq!(translation.diagnostics.with_code(DiagnosticCode::UnionFallback).count(), 0);
    }

    #[test]
    fn test_default_mismatch_reported() {
        let schema = entity(vec![("rating", TypeNode::number().with_default("high"))]);
        let translation = translate(&schema);
        assert_eq!(translation.schema.fields[0].spec.default, Some(json!("high")));
        let item = translation
            .diagnostics
            .with_code(DiagnosticCode::DefaultTypeMismatch)
            .next()
            .unwrap();
        assert_eq!(item.field_path, "rating");
    }

    #[test]
    fn test_element_paths() {
        let schema = entity(vec![(
            "items",
            TypeNode::array(TypeNode::object(vec![("shape", TypeNode::unmodeled("set"))])),
        )]);
        let translation = translate(&schema);
        let warning = translation.diagnostics.unhandled_types().next().unwrap();
        assert_eq!(warning.field_path, "items[].shape");
    }
}
