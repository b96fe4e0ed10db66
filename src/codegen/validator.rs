//! Collection validator emitter
//!
//! Renders a `TranslatedSchema` as a MongoDB `$jsonSchema` validator document,
//! suitable for `collMod` or `createCollection`.

use serde_json::{json, Map, Value};

use crate::translate::{FieldSpec, TargetType, TranslatedField, TranslatedSchema};

/// Top-level keys the database or the timestamps option manage
const MANAGED_FIELDS: &[&str] = &["_id", "createdAt", "updatedAt"];

/// Render the `$jsonSchema` validator for a schema
pub fn render_validator(schema: &TranslatedSchema) -> Value {
    let fields: Vec<&TranslatedField> = schema
        .fields
        .iter()
        .filter(|f| !MANAGED_FIELDS.contains(&f.name.as_str()))
        .collect();
    json!({ "$jsonSchema": object_schema(&fields) })
}

fn object_schema(fields: &[&TranslatedField]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let nullable = !field.spec.required;
        properties.insert(field.name.clone(), field_schema(&field.spec, nullable));
        if field.spec.required {
            required.push(Value::String(field.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("bsonType".to_string(), json!("object"));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    Value::Object(schema)
}

fn field_schema(spec: &FieldSpec, nullable: bool) -> Value {
    let mut schema = Map::new();

    if let Some(bson_type) = bson_type(&spec.ty) {
        // Optional properties may be stored as null
        let ty = if nullable {
            json!([bson_type, "null"])
        } else {
            json!(bson_type)
        };
        schema.insert("bsonType".to_string(), ty);
    }

    match &spec.ty {
        TargetType::Object(fields) => {
            let nested: Vec<&TranslatedField> = fields.iter().collect();
            if let Value::Object(object) = object_schema(&nested) {
                schema.extend(object.into_iter().filter(|(k, _)| k != "bsonType"));
            }
        }
        TargetType::Array(element) => {
            schema.insert("items".to_string(), field_schema(element, false));
        }
        _ => {}
    }

    if let Some(values) = &spec.enum_values {
        // enum is checked independently of bsonType
        let mut values = values.clone();
        if nullable && !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
        schema.insert("enum".to_string(), Value::Array(values));
    }
    if let Some(min) = &spec.min {
        schema.insert("minimum".to_string(), Value::Number(min.clone()));
    }
    if let Some(max) = &spec.max {
        schema.insert("maximum".to_string(), Value::Number(max.clone()));
    }
    if spec.integer {
        schema.insert("multipleOf".to_string(), json!(1));
    }
    if let Some(min_length) = spec.min_length {
        schema.insert("minLength".to_string(), json!(min_length));
    }
    if let Some(max_length) = spec.max_length {
        schema.insert("maxLength".to_string(), json!(max_length));
    }
    if let Some(pattern) = &spec.pattern {
        schema.insert("pattern".to_string(), json!(pattern));
    }

    Value::Object(schema)
}

fn bson_type(ty: &TargetType) -> Option<&'static str> {
    match ty {
        TargetType::String => Some("string"),
        TargetType::Number => Some("number"),
        TargetType::Boolean => Some("bool"),
        TargetType::Date => Some("date"),
        TargetType::Array(_) => Some("array"),
        TargetType::Object(_) => Some("object"),
        TargetType::Mixed => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EntitySchema, NumberConstraints, StringConstraints, TypeNode};
    use crate::translate::translate;
    use serde_json::Number;

    fn translated(fields: Vec<(&str, TypeNode)>) -> TranslatedSchema {
        let entity = EntitySchema::from_node("books", &TypeNode::object(fields)).unwrap();
        translate(&entity).schema
    }

    #[test]
    fn test_scalar_keywords() {
        let schema = translated(vec![
            (
                "title",
                TypeNode::string_with(StringConstraints {
                    min_length: Some(1),
                    max_length: Some(200),
                    ..Default::default()
                }),
            ),
            (
                "rating",
                TypeNode::number_with(NumberConstraints {
                    min: Some(Number::from(1)),
                    max: Some(Number::from(5)),
                    integer: true,
                })
                .optional(),
            ),
            ("category", TypeNode::enumeration(["technical", "other"])),
        ]);
        let validator = render_validator(&schema);
        let root = &validator["$jsonSchema"];

        assert_eq!(root["bsonType"], "object");
        assert_eq!(root["required"], json!(["title", "category"]));
        assert_eq!(
            root["properties"]["title"],
            json!({ "bsonType": "string", "minLength": 1, "maxLength": 200 })
        );
        assert_eq!(
            root["properties"]["rating"],
            json!({
                "bsonType": ["number", "null"],
                "minimum": 1,
                "maximum": 5,
                "multipleOf": 1
            })
        );
        assert_eq!(root["properties"]["category"]["enum"], json!(["technical", "other"]));
    }

    #[test]
    fn test_optional_enum_accepts_null() {
        let schema = translated(vec![
            ("role", TypeNode::enumeration(["user", "admin"]).with_default("user")),
            ("status", TypeNode::enumeration(["active", "banned"]).nullable()),
            ("kind", TypeNode::literal("ebook")),
            ("labels", TypeNode::array(TypeNode::enumeration(["a", "b"])).optional()),
        ]);
        let validator = render_validator(&schema);
        let props = &validator["$jsonSchema"]["properties"];

        assert_eq!(props["role"]["bsonType"], json!(["string", "null"]));
        assert_eq!(props["role"]["enum"], json!(["user", "admin", null]));
        assert_eq!(props["status"]["enum"], json!(["active", "banned", null]));
        assert_eq!(props["kind"]["enum"], json!(["ebook"]));
        assert_eq!(props["labels"]["items"]["enum"], json!(["a", "b"]));
    }

    #[test]
    fn test_nested_and_arrays() {
        let schema = translated(vec![
            (
                "attachments",
                TypeNode::array(TypeNode::object(vec![
                    ("filename", TypeNode::string()),
                    ("size", TypeNode::number().optional()),
                ])),
            ),
            ("extra", TypeNode::union(vec![TypeNode::string(), TypeNode::boolean()])),
        ]);
        let validator = render_validator(&schema);
        let props = &validator["$jsonSchema"]["properties"];

        let items = &props["attachments"]["items"];
        assert_eq!(items["bsonType"], "object");
        assert_eq!(items["required"], json!(["filename"]));
        assert_eq!(items["properties"]["size"]["bsonType"], json!(["number", "null"]));
        assert_eq!(props["extra"], json!({}));
    }

    #[test]
    fn test_managed_fields_skipped() {
        let schema = translated(vec![
            ("_id", TypeNode::string()),
            ("createdAt", TypeNode::date()),
            ("name", TypeNode::string()),
        ]);
        let validator = render_validator(&schema);
        let props = validator["$jsonSchema"]["properties"].as_object().unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["name"]);
    }
}
