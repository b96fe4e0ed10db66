//! Type-Descriptor Model
//!
//! Two layers of the same information:
//! - `TypeNode`: the source type tree exactly as a definition file states it,
//!   modifier wrappers included
//! - `FieldDescriptor`: one field after unwrapping, carrying a concrete
//!   `FieldKind` plus the collected optional/nullable/default modifiers
//!
//! Parsing walks raw `serde_json::Value` trees. Object shapes keep file order
//! because serde_json is built with `preserve_order`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{ModelgenError, Result};
use crate::unwrap::unwrap;

// =============================================================================
// Constraints
// =============================================================================

/// Constraints collected from a string node's checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Pattern from a `regex` check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub email: bool,
}

/// Constraints collected from a number node's checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default)]
    pub integer: bool,
}

// =============================================================================
// Type Nodes
// =============================================================================

/// A modifier layer wrapped around another node
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Optional,
    Nullable,
    Default(Value),
}

/// Source type tree
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Modified {
        modifier: Modifier,
        inner: Box<TypeNode>,
    },
    Concrete(ConcreteNode),
}

/// A node that is not a modifier
#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteNode {
    String(StringConstraints),
    Number(NumberConstraints),
    Boolean,
    Date,
    Enum { entries: Vec<String> },
    Literal { value: Value },
    Array { element: Box<TypeNode> },
    Object { shape: Vec<(String, TypeNode)> },
    Union { options: Vec<TypeNode> },
    /// A source kind with no mapping, e.g. `tuple`
    Unmodeled { type_name: String },
}

impl ConcreteNode {
    pub fn type_name(&self) -> &str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Enum { .. } => "enum",
            Self::Literal { .. } => "literal",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Union { .. } => "union",
            Self::Unmodeled { type_name } => type_name,
        }
    }
}

impl TypeNode {
    /// Parse a type node from its JSON definition
    pub fn from_value(value: &Value) -> Result<Self> {
        parse_node(value, "$")
    }

    /// Whether a JSON value looks like a type node (has a string `type` tag)
    pub fn is_node(value: &Value) -> bool {
        value.get("type").map(Value::is_string).unwrap_or(false)
    }

    pub fn string() -> Self {
        Self::Concrete(ConcreteNode::String(StringConstraints::default()))
    }

    pub fn string_with(constraints: StringConstraints) -> Self {
        Self::Concrete(ConcreteNode::String(constraints))
    }

    pub fn number() -> Self {
        Self::Concrete(ConcreteNode::Number(NumberConstraints::default()))
    }

    pub fn number_with(constraints: NumberConstraints) -> Self {
        Self::Concrete(ConcreteNode::Number(constraints))
    }

    pub fn boolean() -> Self {
        Self::Concrete(ConcreteNode::Boolean)
    }

    pub fn date() -> Self {
        Self::Concrete(ConcreteNode::Date)
    }

    pub fn enumeration<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Concrete(ConcreteNode::Enum {
            entries: entries.into_iter().map(Into::into).collect(),
        })
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Concrete(ConcreteNode::Literal { value: value.into() })
    }

    pub fn array(element: TypeNode) -> Self {
        Self::Concrete(ConcreteNode::Array {
            element: Box::new(element),
        })
    }

    pub fn object<I, S>(shape: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeNode)>,
        S: Into<String>,
    {
        Self::Concrete(ConcreteNode::Object {
            shape: shape.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn union(options: Vec<TypeNode>) -> Self {
        Self::Concrete(ConcreteNode::Union { options })
    }

    pub fn unmodeled(type_name: impl Into<String>) -> Self {
        Self::Concrete(ConcreteNode::Unmodeled {
            type_name: type_name.into(),
        })
    }

    pub fn optional(self) -> Self {
        self.wrap(Modifier::Optional)
    }

    pub fn nullable(self) -> Self {
        self.wrap(Modifier::Nullable)
    }

    pub fn with_default(self, value: impl Into<Value>) -> Self {
        self.wrap(Modifier::Default(value.into()))
    }

    fn wrap(self, modifier: Modifier) -> Self {
        Self::Modified {
            modifier,
            inner: Box::new(self),
        }
    }
}

// =============================================================================
// Node Parsing
// =============================================================================

fn parse_node(value: &Value, path: &str) -> Result<TypeNode> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelgenError::invalid_node(path, "expected a type node object"))?;
    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelgenError::invalid_node(path, "missing string `type` tag"))?;

    let node = match type_name {
        "optional" => wrapped(Modifier::Optional, obj, path)?,
        "nullable" => wrapped(Modifier::Nullable, obj, path)?,
        "default" => {
            let default_value = obj.get("defaultValue").cloned().ok_or_else(|| {
                ModelgenError::invalid_node(path, "`default` node without `defaultValue`")
            })?;
            wrapped(Modifier::Default(default_value), obj, path)?
        }
        "string" => TypeNode::Concrete(ConcreteNode::String(parse_string_checks(obj, path)?)),
        "number" => TypeNode::Concrete(ConcreteNode::Number(parse_number_checks(obj, path)?)),
        "boolean" => TypeNode::boolean(),
        "date" => TypeNode::date(),
        "enum" => TypeNode::Concrete(ConcreteNode::Enum {
            entries: parse_entries(obj, path)?,
        }),
        "literal" => {
            let value = obj.get("value").ok_or_else(|| {
                ModelgenError::invalid_node(path, "`literal` node without `value`")
            })?;
            if value.is_array() || value.is_object() {
                return Err(ModelgenError::invalid_node(path, "literal value must be a scalar"));
            }
            TypeNode::literal(value.clone())
        }
        "array" => {
            let element = obj.get("element").ok_or_else(|| {
                ModelgenError::invalid_node(path, "`array` node without `element`")
            })?;
            TypeNode::array(parse_node(element, &format!("{}.element", path))?)
        }
        "object" => TypeNode::Concrete(ConcreteNode::Object {
            shape: parse_shape(obj, path)?,
        }),
        "union" => {
            let options = obj
                .get("options")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    ModelgenError::invalid_node(path, "`union` node without `options`")
                })?;
            let options = options
                .iter()
                .enumerate()
                .map(|(i, option)| parse_node(option, &format!("{}.options[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?;
            TypeNode::union(options)
        }
        other => TypeNode::unmodeled(other),
    };

    Ok(node)
}

fn wrapped(modifier: Modifier, obj: &Map<String, Value>, path: &str) -> Result<TypeNode> {
    let inner = obj.get("innerType").ok_or_else(|| {
        ModelgenError::invalid_node(path, "modifier node without `innerType`")
    })?;
    let inner = parse_node(inner, path)?;
    Ok(inner.wrap(modifier))
}

fn parse_shape(obj: &Map<String, Value>, path: &str) -> Result<Vec<(String, TypeNode)>> {
    let shape = match obj.get("shape") {
        None => return Ok(Vec::new()),
        Some(Value::Object(shape)) => shape,
        Some(_) => return Err(ModelgenError::invalid_node(path, "`shape` must be an object")),
    };

    shape
        .iter()
        .map(|(name, field)| {
            let node = parse_node(field, &format!("{}.{}", path, name))?;
            Ok((name.clone(), node))
        })
        .collect()
}

fn parse_entries(obj: &Map<String, Value>, path: &str) -> Result<Vec<String>> {
    let members: Vec<&Value> = match obj.get("entries") {
        Some(Value::Array(items)) => items.iter().collect(),
        // Keyed form: members are the values, in declaration order
        Some(Value::Object(map)) => map.values().collect(),
        _ => return Err(ModelgenError::invalid_node(path, "`enum` node without `entries`")),
    };

    members
        .into_iter()
        .map(|member| {
            member
                .as_str()
                .map(String::from)
                .ok_or_else(|| ModelgenError::invalid_node(path, "enum members must be strings"))
        })
        .collect()
}

type Check<'a> = (&'a str, &'a Map<String, Value>);

fn checks<'a>(obj: &'a Map<String, Value>, path: &str) -> Result<Vec<Check<'a>>> {
    let Some(list) = obj.get("checks") else {
        return Ok(Vec::new());
    };
    let list = list
        .as_array()
        .ok_or_else(|| ModelgenError::invalid_node(path, "`checks` must be an array"))?;

    list.iter()
        .map(|check| {
            let check = check
                .as_object()
                .ok_or_else(|| ModelgenError::invalid_node(path, "check must be an object"))?;
            let kind = check
                .get("kind")
                .and_then(Value::as_str)
                .ok_or_else(|| ModelgenError::invalid_node(path, "check without `kind`"))?;
            Ok((kind, check))
        })
        .collect()
}

fn check_number(check: &Map<String, Value>, kind: &str, path: &str) -> Result<Number> {
    match check.get("value") {
        Some(Value::Number(n)) => Ok(n.clone()),
        _ => Err(ModelgenError::invalid_node(
            path,
            format!("`{}` check needs a numeric `value`", kind),
        )),
    }
}

fn check_length(check: &Map<String, Value>, kind: &str, path: &str) -> Result<u64> {
    check_number(check, kind, path)?.as_u64().ok_or_else(|| {
        let message = format!("`{}` length must be a non-negative integer", kind);
        ModelgenError::invalid_node(path, message)
    })
}

fn parse_string_checks(obj: &Map<String, Value>, path: &str) -> Result<StringConstraints> {
    let mut constraints = StringConstraints::default();

    for (kind, check) in checks(obj, path)? {
        match kind {
            "min" => constraints.min_length = Some(check_length(check, kind, path)?),
            "max" => constraints.max_length = Some(check_length(check, kind, path)?),
            "length" => {
                let len = check_length(check, kind, path)?;
                constraints.min_length = Some(len);
                constraints.max_length = Some(len);
            }
            "email" => constraints.email = true,
            "regex" => {
                let pattern = check
                    .get("regex")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ModelgenError::invalid_node(path, "`regex` check without `regex`")
                    })?;
                constraints.pattern = Some(pattern.to_string());
            }
            other => debug!(path, check = other, "ignoring string check"),
        }
    }

    Ok(constraints)
}

fn parse_number_checks(obj: &Map<String, Value>, path: &str) -> Result<NumberConstraints> {
    let mut constraints = NumberConstraints::default();

    for (kind, check) in checks(obj, path)? {
        match kind {
            "min" => constraints.min = Some(check_number(check, kind, path)?),
            "max" => constraints.max = Some(check_number(check, kind, path)?),
            "int" => constraints.integer = true,
            other => debug!(path, check = other, "ignoring number check"),
        }
    }

    Ok(constraints)
}

// =============================================================================
// Field Descriptors
// =============================================================================

/// Concrete kind of a field, after unwrapping
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String(StringConstraints),
    Number(NumberConstraints),
    Boolean,
    Date,
    Enum { members: Vec<String> },
    Literal { value: Value },
    Array { element: Box<FieldDescriptor> },
    Object { fields: Vec<FieldDescriptor> },
    Union { options: Vec<FieldDescriptor> },
    Unmodeled { type_name: String },
}

/// One normalized field of an entity schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub is_optional: bool,
    pub is_nullable: bool,
    pub default_value: Option<Value>,
}

/// Name given to array element descriptors
pub const ELEMENT_NAME: &str = "[]";

impl FieldDescriptor {
    /// Unwrap a node and normalize it, recursing into elements and shapes
    pub fn from_node(name: impl Into<String>, node: &TypeNode) -> Self {
        let unwrapped = unwrap(node);

        let kind = match unwrapped.inner {
            ConcreteNode::String(c) => FieldKind::String(c.clone()),
            ConcreteNode::Number(c) => FieldKind::Number(c.clone()),
            ConcreteNode::Boolean => FieldKind::Boolean,
            ConcreteNode::Date => FieldKind::Date,
            ConcreteNode::Enum { entries } => FieldKind::Enum {
                members: entries.clone(),
            },
            ConcreteNode::Literal { value } => FieldKind::Literal {
                value: value.clone(),
            },
            ConcreteNode::Array { element } => FieldKind::Array {
                element: Box::new(Self::from_node(ELEMENT_NAME, element)),
            },
            ConcreteNode::Object { shape } => FieldKind::Object {
                fields: shape
                    .iter()
                    .map(|(name, field)| Self::from_node(name.clone(), field))
                    .collect(),
            },
            ConcreteNode::Union { options } => FieldKind::Union {
                options: options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| Self::from_node(i.to_string(), option))
                    .collect(),
            },
            ConcreteNode::Unmodeled { type_name } => FieldKind::Unmodeled {
                type_name: type_name.clone(),
            },
        };

        Self {
            name: name.into(),
            kind,
            is_optional: unwrapped.is_optional,
            is_nullable: unwrapped.is_nullable,
            default_value: unwrapped.default_value,
        }
    }

    /// A default satisfies a missing value just like `optional` does
    pub fn is_required(&self) -> bool {
        !self.is_optional && !self.is_nullable && self.default_value.is_none()
    }
}

/// A named, ordered field map describing one document type
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl EntitySchema {
    /// Build an entity schema from its primary node, which must be an object
    pub fn from_node(name: impl Into<String>, node: &TypeNode) -> Result<Self> {
        let name = name.into();
        match node {
            TypeNode::Concrete(ConcreteNode::Object { shape }) => Ok(Self {
                fields: shape
                    .iter()
                    .map(|(field, node)| FieldDescriptor::from_node(field.clone(), node))
                    .collect(),
                name,
            }),
            TypeNode::Concrete(other) => Err(ModelgenError::invalid_node(
                "$",
                format!(
                    "primary schema of `{}` is `{}`, expected `object`",
                    name,
                    other.type_name()
                ),
            )),
            TypeNode::Modified { .. } => Err(ModelgenError::invalid_node(
                "$",
                format!("primary schema of `{}` is wrapped in a modifier, expected `object`", name),
            )),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wrapped_string() {
        let node = TypeNode::from_value(&json!({
            "type": "optional",
            "innerType": {
                "type": "string",
                "checks": [
                    { "kind": "min", "value": 1 },
                    { "kind": "max", "value": 50 },
                    { "kind": "trim" }
                ]
            }
        }))
        .unwrap();

        let expected = TypeNode::string_with(StringConstraints {
            min_length: Some(1),
            max_length: Some(50),
            ..Default::default()
        })
        .optional();
        assert_eq!(node, expected);
    }

    #[test]
    fn test_parse_keyed_enum_keeps_order() {
        let node = TypeNode::from_value(&json!({
            "type": "enum",
            "entries": { "zeta": "zeta", "alpha": "alpha", "mid": "mid" }
        }))
        .unwrap();
        assert_eq!(node, TypeNode::enumeration(["zeta", "alpha", "mid"]));
    }

    #[test]
    fn test_parse_falsy_default() {
        let node = TypeNode::from_value(&json!({
            "type": "default",
            "defaultValue": false,
            "innerType": { "type": "boolean" }
        }))
        .unwrap();
        assert_eq!(node, TypeNode::boolean().with_default(false));
    }

    #[test]
    fn test_unknown_type_is_unmodeled() {
        let node = TypeNode::from_value(&json!({ "type": "tuple", "items": [] })).unwrap();
        assert_eq!(node, TypeNode::unmodeled("tuple"));
    }

    #[test]
    fn test_malformed_nodes() {
        let missing_tag = TypeNode::from_value(&json!({ "shape": {} }));
        assert!(matches!(missing_tag, Err(ModelgenError::InvalidNode { .. })));

        let missing_default = TypeNode::from_value(&json!({
            "type": "default",
            "innerType": { "type": "string" }
        }));
        assert!(missing_default.is_err());

        let nested = TypeNode::from_value(&json!({
            "type": "object",
            "shape": { "address": { "type": "object", "shape": { "city": {} } } }
        }));
        match nested {
            Err(ModelgenError::InvalidNode { path, .. }) => assert_eq!(path, "$.address.city"),
            other => panic!("Expected InvalidNode, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_order_preserved() {
        let node = TypeNode::from_value(&json!({
            "type": "object",
            "shape": {
                "zebra": { "type": "string" },
                "apple": { "type": "number" },
                "mango": { "type": "boolean" }
            }
        }))
        .unwrap();
        let schema = EntitySchema::from_node("fruit", &node).unwrap();
        assert_eq!(schema.field_names(), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_descriptor_required_law() {
        let cases = [
            (TypeNode::string(), true),
            (TypeNode::string().optional(), false),
            (TypeNode::string().nullable(), false),
            (TypeNode::string().with_default(""), false),
            (TypeNode::string().with_default("x").optional().nullable(), false),
        ];
        for (node, required) in cases {
            let field = FieldDescriptor::from_node("f", &node);
            assert_eq!(field.is_required(), required, "{:?}", node);
            assert_eq!(
                field.is_required(),
                !field.is_optional && !field.is_nullable && field.default_value.is_none()
            );
        }
    }

    #[test]
    fn test_array_element_is_unwrapped() {
        let node = TypeNode::array(TypeNode::string().optional());
        let field = FieldDescriptor::from_node("tags", &node);
        match field.kind {
            FieldKind::Array { element } => {
                assert_eq!(element.name, ELEMENT_NAME);
                assert!(element.is_optional);
                assert!(matches!(element.kind, FieldKind::String(_)));
            }
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_primary_must_be_object() {
        let err = EntitySchema::from_node("broken", &TypeNode::string()).unwrap_err();
        assert!(err.to_string().contains("expected `object`"));
    }
}
