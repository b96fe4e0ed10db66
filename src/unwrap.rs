//! Modifier Unwrapping
//!
//! Peels optional/nullable/default layers off a type node, in any order and
//! any multiplicity, until a concrete node is reached.

use serde_json::Value;

use crate::descriptor::{ConcreteNode, Modifier, TypeNode};

/// The innermost concrete node plus everything collected on the way down
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped<'a> {
    pub inner: &'a ConcreteNode,
    pub is_optional: bool,
    pub is_nullable: bool,
    /// Outermost default wins; it is the one applied to a missing value
    pub default_value: Option<Value>,
}

/// Strip every modifier layer from `node`
pub fn unwrap(node: &TypeNode) -> Unwrapped<'_> {
    let mut current = node;
    let mut is_optional = false;
    let mut is_nullable = false;
    let mut default_value = None;

    loop {
        match current {
            TypeNode::Modified { modifier, inner } => {
                match modifier {
                    Modifier::Optional => is_optional = true,
                    Modifier::Nullable => is_nullable = true,
                    Modifier::Default(value) => {
                        if default_value.is_none() {
                            default_value = Some(value.clone());
                        }
                    }
                }
                current = inner.as_ref();
            }
            TypeNode::Concrete(inner) => {
                return Unwrapped {
                    inner,
                    is_optional,
                    is_nullable,
                    default_value,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_node() {
        let node = TypeNode::number();
        let unwrapped = unwrap(&node);
        assert!(matches!(unwrapped.inner, ConcreteNode::Number(_)));
        assert!(!unwrapped.is_optional);
        assert!(!unwrapped.is_nullable);
        assert_eq!(unwrapped.default_value, None);
    }

    #[test]
    fn test_default_alone_keeps_value() {
        let node = TypeNode::enumeration(["student", "admin"]).with_default("student");
        let unwrapped = unwrap(&node);
        assert!(!unwrapped.is_optional);
        assert!(!unwrapped.is_nullable);
        assert_eq!(unwrapped.default_value, Some(json!("student")));
    }

    #[test]
    fn test_arbitrary_order() {
        // nullable(optional(default(boolean)))
        let node = TypeNode::boolean().with_default(true).optional().nullable();
        let unwrapped = unwrap(&node);
        assert!(matches!(unwrapped.inner, ConcreteNode::Boolean));
        assert!(unwrapped.is_optional);
        assert!(unwrapped.is_nullable);
        assert_eq!(unwrapped.default_value, Some(json!(true)));

        // default(optional(nullable(string)))
        let node = TypeNode::string().nullable().optional().with_default(json!(null));
        let unwrapped = unwrap(&node);
        assert!(matches!(unwrapped.inner, ConcreteNode::String(_)));
        assert!(unwrapped.is_optional && unwrapped.is_nullable);
        assert_eq!(unwrapped.default_value, Some(Value::Null));
    }

    #[test]
    fn test_repeated_modifiers() {
        let node = TypeNode::number()
            .with_default(1)
            .optional()
            .optional()
            .with_default(2);
        let unwrapped = unwrap(&node);
        assert!(unwrapped.is_optional);
        assert!(!unwrapped.is_nullable);
        assert_eq!(unwrapped.default_value, Some(json!(2)));
    }

    #[test]
    fn test_stops_at_compound_node() {
        let node = TypeNode::array(TypeNode::string().optional()).nullable();
        let unwrapped = unwrap(&node);
        assert!(unwrapped.is_nullable);
        // The element's own optional layer belongs to the element
        assert!(!unwrapped.is_optional);
        assert!(matches!(unwrapped.inner, ConcreteNode::Array { .. }));
    }
}
