//! Index Inference
//!
//! Attaches index declarations to a translated schema based on top-level
//! field names alone. A numeric field named `status` still gets an index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::IndexConfig;
use crate::translate::TranslatedSchema;

/// Sort direction or text designation of an index key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    Ascending,
    Descending,
    Text,
}

impl IndexDirection {
    /// Key value as written in an index declaration
    pub fn key_literal(&self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
            Self::Text => "'text'",
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// An index on one top-level field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    pub field: String,
    pub direction: IndexDirection,
}

impl IndexSpec {
    pub fn new(field: impl Into<String>, direction: IndexDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.field, self.direction)
    }
}

/// Recognized field names, in declaration order
pub const RECOGNIZED_INDEXES: &[(&str, IndexDirection)] = &[
    ("email", IndexDirection::Ascending),
    ("status", IndexDirection::Ascending),
    ("createdAt", IndexDirection::Descending),
    ("role", IndexDirection::Ascending),
    ("category", IndexDirection::Ascending),
];

/// Infer index declarations for the top-level fields of `schema`
pub fn infer_indexes(schema: &TranslatedSchema, config: &IndexConfig) -> Vec<IndexSpec> {
    let mut specs: Vec<IndexSpec> = Vec::new();

    let recognized = RECOGNIZED_INDEXES
        .iter()
        .map(|(field, direction)| IndexSpec::new(*field, *direction));
    let text = config
        .text_fields
        .iter()
        .map(|field| IndexSpec::new(field.as_str(), IndexDirection::Text));

    for spec in recognized.chain(text) {
        if schema.has_field(&spec.field) && !specs.contains(&spec) {
            specs.push(spec);
        }
    }

    specs
}
