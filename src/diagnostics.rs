//! Diagnostics
//!
//! Collects findings raised while translating a schema. Fallbacks never fail
//! a translation; they are reported here so an operator can tell a deliberate
//! union simplification apart from a kind the translator does not model.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Union translated to the permissive any-value type
    UnionFallback,
    /// Unmodeled source kind translated to a plain string
    UnhandledType,
    /// Default value does not fit the translated field type
    DefaultTypeMismatch,
    /// Enum declared without members
    EmptyEnum,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnionFallback => "I001",
            Self::UnhandledType => "W001",
            Self::DefaultTypeMismatch => "W002",
            Self::EmptyEnum => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnionFallback => Severity::Info,
            Self::UnhandledType | Self::DefaultTypeMismatch | Self::EmptyEnum => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single finding, located by entity and dotted field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    pub entity: String,
    pub field_path: String,
    pub code: DiagnosticCode,
    pub message: String,
}

impl DiagnosticItem {
    pub fn new(
        entity: impl Into<String>,
        field_path: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            field_path: field_path.into(),
            code,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}.{}: {}",
            self.code,
            self.code.severity(),
            self.entity,
            self.field_path,
            self.message
        )
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of findings from one translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    pub fn union_fallback(&mut self, entity: &str, field_path: &str, branches: usize) {
        self.push(DiagnosticItem::new(
            entity,
            field_path,
            DiagnosticCode::UnionFallback,
            format!("union of {} branches stored as Mixed", branches),
        ));
    }

    pub fn unhandled(&mut self, entity: &str, field_path: &str, type_name: &str) {
        self.push(DiagnosticItem::new(
            entity,
            field_path,
            DiagnosticCode::UnhandledType,
            format!("unhandled type `{}` translated to String", type_name),
        ));
    }

    pub fn default_mismatch(&mut self, entity: &str, field_path: &str, expected: &str) {
        self.push(DiagnosticItem::new(
            entity,
            field_path,
            DiagnosticCode::DefaultTypeMismatch,
            format!("default value is not a {}", expected),
        ));
    }

    pub fn empty_enum(&mut self, entity: &str, field_path: &str) {
        self.push(DiagnosticItem::new(
            entity,
            field_path,
            DiagnosticCode::EmptyEnum,
            "enum has no members; every value will be rejected",
        ));
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn unhandled_types(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.with_code(DiagnosticCode::UnhandledType)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Info)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}
