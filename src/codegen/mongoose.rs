//! Mongoose Module Emitter
//!
//! Renders a `TranslatedSchema` as a CommonJS module declaring a Mongoose
//! schema, its inferred indexes and the exported model.
//!
//! Output is a pure function of its input: fields keep IR order, options keep
//! a fixed order, and values are printed as compact JSON.

use serde_json::Value;

use super::{model_name, schema_ident, EmitOptions};
use crate::indexes::{IndexDirection, IndexSpec};
use crate::translate::{FieldSpec, TargetType, TranslatedField, TranslatedSchema};

const INDENT: &str = "  ";

// =============================================================================
// Public API
// =============================================================================

/// Render the model module for `entity`
pub fn render_module(
    entity: &str,
    schema: &TranslatedSchema,
    indexes: &[IndexSpec],
    options: &EmitOptions,
) -> String {
    let ident = schema_ident(entity);
    let mut output = String::new();

    output.push_str("const mongoose = require('mongoose');\n\n");
    output.push_str(&format!("const {} = new mongoose.Schema(", ident));
    output.push_str(&fields_block(&schema.fields, 1));
    output.push_str(", {\n");
    output.push_str(&format!("{}timestamps: {}\n", INDENT, options.timestamps));
    output.push_str("});\n");

    if !indexes.is_empty() {
        output.push_str("\n// Indexes\n");
        emit_indexes(&mut output, &ident, indexes);
    }

    output.push_str(&format!(
        "\nmodule.exports = mongoose.model({}, {});\n",
        single_quoted(&model_name(entity)),
        ident
    ));

    output
}

// =============================================================================
// Index Emission
// =============================================================================

fn emit_indexes(output: &mut String, ident: &str, indexes: &[IndexSpec]) {
    let (text, keyed): (Vec<&IndexSpec>, Vec<&IndexSpec>) = indexes
        .iter()
        .partition(|spec| spec.direction == IndexDirection::Text);

    for spec in keyed {
        output.push_str(&format!(
            "if ({}.path({})) {}.index({{ {}: {} }});\n",
            ident,
            single_quoted(&spec.field),
            ident,
            object_key(&spec.field),
            spec.direction.key_literal()
        ));
    }

    // A collection holds a single text index, so text keys share one declaration
    if !text.is_empty() {
        let guard = text
            .iter()
            .map(|spec| format!("{}.path({})", ident, single_quoted(&spec.field)))
            .collect::<Vec<_>>()
            .join(" && ");
        let keys = text
            .iter()
            .map(|spec| format!("{}: {}", object_key(&spec.field), spec.direction.key_literal()))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("if ({}) {}.index({{ {} }});\n", guard, ident, keys));
    }
}

// =============================================================================
// Field Emission
// =============================================================================

/// `{ ... }` block of field declarations; fields sit at `depth`, the closing
/// brace one level out
fn fields_block(fields: &[TranslatedField], depth: usize) -> String {
    let mut block = String::from("{\n");
    for field in fields {
        block.push_str(&INDENT.repeat(depth));
        block.push_str(&object_key(&field.name));
        block.push_str(": ");
        block.push_str(&field_options(&field.spec, depth, true));
        block.push_str(",\n");
    }
    block.push_str(&INDENT.repeat(depth.saturating_sub(1)));
    block.push('}');
    block
}

/// `{ type: ..., ... }` for one field whose key sits at `depth`
fn field_options(spec: &FieldSpec, depth: usize, with_modifiers: bool) -> String {
    let mut options = vec![format!("type: {}", type_expr(&spec.ty, depth + 1))];

    if let Some(min_length) = spec.min_length {
        options.push(format!("minlength: {}", min_length));
    }
    if let Some(max_length) = spec.max_length {
        options.push(format!("maxlength: {}", max_length));
    }
    if let Some(min) = &spec.min {
        options.push(format!("min: {}", min));
    }
    if let Some(max) = &spec.max {
        options.push(format!("max: {}", max));
    }
    if spec.integer {
        options.push("validate: Number.isInteger".to_string());
    }
    if let Some(pattern) = &spec.pattern {
        options.push(format!("match: {}", regex_literal(pattern)));
    }
    if let Some(values) = &spec.enum_values {
        options.push(format!("enum: {}", Value::Array(values.clone())));
    }
    if with_modifiers {
        options.push(format!("required: {}", spec.required));
        if let Some(default) = &spec.default {
            options.push(format!("default: {}", default));
        }
    }

    if options.iter().any(|o| o.contains('\n')) {
        let inner = INDENT.repeat(depth + 1);
        let mut block = String::from("{\n");
        for option in options {
            block.push_str(&inner);
            block.push_str(&option);
            block.push_str(",\n");
        }
        block.push_str(&INDENT.repeat(depth));
        block.push('}');
        block
    } else {
        format!("{{ {} }}", options.join(", "))
    }
}

/// Value of the `type` option, written at `depth`
fn type_expr(ty: &TargetType, depth: usize) -> String {
    match ty {
        TargetType::String => "String".to_string(),
        TargetType::Number => "Number".to_string(),
        TargetType::Boolean => "Boolean".to_string(),
        TargetType::Date => "Date".to_string(),
        TargetType::Mixed => "mongoose.Schema.Types.Mixed".to_string(),
        TargetType::Object(fields) => fields_block(fields, depth + 1),
        TargetType::Array(element) => format!("[{}]", element_expr(element, depth)),
    }
}

fn element_expr(element: &FieldSpec, depth: usize) -> String {
    match &element.ty {
        TargetType::Object(fields) => fields_block(fields, depth + 1),
        ty if is_bare(element) => type_expr(ty, depth),
        _ => field_options(element, depth, false),
    }
}

/// Element with nothing to declare beyond its type
fn is_bare(spec: &FieldSpec) -> bool {
    spec.min_length.is_none()
        && spec.max_length.is_none()
        && spec.min.is_none()
        && spec.max.is_none()
        && !spec.integer
        && spec.pattern.is_none()
        && spec.enum_values.is_none()
}

// =============================================================================
// JavaScript Literals
// =============================================================================

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Object key, quoted only when it is not an identifier
fn object_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        Value::String(name.to_string()).to_string()
    }
}

fn single_quoted(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// `/pattern/` with unescaped slashes escaped
fn regex_literal(pattern: &str) -> String {
    if pattern.is_empty() {
        return "/(?:)/".to_string();
    }
    let mut literal = String::with_capacity(pattern.len() + 2);
    literal.push('/');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                literal.push('\\');
                if let Some(next) = chars.next() {
                    literal.push(next);
                }
            }
            '/' => literal.push_str("\\/"),
            '\n' => literal.push_str("\\n"),
            c => literal.push(c),
        }
    }
    literal.push('/');
    literal
}
