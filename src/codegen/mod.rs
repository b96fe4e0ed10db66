//! Code Generation
//!
//! Renders translated schemas into artifacts.
//!
//! Architecture:
//! - `TranslatedSchema` + `IndexSpec`s: the only input an emitter receives
//! - `mongoose`: CommonJS model modules, one file per entity
//! - `validator`: MongoDB `$jsonSchema` collection validators
//!
//! Emitters never see definition files or type nodes, and never decide
//! translation questions; everything they print is already in the IR.

pub mod mongoose;
pub mod validator;

use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::error::{ModelgenError, Result};

pub use mongoose::render_module;
pub use validator::render_validator;

/// Options that change emitted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub timestamps: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { timestamps: true }
    }
}

/// A rendered module and where it belongs
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    pub entity: String,
    pub model_name: String,
    pub path: PathBuf,
    pub code: String,
    pub checksum: Checksum,
}

impl GeneratedModule {
    pub fn new(entity: &str, path: PathBuf, code: String) -> Self {
        Self {
            entity: entity.to_string(),
            model_name: model_name(entity),
            checksum: Checksum::of(&code),
            path,
            code,
        }
    }

    /// Write the module, replacing any previous file in full
    pub fn write(&self) -> Result<()> {
        write_file(&self.path, &self.code)
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    let emission = |source| ModelgenError::Emission {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(emission)?;
        }
    }
    fs::write(path, content).map_err(emission)
}

/// Externally visible model name: entity name with its first letter capitalized
pub fn model_name(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JavaScript identifier derived from an entity name
pub fn schema_ident(entity: &str) -> String {
    let mut ident: String = entity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if ident.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    format!("{}Schema", ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name() {
        assert_eq!(model_name("books"), "Books");
        assert_eq!(model_name("ebookuser"), "Ebookuser");
        assert_eq!(model_name("PDF"), "PDF");
        assert_eq!(model_name(""), "");
    }

    #[test]
    fn test_schema_ident() {
        assert_eq!(schema_ident("books"), "booksSchema");
        assert_eq!(schema_ident("ebook-user"), "ebook_userSchema");
        assert_eq!(schema_ident("2fa"), "_2faSchema");
    }

    #[test]
    fn test_write_overwrites_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("books.generated.js");

        GeneratedModule::new("books", path.clone(), "a much longer first version\n".to_string())
            .write()
            .unwrap();
        let module = GeneratedModule::new("books", path.clone(), "short\n".to_string());
        module.write().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short\n");
        assert!(module.checksum.verify("short\n"));
        assert_eq!(module.model_name, "Books");
    }
}
