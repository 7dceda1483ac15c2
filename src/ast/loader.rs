//! JSON form of [`TranslationUnit`].
//!
//! This is the adapter seam between a compiler front end and the checkers: an
//! exporter walks its own AST and writes the closed shape defined in
//! [`crate::ast`].

use super::TranslationUnit;
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;

/// Parse a translation unit from JSON text. `origin` is only used in errors
/// and as the unit's path when the document does not carry one.
pub fn parse_translation_unit(contents: &str, origin: &Path) -> Result<TranslationUnit> {
    let mut tu: TranslationUnit = serde_json::from_str(contents)
        .map_err(|e| Error::input(origin, e.to_string()))?;
    if tu.path.is_empty() {
        tu.path = origin.display().to_string();
    }
    Ok(tu)
}

pub fn load_translation_unit(path: &Path) -> Result<TranslationUnit> {
    let contents = fs::read_to_string(path).map_err(|e| Error::FileSystem {
        message: format!("cannot read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;
    log::debug!("Loaded {} bytes from {}", contents.len(), path.display());
    parse_translation_unit(&contents, path)
}
