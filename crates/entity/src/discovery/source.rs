//! Source inspection for entity discovery
//!
//! The textual pass is cheap and runs on every file: it derives the module
//! path from the file location and finds the first struct name. Only files
//! that produce a candidate are parsed with `syn`.

use std::path::Path;

use regex::Regex;

use crate::error::{EntityError, EntityResult};

const STRUCT_DECL: &str = r"(?m)^[ \t]*(?:pub(?:\s*\([^)]*\))?\s+)?struct\s+([A-Za-z_][A-Za-z0-9_]*)";

/// Line-anchored matcher for the first struct declaration of a file
#[derive(Debug, Clone)]
pub struct StructMatcher {
    pattern: Regex,
}

impl StructMatcher {
    pub fn new() -> EntityResult<Self> {
        let pattern = Regex::new(STRUCT_DECL)
            .map_err(|e| EntityError::discovery("<pattern>", format!("Invalid struct pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// First struct name declared at the start of a line
    pub fn primary_struct(&self, source: &str) -> Option<String> {
        self.pattern
            .captures(source)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Textual pass: combine the module path and the primary struct name
    pub fn candidate(
        &self,
        root: &Path,
        file: &Path,
        source: &str,
        root_module: Option<&str>,
    ) -> Option<Candidate> {
        let type_name = self.primary_struct(source)?;
        let segments = module_path(root, file)?;

        let identifier = root_module
            .into_iter()
            .map(str::to_string)
            .chain(segments)
            .chain(std::iter::once(type_name.clone()))
            .collect::<Vec<_>>()
            .join("::");

        Some(Candidate {
            identifier,
            type_name,
        })
    }
}

fn is_ident(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .map_or(false, |first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// A file that textually looks like it declares a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// `root_module::path::Type`
    pub identifier: String,
    pub type_name: String,
}

/// What the full parse found for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    Entity,
    Abstract,
    NotEntity,
    /// The struct from the textual pass is not a top-level item
    Missing,
}

/// Module path segments for a file, relative to the scan root.
///
/// `lib.rs`, `main.rs` and `mod.rs` name their parent directory.
pub fn module_path(root: &Path, file: &Path) -> Option<Vec<String>> {
    let relative = file.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = Vec::new();

    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    for component in parent.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }

    let stem = relative.file_stem()?.to_str()?;
    if !matches!(stem, "lib" | "main" | "mod") {
        segments.push(stem.to_string());
    }

    if segments.iter().all(|s| is_ident(s)) {
        Some(segments)
    } else {
        None
    }
}

/// Reflective pass: parse the file and inspect the candidate struct's attributes
pub fn reflect(source: &str, type_name: &str) -> syn::Result<Reflection> {
    let file = syn::parse_file(source)?;

    let Some(item) = file.items.iter().find_map(|item| match item {
        syn::Item::Struct(item_struct) if item_struct.ident == type_name => Some(item_struct),
        _ => None,
    }) else {
        return Ok(Reflection::Missing);
    };

    if !derives_entity(&item.attrs)? {
        return Ok(Reflection::NotEntity);
    }

    if is_abstract(&item.attrs)? {
        Ok(Reflection::Abstract)
    } else {
        Ok(Reflection::Entity)
    }
}

fn derives_entity(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut found = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.segments.last().map_or(false, |s| s.ident == "Entity") {
                found = true;
            }
            Ok(())
        })?;
    }
    Ok(found)
}

fn is_abstract(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut found = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("entity")) {
        if let syn::Meta::Path(_) = attr.meta {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("abstract_entity") || meta.path.is_ident("abstract") {
                found = true;
            } else if meta.input.peek(syn::Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        })?;
    }
    Ok(found)
}
