//! Reverse-parsing of previously generated source text.
//!
//! The diff engine never keeps a structured model of the prior run; it
//! recovers one from whatever text currently exists on disk, tolerating hand
//! edits. This module is the narrow interface for that recovery (a
//! brace-balanced scan plus line-oriented regexes) so it could be swapped
//! for a real parser without touching the diff algorithm.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::openapi::emit::functions::{GENERATED_BEGIN, GENERATED_END};

/// A type recovered from text: an interface's fields, or an alias body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedType {
    /// Field name -> type text, for interfaces.
    pub fields: BTreeMap<String, String>,
    /// Right-hand side of a type alias, whitespace-normalized.
    pub alias: Option<String>,
}

static INTERFACE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^export interface ([A-Za-z_$][A-Za-z0-9_$]*)[^{]*\{"));

static TYPE_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^export type ([A-Za-z_$][A-Za-z0-9_$]*)\s*="));

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^export (?:async )?function ([A-Za-z_$][A-Za-z0-9_$]*)\s*\(|^export const ([A-Za-z_$][A-Za-z0-9_$]*)\s*=",
    )
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"^\s*(?:"([^"]+)"|([A-Za-z_$][A-Za-z0-9_$]*))\s*\??\s*:\s*(.+?);?\s*$"#)
});

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extraction pattern must compile")
}

/// Collapse whitespace runs so cosmetic edits do not register as changes.
pub fn normalize_type_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract every exported interface and type alias from a type-declaration
/// file, by name.
pub fn extract_types(text: &str) -> BTreeMap<String, ExtractedType> {
    let mut types = BTreeMap::new();

    for caps in INTERFACE_RE.captures_iter(text) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let Some(open) = caps.get(0) else {
            continue;
        };
        let Some(body) = balanced_braces(text, open.end() - 1) else {
            continue;
        };
        types.insert(
            name.as_str().to_string(),
            ExtractedType {
                fields: extract_fields(body),
                alias: None,
            },
        );
    }

    for caps in TYPE_ALIAS_RE.captures_iter(text) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let Some(m) = caps.get(0) else {
            continue;
        };
        let Some(rhs) = alias_body(text, m.end()) else {
            continue;
        };
        types.insert(
            name.as_str().to_string(),
            ExtractedType {
                fields: BTreeMap::new(),
                alias: Some(normalize_type_text(rhs)),
            },
        );
    }

    types
}

/// Extract the exported call names from a function file. When both sentinel
/// markers are present only the machine-owned region is scanned, so
/// hand-added functions outside the markers never register as drift.
pub fn extract_function_names(text: &str) -> BTreeSet<String> {
    let region = generated_region(text).unwrap_or(text);

    let mut names = BTreeSet::new();
    for caps in FUNCTION_RE.captures_iter(region) {
        let name = caps.get(1).or_else(|| caps.get(2));
        if let Some(name) = name {
            names.insert(name.as_str().to_string());
        }
    }
    names
}

/// The text between the sentinel markers, when both are present in order.
pub fn generated_region(text: &str) -> Option<&str> {
    let begin = find_marker_line(text, GENERATED_BEGIN)?;
    let after_begin = begin + GENERATED_BEGIN.len();
    let end_offset = find_marker_line(&text[after_begin..], GENERATED_END)?;
    Some(&text[after_begin..after_begin + end_offset])
}

/// Byte offset of a marker occupying a whole (trimmed) line.
fn find_marker_line(text: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']).trim() == marker {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Given the byte index of an opening brace, return the text inside the
/// balanced pair, skipping string literals.
fn balanced_braces(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The right-hand side of a type alias: everything up to the terminating
/// semicolon at brace/angle depth zero.
fn alias_body(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'"' => in_string = !in_string,
            b'{' | b'<' | b'(' if !in_string => depth += 1,
            b'}' | b'>' | b')' if !in_string => depth -= 1,
            b';' if !in_string && depth <= 0 => return Some(&text[start..i]),
            _ => {}
        }
    }
    // Tolerate a missing trailing semicolon on the last declaration.
    Some(&text[start..])
}

/// Field name -> type text pairs from an interface body, one field per line.
fn extract_fields(body: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("/*") {
            continue;
        }
        if let Some(caps) = FIELD_RE.captures(trimmed) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string());
            let ty = caps.get(3).map(|m| normalize_type_text(m.as_str()));
            if let (Some(name), Some(ty)) = (name, ty) {
                fields.insert(name, ty);
            }
        }
    }
    fields
}
