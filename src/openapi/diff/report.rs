//! Change detection and report rendering.
//!
//! Check mode never writes artifacts: it reverse-parses whatever text exists
//! on disk, compares it with the freshly emitted text, and renders a
//! human-readable report. Both sides of the comparison go through the same
//! extraction, so a run against its own output always reports no drift.

use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

use crate::openapi::diff::extract::{ExtractedType, extract_function_names, extract_types};

/// Kind of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        }
    }
}

/// A field-level delta inside a modified type.
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub name: String,
    pub kind: ChangeKind,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// A type-level change within a group.
#[derive(Debug, Clone)]
pub struct TypeChange {
    pub name: String,
    pub kind: ChangeKind,
    pub fields: Vec<FieldChange>,
    pub old_alias: Option<String>,
    pub new_alias: Option<String>,
}

/// An operation-level change within a group. Call bodies are never diffed
/// structurally; only the exported name set is compared.
#[derive(Debug, Clone)]
pub struct OperationChange {
    pub name: String,
    pub kind: ChangeKind,
}

/// All changes detected for one group.
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: String,
    pub types: Vec<TypeChange>,
    pub operations: Vec<OperationChange>,
}

/// The full report for a run: one entry per group with a nonempty change set.
#[derive(Debug, Clone, Default)]
pub struct ChangeReport {
    pub groups: Vec<GroupReport>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Diff one group's freshly emitted text against the prior on-disk text.
/// `None` prior text means the file is absent and everything is `added`.
pub fn diff_group(
    group: &str,
    fresh_types_text: &str,
    prior_types_text: Option<&str>,
    fresh_functions_text: &str,
    prior_functions_text: Option<&str>,
) -> Option<GroupReport> {
    let new_types = extract_types(fresh_types_text);
    let old_types = prior_types_text.map(extract_types).unwrap_or_default();

    let mut type_changes = Vec::new();
    let type_names: BTreeSet<&String> = new_types.keys().chain(old_types.keys()).collect();
    for name in type_names {
        match (old_types.get(name), new_types.get(name)) {
            (None, Some(_)) => type_changes.push(TypeChange {
                name: name.clone(),
                kind: ChangeKind::Added,
                fields: Vec::new(),
                old_alias: None,
                new_alias: None,
            }),
            (Some(_), None) => type_changes.push(TypeChange {
                name: name.clone(),
                kind: ChangeKind::Removed,
                fields: Vec::new(),
                old_alias: None,
                new_alias: None,
            }),
            (Some(old), Some(new)) => {
                if let Some(change) = diff_type(name, old, new) {
                    type_changes.push(change);
                }
            }
            (None, None) => {}
        }
    }

    let new_functions = extract_function_names(fresh_functions_text);
    let old_functions = prior_functions_text
        .map(extract_function_names)
        .unwrap_or_default();

    let mut operation_changes = Vec::new();
    for name in new_functions.difference(&old_functions) {
        operation_changes.push(OperationChange {
            name: name.clone(),
            kind: ChangeKind::Added,
        });
    }
    for name in old_functions.difference(&new_functions) {
        operation_changes.push(OperationChange {
            name: name.clone(),
            kind: ChangeKind::Removed,
        });
    }

    if type_changes.is_empty() && operation_changes.is_empty() {
        return None;
    }

    type_changes.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
    operation_changes.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));

    Some(GroupReport {
        group: group.to_string(),
        types: type_changes,
        operations: operation_changes,
    })
}

/// Field-level comparison of a type present on both sides. Type texts are
/// whitespace-normalized by extraction, so only substantive edits register.
fn diff_type(name: &str, old: &ExtractedType, new: &ExtractedType) -> Option<TypeChange> {
    let mut fields = Vec::new();

    let field_names: BTreeSet<&String> = old.fields.keys().chain(new.fields.keys()).collect();
    for field in field_names {
        match (old.fields.get(field), new.fields.get(field)) {
            (None, Some(new_ty)) => fields.push(FieldChange {
                name: field.clone(),
                kind: ChangeKind::Added,
                old: None,
                new: Some(new_ty.clone()),
            }),
            (Some(old_ty), None) => fields.push(FieldChange {
                name: field.clone(),
                kind: ChangeKind::Removed,
                old: Some(old_ty.clone()),
                new: None,
            }),
            (Some(old_ty), Some(new_ty)) if old_ty != new_ty => fields.push(FieldChange {
                name: field.clone(),
                kind: ChangeKind::Modified,
                old: Some(old_ty.clone()),
                new: Some(new_ty.clone()),
            }),
            _ => {}
        }
    }

    let alias_changed = old.alias != new.alias;
    if fields.is_empty() && !alias_changed {
        return None;
    }

    Some(TypeChange {
        name: name.to_string(),
        kind: ChangeKind::Modified,
        fields,
        old_alias: if alias_changed { old.alias.clone() } else { None },
        new_alias: if alias_changed { new.alias.clone() } else { None },
    })
}

/// Render the report as a markdown document.
pub fn render_report(report: &ChangeReport, generated_at: &str) -> String {
    let mut out = String::from("# API change report\n\n");
    out.push_str(&format!("Generated by apigen on {generated_at}.\n"));

    if report.is_empty() {
        out.push_str("\nNo changes detected.\n");
        return out;
    }

    for group in &report.groups {
        out.push_str(&format!("\n## Group `{}`\n", group.group));

        if !group.types.is_empty() {
            out.push_str("\n### Types\n\n");
            for change in &group.types {
                out.push_str(&format!("- {} `{}`\n", change.kind.label(), change.name));
                for field in &change.fields {
                    out.push_str(&render_field_change(field));
                }
                if change.old_alias.is_some() || change.new_alias.is_some() {
                    out.push_str(&render_alias_diff(
                        change.old_alias.as_deref().unwrap_or_default(),
                        change.new_alias.as_deref().unwrap_or_default(),
                    ));
                }
            }
        }

        if !group.operations.is_empty() {
            out.push_str("\n### Operations\n\n");
            for change in &group.operations {
                out.push_str(&format!("- {} `{}`\n", change.kind.label(), change.name));
            }
        }
    }

    out
}

fn render_field_change(field: &FieldChange) -> String {
    match field.kind {
        ChangeKind::Added => format!(
            "  - added `{}` (`{}`)\n",
            field.name,
            field.new.as_deref().unwrap_or_default()
        ),
        ChangeKind::Removed => format!(
            "  - removed `{}` (`{}`)\n",
            field.name,
            field.old.as_deref().unwrap_or_default()
        ),
        ChangeKind::Modified => format!(
            "  - modified `{}`: `{}` -> `{}`\n",
            field.name,
            field.old.as_deref().unwrap_or_default(),
            field.new.as_deref().unwrap_or_default()
        ),
    }
}

/// Unified diff snippet for a changed alias body.
fn render_alias_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut out = String::from("\n  ```diff\n");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str("  ");
        out.push_str(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    out.push_str("  ```\n");
    out
}
