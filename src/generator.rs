//! Per-run orchestration.
//!
//! One run loads the manifest and alias table, fetches and normalizes the
//! spec once, then handles each group independently: emit both files, then
//! either write them (update mode, merging the function file) or diff them
//! against what is on disk (check mode, producing the change report). All
//! model construction is in-memory; file writes happen once per group after
//! the full model has been computed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::aliases::AliasContext;
use crate::config::Config;
use crate::loader;
use crate::openapi::diff::merge::{MergeOutcome, merge_generated};
use crate::openapi::diff::report::{ChangeReport, diff_group, render_report};
use crate::openapi::document::SpecDocument;
use crate::openapi::emit::functions::FunctionEmitter;
use crate::openapi::emit::types::TypeRenderer;
use crate::openapi::ir::normalize::{NormalizeOptions, normalize_document};

/// Change report filename, written into the project root by check mode.
pub const REPORT_FILE: &str = "API_CHANGES.md";
/// Type-declaration filename inside each group directory (fully owned).
pub const TYPES_FILE: &str = "types.ts";
/// Function filename inside each group directory (partially owned, merged).
pub const FUNCTIONS_FILE: &str = "api.ts";

/// Whether a run writes artifacts or only reports drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Update,
    Check,
}

/// Counters and advisories accumulated over one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub groups: usize,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_unchanged: usize,
    /// Check mode: number of groups with a nonempty change set.
    pub changed_groups: usize,
    /// Labels first seen during this run, for the operator to alias later.
    pub discovered_labels: Vec<String>,
}

/// Execute one full run against a project.
pub async fn run(project_root: &Path, config: &Config, mode: Mode) -> Result<RunSummary, String> {
    let output_root = config.output_root(project_root);
    let mut aliases = AliasContext::load(config.groups.aliases.as_ref(), &output_root)?;

    let text = loader::load_spec_text(&config.spec, project_root).await?;
    let doc = SpecDocument::parse(&text)?;

    let opts = NormalizeOptions {
        strip_prefixes: &config.naming.strip_prefixes,
        strip_suffixes: &config.naming.strip_suffixes,
        exclude_fields: &config.naming.exclude_fields,
        unwrap_field: config.naming.unwrap_field.as_deref(),
        include_labels: &config.groups.include,
        exclude_labels: &config.groups.exclude,
    };
    let model = normalize_document(&doc, &opts, &mut aliases);
    debug!(groups = model.groups.len(), "Normalized API model.");

    let renderer = TypeRenderer::new(&config.naming.strip_suffixes, &config.naming.exclude_fields);
    let emitter = FunctionEmitter {
        convention: config.request.style,
        client_symbol: &config.request.client,
        client_import: &config.request.import_from,
        renderer,
    };

    let mut summary = RunSummary {
        groups: model.groups.len(),
        ..RunSummary::default()
    };
    let mut report = ChangeReport::default();

    for group in &model.groups {
        let group_dir = output_root.join(&group.name);
        let types_path = group_dir.join(TYPES_FILE);
        let functions_path = group_dir.join(FUNCTIONS_FILE);

        let fresh_types = renderer.render_types_file(group);
        let fresh_functions = emitter.render_functions_file(group);

        let prior_types = read_optional(&types_path)?;
        let prior_functions = read_optional(&functions_path)?;

        match mode {
            Mode::Check => {
                if let Some(group_report) = diff_group(
                    &group.name,
                    &fresh_types,
                    prior_types.as_deref(),
                    &fresh_functions,
                    prior_functions.as_deref(),
                ) {
                    report.groups.push(group_report);
                }
            }
            Mode::Update => {
                fs::create_dir_all(&group_dir).map_err(|err| {
                    format!("Failed to create {}: {err}", group_dir.display())
                })?;

                // The type file is fully machine-owned: overwrite wholesale.
                let types_outcome = match prior_types.as_deref() {
                    None => MergeOutcome::Created,
                    Some(prior) if prior == fresh_types => MergeOutcome::Unchanged,
                    Some(_) => MergeOutcome::Overwritten,
                };
                if types_outcome != MergeOutcome::Unchanged {
                    fs::write(&types_path, &fresh_types).map_err(|err| {
                        format!("Failed to write {}: {err}", types_path.display())
                    })?;
                }
                record_outcome(&mut summary, types_outcome, &group.name, TYPES_FILE);

                let (merged, functions_outcome) =
                    merge_generated(prior_functions.as_deref(), &fresh_functions);
                if functions_outcome != MergeOutcome::Unchanged {
                    fs::write(&functions_path, &merged).map_err(|err| {
                        format!("Failed to write {}: {err}", functions_path.display())
                    })?;
                }
                record_outcome(&mut summary, functions_outcome, &group.name, FUNCTIONS_FILE);
            }
        }
    }

    match mode {
        Mode::Check => {
            summary.changed_groups = report.groups.len();
            let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
            let rendered = render_report(&report, &generated_at);
            let report_path = project_root.join(REPORT_FILE);
            fs::write(&report_path, &rendered)
                .map_err(|err| format!("Failed to write {}: {err}", report_path.display()))?;
        }
        Mode::Update => {
            // Write-back only happens when the table did not come from the
            // configuration; the context enforces that.
            aliases.persist(&output_root)?;
        }
    }

    summary.discovered_labels = aliases.discovered().to_vec();
    Ok(summary)
}

fn record_outcome(summary: &mut RunSummary, outcome: MergeOutcome, group: &str, file: &str) {
    let (mark, color) = match outcome {
        MergeOutcome::Created => {
            summary.files_created += 1;
            ("+", "\x1b[32m")
        }
        MergeOutcome::Merged | MergeOutcome::Overwritten => {
            summary.files_updated += 1;
            ("~", "\x1b[33m")
        }
        MergeOutcome::Unchanged => {
            summary.files_unchanged += 1;
            ("=", "\x1b[90m")
        }
    };
    println!("  {color}{mark}\x1b[0m {group}/{file}");
}

fn read_optional(path: &Path) -> Result<Option<String>, String> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;

    const SPEC: &str = r##"{
        "swagger": "2.0",
        "paths": {
            "/api/orders": {
                "get": {
                    "tags": ["order"],
                    "summary": "List orders",
                    "parameters": [
                        { "name": "page", "in": "query", "required": false, "type": "integer" }
                    ],
                    "responses": {
                        "200": { "schema": { "$ref": "#/definitions/order.PageDTO" } }
                    }
                },
                "post": {
                    "tags": ["order"],
                    "parameters": [
                        { "name": "body", "in": "body", "schema": { "$ref": "#/definitions/order.CreateDTO" } }
                    ],
                    "responses": {
                        "200": { "schema": { "$ref": "#/definitions/order.OrderDTO" } }
                    }
                }
            }
        },
        "definitions": {
            "order.OrderDTO": {
                "type": "object",
                "required": ["id"],
                "properties": { "id": { "type": "integer" }, "label": { "type": "string" } }
            },
            "order.CreateDTO": {
                "type": "object",
                "properties": { "label": { "type": "string" } }
            },
            "order.PageDTO": {
                "type": "object",
                "properties": {
                    "total": { "type": "integer" },
                    "items": { "type": "array", "items": { "$ref": "#/definitions/order.OrderDTO" } }
                }
            }
        }
    }"##;

    fn write_project(dir: &Path) {
        fs::write(dir.join("api.json"), SPEC).unwrap();
        fs::write(
            dir.join(CONFIG_FILE),
            "spec = \"api.json\"\noutput = \"services\"\n[naming]\nstrip_prefixes = [\"/api\"]\nstrip_suffixes = [\"DTO\"]\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_then_rerun_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let config = Config::load(dir.path()).unwrap();

        let first = run(dir.path(), &config, Mode::Update).await.unwrap();
        assert_eq!(first.groups, 1);
        assert_eq!(first.files_created, 2);
        assert_eq!(first.discovered_labels, vec!["order".to_string()]);

        let types = fs::read_to_string(dir.path().join("services/order/types.ts")).unwrap();
        assert!(types.contains("export interface Order {"));
        assert!(types.contains("export interface Page {"));
        assert!(types.contains("items?: Order[];"));
        assert!(types.contains("export interface GetOrdersParams {"));

        let api = fs::read_to_string(dir.path().join("services/order/api.ts")).unwrap();
        assert!(api.contains("export function getOrders(params?: GetOrdersParams)"));
        assert!(api.contains("export function postOrders(data: Create)"));

        // The discovered label was persisted for the next run.
        let aliases = fs::read_to_string(dir.path().join("services/aliases.json")).unwrap();
        assert!(aliases.contains("\"order\""));

        // Idempotence: a second run with an unchanged document touches nothing.
        let second = run(dir.path(), &config, Mode::Update).await.unwrap();
        assert_eq!(second.files_created, 0);
        assert_eq!(second.files_updated, 0);
        assert_eq!(second.files_unchanged, 2);
    }

    #[tokio::test]
    async fn test_update_preserves_hand_written_tail() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let config = Config::load(dir.path()).unwrap();
        run(dir.path(), &config, Mode::Update).await.unwrap();

        let api_path = dir.path().join("services/order/api.ts");
        let hand_written = "\nexport function myHelper() {\n  return getOrders();\n}\n";
        let mut api = fs::read_to_string(&api_path).unwrap();
        api.push_str(hand_written);
        fs::write(&api_path, &api).unwrap();

        run(dir.path(), &config, Mode::Update).await.unwrap();
        let merged = fs::read_to_string(&api_path).unwrap();
        assert!(merged.ends_with(hand_written));
        assert!(merged.contains("export function getOrders"));
    }

    #[tokio::test]
    async fn test_check_reports_everything_added_for_fresh_project() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let config = Config::load(dir.path()).unwrap();

        let summary = run(dir.path(), &config, Mode::Check).await.unwrap();
        assert_eq!(summary.changed_groups, 1);

        let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
        assert!(report.contains("## Group `order`"));
        assert!(report.contains("added `Order`"));
        assert!(report.contains("added `getOrders`"));

        // Check mode writes nothing under the output root.
        assert!(!dir.path().join("services/order").exists());
    }

    #[tokio::test]
    async fn test_check_after_update_reports_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let config = Config::load(dir.path()).unwrap();

        run(dir.path(), &config, Mode::Update).await.unwrap();
        let summary = run(dir.path(), &config, Mode::Check).await.unwrap();
        assert_eq!(summary.changed_groups, 0);

        let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
        assert!(report.contains("No changes detected."));
    }
}
