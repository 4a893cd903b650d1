//! Category alias table with an explicit lifecycle.
//!
//! Raw category labels (the first tag of an operation) are mapped to the
//! directory aliases their groups are emitted under. The table is loaded once
//! per run: an explicitly configured table wins over the alias file persisted
//! in the output root. Labels discovered during the run without a mapping
//! default to themselves and are recorded so the operator can customize them
//! later. The table is written back only when it was not sourced from the
//! higher-priority configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Alias filename inside the output root.
pub const ALIAS_FILE: &str = "aliases.json";

/// The alias table threaded through a run. Never global state; one instance
/// is created per run and carried explicitly.
#[derive(Debug)]
pub struct AliasContext {
    table: BTreeMap<String, String>,
    /// True when the table came from the configuration, which suppresses
    /// both the persisted-file read and the write-back.
    from_config: bool,
    /// Labels first seen during this run, in discovery order.
    discovered: Vec<String>,
}

impl AliasContext {
    /// Load the table from the highest-priority source available.
    pub fn load(
        configured: Option<&BTreeMap<String, String>>,
        output_root: &Path,
    ) -> Result<AliasContext, String> {
        if let Some(table) = configured {
            return Ok(AliasContext {
                table: table.clone(),
                from_config: true,
                discovered: Vec::new(),
            });
        }

        let path = output_root.join(ALIAS_FILE);
        let table = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
            serde_json::from_str(&content)
                .map_err(|err| format!("Failed to parse {}: {err}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(AliasContext {
            table,
            from_config: false,
            discovered: Vec::new(),
        })
    }

    /// Resolve a raw label to its alias, defaulting unmapped labels to an
    /// identity alias and recording the discovery.
    pub fn resolve(&mut self, label: &str) -> String {
        if let Some(alias) = self.table.get(label) {
            return alias.clone();
        }
        self.table.insert(label.to_string(), label.to_string());
        self.discovered.push(label.to_string());
        label.to_string()
    }

    /// Labels first seen during this run, for the operator advisory.
    pub fn discovered(&self) -> &[String] {
        &self.discovered
    }

    /// Write the table back to the output root. A no-op (returning `false`)
    /// when the table was sourced from the configuration.
    pub fn persist(&self, output_root: &Path) -> Result<bool, String> {
        if self.from_config {
            debug!("Alias table came from configuration; skipping write-back.");
            return Ok(false);
        }

        fs::create_dir_all(output_root)
            .map_err(|err| format!("Failed to create output root: {err}"))?;

        let path = output_root.join(ALIAS_FILE);
        let content = serde_json::to_string_pretty(&self.table)
            .map_err(|err| format!("Failed to serialize alias table: {err}"))?;
        fs::write(&path, content)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        Ok(true)
    }
}
