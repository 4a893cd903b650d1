//! Project manifest loading.
//!
//! `apigen.toml` at the project root describes where the API description
//! lives, where generated files go, and how names and calls are shaped. The
//! manifest is loaded and validated before the generation core runs.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest filename looked up in the project root.
pub const CONFIG_FILE: &str = "apigen.toml";

/// The call convention applied to every generated function in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallConvention {
    /// `client.get<Res>(url, { params })` / `client.post(url, data, { params })`
    #[default]
    Chained,
    /// `client<Res>({ url, method, data, params })`
    Object,
}

/// Root manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Input location: a local path or an http(s) URL.
    pub spec: String,
    /// Output root for generated files, relative to the project root.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
}

/// Request-client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub style: CallConvention,
    /// Imported client symbol.
    pub client: String,
    /// Import path the client symbol comes from.
    pub import_from: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            style: CallConvention::Chained,
            client: "client".to_string(),
            import_from: "@/utils/client".to_string(),
        }
    }
}

/// Naming settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Path prefixes stripped before call names are derived. Sorted
    /// longest-first at load time so a more specific prefix always wins.
    pub strip_prefixes: Vec<String>,
    /// Suffixes removed from type display names.
    pub strip_suffixes: Vec<String>,
    /// Field names omitted from every declaration.
    pub exclude_fields: Vec<String>,
    /// Envelope field to unwrap response types through. Absent means
    /// unwrapping is disabled and the full envelope type is kept.
    pub unwrap_field: Option<String>,
}

/// Category label filtering and aliasing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    /// Allow-list of raw category labels; takes precedence over `exclude`.
    pub include: Vec<String>,
    /// Deny-list of raw category labels.
    pub exclude: Vec<String>,
    /// Explicit label -> directory alias table. When present it takes
    /// priority over the persisted alias file and is never written back.
    pub aliases: Option<std::collections::BTreeMap<String, String>>,
}

fn default_output() -> PathBuf {
    PathBuf::from("src/services")
}

impl Config {
    /// Load and validate the manifest from `<project_root>/apigen.toml`.
    pub fn load(project_root: &Path) -> Result<Config, String> {
        let path = project_root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(format!(
                "{} not found at {}. Run `apigen init` to create one.",
                CONFIG_FILE,
                path.display()
            ));
        }

        let content = fs::read_to_string(&path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|err| format!("Failed to parse {}: {err}", path.display()))?;

        if config.spec.trim().is_empty() {
            return Err(format!("`spec` in {CONFIG_FILE} must not be empty"));
        }

        // Longest prefix first, so /api/v1 wins over /api.
        config
            .naming
            .strip_prefixes
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Ok(config)
    }

    /// Absolute output root for a project.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output)
    }
}

/// Commented manifest template written by `apigen init`.
pub const DEFAULT_MANIFEST: &str = r#"# apigen project manifest.

# Where the API description lives: a local path or an http(s) URL.
spec = "http://localhost:8000/openapi.json"

# Output root for generated files, relative to this file.
output = "src/services"

[request]
# Call convention: "chained" (client.get<T>(url)) or "object" (client<T>({ url })).
style = "chained"
# Request-client symbol and the path it is imported from.
client = "client"
import_from = "@/utils/client"

[naming]
# Path prefixes stripped before call names are derived (longest match wins).
strip_prefixes = ["/api"]
# Suffixes removed from type display names.
strip_suffixes = ["DTO", "VO"]
# Field names omitted from every generated declaration.
exclude_fields = []
# Envelope field to unwrap response types through; remove to keep envelopes.
unwrap_field = "data"

[groups]
# Optional allow/deny lists of raw category labels.
include = []
exclude = []

# Optional explicit label -> directory aliases. When this table is present it
# takes priority over the persisted aliases.json and is never written back.
# [groups.aliases]
# "user management" = "user"
"#;
