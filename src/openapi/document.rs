//! Raw spec document structs for serde deserialization.
//!
//! One superset shape covers both supported dialects: Swagger 2.0 keeps its
//! schemas under `definitions` and carries body/response schemas inline,
//! OpenAPI 3.0 keeps schemas under `components.schemas` and nests payload
//! schemas inside `content` media-type maps. The dialect is decided once,
//! from the version marker fields, and never re-inspected downstream.

// Fields that are part of the spec dialects but not consumed everywhere are
// kept for completeness.
#![allow(dead_code)]

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// The spec dialect of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swagger 2.0 (`"swagger": "2.0"`).
    Swagger2,
    /// OpenAPI 3.0 (`"openapi": "3.x"`).
    OpenApi3,
}

/// Root document of either dialect.
#[derive(Debug, Deserialize)]
pub struct SpecDocument {
    /// Swagger 2.0 version marker.
    pub swagger: Option<String>,
    /// OpenAPI 3.0 version marker.
    pub openapi: Option<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Swagger 2.0 definition table.
    pub definitions: Option<HashMap<String, SchemaDoc>>,
    /// OpenAPI 3.0 components section.
    pub components: Option<Components>,
}

/// OpenAPI 3.0 components section; only schemas are consumed.
#[derive(Debug, Deserialize)]
pub struct Components {
    pub schemas: Option<HashMap<String, SchemaDoc>>,
}

/// A path item holding the operations declared for each HTTP method.
#[derive(Debug, Deserialize)]
pub struct PathItem {
    pub get: Option<OperationDoc>,
    pub post: Option<OperationDoc>,
    pub put: Option<OperationDoc>,
    pub patch: Option<OperationDoc>,
    pub delete: Option<OperationDoc>,
    /// Path-level parameters shared by all operations.
    pub parameters: Option<Vec<ParameterDoc>>,
}

/// A single declared operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDoc {
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub parameters: Option<Vec<ParameterDoc>>,
    /// OpenAPI 3.0 request body.
    pub request_body: Option<RequestBodyDoc>,
    #[serde(default)]
    pub responses: HashMap<String, ResponseDoc>,
}

impl OperationDoc {
    /// First declared category label, defaulting to `default`.
    pub fn category_label(&self) -> &str {
        self.tags
            .as_ref()
            .and_then(|tags| tags.first())
            .map_or("default", |tag| tag.as_str())
    }
}

/// A parameter declaration. Swagger 2.0 types the parameter directly
/// (`type`/`enum` on the parameter); OpenAPI 3.0 nests a `schema`.
#[derive(Debug, Deserialize)]
pub struct ParameterDoc {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    /// Parameter schema (OpenAPI 3.0, and Swagger 2.0 `in: body`).
    pub schema: Option<SchemaDoc>,
    /// Direct type tag (Swagger 2.0).
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    /// Direct enumeration (Swagger 2.0).
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,
}

/// An OpenAPI 3.0 request body.
#[derive(Debug, Deserialize)]
pub struct RequestBodyDoc {
    #[serde(default)]
    pub required: bool,
    pub content: Option<HashMap<String, MediaTypeDoc>>,
}

/// A response declaration of either dialect.
#[derive(Debug, Deserialize)]
pub struct ResponseDoc {
    pub description: Option<String>,
    /// Direct response schema (Swagger 2.0).
    pub schema: Option<SchemaDoc>,
    /// Media-type map (OpenAPI 3.0).
    pub content: Option<HashMap<String, MediaTypeDoc>>,
}

/// Media type entry (e.g. `application/json`).
#[derive(Debug, Deserialize)]
pub struct MediaTypeDoc {
    pub schema: Option<SchemaDoc>,
}

/// JSON-Schema-like definition used by both dialects.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDoc {
    #[serde(rename = "type")]
    pub schema_type: Option<String>,

    /// Reference to another definition, in either dialect's path convention.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    pub properties: Option<HashMap<String, SchemaDoc>>,

    pub required: Option<Vec<String>>,

    pub items: Option<Box<SchemaDoc>>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,

    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<SchemaDoc>>,

    pub additional_properties: Option<AdditionalPropertiesDoc>,

    pub description: Option<String>,

    /// Format hint (e.g. `date-time`); parsed but not emitted as a type.
    pub format: Option<String>,
}

/// Enum values can be strings, integers, floats, booleans, or null.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

/// `additionalProperties` is either a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalPropertiesDoc {
    Bool(bool),
    Schema(Box<SchemaDoc>),
}

impl SpecDocument {
    /// Parse a spec document from JSON, falling back to YAML.
    pub fn parse(text: &str) -> Result<Self, String> {
        match serde_json::from_str::<SpecDocument>(text) {
            Ok(doc) => Ok(doc),
            Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| {
                format!(
                    "Failed to parse spec document as JSON ({json_err}) or YAML ({yaml_err})"
                )
            }),
        }
    }

    /// Detect the dialect from the version marker fields.
    ///
    /// A document carrying neither marker is treated as Swagger 2.0; this is
    /// a deliberate permissive fallback, not a validation failure.
    pub fn dialect(&self) -> Dialect {
        if self
            .openapi
            .as_deref()
            .is_some_and(|version| version.starts_with('3'))
        {
            Dialect::OpenApi3
        } else {
            Dialect::Swagger2
        }
    }
}

/// Extract the qualified type name from a reference path, accepting both
/// dialects' conventions.
pub fn ref_to_qualified_name(ref_path: &str) -> String {
    ref_path
        .strip_prefix("#/components/schemas/")
        .or_else(|| ref_path.strip_prefix("#/definitions/"))
        .unwrap_or(ref_path)
        .to_string()
}
