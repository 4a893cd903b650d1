//! Unified intermediate model for API descriptions.
//!
//! Both spec dialects are normalized into these types; everything downstream
//! of the normalizer (emitters, diff engine) is dialect-agnostic.

// Allow dead code for model fields that are part of the design but not read
// by every consumer.
#![allow(dead_code)]

use std::collections::BTreeMap;

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    /// Read-style verbs use the no-body client signature in the chained
    /// call convention.
    pub fn is_read(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// A literal value appearing in an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    Null,
}

impl LiteralValue {
    /// Render as a TypeScript literal: strings quoted, everything else bare.
    pub fn render(&self) -> String {
        match self {
            LiteralValue::String(s) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            LiteralValue::Int(i) => i.to_string(),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::Bool(b) => b.to_string(),
            LiteralValue::Null => "null".to_string(),
        }
    }
}

/// `additionalProperties` of an object schema: either a blanket allow/deny
/// flag or a value schema.
#[derive(Debug, Clone)]
pub enum AdditionalProps {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// Recursive, dialect-agnostic schema description.
///
/// At most one of `reference`, `kind`, `all_of` and `enum_values` acts as the
/// node's primary discriminant; `properties`/`items`/`additional` may
/// co-occur with an `object`/`array` kind.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// Qualified name of a referenced definition (reference path already
    /// stripped of its dialect prefix).
    pub reference: Option<String>,
    /// Primitive kind tag as carried by the document: `string`, `integer`,
    /// `number`, `boolean`, `object`, `array`.
    pub kind: Option<String>,
    /// Object properties. Insertion order is irrelevant; a sorted map keeps
    /// emission deterministic.
    pub properties: BTreeMap<String, SchemaNode>,
    /// Required property names.
    pub required: Vec<String>,
    /// Item schema for sequences.
    pub items: Option<Box<SchemaNode>>,
    /// Ordered members of an `allOf` composition.
    pub all_of: Vec<SchemaNode>,
    /// Enumerated literal set.
    pub enum_values: Vec<LiteralValue>,
    /// `additionalProperties`, when declared.
    pub additional: Option<AdditionalProps>,
    /// Free-text description.
    pub description: Option<String>,
}

impl SchemaNode {
    /// Shorthand for a node that only references a named definition.
    pub fn reference_to(name: &str) -> Self {
        SchemaNode {
            reference: Some(name.to_string()),
            ..SchemaNode::default()
        }
    }

    pub fn is_required(&self, prop: &str) -> bool {
        self.required.iter().any(|r| r == prop)
    }
}

/// A path or query parameter of an operation.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    /// Primitive type tag of the parameter, when declared.
    pub type_tag: Option<String>,
    /// Enumerated values, when the parameter is an enumeration.
    pub enum_values: Vec<LiteralValue>,
    pub required: bool,
    pub description: Option<String>,
}

/// A normalized HTTP operation.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Path exactly as declared in the document.
    pub raw_path: String,
    /// Path with the longest matching configured prefix stripped.
    pub path: String,
    pub method: HttpMethod,
    /// Resolved group alias this operation is emitted under.
    pub group: String,
    /// Deterministic call name derived from verb + cleaned path.
    pub call_name: String,
    pub summary: Option<String>,
    /// Qualified name of the request-body definition, when the body is a
    /// plain reference.
    pub body_ref: Option<String>,
    /// Rendered type expression for the `data` parameter, when a body was
    /// resolved.
    pub body_type: Option<String>,
    /// Raw request-body schema.
    pub body_schema: Option<SchemaNode>,
    /// Name of the generated query-params interface, when the operation has
    /// at least one usable query parameter.
    pub params_type: Option<String>,
    /// Rendered response type expression, after the unwrap heuristic.
    pub response_type: Option<String>,
    /// Raw response schema, before unwrapping.
    pub response_schema: Option<SchemaNode>,
    pub path_params: Vec<ParamSpec>,
    pub query_params: Vec<ParamSpec>,
}

/// A resolved, nameable schema.
#[derive(Debug, Clone)]
pub struct NamedType {
    /// Original dialect-qualified name, e.g. `user.LoginDTO`.
    pub qualified_name: String,
    /// Cleaned display name, e.g. `Login`.
    pub display_name: String,
    pub schema: SchemaNode,
}

/// One emission group: the operations filed under a category alias plus the
/// named types transitively reachable from their schemas, keyed by module.
#[derive(Debug, Clone)]
pub struct GroupApi {
    pub name: String,
    pub operations: Vec<Operation>,
    pub modules: BTreeMap<String, Vec<NamedType>>,
}

/// The full normalized model for one run.
#[derive(Debug, Clone, Default)]
pub struct ApiModel {
    /// Groups sorted by name; each writes to a disjoint output directory.
    pub groups: Vec<GroupApi>,
}

impl ApiModel {
    pub fn group(&self, name: &str) -> Option<&GroupApi> {
        self.groups.iter().find(|g| g.name == name)
    }
}
