//! Type-declaration emitter.
//!
//! Renders `SchemaNode`s into inline TypeScript type expressions and
//! `NamedType`s into declaration blocks. Emission is purely mechanical string
//! building; every spec-dialect question has already been resolved by the
//! normalizer.

use crate::openapi::ir::model::{
    AdditionalProps, GroupApi, NamedType, Operation, ParamSpec, SchemaNode,
};
use crate::openapi::ir::names::{display_name, quote_if_needed};

/// Fixed first lines of every generated type-declaration file.
pub const TYPES_FILE_PREAMBLE: &str = "// Generated by apigen from the API description. This file is fully\n// machine-owned and rewritten on every run; do not edit by hand.\n";

/// Stateless renderer from schema nodes to TypeScript type text.
#[derive(Debug, Clone, Copy)]
pub struct TypeRenderer<'a> {
    pub strip_suffixes: &'a [String],
    pub exclude_fields: &'a [String],
}

impl<'a> TypeRenderer<'a> {
    pub fn new(strip_suffixes: &'a [String], exclude_fields: &'a [String]) -> Self {
        TypeRenderer {
            strip_suffixes,
            exclude_fields,
        }
    }

    fn is_excluded(&self, field: &str) -> bool {
        self.exclude_fields.iter().any(|f| f == field)
    }

    /// Map a primitive type tag to its TypeScript counterpart.
    pub fn primitive(tag: &str) -> &'static str {
        match tag {
            "string" => "string",
            "integer" | "number" => "number",
            "boolean" => "boolean",
            _ => "unknown",
        }
    }

    /// Type expression for a path/query parameter, from its own type tag.
    /// Enumerated parameters render as the union of their literal values;
    /// parameters without a tag default to `string`.
    pub fn param_type(&self, param: &ParamSpec) -> String {
        if !param.enum_values.is_empty() {
            return param
                .enum_values
                .iter()
                .map(|v| v.render())
                .collect::<Vec<_>>()
                .join(" | ");
        }
        match param.type_tag.as_deref() {
            None => "string".to_string(),
            Some("array") => "unknown[]".to_string(),
            Some(tag) => Self::primitive(tag).to_string(),
        }
    }

    /// Render a schema node as an inline type expression.
    pub fn inline(&self, node: &SchemaNode) -> String {
        if let Some(reference) = &node.reference {
            return display_name(reference, self.strip_suffixes);
        }

        if !node.enum_values.is_empty() {
            return node
                .enum_values
                .iter()
                .map(|v| v.render())
                .collect::<Vec<_>>()
                .join(" | ");
        }

        if !node.all_of.is_empty() {
            let members: Vec<_> = node.all_of.iter().map(|m| self.inline(m)).collect();
            return members.join(" & ");
        }

        match node.kind.as_deref() {
            Some("string") | Some("integer") | Some("number") | Some("boolean") => {
                Self::primitive(node.kind.as_deref().unwrap_or_default()).to_string()
            }
            Some("array") => match &node.items {
                Some(items) => {
                    let item_type = self.inline(items);
                    if item_type.contains(" | ") || item_type.contains(" & ") {
                        format!("({item_type})[]")
                    } else {
                        format!("{item_type}[]")
                    }
                }
                None => "unknown[]".to_string(),
            },
            Some("object") | None => self.object_literal(node),
            Some(_) => "unknown".to_string(),
        }
    }

    /// Render an object schema as an inline object/Record expression.
    fn object_literal(&self, node: &SchemaNode) -> String {
        let props: Vec<_> = node
            .properties
            .iter()
            .filter(|(name, _)| !self.is_excluded(name))
            .collect();

        if props.is_empty() {
            return match &node.additional {
                None => {
                    if node.kind.is_none() {
                        "unknown".to_string()
                    } else {
                        "Record<string, unknown>".to_string()
                    }
                }
                Some(additional) => self.record_of(additional),
            };
        }

        let fields: Vec<_> = props
            .iter()
            .map(|(name, schema)| {
                let opt = if node.is_required(name) { "" } else { "?" };
                format!("{}{}: {}", quote_if_needed(name), opt, self.inline(schema))
            })
            .collect();
        let literal = format!("{{ {} }}", fields.join("; "));

        match &node.additional {
            Some(additional) => format!("{literal} & {}", self.record_of(additional)),
            None => literal,
        }
    }

    fn record_of(&self, additional: &AdditionalProps) -> String {
        match additional {
            AdditionalProps::Allowed(true) => "Record<string, unknown>".to_string(),
            AdditionalProps::Allowed(false) => "{}".to_string(),
            AdditionalProps::Schema(schema) => {
                format!("Record<string, {}>", self.inline(schema))
            }
        }
    }

    /// Render a named type as a full declaration block.
    pub fn declaration(&self, ty: &NamedType) -> String {
        let mut out = String::new();
        if let Some(desc) = &ty.schema.description {
            out.push_str(&doc_comment(desc, ""));
        }

        if !ty.schema.enum_values.is_empty() {
            out.push_str(&format!(
                "export type {} = {};\n",
                ty.display_name,
                self.inline(&ty.schema)
            ));
            return out;
        }

        if !ty.schema.all_of.is_empty() {
            out.push_str(&self.all_of_declaration(ty));
            return out;
        }

        if !ty.schema.properties.is_empty() {
            if ty.schema.additional.is_some() {
                // Known fields plus an index signature: intersection alias.
                out.push_str(&format!(
                    "export type {} = {};\n",
                    ty.display_name,
                    self.object_literal(&ty.schema)
                ));
            } else {
                out.push_str(&self.interface_block(&ty.display_name, &[], &ty.schema));
            }
            return out;
        }

        out.push_str(&format!(
            "export type {} = {};\n",
            ty.display_name,
            self.inline(&ty.schema)
        ));
        out
    }

    /// Declaration for an `allOf` composition: an intersection alias when
    /// every member is a reference, otherwise an interface extending the
    /// referenced members and declaring the merged own properties (later
    /// members override earlier ones with the same name).
    fn all_of_declaration(&self, ty: &NamedType) -> String {
        let mut extends = Vec::new();
        let mut merged = SchemaNode::default();

        for member in &ty.schema.all_of {
            if let Some(reference) = &member.reference {
                extends.push(display_name(reference, self.strip_suffixes));
            } else {
                for (name, schema) in &member.properties {
                    merged.properties.insert(name.clone(), schema.clone());
                    merged.required.retain(|r| r != name);
                    if member.is_required(name) {
                        merged.required.push(name.clone());
                    }
                }
            }
        }

        if merged.properties.is_empty() && !extends.is_empty() {
            format!("export type {} = {};\n", ty.display_name, extends.join(" & "))
        } else {
            self.interface_block(&ty.display_name, &extends, &merged)
        }
    }

    fn interface_block(&self, name: &str, extends: &[String], schema: &SchemaNode) -> String {
        let extends_clause = if extends.is_empty() {
            String::new()
        } else {
            format!(" extends {}", extends.join(", "))
        };

        let mut out = format!("export interface {name}{extends_clause} {{\n");
        for (prop, prop_schema) in &schema.properties {
            if self.is_excluded(prop) {
                continue;
            }
            if let Some(desc) = &prop_schema.description {
                out.push_str(&doc_comment(desc, "  "));
            }
            let opt = if schema.is_required(prop) { "" } else { "?" };
            out.push_str(&format!(
                "  {}{}: {};\n",
                quote_if_needed(prop),
                opt,
                self.inline(prop_schema)
            ));
        }
        out.push_str("}\n");
        out
    }

    /// Usable query parameters of an operation: blank/placeholder names and
    /// excluded names are dropped from the generated interface.
    pub fn usable_query_params<'op>(&self, op: &'op Operation) -> Vec<&'op ParamSpec> {
        op.query_params
            .iter()
            .filter(|p| {
                let name = p.name.trim();
                !name.is_empty() && name != "_" && !self.is_excluded(name)
            })
            .collect()
    }

    /// Dedicated parameters interface for an operation's query parameters.
    pub fn params_interface(&self, op: &Operation) -> Option<String> {
        let type_name = op.params_type.as_ref()?;
        let params = self.usable_query_params(op);
        if params.is_empty() {
            return None;
        }

        let mut out = format!("export interface {type_name} {{\n");
        for param in params {
            if let Some(desc) = &param.description {
                out.push_str(&doc_comment(desc, "  "));
            }
            let opt = if param.required { "" } else { "?" };
            out.push_str(&format!(
                "  {}{}: {};\n",
                quote_if_needed(&param.name),
                opt,
                self.param_type(param)
            ));
        }
        out.push_str("}\n");
        Some(out)
    }

    /// Assemble the full type-declaration file for a group: the reachable
    /// named types under per-module banners, then the per-operation
    /// parameter interfaces.
    pub fn render_types_file(&self, group: &GroupApi) -> String {
        let mut out = String::from(TYPES_FILE_PREAMBLE);

        for (module, types) in &group.modules {
            if types.is_empty() {
                continue;
            }
            out.push_str(&format!("\n// ---- module: {module} ----\n\n"));
            let blocks: Vec<_> = types.iter().map(|t| self.declaration(t)).collect();
            out.push_str(&blocks.join("\n"));
        }

        let param_blocks: Vec<_> = group
            .operations
            .iter()
            .filter_map(|op| self.params_interface(op))
            .collect();
        if !param_blocks.is_empty() {
            out.push_str("\n// ---- operation parameters ----\n\n");
            out.push_str(&param_blocks.join("\n"));
        }

        out
    }
}

/// Render a free-text description as a single-line doc comment.
fn doc_comment(text: &str, indent: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{indent}/** {single_line} */\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::ir::model::LiteralValue;
    use std::collections::BTreeMap;

    fn renderer<'a>() -> TypeRenderer<'a> {
        TypeRenderer::new(&[], &[])
    }

    fn prop(name: &str, kind: &str) -> (String, SchemaNode) {
        (
            name.to_string(),
            SchemaNode {
                kind: Some(kind.to_string()),
                ..SchemaNode::default()
            },
        )
    }

    #[test]
    fn test_primitive_mapping() {
        assert_eq!(TypeRenderer::primitive("string"), "string");
        assert_eq!(TypeRenderer::primitive("integer"), "number");
        assert_eq!(TypeRenderer::primitive("number"), "number");
        assert_eq!(TypeRenderer::primitive("boolean"), "boolean");
        assert_eq!(TypeRenderer::primitive("file"), "unknown");
    }

    #[test]
    fn test_inline_array_of_ref() {
        let node = SchemaNode {
            kind: Some("array".to_string()),
            items: Some(Box::new(SchemaNode::reference_to("user.User"))),
            ..SchemaNode::default()
        };
        assert_eq!(renderer().inline(&node), "User[]");
    }

    #[test]
    fn test_inline_array_without_items() {
        let node = SchemaNode {
            kind: Some("array".to_string()),
            ..SchemaNode::default()
        };
        assert_eq!(renderer().inline(&node), "unknown[]");
    }

    #[test]
    fn test_inline_bare_object_is_record() {
        let node = SchemaNode {
            kind: Some("object".to_string()),
            ..SchemaNode::default()
        };
        assert_eq!(renderer().inline(&node), "Record<string, unknown>");
    }

    #[test]
    fn test_inline_enum_union() {
        let node = SchemaNode {
            enum_values: vec![
                LiteralValue::String("active".to_string()),
                LiteralValue::String("archived".to_string()),
                LiteralValue::Int(3),
            ],
            ..SchemaNode::default()
        };
        assert_eq!(renderer().inline(&node), "\"active\" | \"archived\" | 3");
    }

    #[test]
    fn test_declaration_interface() {
        let mut properties = BTreeMap::new();
        let (k, v) = prop("id", "integer");
        properties.insert(k, v);
        let (k, v) = prop("name", "string");
        properties.insert(k, v);

        let ty = NamedType {
            qualified_name: "user.User".to_string(),
            display_name: "User".to_string(),
            schema: SchemaNode {
                kind: Some("object".to_string()),
                properties,
                required: vec!["id".to_string()],
                ..SchemaNode::default()
            },
        };
        assert_eq!(
            renderer().declaration(&ty),
            "export interface User {\n  id: number;\n  name?: string;\n}\n"
        );
    }

    #[test]
    fn test_declaration_all_of_refs_only() {
        let ty = NamedType {
            qualified_name: "Admin".to_string(),
            display_name: "Admin".to_string(),
            schema: SchemaNode {
                all_of: vec![
                    SchemaNode::reference_to("Base"),
                    SchemaNode::reference_to("User"),
                ],
                ..SchemaNode::default()
            },
        };
        assert_eq!(renderer().declaration(&ty), "export type Admin = Base & User;\n");
    }

    #[test]
    fn test_declaration_all_of_with_own_props() {
        let mut first = BTreeMap::new();
        let (k, v) = prop("role", "string");
        first.insert(k, v);
        let mut second = BTreeMap::new();
        let (k, v) = prop("role", "integer");
        second.insert(k, v);

        let ty = NamedType {
            qualified_name: "Admin".to_string(),
            display_name: "Admin".to_string(),
            schema: SchemaNode {
                all_of: vec![
                    SchemaNode::reference_to("User"),
                    SchemaNode {
                        properties: first,
                        required: vec!["role".to_string()],
                        ..SchemaNode::default()
                    },
                    SchemaNode {
                        properties: second,
                        ..SchemaNode::default()
                    },
                ],
                ..SchemaNode::default()
            },
        };
        // The later member overrides both the type and the required flag.
        assert_eq!(
            renderer().declaration(&ty),
            "export interface Admin extends User {\n  role?: number;\n}\n"
        );
    }

    #[test]
    fn test_excluded_fields_are_omitted() {
        let exclude = vec!["internalFlag".to_string()];
        let renderer = TypeRenderer::new(&[], &exclude);

        let mut properties = BTreeMap::new();
        let (k, v) = prop("id", "integer");
        properties.insert(k, v);
        let (k, v) = prop("internalFlag", "boolean");
        properties.insert(k, v);

        let ty = NamedType {
            qualified_name: "User".to_string(),
            display_name: "User".to_string(),
            schema: SchemaNode {
                kind: Some("object".to_string()),
                properties,
                ..SchemaNode::default()
            },
        };
        let decl = renderer.declaration(&ty);
        assert!(decl.contains("id?: number"));
        assert!(!decl.contains("internalFlag"));
    }

    #[test]
    fn test_quoted_property_names() {
        let mut properties = BTreeMap::new();
        let (k, v) = prop("x-request-id", "string");
        properties.insert(k, v);
        let ty = NamedType {
            qualified_name: "Meta".to_string(),
            display_name: "Meta".to_string(),
            schema: SchemaNode {
                kind: Some("object".to_string()),
                properties,
                ..SchemaNode::default()
            },
        };
        assert!(
            renderer()
                .declaration(&ty)
                .contains("\"x-request-id\"?: string;")
        );
    }

    #[test]
    fn test_params_interface_enum_param() {
        let op = Operation {
            raw_path: "/orders".to_string(),
            path: "/orders".to_string(),
            method: crate::openapi::ir::model::HttpMethod::Get,
            group: "default".to_string(),
            call_name: "getOrders".to_string(),
            summary: None,
            body_ref: None,
            body_type: None,
            body_schema: None,
            params_type: Some("GetOrdersParams".to_string()),
            response_type: None,
            response_schema: None,
            path_params: vec![],
            query_params: vec![
                ParamSpec {
                    name: "status".to_string(),
                    type_tag: Some("string".to_string()),
                    enum_values: vec![
                        LiteralValue::String("open".to_string()),
                        LiteralValue::String("closed".to_string()),
                    ],
                    required: true,
                    description: None,
                },
                ParamSpec {
                    name: "".to_string(),
                    type_tag: None,
                    enum_values: vec![],
                    required: false,
                    description: None,
                },
            ],
        };

        let block = renderer().params_interface(&op).unwrap();
        assert_eq!(
            block,
            "export interface GetOrdersParams {\n  status: \"open\" | \"closed\";\n}\n"
        );
    }
}
