//! Normalization from raw spec documents to the unified API model.
//!
//! This module owns every dialect-specific question: where definitions live,
//! where body and response schemas hide, how references are written, and the
//! response-unwrap heuristic. The dialect is decided once at the entry point
//! and expressed as a pair of payload accessors; nothing downstream of the
//! returned model ever branches on it again.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::aliases::AliasContext;
use crate::openapi::document::{
    AdditionalPropertiesDoc, Dialect, EnumValue, MediaTypeDoc, OperationDoc, ParameterDoc,
    SchemaDoc, SpecDocument, ref_to_qualified_name,
};
use crate::openapi::emit::types::TypeRenderer;
use crate::openapi::ir::model::{
    AdditionalProps, ApiModel, GroupApi, HttpMethod, LiteralValue, NamedType, Operation,
    ParamSpec, SchemaNode,
};
use crate::openapi::ir::names::{
    call_name, capitalize_first, display_name, module_name, strip_path_prefix,
};

/// Options controlling one normalization run, borrowed from the config.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions<'a> {
    /// Path prefixes to strip, pre-sorted longest-first.
    pub strip_prefixes: &'a [String],
    pub strip_suffixes: &'a [String],
    pub exclude_fields: &'a [String],
    /// Envelope field to unwrap response types through; `None` disables
    /// unwrapping entirely.
    pub unwrap_field: Option<&'a str>,
    /// Allow-list of raw category labels; beats `exclude_labels`.
    pub include_labels: &'a [String],
    /// Deny-list of raw category labels.
    pub exclude_labels: &'a [String],
}

/// Dialect-specific payload accessors, selected once when normalization
/// starts so no dialect branching leaks into downstream consumers.
#[derive(Clone, Copy)]
struct DialectShape {
    body_schema: fn(&OperationDoc) -> Option<&SchemaDoc>,
    response_schema: fn(&OperationDoc) -> Option<&SchemaDoc>,
}

/// Success responses consulted in priority order.
const RESPONSE_STATUS_PRIORITY: [&str; 4] = ["200", "201", "202", "default"];

/// Normalize a parsed document into the unified API model.
pub fn normalize_document(
    doc: &SpecDocument,
    opts: &NormalizeOptions<'_>,
    aliases: &mut AliasContext,
) -> ApiModel {
    match doc.dialect() {
        Dialect::Swagger2 => extract_swagger2(doc, opts, aliases),
        Dialect::OpenApi3 => extract_openapi3(doc, opts, aliases),
    }
}

/// Extraction for Swagger 2.0: definitions table, body parameter, direct
/// response schemas.
fn extract_swagger2(
    doc: &SpecDocument,
    opts: &NormalizeOptions<'_>,
    aliases: &mut AliasContext,
) -> ApiModel {
    let definitions = doc.definitions.clone().unwrap_or_default();
    let shape = DialectShape {
        body_schema: swagger2_body,
        response_schema: swagger2_response,
    };
    build_model(doc, &definitions, shape, opts, aliases)
}

/// Extraction for OpenAPI 3.0: component schemas, request bodies, media-type
/// response content.
fn extract_openapi3(
    doc: &SpecDocument,
    opts: &NormalizeOptions<'_>,
    aliases: &mut AliasContext,
) -> ApiModel {
    let definitions = doc
        .components
        .as_ref()
        .and_then(|c| c.schemas.clone())
        .unwrap_or_default();
    let shape = DialectShape {
        body_schema: openapi3_body,
        response_schema: openapi3_response,
    };
    build_model(doc, &definitions, shape, opts, aliases)
}

fn swagger2_body(op: &OperationDoc) -> Option<&SchemaDoc> {
    op.parameters
        .as_ref()?
        .iter()
        .find(|p| p.location == "body")?
        .schema
        .as_ref()
}

fn swagger2_response(op: &OperationDoc) -> Option<&SchemaDoc> {
    success_response_priority(op)?.schema.as_ref()
}

fn openapi3_body(op: &OperationDoc) -> Option<&SchemaDoc> {
    media_schema(op.request_body.as_ref()?.content.as_ref()?)
}

fn openapi3_response(op: &OperationDoc) -> Option<&SchemaDoc> {
    media_schema(success_response_priority(op)?.content.as_ref()?)
}

fn success_response_priority(op: &OperationDoc) -> Option<&crate::openapi::document::ResponseDoc> {
    RESPONSE_STATUS_PRIORITY
        .iter()
        .find_map(|status| op.responses.get(*status))
}

/// First of `application/json` then `*/*`; other media entries are ignored.
fn media_schema(content: &HashMap<String, MediaTypeDoc>) -> Option<&SchemaDoc> {
    content
        .get("application/json")
        .or_else(|| content.get("*/*"))?
        .schema
        .as_ref()
}

/// Shared model construction: operations per group, then the reference
/// closure, then per-group module assembly.
fn build_model(
    doc: &SpecDocument,
    definitions: &HashMap<String, SchemaDoc>,
    shape: DialectShape,
    opts: &NormalizeOptions<'_>,
    aliases: &mut AliasContext,
) -> ApiModel {
    let renderer = TypeRenderer::new(opts.strip_suffixes, opts.exclude_fields);

    // Group name -> (operations in declaration order, reference seeds).
    let mut groups: BTreeMap<String, (Vec<Operation>, Vec<String>)> = BTreeMap::new();

    for (path, item) in &doc.paths {
        let verbs = [
            (HttpMethod::Get, item.get.as_ref()),
            (HttpMethod::Post, item.post.as_ref()),
            (HttpMethod::Put, item.put.as_ref()),
            (HttpMethod::Patch, item.patch.as_ref()),
            (HttpMethod::Delete, item.delete.as_ref()),
        ];
        for (method, op_doc) in verbs {
            let Some(op_doc) = op_doc else {
                continue;
            };
            let label = op_doc.category_label();
            if !label_accepted(label, opts) {
                debug!(path = %path, label = %label, "Operation filtered out by label lists.");
                continue;
            }
            let group = aliases.resolve(label);

            let mut refs = Vec::new();
            let operation = build_operation(
                path,
                method,
                op_doc,
                item.parameters.as_deref(),
                &group,
                shape,
                definitions,
                opts,
                &renderer,
                &mut refs,
            );

            let entry = groups.entry(group).or_default();
            entry.0.push(operation);
            entry.1.extend(refs);
        }
    }

    // Resolve every type reachable from any operation, once, cycle-safe.
    let all_seeds: Vec<String> = groups
        .values()
        .flat_map(|(_, seeds)| seeds.iter().cloned())
        .collect();
    let resolved = resolve_types(&all_seeds, definitions, opts);

    let groups = groups
        .into_iter()
        .map(|(name, (operations, seeds))| {
            let reachable = reachable_from(&seeds, &resolved);
            let modules = group_into_modules(&reachable, &resolved);
            GroupApi {
                name,
                operations,
                modules,
            }
        })
        .collect();

    ApiModel { groups }
}

/// Apply the label filter: an explicit allow-list takes precedence over a
/// deny-list; absent both, every label is accepted.
fn label_accepted(label: &str, opts: &NormalizeOptions<'_>) -> bool {
    if !opts.include_labels.is_empty() {
        return opts.include_labels.iter().any(|l| l == label);
    }
    if !opts.exclude_labels.is_empty() {
        return !opts.exclude_labels.iter().any(|l| l == label);
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn build_operation(
    raw_path: &str,
    method: HttpMethod,
    op_doc: &OperationDoc,
    path_level_params: Option<&[ParameterDoc]>,
    group: &str,
    shape: DialectShape,
    definitions: &HashMap<String, SchemaDoc>,
    opts: &NormalizeOptions<'_>,
    renderer: &TypeRenderer<'_>,
    refs: &mut Vec<String>,
) -> Operation {
    let cleaned = strip_path_prefix(raw_path, opts.strip_prefixes);
    let name = call_name(method.as_str(), &cleaned);

    // Path-level parameters first, operation-level ones override by name.
    let mut merged: Vec<&ParameterDoc> = Vec::new();
    for p in path_level_params.into_iter().flatten() {
        merged.push(p);
    }
    for p in op_doc.parameters.iter().flatten() {
        merged.retain(|existing| existing.name != p.name);
        merged.push(p);
    }

    let mut path_params = Vec::new();
    let mut query_params = Vec::new();
    for p in merged {
        match p.location.as_str() {
            "path" => path_params.push(convert_param(p)),
            "query" => query_params.push(convert_param(p)),
            // The body parameter is handled through the dialect shape;
            // header/cookie/formData parameters are not emitted.
            _ => {}
        }
    }

    let (body_schema, body_ref, body_type) = match (shape.body_schema)(op_doc) {
        Some(schema_doc) => {
            let node = convert_schema(schema_doc, refs);
            let body_ref = node.reference.clone();
            let body_type = renderer.inline(&node);
            (Some(node), body_ref, Some(body_type))
        }
        None => (None, None, None),
    };

    let (response_schema, response_type) = match (shape.response_schema)(op_doc) {
        Some(schema_doc) => {
            let node = convert_schema(schema_doc, refs);
            let unwrapped = opts
                .unwrap_field
                .and_then(|field| unwrap_response(&node, field, definitions, refs));
            let text = renderer.inline(unwrapped.as_ref().unwrap_or(&node));
            (Some(node), Some(text))
        }
        None => (None, None),
    };

    let has_usable_query = query_params.iter().any(|p: &ParamSpec| {
        let trimmed = p.name.trim();
        !trimmed.is_empty() && trimmed != "_" && !opts.exclude_fields.iter().any(|f| f == trimmed)
    });
    let params_type = has_usable_query.then(|| format!("{}Params", capitalize_first(&name)));

    Operation {
        raw_path: raw_path.to_string(),
        path: cleaned,
        method,
        group: group.to_string(),
        call_name: name,
        summary: op_doc.summary.clone(),
        body_ref,
        body_type,
        body_schema,
        params_type,
        response_type,
        response_schema,
        path_params,
        query_params,
    }
}

/// Convert a parameter of either dialect: Swagger 2.0 types it directly,
/// OpenAPI 3.0 nests a schema; presence decides, not the dialect.
fn convert_param(p: &ParameterDoc) -> ParamSpec {
    let type_tag = p
        .type_tag
        .clone()
        .or_else(|| p.schema.as_ref().and_then(|s| s.schema_type.clone()));
    let enum_values = p
        .enum_values
        .as_ref()
        .or_else(|| p.schema.as_ref().and_then(|s| s.enum_values.as_ref()))
        .map(|values| values.iter().map(convert_enum_value).collect())
        .unwrap_or_default();

    ParamSpec {
        name: p.name.clone(),
        type_tag,
        enum_values,
        required: p.required,
        description: p.description.clone(),
    }
}

/// Convert a raw schema into a `SchemaNode`, recording every encountered
/// reference in `refs` for the closure worklist.
pub fn convert_schema(doc: &SchemaDoc, refs: &mut Vec<String>) -> SchemaNode {
    if let Some(ref_path) = &doc.ref_path {
        let name = ref_to_qualified_name(ref_path);
        refs.push(name.clone());
        return SchemaNode::reference_to(&name);
    }

    let properties = doc
        .properties
        .as_ref()
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), convert_schema(schema, refs)))
                .collect()
        })
        .unwrap_or_default();

    let additional = doc.additional_properties.as_ref().map(|ap| match ap {
        AdditionalPropertiesDoc::Bool(allowed) => AdditionalProps::Allowed(*allowed),
        AdditionalPropertiesDoc::Schema(schema) => {
            AdditionalProps::Schema(Box::new(convert_schema(schema, refs)))
        }
    });

    SchemaNode {
        reference: None,
        kind: doc.schema_type.clone(),
        properties,
        required: doc.required.clone().unwrap_or_default(),
        items: doc
            .items
            .as_ref()
            .map(|items| Box::new(convert_schema(items, refs))),
        all_of: doc
            .all_of
            .as_ref()
            .map(|members| members.iter().map(|m| convert_schema(m, refs)).collect())
            .unwrap_or_default(),
        enum_values: doc
            .enum_values
            .as_ref()
            .map(|values| values.iter().map(convert_enum_value).collect())
            .unwrap_or_default(),
        additional,
        description: doc.description.clone(),
    }
}

fn convert_enum_value(value: &EnumValue) -> LiteralValue {
    match value {
        EnumValue::String(s) => LiteralValue::String(s.clone()),
        EnumValue::Integer(i) => LiteralValue::Int(*i),
        EnumValue::Float(f) => LiteralValue::Number(*f),
        EnumValue::Bool(b) => LiteralValue::Bool(*b),
        EnumValue::Null => LiteralValue::Null,
    }
}

/// Apply the response-unwrap heuristic: when the response resolves, directly
/// or through the first `allOf` member or through inline properties, to an
/// envelope exposing `field`, return that field's schema as the substitute.
fn unwrap_response(
    node: &SchemaNode,
    field: &str,
    definitions: &HashMap<String, SchemaDoc>,
    refs: &mut Vec<String>,
) -> Option<SchemaNode> {
    if let Some(inner) = node.properties.get(field) {
        return Some(inner.clone());
    }

    if let Some(name) = &node.reference {
        let envelope_doc = definitions.get(name)?;
        let envelope = convert_schema(envelope_doc, refs);
        if let Some(inner) = envelope.properties.get(field) {
            return Some(inner.clone());
        }
        return unwrap_first_all_of(&envelope, field, definitions, refs);
    }

    unwrap_first_all_of(node, field, definitions, refs)
}

fn unwrap_first_all_of(
    node: &SchemaNode,
    field: &str,
    definitions: &HashMap<String, SchemaDoc>,
    refs: &mut Vec<String>,
) -> Option<SchemaNode> {
    let first = node.all_of.first()?;
    if let Some(inner) = first.properties.get(field) {
        return Some(inner.clone());
    }
    if let Some(member_ref) = &first.reference {
        let member_doc = definitions.get(member_ref)?;
        let member = convert_schema(member_doc, refs);
        if let Some(inner) = member.properties.get(field) {
            return Some(inner.clone());
        }
    }
    None
}

/// A resolved definition plus its direct references, for reachability walks.
#[derive(Debug, Clone)]
struct ResolvedType {
    named: NamedType,
    refs: Vec<String>,
}

/// Drain the reference worklist into resolved named types. Order-independent,
/// duplicate-tolerant; the visited set guarantees termination on
/// self-referential and mutually-referential schemas. References with no
/// matching definition are skipped.
fn resolve_types(
    seeds: &[String],
    definitions: &HashMap<String, SchemaDoc>,
    opts: &NormalizeOptions<'_>,
) -> BTreeMap<String, ResolvedType> {
    let mut resolved = BTreeMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending: VecDeque<String> = seeds.iter().cloned().collect();

    while let Some(name) = pending.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(schema_doc) = definitions.get(&name) else {
            warn!(type_name = %name, "Reference has no matching definition; skipping.");
            continue;
        };

        let mut refs = Vec::new();
        let schema = convert_schema(schema_doc, &mut refs);
        pending.extend(refs.iter().cloned());

        resolved.insert(
            name.clone(),
            ResolvedType {
                named: NamedType {
                    display_name: display_name(&name, opts.strip_suffixes),
                    qualified_name: name,
                    schema,
                },
                refs,
            },
        );
    }

    resolved
}

/// Qualified names reachable from a group's seeds through the resolved set.
fn reachable_from(
    seeds: &[String],
    resolved: &BTreeMap<String, ResolvedType>,
) -> BTreeSet<String> {
    let mut reachable = BTreeSet::new();
    let mut pending: VecDeque<&str> = seeds.iter().map(String::as_str).collect();

    while let Some(name) = pending.pop_front() {
        let Some(entry) = resolved.get(name) else {
            continue;
        };
        if !reachable.insert(name.to_string()) {
            continue;
        }
        pending.extend(entry.refs.iter().map(String::as_str));
    }

    reachable
}

/// Group reachable types into modules keyed by qualified-name prefix.
/// Display-name collisions within a module are not deduplicated: the last
/// one processed wins, and the collision is surfaced as a warning.
fn group_into_modules(
    reachable: &BTreeSet<String>,
    resolved: &BTreeMap<String, ResolvedType>,
) -> BTreeMap<String, Vec<NamedType>> {
    let mut modules: BTreeMap<String, Vec<NamedType>> = BTreeMap::new();

    for name in reachable {
        let Some(entry) = resolved.get(name) else {
            continue;
        };
        let module = module_name(name);
        let types = modules.entry(module.clone()).or_default();

        if let Some(pos) = types
            .iter()
            .position(|t| t.display_name == entry.named.display_name)
        {
            warn!(
                module = %module,
                display_name = %entry.named.display_name,
                first = %types[pos].qualified_name,
                second = %entry.named.qualified_name,
                "Display-name collision; the later type replaces the earlier one."
            );
            types[pos] = entry.named.clone();
        } else {
            types.push(entry.named.clone());
        }
    }

    modules
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn options<'a>() -> NormalizeOptions<'a> {
        NormalizeOptions {
            strip_prefixes: &[],
            strip_suffixes: &[],
            exclude_fields: &[],
            unwrap_field: None,
            include_labels: &[],
            exclude_labels: &[],
        }
    }

    #[test]
    fn test_label_filter_allow_beats_deny() {
        let include = vec!["user".to_string()];
        let exclude = vec!["user".to_string()];
        let opts = NormalizeOptions {
            include_labels: &include,
            exclude_labels: &exclude,
            ..options()
        };
        assert!(label_accepted("user", &opts));
        assert!(!label_accepted("order", &opts));
    }

    #[test]
    fn test_label_filter_deny_only() {
        let exclude = vec!["internal".to_string()];
        let opts = NormalizeOptions {
            exclude_labels: &exclude,
            ..options()
        };
        assert!(label_accepted("user", &opts));
        assert!(!label_accepted("internal", &opts));
    }

    #[test]
    fn test_resolve_types_skips_dangling_reference() {
        let definitions = HashMap::new();
        let resolved = resolve_types(&["Ghost".to_string()], &definitions, &options());
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_types_terminates_on_cycle() {
        let mut definitions = HashMap::new();
        definitions.insert(
            "A".to_string(),
            serde_json::from_str::<SchemaDoc>(
                r##"{ "type": "object", "properties": { "b": { "$ref": "#/definitions/B" } } }"##,
            )
            .unwrap(),
        );
        definitions.insert(
            "B".to_string(),
            serde_json::from_str::<SchemaDoc>(
                r##"{ "type": "object", "properties": { "a": { "$ref": "#/definitions/A" } } }"##,
            )
            .unwrap(),
        );

        let resolved = resolve_types(&["A".to_string()], &definitions, &options());
        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains_key("A"));
        assert!(resolved.contains_key("B"));
    }

    #[test]
    fn test_convert_schema_collects_nested_refs() {
        let doc: SchemaDoc = serde_json::from_str(
            r##"{
                "type": "object",
                "properties": {
                    "items": { "type": "array", "items": { "$ref": "#/definitions/Item" } },
                    "extra": { "additionalProperties": { "$ref": "#/components/schemas/Extra" } }
                }
            }"##,
        )
        .unwrap();

        let mut refs = Vec::new();
        let node = convert_schema(&doc, &mut refs);
        refs.sort();
        assert_eq!(refs, vec!["Extra".to_string(), "Item".to_string()]);
        assert!(node.properties.contains_key("items"));
    }

    #[test]
    fn test_unwrap_through_reference() {
        let mut definitions = HashMap::new();
        definitions.insert(
            "Envelope".to_string(),
            serde_json::from_str::<SchemaDoc>(
                r##"{
                    "type": "object",
                    "properties": {
                        "code": { "type": "integer" },
                        "message": { "type": "string" },
                        "data": { "$ref": "#/definitions/User" }
                    }
                }"##,
            )
            .unwrap(),
        );

        let mut refs = Vec::new();
        let node = SchemaNode::reference_to("Envelope");
        let unwrapped = unwrap_response(&node, "data", &definitions, &mut refs).unwrap();
        assert_eq!(unwrapped.reference.as_deref(), Some("User"));
    }

    #[test]
    fn test_unwrap_through_first_all_of_member() {
        let mut definitions = HashMap::new();
        definitions.insert(
            "Envelope".to_string(),
            serde_json::from_str::<SchemaDoc>(
                r#"{
                    "allOf": [
                        { "type": "object", "properties": { "data": { "type": "string" } } },
                        { "type": "object", "properties": { "other": { "type": "integer" } } }
                    ]
                }"#,
            )
            .unwrap(),
        );

        let mut refs = Vec::new();
        let node = SchemaNode::reference_to("Envelope");
        let unwrapped = unwrap_response(&node, "data", &definitions, &mut refs).unwrap();
        assert_eq!(unwrapped.kind.as_deref(), Some("string"));

        // Only the first allOf member is consulted.
        assert!(unwrap_response(&node, "other", &definitions, &mut refs).is_none());
    }
}
