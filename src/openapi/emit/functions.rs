//! Request-function emitter.
//!
//! Renders the operations of a group into a function file: a fixed preamble,
//! the configured request-client import, a deduplicated type-only import and
//! a single sentinel-bounded region holding every function in operation
//! order. The region boundaries are what the merge engine keys on.

use std::collections::BTreeSet;

use crate::config::CallConvention;
use crate::openapi::emit::types::TypeRenderer;
use crate::openapi::ir::model::{GroupApi, Operation};
use crate::openapi::ir::names::{camel_case, BUILTIN_TYPE_NAMES};

/// First line of the machine-owned region of a function file.
pub const GENERATED_BEGIN: &str = "// ---- apigen generated: begin (do not edit this block) ----";
/// Last line of the machine-owned region of a function file.
pub const GENERATED_END: &str = "// ---- apigen generated: end ----";

/// Fixed first lines of every generated function file.
pub const FUNCTIONS_FILE_PREAMBLE: &str = "/* eslint-disable */\n// Request functions generated from the API description. The block between\n// the apigen markers is rewritten on every regeneration; code outside the\n// markers is preserved.\n";

/// Renderer from operations to request-function source text.
#[derive(Debug, Clone, Copy)]
pub struct FunctionEmitter<'a> {
    pub convention: CallConvention,
    pub client_symbol: &'a str,
    pub client_import: &'a str,
    pub renderer: TypeRenderer<'a>,
}

impl<'a> FunctionEmitter<'a> {
    /// Assemble the full function file for a group.
    pub fn render_functions_file(&self, group: &GroupApi) -> String {
        let mut out = String::from(FUNCTIONS_FILE_PREAMBLE);
        out.push_str(&format!(
            "import {} from \"{}\";\n",
            self.client_symbol, self.client_import
        ));

        let type_names = self.collect_type_imports(group);
        if !type_names.is_empty() {
            out.push_str(&format!(
                "import type {{ {} }} from \"./types\";\n",
                type_names.join(", ")
            ));
        }

        out.push('\n');
        out.push_str(&self.render_generated_region(group));
        out
    }

    /// The sentinel-bounded region, from begin marker to end marker.
    pub fn render_generated_region(&self, group: &GroupApi) -> String {
        let functions: Vec<_> = group
            .operations
            .iter()
            .map(|op| self.render_function(op))
            .collect();

        if functions.is_empty() {
            format!("{GENERATED_BEGIN}\n{GENERATED_END}\n")
        } else {
            format!(
                "{GENERATED_BEGIN}\n\n{}\n{GENERATED_END}\n",
                functions.join("\n")
            )
        }
    }

    /// Every named type referenced by the group's functions, deduplicated
    /// and name-sorted; built-in primitive/utility names are excluded.
    fn collect_type_imports(&self, group: &GroupApi) -> Vec<String> {
        let mut names = BTreeSet::new();
        for op in &group.operations {
            if let Some(params_type) = &op.params_type {
                names.insert(params_type.clone());
            }
            if let Some(body_type) = &op.body_type {
                collect_named_roots(body_type, &mut names);
            }
            if let Some(response_type) = &op.response_type {
                collect_named_roots(response_type, &mut names);
            }
        }
        names.into_iter().collect()
    }

    /// Render one exported function for an operation.
    fn render_function(&self, op: &Operation) -> String {
        let mut out = String::new();
        if let Some(summary) = &op.summary {
            let single_line = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            out.push_str(&format!("/** {single_line} */\n"));
        }

        let mut args = Vec::new();
        for param in &op.path_params {
            let ty = self.renderer.param_type(param);
            args.push(format!("{}: {}", camel_case(&param.name), ty));
        }
        if let Some(body_type) = &op.body_type {
            args.push(format!("data: {body_type}"));
        }
        if let Some(params_type) = &op.params_type {
            let required = op.query_params.iter().any(|p| p.required);
            let opt = if required { "" } else { "?" };
            args.push(format!("params{opt}: {params_type}"));
        }

        out.push_str(&format!(
            "export function {}({}) {{\n",
            op.call_name,
            args.join(", ")
        ));
        out.push_str(&format!("  return {};\n", self.render_call(op)));
        out.push_str("}\n");
        out
    }

    /// Render the client call under the configured convention.
    fn render_call(&self, op: &Operation) -> String {
        let url = path_expression(&op.path);
        let generic = op
            .response_type
            .as_ref()
            .map(|t| format!("<{t}>"))
            .unwrap_or_default();

        match self.convention {
            CallConvention::Chained => {
                if op.method.is_read() {
                    let mut call_args = vec![url];
                    if op.params_type.is_some() {
                        call_args.push("{ params }".to_string());
                    }
                    format!(
                        "{}.{}{}({})",
                        self.client_symbol,
                        op.method.as_lower(),
                        generic,
                        call_args.join(", ")
                    )
                } else {
                    let mut call_args = vec![url];
                    if op.body_type.is_some() {
                        call_args.push("data".to_string());
                    } else if op.params_type.is_some() {
                        // Keep the config slot aligned when there is no body.
                        call_args.push("undefined".to_string());
                    }
                    if op.params_type.is_some() {
                        call_args.push("{ params }".to_string());
                    }
                    format!(
                        "{}.{}({})",
                        self.client_symbol,
                        op.method.as_lower(),
                        call_args.join(", ")
                    )
                }
            }
            CallConvention::Object => {
                let mut fields = vec![
                    format!("url: {url}"),
                    format!("method: \"{}\"", op.method.as_lower()),
                ];
                if op.body_type.is_some() {
                    fields.push("data".to_string());
                }
                if op.params_type.is_some() {
                    fields.push("params".to_string());
                }
                format!(
                    "{}{}({{ {} }})",
                    self.client_symbol,
                    generic,
                    fields.join(", ")
                )
            }
        }
    }
}

/// Render a cleaned path as a URL expression, substituting `{name}` and
/// `:name` tokens with interpolations of the like-named parameter.
fn path_expression(path: &str) -> String {
    let mut template = String::new();
    let mut interpolated = false;
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' {
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            template.push_str(&format!("${{{}}}", camel_case(&name)));
            interpolated = true;
        } else if c == ':' {
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next == '/' {
                    break;
                }
                name.push(next);
                chars.next();
            }
            if name.is_empty() {
                template.push(':');
            } else {
                template.push_str(&format!("${{{}}}", camel_case(&name)));
                interpolated = true;
            }
        } else {
            template.push(c);
        }
    }

    if interpolated {
        format!("`{template}`")
    } else {
        format!("\"{template}\"")
    }
}

/// Collect named type roots out of a rendered type expression: identifier
/// tokens that start with an uppercase letter and are not built-ins.
fn collect_named_roots(type_text: &str, names: &mut BTreeSet<String>) {
    let mut token = String::new();
    for c in type_text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            token.push(c);
        } else {
            if token
                .chars()
                .next()
                .is_some_and(|first| first.is_ascii_uppercase())
                && !BUILTIN_TYPE_NAMES.contains(token.as_str())
            {
                names.insert(token.clone());
            }
            token.clear();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::ir::model::{HttpMethod, ParamSpec};
    use std::collections::BTreeMap;

    fn emitter<'a>(convention: CallConvention) -> FunctionEmitter<'a> {
        FunctionEmitter {
            convention,
            client_symbol: "client",
            client_import: "@/utils/client",
            renderer: TypeRenderer::new(&[], &[]),
        }
    }

    fn op(method: HttpMethod, path: &str, call_name: &str) -> Operation {
        Operation {
            raw_path: path.to_string(),
            path: path.to_string(),
            method,
            group: "default".to_string(),
            call_name: call_name.to_string(),
            summary: None,
            body_ref: None,
            body_type: None,
            body_schema: None,
            params_type: None,
            response_type: None,
            response_schema: None,
            path_params: vec![],
            query_params: vec![],
        }
    }

    fn string_param(name: &str, required: bool) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            type_tag: Some("string".to_string()),
            enum_values: vec![],
            required,
            description: None,
        }
    }

    #[test]
    fn test_path_expression() {
        assert_eq!(path_expression("/orders"), "\"/orders\"");
        assert_eq!(
            path_expression("/orders/{id}/items/{item_id}"),
            "`/orders/${id}/items/${itemId}`"
        );
        assert_eq!(path_expression("/users/:userId"), "`/users/${userId}`");
    }

    #[test]
    fn test_chained_read_call() {
        let mut operation = op(HttpMethod::Get, "/orders/{id}", "getOrdersById");
        operation.path_params = vec![string_param("id", true)];
        operation.params_type = Some("GetOrdersByIdParams".to_string());
        operation.query_params = vec![string_param("expand", false)];
        operation.response_type = Some("Order".to_string());

        let text = emitter(CallConvention::Chained).render_function(&operation);
        assert_eq!(
            text,
            "export function getOrdersById(id: string, params?: GetOrdersByIdParams) {\n  return client.get<Order>(`/orders/${id}`, { params });\n}\n"
        );
    }

    #[test]
    fn test_chained_write_call() {
        let mut operation = op(HttpMethod::Post, "/orders", "postOrders");
        operation.body_type = Some("CreateOrder".to_string());
        operation.response_type = Some("Order".to_string());

        let text = emitter(CallConvention::Chained).render_function(&operation);
        assert_eq!(
            text,
            "export function postOrders(data: CreateOrder) {\n  return client.post(\"/orders\", data);\n}\n"
        );
    }

    #[test]
    fn test_chained_write_call_params_without_body() {
        let mut operation = op(HttpMethod::Post, "/orders/sync", "postOrdersSync");
        operation.params_type = Some("PostOrdersSyncParams".to_string());
        operation.query_params = vec![string_param("force", true)];

        let text = emitter(CallConvention::Chained).render_function(&operation);
        assert!(text.contains("client.post(\"/orders/sync\", undefined, { params })"));
        assert!(text.contains("params: PostOrdersSyncParams"));
    }

    #[test]
    fn test_object_call() {
        let mut operation = op(HttpMethod::Put, "/orders/{id}", "putOrdersById");
        operation.path_params = vec![string_param("id", true)];
        operation.body_type = Some("UpdateOrder".to_string());
        operation.response_type = Some("Order".to_string());

        let text = emitter(CallConvention::Object).render_function(&operation);
        assert_eq!(
            text,
            "export function putOrdersById(id: string, data: UpdateOrder) {\n  return client<Order>({ url: `/orders/${id}`, method: \"put\", data });\n}\n"
        );
    }

    #[test]
    fn test_summary_becomes_doc_comment() {
        let mut operation = op(HttpMethod::Get, "/orders", "getOrders");
        operation.summary = Some("List all\norders".to_string());
        let text = emitter(CallConvention::Chained).render_function(&operation);
        assert!(text.starts_with("/** List all orders */\n"));
    }

    #[test]
    fn test_file_layout_and_imports() {
        let mut get = op(HttpMethod::Get, "/orders", "getOrders");
        get.response_type = Some("Order[]".to_string());
        let mut post = op(HttpMethod::Post, "/orders", "postOrders");
        post.body_type = Some("CreateOrder".to_string());
        post.response_type = Some("Order".to_string());

        let group = GroupApi {
            name: "order".to_string(),
            operations: vec![get, post],
            modules: BTreeMap::new(),
        };

        let text = emitter(CallConvention::Chained).render_functions_file(&group);
        assert!(text.starts_with("/* eslint-disable */\n"));
        assert!(text.contains("import client from \"@/utils/client\";\n"));
        // Deduplicated and name-sorted, primitives excluded.
        assert!(text.contains("import type { CreateOrder, Order } from \"./types\";\n"));
        let begin = text.find(GENERATED_BEGIN).unwrap();
        let end = text.find(GENERATED_END).unwrap();
        assert!(begin < end);
        assert!(text[begin..end].contains("export function getOrders"));
        assert!(text[begin..end].contains("export function postOrders"));
    }

    #[test]
    fn test_collect_named_roots_filters_builtins() {
        let mut names = BTreeSet::new();
        collect_named_roots("Record<string, Order>", &mut names);
        collect_named_roots("{ total: number; items: OrderItem[] }", &mut names);
        let names: Vec<_> = names.into_iter().collect();
        assert_eq!(names, vec!["Order".to_string(), "OrderItem".to_string()]);
    }
}
