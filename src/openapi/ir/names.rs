//! Naming utilities shared by normalization, emission and diffing.
//!
//! Everything that turns raw spec identifiers (paths, qualified type names,
//! parameter names) into TypeScript-facing names lives here so the rules are
//! applied consistently across the pipeline.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Type names that must never appear in a type-only import line because they
/// are TypeScript built-ins or global utility types.
pub static BUILTIN_TYPE_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "string",
        "number",
        "boolean",
        "null",
        "undefined",
        "void",
        "unknown",
        "any",
        "never",
        "object",
        "Record",
        "Array",
        "Promise",
        "Date",
        "Blob",
        "File",
        "FormData",
    ]
    .into_iter()
    .collect()
});

/// Check whether a name is a valid bare TypeScript identifier.
///
/// Names failing this check must be quoted when used as property keys.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use inside a double-quoted JS/TS string literal.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a property key if it is not a valid bare identifier.
pub fn quote_if_needed(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", escape_js_string(name))
    }
}

/// Convert a raw segment to PascalCase.
///
/// Splits on `-`, `_`, `.` and spaces and upper-cases the first letter of
/// every part while leaving the rest untouched, so `item_id` and `itemId`
/// both become `ItemId`.
pub fn pascal_case(s: &str) -> String {
    s.split(['-', '_', '.', ' '])
        .filter(|part| !part.is_empty())
        .map(capitalize_first)
        .collect()
}

/// Convert a raw segment to camelCase (PascalCase with the first letter
/// lowered), used for argument names in generated functions.
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Strip the longest matching prefix from a path.
///
/// The prefix list must already be sorted longest-first (the config loader
/// guarantees this) so a more specific prefix always wins.
pub fn strip_path_prefix(path: &str, prefixes: &[String]) -> String {
    for prefix in prefixes {
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            if rest.is_empty() {
                return "/".to_string();
            }
            if rest.starts_with('/') {
                return rest.to_string();
            }
        }
    }
    path.to_string()
}

/// Derive the generated call name for a verb + cleaned path.
///
/// Every `{param}` or `:param` segment becomes a `By<PascalParam>` token and
/// the remaining segments are PascalCased and joined behind the lowercase
/// verb: `GET /orders/{id}/items/{itemId}` -> `getOrdersByIdItemsByItemId`.
pub fn call_name(verb: &str, cleaned_path: &str) -> String {
    let mut name = verb.to_lowercase();
    for segment in cleaned_path.split('/').filter(|s| !s.is_empty()) {
        if let Some(param) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| segment.strip_prefix(':'))
        {
            name.push_str("By");
            name.push_str(&pascal_case(param));
        } else {
            name.push_str(&pascal_case(segment));
        }
    }
    name
}

/// Module name for a dialect-qualified type name: the portion before the
/// first `.`, or `common` when the name is unqualified.
pub fn module_name(qualified: &str) -> String {
    match qualified.split_once('.') {
        Some((module, rest)) if !module.is_empty() && !rest.is_empty() => module.to_string(),
        _ => "common".to_string(),
    }
}

/// Cleaned display name for a dialect-qualified type name: module prefix
/// stripped, configured suffixes removed, PascalCase normalized.
pub fn display_name(qualified: &str, strip_suffixes: &[String]) -> String {
    let local = match qualified.split_once('.') {
        Some((module, rest)) if !module.is_empty() && !rest.is_empty() => rest,
        _ => qualified,
    };

    let mut local = local.to_string();
    for suffix in strip_suffixes {
        if let Some(stripped) = local.strip_suffix(suffix.as_str()) {
            if !stripped.is_empty() {
                local = stripped.to_string();
            }
        }
    }

    pascal_case(&local)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_foo"));
        assert!(is_valid_identifier("$foo"));
        assert!(is_valid_identifier("foo123"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("123foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo.bar"));
        assert!(!is_valid_identifier("foo bar"));
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("foo-bar"), "\"foo-bar\"");
        assert_eq!(quote_if_needed("123"), "\"123\"");
        assert_eq!(quote_if_needed("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("orders"), "Orders");
        assert_eq!(pascal_case("item_id"), "ItemId");
        assert_eq!(pascal_case("item-id"), "ItemId");
        assert_eq!(pascal_case("itemId"), "ItemId");
        assert_eq!(pascal_case("login.request"), "LoginRequest");
    }

    #[test]
    fn test_strip_path_prefix_longest_wins() {
        let prefixes = vec!["/api/v1".to_string(), "/api".to_string()];
        assert_eq!(strip_path_prefix("/api/v1/orders", &prefixes), "/orders");
        assert_eq!(strip_path_prefix("/api/users", &prefixes), "/users");
        assert_eq!(strip_path_prefix("/health", &prefixes), "/health");
        // A prefix match that does not land on a segment boundary is ignored.
        assert_eq!(strip_path_prefix("/api2/orders", &prefixes), "/api2/orders");
    }

    #[test]
    fn test_call_name_derivation() {
        assert_eq!(
            call_name("GET", "/orders/{id}/items/{itemId}"),
            "getOrdersByIdItemsByItemId"
        );
        assert_eq!(call_name("POST", "/orders"), "postOrders");
        assert_eq!(call_name("GET", "/users/:userId"), "getUsersByUserId");
        assert_eq!(call_name("DELETE", "/user-roles/{id}"), "deleteUserRolesById");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("item_id"), "itemId");
        assert_eq!(camel_case("ItemId"), "itemId");
        assert_eq!(camel_case("id"), "id");
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("user.LoginRequest"), "user");
        assert_eq!(module_name("ApiResponse"), "common");
        assert_eq!(module_name(".Odd"), "common");
    }

    #[test]
    fn test_display_name() {
        let suffixes = vec!["DTO".to_string(), "VO".to_string()];
        assert_eq!(display_name("user.LoginDTO", &suffixes), "Login");
        assert_eq!(display_name("order.OrderItemVO", &suffixes), "OrderItem");
        assert_eq!(display_name("ApiResponse", &suffixes), "ApiResponse");
        // Stripping never produces an empty name.
        assert_eq!(display_name("DTO", &suffixes), "DTO");
    }
}
