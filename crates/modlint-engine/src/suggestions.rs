//! Fuzzy matching suggestions for template errors

use serde_json::Value as JsonValue;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Filters registered on top of the MiniJinja builtins
pub const AVAILABLE_FILTERS: &[&str] = &[
    "toyaml",
    "tojson",
    "b64encode",
    "quote",
    "squote",
    "indent",
    "nindent",
    "required",
    "trunc",
    "sha256",
    // MiniJinja builtins used most in manifests
    "default",
    "upper",
    "lower",
    "replace",
    "trim",
    "join",
    "first",
    "last",
    "length",
    "int",
    "string",
    "items",
];

/// Functions registered on top of the MiniJinja builtins
pub const AVAILABLE_FUNCTIONS: &[&str] = &["fail", "dict", "list", "coalesce", "ternary", "range"];

/// Top-level context variables always available in templates
pub const CONTEXT_VARIABLES: &[&str] = &["Values", "Release", "Chart", "Capabilities"];

/// Closest candidate within the suggestion distance, ties broken by order
pub fn closest_match<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|candidate| (strsim::levenshtein(input, candidate), candidate))
        .filter(|(distance, _)| *distance > 0 && *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Explain where a dotted expression stops resolving in the context
///
/// `Values.certManager.logLevl` against a context lacking `logLevl`
/// yields a hint naming `logLevel` when it is close enough.
pub fn suggest_for_path(expr: &str, context: &JsonValue) -> Option<String> {
    let parts: Vec<&str> = expr.split('.').map(str::trim).collect();
    let mut current = context;
    let mut resolved: Vec<&str> = vec![];

    for part in &parts {
        match current.get(part) {
            Some(next) => {
                resolved.push(part);
                current = next;
            }
            None => {
                let obj = current.as_object()?;
                let parent = if resolved.is_empty() {
                    "the template context".to_string()
                } else {
                    format!("`{}`", resolved.join("."))
                };

                return Some(match closest_match(part, obj.keys().map(String::as_str)) {
                    Some(candidate) => format!(
                        "Key `{}` not found in {}. Did you mean `{}`?",
                        part, parent, candidate
                    ),
                    None if obj.is_empty() => format!(
                        "Key `{}` not found: {} is empty for this values document. \
                         Guard optional values with `is defined` or `| default(...)`.",
                        part, parent
                    ),
                    None => {
                        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
                        keys.sort_unstable();
                        format!(
                            "Key `{}` not found in {}. Available keys: {}",
                            part,
                            parent,
                            keys.join(", ")
                        )
                    }
                });
            }
        }
    }

    None
}

/// Suggest a registered filter for an unknown one
pub fn suggest_unknown_filter(name: &str) -> Option<String> {
    closest_match(name, AVAILABLE_FILTERS.iter().copied())
        .map(|candidate| format!("Did you mean the `{}` filter?", candidate))
}

/// Suggest a registered function for an unknown one
pub fn suggest_unknown_function(name: &str) -> Option<String> {
    closest_match(name, AVAILABLE_FUNCTIONS.iter().copied())
        .map(|candidate| format!("Did you mean `{}()`?", candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closest_match() {
        assert_eq!(
            closest_match("toyml", AVAILABLE_FILTERS.iter().copied()),
            Some("toyaml")
        );
        assert_eq!(closest_match("completely_different", ["a", "b"]), None);
        assert_eq!(closest_match("exact", ["exact"]), None);
    }

    #[test]
    fn test_suggest_for_path_typo() {
        let ctx = json!({"Values": {"certManager": {"logLevel": "Info"}}});
        let hint = suggest_for_path("Values.certManager.logLevl", &ctx).unwrap();
        assert!(hint.contains("`logLevel`"));
        assert!(hint.contains("`Values.certManager`"));
    }

    #[test]
    fn test_suggest_for_path_empty_document() {
        let ctx = json!({"Values": {"certManager": {}}});
        let hint = suggest_for_path("Values.certManager.https.mode", &ctx).unwrap();
        assert!(hint.contains("is empty"));
    }

    #[test]
    fn test_suggest_for_path_resolves() {
        let ctx = json!({"Values": {"a": 1}});
        assert_eq!(suggest_for_path("Values.a", &ctx), None);
    }

    #[test]
    fn test_unknown_filter_and_function() {
        assert!(suggest_unknown_filter("nindnet").unwrap().contains("nindent"));
        assert!(suggest_unknown_function("dcit").unwrap().contains("dict"));
    }
}
