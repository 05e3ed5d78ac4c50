//! Recovery of structured results from raw model output.
//!
//! Models wrap JSON in reasoning blocks, markdown fences and prose. The
//! strategies below are tried in order after reasoning blocks are removed;
//! the first that yields a JSON object wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys that mark an object as a parse result rather than stray JSON
const SCHEMA_KEYS: &[&str] = &[
    "coreKeywords",
    "keywords",
    "priority",
    "dueDate",
    "status",
    "folder",
    "tags",
];

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<think>.*?</think>|<thinking>.*?</thinking>|<reasoning>.*?</reasoning>|<reflection>.*?</reflection>",
    )
    .expect("Invalid regex")
});
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)```").expect("Invalid regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("Invalid regex"));

/// Parse result as reported by the model, leniently typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelQueryResult {
    pub core_keywords: Vec<String>,
    pub keywords: Vec<String>,
    /// Raw priority value (`1`, `"p2"`, `"high"`); resolved later
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

impl ModelQueryResult {
    /// Read a result from a JSON object, tolerating wrong or missing types.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            core_keywords: string_list(object.get("coreKeywords")),
            keywords: string_list(object.get("keywords")),
            priority: scalar(object.get("priority")),
            due_date: scalar(object.get("dueDate")),
            status: scalar(object.get("status")),
            folder: scalar(object.get("folder")),
            tags: string_list(object.get("tags"))
                .into_iter()
                .map(|t| t.trim_start_matches('#').to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| scalar(Some(v))).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A way of locating the JSON object inside model output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Contents of a ```json fenced block
    FencedCodeBlock,
    /// Balanced `{...}` spans, schema-looking objects first
    BalancedBraces,
    /// From the first `{` to the last `}`, with trailing commas removed
    OuterBraces,
}

impl RecoveryStrategy {
    /// Strategies in the order they are tried
    pub const ORDERED: [Self; 3] = [Self::FencedCodeBlock, Self::BalancedBraces, Self::OuterBraces];

    pub fn apply(self, text: &str) -> Option<ModelQueryResult> {
        let object = match self {
            Self::FencedCodeBlock => FENCED_BLOCK
                .captures_iter(text)
                .find_map(|cap| parse_object(cap[1].trim())),
            Self::BalancedBraces => {
                let mut objects: Vec<_> = balanced_spans(text)
                    .into_iter()
                    .filter_map(parse_object)
                    .collect();
                objects
                    .iter()
                    .position(looks_like_result)
                    .or_else(|| (!objects.is_empty()).then_some(0))
                    .map(|i| objects.swap_remove(i))
            }
            Self::OuterBraces => {
                let start = text.find('{')?;
                let end = text.rfind('}')?;
                if end <= start {
                    return None;
                }
                let span = &text[start..=end];
                parse_object(span).or_else(|| parse_object(&TRAILING_COMMA.replace_all(span, "$1")))
            }
        }?;
        Some(ModelQueryResult::from_object(&object))
    }
}

/// Remove `<think>`-style reasoning blocks.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").trim().to_string()
}

/// Recover a parse result from raw model output, or `None` if nothing usable.
pub fn recover_model_result(raw: &str) -> Option<ModelQueryResult> {
    let text = strip_reasoning(raw);
    if text.is_empty() {
        return None;
    }

    RecoveryStrategy::ORDERED.into_iter().find_map(|strategy| {
        let result = strategy.apply(&text);
        if result.is_some() {
            tracing::debug!(?strategy, "Recovered model result");
        }
        result
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn looks_like_result(object: &Map<String, Value>) -> bool {
    SCHEMA_KEYS.iter().any(|key| object.contains_key(*key))
}

/// Top-level balanced `{...}` spans, ignoring braces inside JSON strings.
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoning_and_fenced_block() {
        let raw = "<think>The user wants {urgent} things.</think>\n```json\n{\"priority\":1,\"keywords\":[\"fix\"]}\n```";
        let result = recover_model_result(raw).unwrap();
        assert_eq!(result.priority.as_deref(), Some("1"));
        assert_eq!(result.keywords, vec!["fix"]);
    }

    #[test]
    fn test_plain_json() {
        let raw = r##"{"coreKeywords":["billing"],"keywords":["billing","invoice"],"dueDate":"week","status":null,"tags":["#work"]}"##;
        let result = recover_model_result(raw).unwrap();
        assert_eq!(result.core_keywords, vec!["billing"]);
        assert_eq!(result.due_date.as_deref(), Some("week"));
        assert_eq!(result.status, None);
        assert_eq!(result.tags, vec!["work"]);
    }

    #[test]
    fn test_balanced_prefers_schema_object() {
        let raw = r#"Example: {"foo": "}"} and the answer {"keywords": ["login"], "priority": "high"} done."#;
        let result = RecoveryStrategy::BalancedBraces.apply(raw).unwrap();
        assert_eq!(result.keywords, vec!["login"]);
        assert_eq!(result.priority.as_deref(), Some("high"));
    }

    #[test]
    fn test_outer_braces_repairs_trailing_commas() {
        let raw = "Result: {\"keywords\": [\"a\", \"b\",], \"status\": \"done\",}";
        assert!(RecoveryStrategy::FencedCodeBlock.apply(raw).is_none());
        assert!(RecoveryStrategy::BalancedBraces.apply(raw).is_none());
        let result = recover_model_result(raw).unwrap();
        assert_eq!(result.keywords, vec!["a", "b"]);
        assert_eq!(result.status.as_deref(), Some("done"));
    }

    #[test]
    fn test_unrecoverable() {
        assert!(recover_model_result("").is_none());
        assert!(recover_model_result("<thinking>hmm</thinking>").is_none());
        assert!(recover_model_result("I cannot help with that").is_none());
        assert!(recover_model_result("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_lenient_types() {
        let raw = r#"{"keywords": "deploy", "priority": 2, "folder": "", "tags": [1, "ops"]}"#;
        let result = recover_model_result(raw).unwrap();
        assert_eq!(result.keywords, vec!["deploy"]);
        assert_eq!(result.priority.as_deref(), Some("2"));
        assert_eq!(result.folder, None);
        assert_eq!(result.tags, vec!["1", "ops"]);
    }
}
