//! Keyword normalization: tokenization, stop words, deduplication.
//!
//! Query text may mix scripts ("修复 login bug"), so a change of script
//! class is treated as a token boundary in addition to whitespace and
//! punctuation.

use std::collections::HashSet;

/// Built-in stop words (English, Chinese, Swedish)
const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "the", "this", "that", "these", "those", "is", "are", "was", "were", "be", "been",
    "am", "do", "does", "did", "have", "has", "had", "to", "of", "in", "for", "on", "with", "at",
    "by", "from", "into", "about", "and", "or", "but", "not", "no", "if", "so", "as", "i", "you",
    "we", "they", "it", "me", "my", "your", "our", "their", "its", "who", "what", "which", "when",
    "where", "how", "why", "all", "any", "some", "show", "find", "list", "get", "give", "tell",
    "please", "task", "tasks", "item", "items", "todo", "todos", "can", "could", "should", "would",
    "will", "there", "here", "related", "regarding",
    // Chinese
    "的", "了", "和", "是", "在", "有", "我", "你", "他", "她", "它", "们", "这", "那", "个", "与",
    "或", "及", "把", "被", "给", "吗", "呢", "吧", "啊", "关于", "一些", "所有", "哪些", "什么",
    "显示", "查找", "列出", "任务", "事项",
    // Swedish
    "och", "att", "det", "som", "en", "ett", "är", "på", "av", "för", "med", "till", "den", "om",
    "jag", "du", "vi", "de", "alla", "visa", "hitta", "uppgift", "uppgifter",
];

/// Script class of a character, used for segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Cyrillic,
    Han,
    Kana,
    Hangul,
    OtherLetter,
    Separator,
}

fn script_of(c: char) -> Script {
    match c {
        '0'..='9' | 'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}' => {
            Script::Latin
        }
        '\u{0400}'..='\u{04FF}' => Script::Cyrillic,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' => Script::Han,
        '\u{3040}'..='\u{30FF}' => Script::Kana,
        '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' => Script::Hangul,
        '_' => Script::Latin,
        c if c.is_alphanumeric() => Script::OtherLetter,
        _ => Script::Separator,
    }
}

/// Split text into lowercased tokens at whitespace, punctuation and
/// script-class boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_script = Script::Separator;

    for c in text.chars() {
        let script = script_of(c);
        if script != current_script && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if script != Script::Separator {
            current.extend(c.to_lowercase());
        }
        current_script = script;
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Multilingual stop-word list
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl StopWords {
    /// Built-in list plus configured extras
    pub fn new(extra: &[String]) -> Self {
        let words = STOP_WORDS
            .iter()
            .map(ToString::to_string)
            .chain(extra.iter().map(|w| w.trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Drop stop words, keeping order
    pub fn filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens.into_iter().filter(|t| !self.contains(t)).collect()
    }
}

/// Deduplicate tokens, dropping any token contained in a longer kept one.
///
/// Exact duplicates are removed case-insensitively. Candidates are then
/// scanned longest-first; a token is kept only if no already-kept token
/// contains it. The result keeps first-appearance order, so the operation
/// is idempotent.
pub fn deduplicate(tokens: &[String]) -> Vec<String> {
    let unique = unique_tokens(tokens);

    let mut by_length: Vec<&String> = unique.iter().collect();
    by_length.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

    let mut kept: Vec<&String> = Vec::with_capacity(by_length.len());
    for token in by_length {
        if !kept.iter().any(|k| k.contains(token.as_str())) {
            kept.push(token);
        }
    }

    let kept: HashSet<&str> = kept.into_iter().map(String::as_str).collect();
    unique
        .iter()
        .filter(|t| kept.contains(t.as_str()))
        .cloned()
        .collect()
}

/// Lowercase and drop exact duplicates, keeping first appearances.
pub fn unique_tokens(tokens: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Tokenize and drop stop words and exact duplicates.
///
/// Tokens contained in longer ones are kept: `fix` still matches tasks
/// that never mention `prefix`.
pub fn normalize(text: &str, stop_words: &StopWords) -> Vec<String> {
    unique_tokens(&stop_words.filter(tokenize(text)))
}
