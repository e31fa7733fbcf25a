//! Heuristic token counting and text-budget helpers (SPEC_FULL.md §4.H).
//! Regex tables are compiled once via `once_cell`, never inside the
//! counting hot path, matching the probe crate's classification tables.

use once_cell::sync::Lazy;
use regex::Regex;

struct CodeSignals {
    import: Regex,
    export: Regex,
    function: Regex,
    class: Regex,
    decl: Regex,
    line_comment: Regex,
    block_comment: Regex,
    brackets_semicolons: Regex,
    arrow: Regex,
}

static CODE_SIGNALS: Lazy<CodeSignals> = Lazy::new(|| CodeSignals {
    import: Regex::new(r"(?m)^\s*import\b").unwrap(),
    export: Regex::new(r"(?m)^\s*export\b").unwrap(),
    function: Regex::new(r"(?m)^\s*function\b").unwrap(),
    class: Regex::new(r"(?m)^\s*class\b").unwrap(),
    decl: Regex::new(r"(?m)^\s*(const|let|var)\b").unwrap(),
    line_comment: Regex::new(r"//").unwrap(),
    block_comment: Regex::new(r"/\*").unwrap(),
    brackets_semicolons: Regex::new(r"[{};]").unwrap(),
    arrow: Regex::new(r"=>").unwrap(),
});

static JSON_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[\{\[]").unwrap());
static XML_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

fn looks_like_code(text: &str) -> bool {
    let signals = &*CODE_SIGNALS;
    let hits = [
        signals.import.is_match(text),
        signals.export.is_match(text),
        signals.function.is_match(text),
        signals.class.is_match(text),
        signals.decl.is_match(text),
        signals.line_comment.is_match(text),
        signals.block_comment.is_match(text),
        signals.brackets_semicolons.is_match(text),
        signals.arrow.is_match(text),
    ];
    hits.into_iter().filter(|h| *h).count() >= 3
}

fn looks_like_json_or_markup(text: &str) -> bool {
    JSON_LIKE.is_match(text.trim_start()) || XML_LIKE.is_match(text)
}

fn whitespace_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let ws = text.chars().filter(|c| c.is_whitespace()).count();
    ws as f64 / text.chars().count() as f64
}

/// Heuristic token estimate: base `chars/4`, scaled up for code-shaped or
/// JSON/XML-shaped content, then bumped for above-threshold whitespace.
/// Always rounds up (SPEC_FULL.md §4.H, §9 Open Questions: no clamp on
/// the whitespace adjustment above `wsRatio=0.2`).
pub fn count_tokens(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let mut estimate = text.chars().count() as f64 / 4.0;

    if looks_like_code(text) {
        estimate /= 0.85;
    } else if looks_like_json_or_markup(text) {
        estimate /= 0.75;
    }

    let ws_ratio = whitespace_ratio(text);
    if ws_ratio > 0.2 {
        estimate *= 1.0 + 0.5 * (ws_ratio - 0.2);
    }

    estimate.ceil() as u64
}

/// Trims `text` to fit within `max` tokens, preferring a word boundary,
/// appending `ellipsis` when truncation occurred.
pub fn truncate_to_tokens(text: &str, max: u64, ellipsis: &str) -> String {
    if count_tokens(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return ellipsis.to_string();
    }

    let approx_chars = (max * 4) as usize;
    let mut cut = approx_chars.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut candidate = &text[..cut];
    if let Some(last_space) = candidate.rfind(char::is_whitespace) {
        if last_space > 0 {
            candidate = &candidate[..last_space];
        }
    }

    let mut result = candidate.to_string();
    while count_tokens(&format!("{result}{ellipsis}")) > max && !result.is_empty() {
        let new_len = result.len().saturating_sub(result.len() / 10 + 1);
        let mut boundary = new_len;
        while boundary > 0 && !result.is_char_boundary(boundary) {
            boundary -= 1;
        }
        result.truncate(boundary);
    }
    format!("{result}{ellipsis}")
}

/// Splits text into chunks no larger than `max_tokens`, preferring
/// paragraph breaks, then sentence breaks, as the donor does for
/// transcript chunking.
pub fn split_into_chunks(text: &str, max_tokens: u64) -> Vec<String> {
    if count_tokens(text) <= max_tokens {
        return vec![text.to_string()];
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let units: Vec<&str> = if paragraphs.len() > 1 {
        paragraphs
    } else {
        text.split_inclusive(['.', '!', '?']).collect()
    };

    let mut chunks = Vec::new();
    let mut current = String::new();
    for unit in units {
        let candidate = if current.is_empty() {
            unit.to_string()
        } else {
            format!("{current}\n\n{unit}")
        };
        if count_tokens(&candidate) > max_tokens && !current.is_empty() {
            chunks.push(current.clone());
            current = unit.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(text.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_tokens() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn plain_prose_uses_base_ratio() {
        let text = "a".repeat(40);
        assert_eq!(count_tokens(&text), 10);
    }

    #[test]
    fn code_shaped_text_is_scaled_up() {
        let code = "import foo\nexport function bar() { return 1; }\n// comment\nconst x = 1;\nconst y = () => x;";
        let plain_equivalent_len = code.len();
        let plain = "a".repeat(plain_equivalent_len);
        assert!(count_tokens(code) > count_tokens(&plain));
    }

    #[test]
    fn json_shaped_text_is_scaled_up() {
        let json = r#"{"a": 1, "b": [1,2,3], "c": {"d": 4}}"#;
        let plain = "a".repeat(json.len());
        assert!(count_tokens(json) > count_tokens(&plain));
    }

    #[test]
    fn high_whitespace_ratio_increases_estimate() {
        let sparse = "a   a   a   a   a   a   a   a";
        let dense = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        assert_eq!(sparse.len(), dense.len());
        assert!(count_tokens(sparse) > count_tokens(dense));
    }

    #[test]
    fn truncate_to_tokens_respects_budget() {
        let text = "word ".repeat(200);
        let truncated = truncate_to_tokens(&text, 20, "...");
        assert!(count_tokens(&truncated) <= 20);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncate_is_a_noop_under_budget() {
        let text = "short text";
        assert_eq!(truncate_to_tokens(text, 1000, "..."), text);
    }

    #[test]
    fn split_into_chunks_respects_paragraph_breaks() {
        let text = format!("{}\n\n{}\n\n{}", "p1 ".repeat(50), "p2 ".repeat(50), "p3 ".repeat(50));
        let chunks = split_into_chunks(&text, 60);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(count_tokens(chunk) <= 90); // some slack for join overhead
        }
    }

    #[test]
    fn split_into_chunks_is_a_single_chunk_under_budget() {
        let text = "short text";
        assert_eq!(split_into_chunks(text, 1000), vec![text.to_string()]);
    }
}
