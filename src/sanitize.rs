//! Text sanitizer applied to everything scraped before it is stored.
//!
//! Scraped posts end up as input to a downstream language-model stage, so
//! instruction-override phrases and chat role prefixes are replaced with a
//! marker before anything else happens to the text.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Replacement written in place of a neutralized phrase.
pub const FILTERED_MARKER: &str = "[FILTERED]";

/// Hard cap on sanitized output, in chars.
pub const MAX_SANITIZED_CHARS: usize = 5000;

// Word gaps are `\s+` so that collapsing whitespace afterwards cannot
// reassemble a phrase that slipped through.
const INJECTION_PATTERNS: &[&str] = &[
    r"(?i)ignore\s+previous\s+instructions",
    r"(?i)disregard\s+all\s+prior",
    r"(?i)system:\s*",
    r"(?i)assistant:\s*",
    r"(?i)user:\s*",
];

fn injection_res() -> &'static [Regex] {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    RES.get_or_init(|| {
        INJECTION_PATTERNS
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect()
    })
}

/// Neutralize injection phrases, collapse whitespace, trim and cap length.
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // 1) Injection phrases
    let mut out = text.to_string();
    for re in injection_res() {
        out = re.replace_all(&out, FILTERED_MARKER).into_owned();
    }

    // 2) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 3) Length cap; a cut can leave a trailing space behind
    if out.chars().count() > MAX_SANITIZED_CHARS {
        out = out.chars().take(MAX_SANITIZED_CHARS).collect();
        out.truncate(out.trim_end().len());
    }

    out
}
