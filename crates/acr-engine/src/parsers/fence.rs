//! Strips a markdown code fence a backend sometimes wraps its JSON output
//! in, tolerating single-line, multi-line, and unclosed fences.

/// Removes a leading ` ``` ` (with optional language tag) and a matching
/// trailing ` ``` ` from `input`. Idempotent: applying it to already-bare
/// text returns that text unchanged.
pub fn strip_markdown_code_fence(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let rest = &trimmed[3..];
    if !rest.contains('\n') {
        let without_tag = skip_language_tag(rest);
        let inner = without_tag.strip_suffix("```").unwrap_or(without_tag);
        return inner.trim().to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if matches!(lines.last(), Some(last) if last.trim() == "```") {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn skip_language_tag(rest: &str) -> &str {
    if rest.starts_with(['{', '[', '"']) {
        return rest;
    }
    let tag_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .count();
    &rest[tag_len..]
}

/// Case-insensitive substring check against the fixed set of phrases a clean
/// review is allowed to say instead of reporting a finding.
pub fn is_blocklisted(text: &str) -> bool {
    const BLOCKLIST: &[&str] = &[
        "no issues",
        "no findings",
        "looks good",
        "code looks clean",
        "no problems",
        "review complete",
    ];
    let lower = text.to_lowercase();
    BLOCKLIST.iter().any(|phrase| lower.contains(phrase))
}
