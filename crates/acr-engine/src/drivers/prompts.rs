//! Prompt text shared across drivers: the default review instructions, the
//! grouping prompt the summarizer sends, and the evaluator prompt the FP
//! filter sends. Kept in one place so the three drivers stay byte-identical
//! on everything except how they deliver the prompt to the backend.

use std::path::Path;

pub const DEFAULT_REVIEW_INSTRUCTIONS: &str = "\
You are reviewing a code change. Examine the diff below and report concrete, \
actionable issues: bugs, security problems, missing error handling, and \
anything that would block a merge. One issue per line of output, no headings, \
no summary paragraph. If you find nothing worth flagging, say so in one line.";

/// Where the diff lives when rendering a review prompt: inline text, or a
/// path the backend is expected to read itself.
pub enum DiffEmbed<'a> {
    Inline(&'a str),
    RefFile(&'a Path),
}

/// Builds the full review prompt: base instructions, the diff (inline or by
/// reference), and an optional trailing guidance paragraph.
pub fn render_review_prompt(embed: DiffEmbed<'_>, guidance: Option<&str>) -> String {
    let mut prompt = String::from(DEFAULT_REVIEW_INSTRUCTIONS);
    prompt.push_str("\n\n");
    match embed {
        DiffEmbed::Inline(diff) => {
            prompt.push_str("```diff\n");
            prompt.push_str(diff);
            prompt.push_str("\n```");
        }
        DiffEmbed::RefFile(path) => {
            prompt.push_str(&format!("The diff is too large to inline; read it from {}.", path.display()));
        }
    }
    if let Some(guidance) = guidance {
        let trimmed = guidance.trim();
        if !trimmed.is_empty() {
            prompt.push_str("\n\nAdditional guidance from the caller: ");
            prompt.push_str(trimmed);
        }
    }
    prompt
}

pub const GROUPING_PROMPT: &str = "\
Cluster the following issues, each given as {\"id\": <int>, \"text\": <string>, \
\"reviewers\": [<int>, ...]}, into groups of textually or semantically \
equivalent issues. For each group, pick one short title, a one-paragraph \
summary, preserve file/line references from the inputs as `messages`, set \
`reviewer_count` to the number of distinct reviewer ids across the group's \
inputs, and list every input id it covers as `sources`. If an input reports \
that no issues were found, place it under `info` instead of `findings`. \
Respond with only a JSON object of the shape \
{\"findings\": [...], \"info\": [...]}, no prose, no markdown fence.";

pub const FP_FILTER_PROMPT: &str = "\
Evaluate each clustered issue below, given as {\"id\": <int>, \"title\": \
<string>, \"summary\": <string>, \"messages\": [<string>, ...], \
\"reviewer_count\": <int>}, for how likely it is to be a false positive: a \
style nit, a misunderstanding of the code, or something already handled \
elsewhere. Respond with only a JSON object of the shape \
{\"evaluations\": [{\"id\": <int>, \"fp_score\": <1-100>, \"reasoning\": \
<string>}, ...]}, one entry per input id, no prose, no markdown fence. A \
higher fp_score means more likely to be a false positive.";

/// Builds the stdin payload every summarize-style call sends:
/// `<prompt>\n\nINPUT JSON:\n<input bytes>\n`.
pub fn render_summary_stdin(prompt: &str, input: &[u8]) -> Vec<u8> {
    let mut stdin = Vec::with_capacity(prompt.len() + input.len() + 16);
    stdin.extend_from_slice(prompt.as_bytes());
    stdin.extend_from_slice(b"\n\nINPUT JSON:\n");
    stdin.extend_from_slice(input);
    stdin.push(b'\n');
    stdin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_prompt_carries_diff_and_guidance() {
        let prompt = render_review_prompt(DiffEmbed::Inline("+ line"), Some("focus on panics"));
        assert!(prompt.contains("+ line"));
        assert!(prompt.ends_with("focus on panics"));
        assert!(prompt.contains("Additional guidance from the caller:"));
    }

    #[test]
    fn ref_file_prompt_mentions_path_not_contents() {
        let path = Path::new("/tmp/.acr-diff-x.patch");
        let prompt = render_review_prompt(DiffEmbed::RefFile(path), None);
        assert!(prompt.contains("/tmp/.acr-diff-x.patch"));
        assert!(!prompt.contains("Additional guidance"));
    }

    #[test]
    fn blank_guidance_is_dropped() {
        let prompt = render_review_prompt(DiffEmbed::Inline("x"), Some("   "));
        assert!(!prompt.contains("Additional guidance"));
    }

    #[test]
    fn summary_stdin_matches_the_fixed_envelope_shape() {
        let stdin = render_summary_stdin("cluster these", br#"[{"id":0}]"#);
        let text = String::from_utf8(stdin).unwrap();
        assert_eq!(text, "cluster these\n\nINPUT JSON:\n[{\"id\":0}]\n");
    }
}
