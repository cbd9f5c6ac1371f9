//! reStructuredText string helpers.

use regex::Regex;
use std::sync::LazyLock;

static RE_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```\s*([\w+-]*)\s*$").unwrap());

/// Double every backslash so RST does not treat it as an escape.
pub fn escape_rst(text: &str) -> String {
    text.replace('\\', "\\\\")
}

/// Prefix every non-empty line with `prefix`.
pub fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite Markdown code fences into `..  code-block::` directives.
///
/// The language defaults to `php`. An unterminated fence runs to the end.
pub fn convert_fences(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = RE_FENCE_OPEN.captures(line) else {
            out.push(line.to_string());
            continue;
        };
        let lang = match &caps[1] {
            "" => "php",
            lang => lang,
        };
        out.push(format!("..  code-block:: {lang}"));
        out.push(String::new());
        for code in lines.by_ref() {
            if code.trim_start().starts_with("```") {
                break;
            }
            out.push(indent(code, "    "));
        }
        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }
        if lines.peek().is_some_and(|next| !next.trim().is_empty()) {
            out.push(String::new());
        }
    }
    out.join("\n")
}
