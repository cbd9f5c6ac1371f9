//! PHPDoc comment parser.
//!
//! Splits a `/** ... */` block into summary, description and tags. Tags keep
//! their rendered text (`@name body`) with continuation lines folded in, and
//! typed tags are checked for balanced type brackets.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

// -- Regex patterns -----------------------------------------------------------

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z\\][\w\\:-]*)(?:\s+(.*))?$").unwrap());

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*```").unwrap());

/// Tags whose first token is a type expression.
const TYPED_TAGS: &[&str] = &[
    "param",
    "return",
    "var",
    "throws",
    "property",
    "property-read",
    "property-write",
];

/// One tag as written, e.g. name `param`, body `int $limit the limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub body: String,
}

impl Tag {
    pub fn rendered(&self) -> String {
        if self.body.is_empty() {
            format!("@{}", self.name)
        } else {
            format!("@{} {}", self.name, self.body)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub summary: String,
    pub description: String,
    pub tags: Vec<Tag>,
}

/// A `@param` tag split into its parts; `type_` is empty when omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamTag {
    pub type_: String,
    pub name: String,
    pub description: String,
}

/// A `@return` tag split into its type token and free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTag {
    pub type_: String,
    pub description: String,
}

impl ReturnTag {
    /// Generics, array shapes and callable signatures.
    pub fn has_complex_type(&self) -> bool {
        self.type_.contains(|c| matches!(c, '<' | '{' | '('))
    }
}

impl DocBlock {
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |t| t.name == name)
    }

    /// Rendered texts of every tag called `name`, in order.
    pub fn rendered(&self, name: &str) -> Vec<String> {
        self.tags_named(name).map(Tag::rendered).collect()
    }

    /// Summary and description, with `**Deprecated:**` notes in front.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for tag in self.tags_named("deprecated") {
            out.push_str("**Deprecated:**");
            if !tag.body.is_empty() {
                out.push(' ');
                out.push_str(&tag.body);
            }
            out.push_str("\n\n");
        }
        out.push_str(&self.summary);
        if !self.description.is_empty() {
            out.push_str("\n\n");
            out.push_str(&self.description);
        }
        out.trim().to_string()
    }

    pub fn params(&self) -> Vec<ParamTag> {
        self.tags_named("param")
            .filter_map(|tag| parse_param(&tag.body))
            .collect()
    }

    /// The first `@return` tag, if any.
    pub fn return_tag(&self) -> Option<ReturnTag> {
        let tag = self.tags_named("return").next()?;
        let (type_, rest) = split_type_token(&tag.body)?;
        Some(ReturnTag {
            type_: type_.to_string(),
            description: rest.trim().to_string(),
        })
    }
}

/// `@internal` marker on a raw doc comment.
pub fn is_internal(raw: &str) -> bool {
    raw.contains("* @internal")
}

/// Parse a raw doc comment including its delimiters.
pub fn parse(raw: &str) -> Result<DocBlock> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DocBlock::default());
    }
    let inner = raw
        .strip_prefix("/**")
        .and_then(|r| r.strip_suffix("*/"))
        .filter(|_| raw.len() >= 5)
        .ok_or_else(|| Error::MalformedDocComment {
            reason: "comment is not delimited by /** and */".to_string(),
        })?;

    let lines = normalize_lines(inner);
    let first_tag = first_tag_line(&lines);
    let (text_lines, tag_lines) = lines.split_at(first_tag);
    let (summary, description) = split_summary(text_lines);
    let tags = collect_tags(tag_lines)?;
    Ok(DocBlock {
        summary,
        description,
        tags,
    })
}

/// Strip comment decoration, keeping indentation after the `* ` prefix.
fn normalize_lines(inner: &str) -> Vec<String> {
    inner
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string(),
                None => trimmed.trim_end().to_string(),
            }
        })
        .collect()
}

/// Index of the first tag line outside a fenced code block.
fn first_tag_line(lines: &[String]) -> usize {
    let mut in_fence = false;
    for (i, line) in lines.iter().enumerate() {
        if RE_FENCE.is_match(line) {
            in_fence = !in_fence;
        } else if !in_fence && RE_TAG.is_match(line) {
            return i;
        }
    }
    lines.len()
}

/// Summary runs to the first blank line or the first line ending in `.`.
fn split_summary(lines: &[String]) -> (String, String) {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let lines = &lines[start..];
    let mut summary_end = lines.len();
    let mut rest_start = lines.len();
    for (i, line) in lines.iter().enumerate() {
        if RE_FENCE.is_match(line) && i == 0 {
            summary_end = 0;
            rest_start = 0;
            break;
        }
        if line.trim().is_empty() {
            summary_end = i;
            rest_start = i + 1;
            break;
        }
        if line.trim_end().ends_with('.') {
            summary_end = i + 1;
            rest_start = i + 1;
            break;
        }
    }
    let summary = lines[..summary_end]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n");
    let description = lines[rest_start..].join("\n").trim_matches('\n').to_string();
    (summary, description.trim_end().to_string())
}

fn collect_tags(lines: &[String]) -> Result<Vec<Tag>> {
    let mut tags: Vec<Tag> = Vec::new();
    for line in lines {
        let line = line.trim();
        if let Some(caps) = RE_TAG.captures(line) {
            tags.push(Tag {
                name: caps[1].to_string(),
                body: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            });
        } else if !line.is_empty() {
            if let Some(last) = tags.last_mut() {
                if !last.body.is_empty() {
                    last.body.push(' ');
                }
                last.body.push_str(line);
            }
        }
    }
    for tag in &tags {
        if TYPED_TAGS.contains(&tag.name.as_str())
            && !tag.body.is_empty()
            && split_type_token(&tag.body).is_none()
        {
            return Err(Error::MalformedDocComment {
                reason: format!("unbalanced type expression in {}", tag.rendered()),
            });
        }
    }
    Ok(tags)
}

/// Split a tag body into its leading type token and the remaining text.
///
/// Whitespace inside brackets, or around `|`, `&`, `,` and `:`, does not end
/// the token. Returns `None` when the brackets do not balance.
pub fn split_type_token(body: &str) -> Option<(&str, &str)> {
    let body = body.trim_start();
    let mut depth = 0i32;
    let mut last_significant = ' ';
    let mut iter = body.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            c if c.is_whitespace() && depth == 0 => {
                let after = body[i..].trim_start();
                let continues_intersection = after
                    .strip_prefix('&')
                    .is_some_and(|rest| !rest.trim_start().starts_with(['$', '.']));
                let joins = matches!(last_significant, '|' | '&' | ',' | ':')
                    || after.starts_with(['|', ':'])
                    || continues_intersection;
                if !joins {
                    return Some((&body[..i], body[i..].trim_start()));
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            last_significant = c;
        }
    }
    (depth == 0).then_some((body.trim_end(), ""))
}

fn parse_param(body: &str) -> Option<ParamTag> {
    let (first, rest) = split_type_token(body)?;
    if first.is_empty() {
        return None;
    }
    let (type_, name, description) = if is_param_name(first) {
        ("", first, rest)
    } else {
        let rest = rest.trim_start();
        let (name, description) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));
        (first, name, description)
    };
    if !is_param_name(name) {
        return None;
    }
    let name = name.trim_start_matches("...").trim_start_matches('&');
    Some(ParamTag {
        type_: type_.to_string(),
        name: name.to_string(),
        description: description.trim().to_string(),
    })
}

fn is_param_name(token: &str) -> bool {
    token
        .trim_start_matches("...")
        .trim_start_matches('&')
        .trim_start_matches("...")
        .starts_with('$')
}
