//! Line access to declaring source files, for excerpts and line lookups.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// How far above the body start a method signature may begin.
const SIGNATURE_LOOKBACK: usize = 20;

/// A source file split into lines.
#[derive(Debug, Clone)]
pub struct SourceFile {
    lines: Vec<String>,
}

impl SourceFile {
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// 1-based line access.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// First line matching `pattern`, 1-based.
    pub fn find_line(&self, pattern: &Regex) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| pattern.is_match(line))
            .map(|i| i + 1)
    }

    /// Lines `first..=last` (1-based), each followed by a newline.
    pub fn excerpt(&self, first: usize, last: usize) -> String {
        let first = first.max(1);
        let last = last.min(self.lines.len());
        if first > last {
            return String::new();
        }
        let mut out = self.lines[first - 1..last].join("\n");
        out.push('\n');
        out
    }

    /// Closest line at or above `body_start` containing `function <name>`,
    /// looking back at most twenty lines.
    pub fn find_signature_start(&self, body_start: usize, name: &str) -> Option<usize> {
        let needle = format!("function {name}");
        let lowest = body_start.saturating_sub(SIGNATURE_LOOKBACK).max(1);
        (lowest..=body_start)
            .rev()
            .find(|&n| self.line(n).is_some_and(|line| line.contains(&needle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "<?php\nclass A\n{\n    public function run(\n        int $x,\n    ): void\n    {\n        echo $x;\n    }\n}\n";

    fn source() -> SourceFile {
        SourceFile::from_text(SOURCE)
    }

    #[test]
    fn lines_are_one_based() {
        let file = source();
        assert_eq!(file.line(1), Some("<?php"));
        assert_eq!(file.line(0), None);
        assert_eq!(file.line(99), None);
    }

    #[test]
    fn signature_is_found_above_body() {
        let file = source();
        assert_eq!(file.find_signature_start(7, "run"), Some(4));
        assert_eq!(file.find_signature_start(7, "missing"), None);
    }

    #[test]
    fn excerpt_covers_signature_to_end() {
        let file = source();
        assert_eq!(
            file.excerpt(4, 9),
            "    public function run(\n        int $x,\n    ): void\n    {\n        echo $x;\n    }\n"
        );
        assert_eq!(file.excerpt(5, 2), "");
    }

    #[test]
    fn find_line_uses_pattern() {
        let file = source();
        let pattern = Regex::new(r"echo \$x;").unwrap();
        assert_eq!(file.find_line(&pattern), Some(8));
    }

    #[test]
    fn open_reports_missing_file() {
        let err = SourceFile::open(Path::new("/nonexistent/Nope.php")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
