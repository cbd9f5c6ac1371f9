//! PHP tokenizer.
//!
//! Produces just enough structure for declaration scanning and constant
//! evaluation: names, variables, literals, comments and punctuation, each
//! tagged with its line and byte span in the source.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    InlineHtml,
    OpenTag,
    CloseTag,
    DocComment,
    Comment,
    Variable,
    Name,
    Integer,
    Float,
    String,
    Heredoc,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character.
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    /// Case-insensitive keyword match on a name token.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Tokens with no meaning for declaration parsing.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::InlineHtml | TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::Comment
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Multi-character operators, longest first.
const PUNCTUATION: &[&str] = &[
    "<<=", ">>=", "**=", "...", "??=", "?->", "===", "!==", "<=>", "#[", "::", "=>", "->", "??",
    "<<", ">>", "**", "==", "!=", "<>", "<=", ">=", "&&", "||", "++", "--", ".=", "+=", "-=",
    "*=", "/=", "%=", "|=", "&=", "^=",
];

/// Tokenize a complete PHP file, starting outside of `<?php`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).run(false)
}

/// Tokenize a bare PHP code fragment such as a constant expression.
pub fn tokenize_code(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).run(true)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self, php_mode: bool) -> Result<Vec<Token>, LexError> {
        let mut in_php = php_mode;
        while self.pos < self.bytes.len() {
            if !in_php {
                self.lex_inline_html();
                in_php = true;
                continue;
            }
            let b = self.bytes[self.pos];
            if b.is_ascii_whitespace() {
                if b == b'\n' {
                    self.line += 1;
                }
                self.pos += 1;
            } else if self.starts_with("?>") {
                self.push(TokenKind::CloseTag, self.pos + 2);
                in_php = false;
            } else if self.starts_with("#[") {
                self.push(TokenKind::Punct, self.pos + 2);
            } else if b == b'#' || self.starts_with("//") {
                self.lex_line_comment();
            } else if self.starts_with("/*") {
                self.lex_block_comment()?;
            } else if b == b'$' && self.peek_at(1).is_some_and(is_ident_start) {
                let end = self.scan_ident(self.pos + 1);
                self.push(TokenKind::Variable, end);
            } else if b == b'\'' || b == b'"' || b == b'`' {
                self.lex_quoted(b)?;
            } else if self.starts_with("<<<") {
                self.lex_heredoc()?;
            } else if b.is_ascii_digit()
                || (b == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
            {
                self.lex_number();
            } else if is_ident_start(b)
                || (b == b'\\' && self.peek_at(1).is_some_and(is_ident_start))
            {
                self.lex_name();
            } else {
                let len = PUNCTUATION
                    .iter()
                    .find(|p| self.starts_with(p))
                    .map_or_else(|| self.char_len(), |p| p.len());
                self.push(TokenKind::Punct, self.pos + len);
            }
        }
        Ok(self.tokens)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn char_len(&self) -> usize {
        self.src[self.pos..].chars().next().map_or(1, char::len_utf8)
    }

    /// Emit the span `pos..end` as a token and advance past it.
    fn push(&mut self, kind: TokenKind, end: usize) {
        let text = &self.src[self.pos..end];
        self.tokens.push(Token {
            kind,
            text: text.to_string(),
            line: self.line,
            start: self.pos,
            end,
        });
        self.line += text.bytes().filter(|&b| b == b'\n').count();
        self.pos = end;
    }

    fn error(&self, message: &str) -> LexError {
        LexError {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn lex_inline_html(&mut self) {
        let rest = &self.src[self.pos..];
        match rest.find("<?") {
            Some(offset) => {
                if offset > 0 {
                    self.push(TokenKind::InlineHtml, self.pos + offset);
                }
                let tag = &self.src[self.pos..];
                let len = if tag.get(..5).is_some_and(|t| t.eq_ignore_ascii_case("<?php")) {
                    5
                } else if tag.starts_with("<?=") {
                    3
                } else {
                    2
                };
                self.push(TokenKind::OpenTag, self.pos + len);
            }
            None => self.push(TokenKind::InlineHtml, self.bytes.len()),
        }
    }

    fn lex_line_comment(&mut self) {
        let mut end = self.pos;
        while end < self.bytes.len() {
            if self.bytes[end] == b'\n' || self.bytes[end..].starts_with(b"?>") {
                break;
            }
            end += 1;
        }
        self.push(TokenKind::Comment, end);
    }

    fn lex_block_comment(&mut self) -> Result<(), LexError> {
        let Some(close) = self.src[self.pos + 2..].find("*/") else {
            return Err(self.error("unterminated comment"));
        };
        let end = self.pos + 2 + close + 2;
        let text = &self.src[self.pos..end];
        let kind = if text.starts_with("/**") && text.len() > 4 {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        };
        self.push(kind, end);
        Ok(())
    }

    fn lex_quoted(&mut self, quote: u8) -> Result<(), LexError> {
        let mut i = self.pos + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b if b == quote => {
                    self.push(TokenKind::String, i + 1);
                    return Ok(());
                }
                _ => i += 1,
            }
        }
        Err(self.error("unterminated string"))
    }

    fn lex_heredoc(&mut self) -> Result<(), LexError> {
        let header_end = self.src[self.pos..]
            .find('\n')
            .map(|off| self.pos + off)
            .ok_or_else(|| self.error("unterminated heredoc"))?;
        let label = self.src[self.pos + 3..header_end]
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        if label.is_empty() {
            return Err(self.error("heredoc without label"));
        }
        let mut line_start = header_end + 1;
        while line_start <= self.bytes.len() {
            let line_end = self.src[line_start..]
                .find('\n')
                .map_or(self.bytes.len(), |off| line_start + off);
            let line = &self.src[line_start..line_end];
            let trimmed = line.trim_start();
            if let Some(after) = trimmed.strip_prefix(label.as_str()) {
                if !after.bytes().next().is_some_and(is_ident_char) {
                    let close = line_start + (line.len() - trimmed.len()) + label.len();
                    self.push(TokenKind::Heredoc, close);
                    return Ok(());
                }
            }
            if line_end >= self.bytes.len() {
                break;
            }
            line_start = line_end + 1;
        }
        Err(self.error("unterminated heredoc"))
    }

    fn lex_number(&mut self) {
        let mut i = self.pos;
        let mut float = false;
        let prefixed = self.bytes[i] == b'0'
            && self
                .bytes
                .get(i + 1)
                .is_some_and(|c| matches!(c, b'x' | b'X' | b'b' | b'B' | b'o' | b'O'));
        if prefixed {
            i += 2;
            while i < self.bytes.len() && (self.bytes[i].is_ascii_hexdigit() || self.bytes[i] == b'_')
            {
                i += 1;
            }
        } else {
            i = self.scan_digits(i);
            if self.bytes.get(i) == Some(&b'.') && self.bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
            {
                float = true;
                i = self.scan_digits(i + 1);
            } else if self.bytes.get(i) == Some(&b'.')
                && !self.bytes.get(i + 1).is_some_and(|&c| c == b'.' || is_ident_start(c))
            {
                float = true;
                i += 1;
            }
            if matches!(self.bytes.get(i), Some(b'e' | b'E')) {
                let mut j = i + 1;
                if matches!(self.bytes.get(j), Some(b'+' | b'-')) {
                    j += 1;
                }
                if self.bytes.get(j).is_some_and(u8::is_ascii_digit) {
                    float = true;
                    i = self.scan_digits(j);
                }
            }
        }
        let kind = if float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        self.push(kind, i);
    }

    fn scan_digits(&self, mut i: usize) -> usize {
        while i < self.bytes.len() && (self.bytes[i].is_ascii_digit() || self.bytes[i] == b'_') {
            i += 1;
        }
        i
    }

    fn scan_ident(&self, mut i: usize) -> usize {
        while i < self.bytes.len() && is_ident_char(self.bytes[i]) {
            i += 1;
        }
        i
    }

    fn lex_name(&mut self) {
        let mut i = self.pos;
        if self.bytes[i] == b'\\' {
            i += 1;
        }
        i = self.scan_ident(i);
        while self.bytes.get(i) == Some(&b'\\') && self.bytes.get(i + 1).is_some_and(|&c| is_ident_start(c)) {
            i = self.scan_ident(i + 1);
        }
        self.push(TokenKind::Name, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
        tokens.iter().map(|t| (t.kind, t.text.as_str())).collect()
    }

    #[test]
    fn tokenize_open_tag_and_class() {
        let tokens = tokenize("<?php\nclass Foo {}\n").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::OpenTag, "<?php"),
                (TokenKind::Name, "class"),
                (TokenKind::Name, "Foo"),
                (TokenKind::Punct, "{"),
                (TokenKind::Punct, "}"),
            ]
        );
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn tokenize_comments_and_doc_comments() {
        let tokens = tokenize_code("// line\n# hash\n/* block */\n/** doc */\n/**/").unwrap();
        let k: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::DocComment,
                TokenKind::Comment,
            ]
        );
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn tokenize_multibyte_comments() {
        let tokens = tokenize("<?php\n// Größe der Datei\n# Übersicht ?>\n<?php class B {}").unwrap();
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Comment && t.text == "// Größe der Datei"));
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Comment && t.text == "# Übersicht "));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Name && t.text == "B"));
    }

    #[test]
    fn tokenize_short_open_tag_before_multibyte_text() {
        let tokens = tokenize("<?phö").unwrap();
        assert_eq!(kinds(&tokens), vec![(TokenKind::OpenTag, "<?"), (TokenKind::Name, "phö")]);
    }

    #[test]
    fn tokenize_attribute_open_is_not_a_comment() {
        let tokens = tokenize_code("#[\\Deprecated]").unwrap();
        assert!(tokens[0].is("#["));
        assert_eq!(tokens[1].text, "\\Deprecated");
        assert!(tokens[2].is("]"));
    }

    #[test]
    fn tokenize_qualified_names() {
        let tokens = tokenize_code("\\Foo\\Bar namespace\\Baz self::X").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::Name, "\\Foo\\Bar"),
                (TokenKind::Name, "namespace\\Baz"),
                (TokenKind::Name, "self"),
                (TokenKind::Punct, "::"),
                (TokenKind::Name, "X"),
            ]
        );
    }

    #[test]
    fn tokenize_group_use_prefix() {
        let tokens = tokenize_code("use A\\{B, C};").unwrap();
        assert_eq!(tokens[1].text, "A");
        assert!(tokens[2].is("\\"));
        assert!(tokens[3].is("{"));
    }

    #[test]
    fn tokenize_numbers() {
        let tokens = tokenize_code("42 0x1F 1_000 3.14 .5 1e3 2.5E-3 7.").unwrap();
        let k: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
            ]
        );
    }

    #[test]
    fn tokenize_strings_with_escapes() {
        let tokens = tokenize_code(r#"'it\'s' "say \"hi\"""#).unwrap();
        assert_eq!(tokens[0].text, r"'it\'s'");
        assert_eq!(tokens[1].text, r#""say \"hi\"""#);
    }

    #[test]
    fn tokenize_heredoc() {
        let src = "$a = <<<EOT\n  line one\n  EOT;\n$b = 1;";
        let tokens = tokenize_code(src).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Heredoc);
        assert_eq!(tokens[2].text, "<<<EOT\n  line one\n  EOT");
        assert!(tokens[3].is(";"));
        assert_eq!(tokens[4].line, 4);
    }

    #[test]
    fn tokenize_multi_char_operators() {
        let tokens = tokenize_code("a::b => ... << ?-> ??").unwrap();
        let puncts: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Punct)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(puncts, vec!["::", "=>", "...", "<<", "?->", "??"]);
    }

    #[test]
    fn tokenize_close_tag_returns_to_html() {
        let tokens = tokenize("<?php $a; ?>\n<p>html</p>\n<?php $b;").unwrap();
        let variables: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Variable)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(variables, vec!["$a", "$b"]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::InlineHtml));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = tokenize_code("\n/* open").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize_code("'abc").is_err());
    }
}
