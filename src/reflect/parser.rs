//! Declaration scanner: turns a token stream into [`ClassInfo`] records.
//!
//! Only the declaration level is parsed. Function and method bodies are
//! skipped by brace matching, and initializer expressions are captured as
//! token slices for later evaluation.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::lexer::{self, LexError, Token, TokenKind};
use super::names::NameContext;
use super::{
    ClassInfo, ClassKind, ConstExpr, ConstantInfo, MethodInfo, ParamInfo, PropertyInfo,
    ReflectedType, Scope,
};
use crate::model::Modifiers;

/// Parse every class, interface, trait and enum declared in `src`.
pub fn parse_source(src: &str, file: Option<&Path>) -> Result<Vec<ClassInfo>, LexError> {
    let tokens = lexer::tokenize(src)?
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        file: file.map(Path::to_path_buf),
        names: NameContext::default(),
        classes: Vec::new(),
    };
    parser.parse_top_level();
    Ok(parser.classes)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    file: Option<PathBuf>,
    names: NameContext,
    classes: Vec<ClassInfo>,
}

/// Modifiers and doc comment collected ahead of a class member.
struct Pending {
    doc: Option<String>,
    attributes: Vec<String>,
    modifiers: Modifiers,
}

impl Pending {
    fn new() -> Self {
        Self {
            doc: None,
            attributes: Vec::new(),
            modifiers: Modifiers::empty(),
        }
    }
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek().is_some_and(|t| t.is(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn prev_significant(&self) -> Option<&Token> {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::DocComment)
    }

    // -- Top level -----------------------------------------------------------

    fn parse_top_level(&mut self) {
        let mut doc: Option<String> = None;
        while let Some(tok) = self.peek().cloned() {
            match tok.kind {
                TokenKind::DocComment => {
                    doc = Some(tok.text);
                    self.pos += 1;
                }
                TokenKind::Punct if tok.text == "#[" => {
                    self.parse_attribute();
                }
                TokenKind::Punct if tok.text == "{" => {
                    self.skip_block();
                    doc = None;
                }
                TokenKind::Name if tok.is_keyword("namespace") => {
                    self.parse_namespace();
                    doc = None;
                }
                TokenKind::Name if tok.is_keyword("use") => {
                    self.parse_use();
                    doc = None;
                }
                TokenKind::Name if self.at_class_declaration() => {
                    let doc = doc.take();
                    self.parse_class(doc);
                }
                _ => {
                    self.pos += 1;
                    doc = None;
                }
            }
        }
    }

    fn at_class_declaration(&self) -> bool {
        let after_operator = self.prev_significant().is_some_and(|t| {
            t.is("::") || t.is("->") || t.is("?->") || t.is("\\") || t.is_keyword("new")
        });
        if after_operator {
            return false;
        }
        let mut i = self.pos;
        while self.tokens.get(i).is_some_and(|t| {
            t.is_keyword("abstract") || t.is_keyword("final") || t.is_keyword("readonly")
        }) {
            i += 1;
        }
        let is_class_keyword = self.tokens.get(i).is_some_and(|t| {
            ["class", "interface", "trait", "enum"]
                .iter()
                .any(|k| t.is_keyword(k))
        });
        let named = self
            .tokens
            .get(i + 1)
            .is_some_and(|t| t.kind == TokenKind::Name);
        let header = self.tokens.get(i + 2).is_some_and(|t| {
            t.is("{") || t.is(":") || t.is_keyword("extends") || t.is_keyword("implements")
        });
        is_class_keyword && named && header
    }

    fn parse_namespace(&mut self) {
        self.pos += 1;
        let mut namespace = String::new();
        if let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::Name) {
            namespace = tok.text.clone();
            self.pos += 1;
        }
        self.names = NameContext::new(&namespace);
        // A braced body is scanned as top level; its closing brace is skipped there.
        if !self.eat(";") {
            self.eat("{");
        }
    }

    fn parse_use(&mut self) {
        self.pos += 1;
        if self.peek().is_some_and(|t| t.is("(")) {
            return;
        }
        if self
            .peek()
            .is_some_and(|t| t.is_keyword("function") || t.is_keyword("const"))
        {
            self.skip_past(";");
            return;
        }
        loop {
            let Some(tok) = self.next() else { return };
            if tok.is(";") {
                return;
            }
            if tok.kind != TokenKind::Name {
                continue;
            }
            let grouped = self.peek().is_some_and(|t| t.is("\\"))
                && self.peek_at(1).is_some_and(|t| t.is("{"));
            if grouped {
                self.pos += 2;
                let prefix = tok.text.trim_end_matches('\\');
                while let Some(item) = self.next() {
                    if item.is("}") {
                        break;
                    }
                    if item.kind != TokenKind::Name {
                        continue;
                    }
                    let alias = self.parse_alias();
                    self.names
                        .import(&format!("{prefix}\\{}", item.text), alias.as_deref());
                }
            } else {
                let alias = self.parse_alias();
                self.names.import(&tok.text, alias.as_deref());
            }
            match self.next() {
                Some(t) if t.is(",") => continue,
                _ => return,
            }
        }
    }

    fn parse_alias(&mut self) -> Option<String> {
        if self.peek().is_some_and(|t| t.is_keyword("as")) {
            self.pos += 1;
            return self
                .next()
                .filter(|t| t.kind == TokenKind::Name)
                .map(|t| t.text);
        }
        None
    }

    /// Consume `#[ ... ]`, returning the resolved attribute class names.
    fn parse_attribute(&mut self) -> Vec<String> {
        self.pos += 1;
        let mut names = Vec::new();
        let mut depth = 1usize;
        let mut expect_name = true;
        while let Some(tok) = self.next() {
            if tok.is("[") || tok.is("(") || tok.is("{") || tok.is("#[") {
                depth += 1;
                expect_name = false;
                continue;
            }
            if tok.is("]") || tok.is(")") || tok.is("}") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                continue;
            }
            if depth == 1 && tok.is(",") {
                expect_name = true;
                continue;
            }
            if depth == 1 && expect_name && tok.kind == TokenKind::Name {
                names.push(self.names.resolve_class(&tok.text));
            }
            expect_name = false;
        }
        names
    }

    /// Skip a balanced `{ ... }` block, returning the line of the closing brace.
    fn skip_block(&mut self) -> usize {
        let mut depth = 0usize;
        let mut last_line = self.peek().map_or(0, |t| t.line);
        while let Some(tok) = self.next() {
            last_line = tok.line;
            if tok.is("{") {
                depth += 1;
            } else if tok.is("}") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
        last_line
    }

    /// Advance past the next `punct` at brace depth zero.
    fn skip_past(&mut self, punct: &str) {
        while let Some(tok) = self.peek().cloned() {
            if tok.is("{") {
                self.skip_block();
                continue;
            }
            self.pos += 1;
            if tok.is(punct) {
                return;
            }
        }
    }

    // -- Classes -------------------------------------------------------------

    fn parse_class(&mut self, doc: Option<String>) {
        let start_line = self.peek().map_or(0, |t| t.line);
        let mut modifiers = Modifiers::empty();
        let mut kind = ClassKind::Class;
        while let Some(tok) = self.next() {
            match tok.text.to_ascii_lowercase().as_str() {
                "abstract" => modifiers |= Modifiers::ABSTRACT,
                "final" => modifiers |= Modifiers::FINAL,
                "readonly" => modifiers |= Modifiers::READONLY,
                "interface" => {
                    kind = ClassKind::Interface;
                    break;
                }
                "trait" => {
                    kind = ClassKind::Trait;
                    break;
                }
                "enum" => {
                    kind = ClassKind::Enum;
                    break;
                }
                _ => break,
            }
        }
        let Some(name_tok) = self.next() else { return };
        let short_name = name_tok.text;
        let name = if self.names.namespace.is_empty() {
            short_name.clone()
        } else {
            format!("{}\\{}", self.names.namespace, short_name)
        };

        let mut parent = None;
        let mut interfaces = Vec::new();
        while let Some(tok) = self.peek().cloned() {
            if tok.is("{") {
                break;
            }
            self.pos += 1;
            if tok.is_keyword("extends") {
                let list = self.parse_name_list();
                if kind == ClassKind::Interface {
                    interfaces.extend(list);
                } else {
                    parent = list.into_iter().next();
                }
            } else if tok.is_keyword("implements") {
                interfaces.extend(self.parse_name_list());
            }
        }
        if self.peek().is_none() {
            return;
        }

        let scope = Rc::new(Scope {
            names: self.names.clone(),
            class_name: name.clone(),
            parent: parent.clone(),
        });
        let mut class = ClassInfo {
            name,
            short_name,
            namespace: self.names.namespace.clone(),
            kind,
            modifiers,
            doc_comment: doc,
            file: self.file.clone(),
            start_line,
            end_line: start_line,
            parent,
            interfaces,
            traits: Vec::new(),
            constants: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            names: self.names.clone(),
        };
        self.parse_class_body(&mut class, &scope);
        self.classes.push(class);
    }

    fn parse_name_list(&mut self) -> Vec<String> {
        let mut list = Vec::new();
        while let Some(tok) = self.peek().cloned() {
            if tok.is(",") {
                self.pos += 1;
            } else if tok.kind == TokenKind::Name
                && !tok.is_keyword("implements")
                && !tok.is_keyword("extends")
            {
                list.push(self.names.resolve_class(&tok.text));
                self.pos += 1;
            } else {
                break;
            }
        }
        list
    }

    fn parse_class_body(&mut self, class: &mut ClassInfo, scope: &Rc<Scope>) {
        self.pos += 1;
        let mut pending = Pending::new();
        while let Some(tok) = self.peek().cloned() {
            let mut declared = true;
            match tok.kind {
                TokenKind::DocComment => {
                    pending.doc = Some(tok.text);
                    self.pos += 1;
                    declared = false;
                }
                TokenKind::Punct if tok.text == "}" => {
                    class.end_line = tok.line;
                    self.pos += 1;
                    return;
                }
                TokenKind::Punct if tok.text == "#[" => {
                    let attributes = self.parse_attribute();
                    pending.attributes.extend(attributes);
                    declared = false;
                }
                TokenKind::Name => {
                    let modifier = match tok.text.to_ascii_lowercase().as_str() {
                        "public" | "var" => Some(Modifiers::PUBLIC),
                        "protected" => Some(Modifiers::PROTECTED),
                        "private" => Some(Modifiers::PRIVATE),
                        "static" => Some(Modifiers::STATIC),
                        "abstract" => Some(Modifiers::ABSTRACT),
                        "final" => Some(Modifiers::FINAL),
                        "readonly" => Some(Modifiers::READONLY),
                        _ => None,
                    };
                    if let Some(modifier) = modifier {
                        pending.modifiers |= modifier;
                        self.pos += 1;
                        declared = false;
                    } else if tok.is_keyword("use") {
                        self.parse_trait_use(class);
                    } else if tok.is_keyword("case") {
                        self.skip_past(";");
                    } else if tok.is_keyword("const") {
                        self.parse_constants(class, &pending, scope);
                    } else if tok.is_keyword("function") {
                        self.parse_method(class, &pending, scope);
                    } else {
                        self.parse_properties(class, &pending, scope);
                    }
                }
                TokenKind::Variable => self.parse_properties(class, &pending, scope),
                TokenKind::Punct if tok.text == "?" || tok.text == "(" => {
                    self.parse_properties(class, &pending, scope)
                }
                _ => self.pos += 1,
            }
            if declared {
                pending = Pending::new();
            }
        }
    }

    fn parse_trait_use(&mut self, class: &mut ClassInfo) {
        self.pos += 1;
        while let Some(tok) = self.peek().cloned() {
            if tok.is(";") {
                self.pos += 1;
                return;
            }
            if tok.is("{") {
                self.skip_block();
                return;
            }
            if tok.kind == TokenKind::Name {
                class.traits.push(self.names.resolve_class(&tok.text));
            }
            self.pos += 1;
        }
    }

    // -- Members -------------------------------------------------------------

    fn parse_constants(&mut self, class: &mut ClassInfo, pending: &Pending, scope: &Rc<Scope>) {
        self.pos += 1;
        let visibility = Some(pending.modifiers.visibility()).filter(|v| !v.is_empty());
        loop {
            let mut name_tok: Option<Token> = None;
            while let Some(tok) = self.peek().cloned() {
                if tok.is("=") || tok.is(";") || tok.is("}") {
                    break;
                }
                if tok.kind == TokenKind::Name {
                    name_tok = Some(tok);
                }
                self.pos += 1;
            }
            if !self.eat("=") {
                self.eat(";");
                return;
            }
            let end = self.expr_end(&[",", ";"]);
            let value = self.make_expr(self.pos, end, scope).unwrap_or_else(|| ConstExpr {
                raw: String::new(),
                tokens: Vec::new(),
                scope: Some(Rc::clone(scope)),
            });
            self.pos = end;
            if let Some(name_tok) = name_tok {
                class.constants.push(ConstantInfo {
                    name: name_tok.text,
                    visibility,
                    modifiers: pending.modifiers & Modifiers::FINAL,
                    doc_comment: pending.doc.clone(),
                    value,
                    line: name_tok.line,
                    declaring_class: class.name.clone(),
                    file: self.file.clone(),
                });
            }
            if !self.eat(",") {
                self.eat(";");
                return;
            }
        }
    }

    fn parse_properties(&mut self, class: &mut ClassInfo, pending: &Pending, scope: &Rc<Scope>) {
        let type_start = self.pos;
        while let Some(tok) = self.peek() {
            if tok.kind == TokenKind::Variable || tok.is(";") || tok.is("}") {
                break;
            }
            self.pos += 1;
        }
        let type_ = self.parse_type(type_start, self.pos);
        let mut modifiers = pending.modifiers;
        if modifiers.visibility().is_empty() {
            modifiers |= Modifiers::PUBLIC;
        }
        loop {
            let Some(var) = self
                .peek()
                .filter(|t| t.kind == TokenKind::Variable)
                .cloned()
            else {
                self.eat(";");
                return;
            };
            self.pos += 1;
            let mut default = None;
            if self.eat("=") {
                let end = self.expr_end(&[",", ";", "{"]);
                default = self.make_expr(self.pos, end, scope);
                self.pos = end;
            }
            class.properties.push(PropertyInfo {
                name: var.text.trim_start_matches('$').to_string(),
                modifiers,
                type_: type_.clone(),
                default,
                doc_comment: pending.doc.clone(),
                promoted: false,
                line: var.line,
                declaring_class: class.name.clone(),
                file: self.file.clone(),
            });
            if self.eat(",") {
                continue;
            }
            if self.peek().is_some_and(|t| t.is("{")) {
                self.skip_block();
            } else {
                self.eat(";");
            }
            return;
        }
    }

    fn parse_method(&mut self, class: &mut ClassInfo, pending: &Pending, scope: &Rc<Scope>) {
        let function_line = self.peek().map_or(0, |t| t.line);
        self.pos += 1;
        self.eat("&");
        let Some(name_tok) = self.next() else { return };

        let mut modifiers = pending.modifiers;
        if modifiers.visibility().is_empty() {
            modifiers |= Modifiers::PUBLIC;
        }
        if class.kind == ClassKind::Interface {
            modifiers |= Modifiers::ABSTRACT;
        }

        let params = if self.eat("(") {
            self.parse_params(class, scope)
        } else {
            Vec::new()
        };

        let mut return_type = None;
        if self.eat(":") {
            let start = self.pos;
            while let Some(tok) = self.peek() {
                if tok.is("{") || tok.is(";") {
                    break;
                }
                self.pos += 1;
            }
            return_type = self.parse_type(start, self.pos);
        }

        let (start_line, end_line) = match self.peek().cloned() {
            Some(tok) if tok.is("{") => {
                let end = self.skip_block();
                (tok.line, end)
            }
            Some(tok) if tok.is(";") => {
                self.pos += 1;
                (tok.line, tok.line)
            }
            _ => (function_line, function_line),
        };

        class.methods.push(MethodInfo {
            name: name_tok.text,
            modifiers,
            doc_comment: pending.doc.clone(),
            attributes: pending.attributes.clone(),
            params,
            return_type,
            function_line,
            start_line,
            end_line,
            declaring_class: class.name.clone(),
            file: self.file.clone(),
        });
    }

    /// Parse a parameter list after its `(`; promoted parameters are also
    /// recorded as properties of `class`.
    fn parse_params(&mut self, class: &mut ClassInfo, scope: &Rc<Scope>) -> Vec<ParamInfo> {
        let mut params = Vec::new();
        loop {
            if self.peek().is_none() || self.eat(")") {
                break;
            }
            let mut promoted = Modifiers::empty();
            while let Some(tok) = self.peek().cloned() {
                if tok.is("#[") {
                    self.parse_attribute();
                    continue;
                }
                let modifier = if tok.kind == TokenKind::DocComment {
                    Some(Modifiers::empty())
                } else if tok.kind == TokenKind::Name {
                    match tok.text.to_ascii_lowercase().as_str() {
                        "public" => Some(Modifiers::PUBLIC),
                        "protected" => Some(Modifiers::PROTECTED),
                        "private" => Some(Modifiers::PRIVATE),
                        "readonly" => Some(Modifiers::READONLY),
                        _ => None,
                    }
                } else {
                    None
                };
                let Some(modifier) = modifier else { break };
                promoted |= modifier;
                self.pos += 1;
            }

            let type_start = self.pos;
            let mut depth = 0usize;
            while let Some(tok) = self.peek() {
                if tok.kind == TokenKind::Variable || tok.is("...") {
                    break;
                }
                if tok.is("(") {
                    depth += 1;
                } else if tok.is(")") {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                } else if tok.is(",") && depth == 0 {
                    break;
                }
                let by_ref_marker = tok.is("&")
                    && self
                        .peek_at(1)
                        .is_some_and(|n| n.kind == TokenKind::Variable || n.is("..."));
                if by_ref_marker {
                    break;
                }
                self.pos += 1;
            }
            let type_ = self.parse_type(type_start, self.pos);
            let by_ref = self.eat("&");
            let variadic = self.eat("...");

            let Some(var) = self
                .peek()
                .filter(|t| t.kind == TokenKind::Variable)
                .cloned()
            else {
                let end = self.expr_end(&[",", ")"]);
                self.pos = end;
                self.eat(",");
                continue;
            };
            self.pos += 1;

            let mut default = None;
            if self.eat("=") {
                let end = self.expr_end(&[",", ")"]);
                default = self.make_expr(self.pos, end, scope);
                self.pos = end;
            }
            if self.peek().is_some_and(|t| t.is("{")) {
                self.skip_block();
            }

            let name = var.text.trim_start_matches('$').to_string();
            if !promoted.is_empty() {
                let mut modifiers = promoted;
                if modifiers.visibility().is_empty() {
                    modifiers |= Modifiers::PUBLIC;
                }
                class.properties.push(PropertyInfo {
                    name: name.clone(),
                    modifiers,
                    type_: type_.clone(),
                    default: None,
                    doc_comment: None,
                    promoted: true,
                    line: var.line,
                    declaring_class: class.name.clone(),
                    file: self.file.clone(),
                });
            }
            params.push(ParamInfo {
                name,
                type_,
                default,
                variadic,
                by_ref,
            });
            self.eat(",");
        }
        params
    }

    // -- Expressions and types -----------------------------------------------

    /// Index of the first `stops` token at nesting depth zero.
    fn expr_end(&self, stops: &[&str]) -> usize {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(tok) = self.tokens.get(i) {
            if depth == 0 && tok.kind == TokenKind::Punct && stops.contains(&tok.text.as_str()) {
                break;
            }
            if tok.is("(") || tok.is("[") || tok.is("{") || tok.is("#[") {
                depth += 1;
            } else if tok.is(")") || tok.is("]") || tok.is("}") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            i += 1;
        }
        i
    }

    fn make_expr(&self, from: usize, to: usize, scope: &Rc<Scope>) -> Option<ConstExpr> {
        let tokens: Vec<Token> = self.tokens[from..to]
            .iter()
            .filter(|t| t.kind != TokenKind::DocComment)
            .cloned()
            .collect();
        let (first, last) = (tokens.first()?, tokens.last()?);
        let raw = self.src[first.start..last.end].to_string();
        Some(ConstExpr {
            raw,
            tokens,
            scope: Some(Rc::clone(scope)),
        })
    }

    fn parse_type(&self, from: usize, to: usize) -> Option<ReflectedType> {
        let tokens: Vec<&Token> = self.tokens[from..to]
            .iter()
            .filter(|t| t.kind != TokenKind::DocComment)
            .collect();
        if tokens.is_empty() {
            return None;
        }
        let mut i = 0;
        self.type_union(&tokens, &mut i)
    }

    fn type_union(&self, tokens: &[&Token], i: &mut usize) -> Option<ReflectedType> {
        let mut parts = vec![self.type_intersection(tokens, i)?];
        while tokens.get(*i).is_some_and(|t| t.is("|")) {
            *i += 1;
            parts.push(self.type_intersection(tokens, i)?);
        }
        Some(if parts.len() == 1 {
            parts.remove(0)
        } else {
            ReflectedType::Union(parts)
        })
    }

    fn type_intersection(&self, tokens: &[&Token], i: &mut usize) -> Option<ReflectedType> {
        let mut parts = vec![self.type_atom(tokens, i)?];
        while tokens.get(*i).is_some_and(|t| t.is("&")) {
            *i += 1;
            parts.push(self.type_atom(tokens, i)?);
        }
        Some(if parts.len() == 1 {
            parts.remove(0)
        } else {
            ReflectedType::Intersection(parts)
        })
    }

    fn type_atom(&self, tokens: &[&Token], i: &mut usize) -> Option<ReflectedType> {
        let tok = tokens.get(*i)?;
        *i += 1;
        if tok.is("?") {
            return match self.type_atom(tokens, i)? {
                ReflectedType::Named { name, .. } => Some(ReflectedType::Named {
                    name,
                    nullable: true,
                }),
                other => Some(other),
            };
        }
        if tok.is("(") {
            let inner = self.type_union(tokens, i)?;
            if tokens.get(*i).is_some_and(|t| t.is(")")) {
                *i += 1;
            }
            return Some(inner);
        }
        if tok.kind == TokenKind::Name {
            return Some(ReflectedType::Named {
                name: self.names.resolve_type(&tok.text),
                nullable: false,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<ClassInfo> {
        parse_source(src, Some(Path::new("/virtual/Test.php"))).unwrap()
    }

    fn single(src: &str) -> ClassInfo {
        let mut classes = parse(src);
        assert_eq!(classes.len(), 1, "expected one class");
        classes.remove(0)
    }

    #[test]
    fn parse_namespaced_class_header() {
        let class = single(
            "<?php\nnamespace Acme\\Shop;\n\nuse Acme\\Core\\Model as BaseModel;\nuse Acme\\Contracts\\{Sellable, Taxable};\n\n/** A product. */\nfinal class Product extends BaseModel implements Sellable, Taxable\n{\n}\n",
        );
        assert_eq!(class.name, "Acme\\Shop\\Product");
        assert_eq!(class.short_name, "Product");
        assert_eq!(class.namespace, "Acme\\Shop");
        assert_eq!(class.parent.as_deref(), Some("Acme\\Core\\Model"));
        assert_eq!(
            class.interfaces,
            vec!["Acme\\Contracts\\Sellable", "Acme\\Contracts\\Taxable"]
        );
        assert!(class.modifiers.contains(Modifiers::FINAL));
        assert_eq!(class.doc_comment.as_deref(), Some("/** A product. */"));
        assert_eq!(class.start_line, 8);
        assert_eq!(class.end_line, 10);
    }

    #[test]
    fn parse_constants_with_visibility() {
        let class = single(
            "<?php class C {\n    const A = 1, B = 'two';\n    protected const C = [1, 2];\n    final public const string D = self::A;\n}",
        );
        let names: Vec<&str> = class.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(class.constants[0].visibility, None);
        assert_eq!(class.constants[1].value.raw, "'two'");
        assert_eq!(class.constants[2].visibility, Some(Modifiers::PROTECTED));
        assert_eq!(class.constants[2].value.raw, "[1, 2]");
        assert_eq!(class.constants[3].visibility, Some(Modifiers::PUBLIC));
        assert!(class.constants[3].modifiers.contains(Modifiers::FINAL));
        assert_eq!(class.constants[3].line, 4);
    }

    #[test]
    fn parse_properties_with_types_and_defaults() {
        let class = single(
            "<?php class C {\n  /** Doc */\n  public ?int $count = 0;\n  protected static $items = [], $other;\n  private readonly string $name;\n  var $legacy;\n}",
        );
        let count = &class.properties[0];
        assert_eq!(count.name, "count");
        assert_eq!(
            count.type_,
            Some(ReflectedType::Named {
                name: "int".into(),
                nullable: true
            })
        );
        assert_eq!(count.default.as_ref().unwrap().raw, "0");
        assert_eq!(count.doc_comment.as_deref(), Some("/** Doc */"));

        let items = &class.properties[1];
        assert_eq!(items.modifiers, Modifiers::PROTECTED | Modifiers::STATIC);
        assert_eq!(items.default.as_ref().unwrap().raw, "[]");
        let other = &class.properties[2];
        assert_eq!(other.name, "other");
        assert!(other.default.is_none());
        assert_eq!(other.doc_comment, None);

        let name = &class.properties[3];
        assert_eq!(name.modifiers, Modifiers::PRIVATE | Modifiers::READONLY);
        assert_eq!(class.properties[4].modifiers, Modifiers::PUBLIC);
    }

    #[test]
    fn parse_method_lines_and_signature() {
        let class = single(
            "<?php\nclass C\n{\n    /**\n     * Doc.\n     */\n    public static function make(\n        array $options,\n        int $limit = 0\n    ): static\n    {\n        return new static();\n    }\n}\n",
        );
        let method = &class.methods[0];
        assert_eq!(method.name, "make");
        assert_eq!(method.modifiers, Modifiers::PUBLIC | Modifiers::STATIC);
        assert_eq!(method.function_line, 7);
        assert_eq!(method.start_line, 11);
        assert_eq!(method.end_line, 13);
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.params[0].type_, Some(ReflectedType::named("array")));
        assert_eq!(method.params[1].default.as_ref().unwrap().raw, "0");
        assert_eq!(method.return_type, Some(ReflectedType::named("static")));
    }

    #[test]
    fn parse_abstract_and_interface_methods() {
        let classes = parse(
            "<?php\ninterface I { function a(): void; }\nabstract class A { abstract protected function b(); }\n",
        );
        let a = &classes[0].methods[0];
        assert_eq!(a.modifiers, Modifiers::PUBLIC | Modifiers::ABSTRACT);
        assert_eq!(a.start_line, 2);
        assert_eq!(a.end_line, 2);
        let b = &classes[1].methods[0];
        assert_eq!(b.modifiers, Modifiers::PROTECTED | Modifiers::ABSTRACT);
    }

    #[test]
    fn parse_parameter_markers() {
        let class = single(
            "<?php class C { function f(Foo&Bar $both, ?string &$ref = null, int|string ...$rest) {} }",
        );
        let params = &class.methods[0].params;
        assert_eq!(
            params[0].type_,
            Some(ReflectedType::Intersection(vec![
                ReflectedType::named("Foo"),
                ReflectedType::named("Bar"),
            ]))
        );
        assert!(params[1].by_ref);
        assert_eq!(params[1].default.as_ref().unwrap().raw, "null");
        assert!(params[2].variadic);
        assert_eq!(
            params[2].type_,
            Some(ReflectedType::Union(vec![
                ReflectedType::named("int"),
                ReflectedType::named("string"),
            ]))
        );
    }

    #[test]
    fn parse_dnf_type() {
        let class = single("<?php class C { function f((A&B)|null $x) {} }");
        assert_eq!(
            class.methods[0].params[0].type_,
            Some(ReflectedType::Union(vec![
                ReflectedType::Intersection(vec![
                    ReflectedType::named("A"),
                    ReflectedType::named("B"),
                ]),
                ReflectedType::named("null"),
            ]))
        );
    }

    #[test]
    fn dnf_parameter_keeps_following_members() {
        let class = single(
            "<?php class C {\n    function f((A&B)|null $x, int $y): void { return; }\n    function g(): int { return 1; }\n    const K = 1;\n}",
        );
        let methods: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["f", "g"]);
        let names: Vec<&str> = class.methods[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(class.methods[0].return_type, Some(ReflectedType::named("void")));
        assert_eq!(class.methods[0].start_line, 2);
        assert_eq!(class.constants[0].name, "K");
    }

    #[test]
    fn parse_promoted_constructor_parameters() {
        let class = single(
            "<?php class C { public function __construct(private readonly int $id, public string $name = 'x', $plain = 1) {} }",
        );
        let props: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["id", "name"]);
        assert!(class.properties.iter().all(|p| p.promoted && p.default.is_none()));
        assert_eq!(
            class.properties[0].modifiers,
            Modifiers::PRIVATE | Modifiers::READONLY
        );
        assert_eq!(class.methods[0].params.len(), 3);
    }

    #[test]
    fn skips_function_bodies_and_anonymous_classes() {
        let classes = parse(
            "<?php\nfunction helper() { $x = new class { public function inner() {} }; return Foo::class; }\nclass Real { public function outer() { if (true) { return; } } }\n",
        );
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Real");
        assert_eq!(classes[0].methods.len(), 1);
    }

    #[test]
    fn parse_traits_enums_and_trait_use() {
        let classes = parse(
            "<?php namespace N;\ntrait T { public function t() {} }\nenum Suit: string { case Hearts = 'H'; const WILD = self::Hearts; public function label(): string { return 'x'; } }\nclass U { use T { t as protected aliasT; } }\n",
        );
        assert_eq!(classes[0].kind, ClassKind::Trait);
        assert_eq!(classes[1].kind, ClassKind::Enum);
        assert_eq!(classes[1].constants.len(), 1);
        assert_eq!(classes[1].methods[0].name, "label");
        assert_eq!(classes[2].traits, vec!["N\\T"]);
    }

    #[test]
    fn braced_namespaces() {
        let classes = parse(
            "<?php namespace One { class A {} }\nnamespace Two { use One\\A; class B extends A {} }",
        );
        assert_eq!(classes[0].name, "One\\A");
        assert_eq!(classes[1].name, "Two\\B");
        assert_eq!(classes[1].parent.as_deref(), Some("One\\A"));
    }

    #[test]
    fn attributes_are_collected_for_methods() {
        let class = single(
            "<?php use Some\\Attr; class C { #[Attr(1), \\Deprecated(since: '2.0')]\n public function old() {} }",
        );
        assert_eq!(class.methods[0].attributes, vec!["Some\\Attr", "Deprecated"]);
    }

    #[test]
    fn property_hooks_are_skipped() {
        let class = single(
            "<?php class C { public string $full { get => $this->a . $this->b; } public int $next = 1; }",
        );
        let props: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["full", "next"]);
    }
}
