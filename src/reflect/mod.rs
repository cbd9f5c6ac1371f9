//! Static class reflection.
//!
//! PHP sources are tokenized and scanned for class-like declarations; the
//! resulting [`ClassIndex`] answers the questions the extractors would
//! otherwise ask a runtime reflection API. A [`Reflector`] layers inheritance
//! on top of the index and memoizes the flattened view per class.

pub mod eval;
pub mod lexer;
pub mod names;
pub mod parser;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Modifiers;
use crate::types::ClassLookup;
use crate::value::Value;

use self::eval::ConstantLookup;
use self::lexer::{LexError, Token, TokenKind};
use self::names::NameContext;

/// Inheritance chains deeper than this are not followed.
const MAX_INHERITANCE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// A declared type as written in the source, with class names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectedType {
    Named { name: String, nullable: bool },
    Union(Vec<ReflectedType>),
    Intersection(Vec<ReflectedType>),
}

impl ReflectedType {
    pub fn named(name: &str) -> Self {
        Self::Named {
            name: name.to_string(),
            nullable: false,
        }
    }
}

/// Where a constant expression was written: its imports and enclosing class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub names: NameContext,
    pub class_name: String,
    pub parent: Option<String>,
}

/// An unevaluated initializer expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstExpr {
    pub raw: String,
    pub tokens: Vec<Token>,
    pub scope: Option<Rc<Scope>>,
}

impl ConstExpr {
    /// Wrap a standalone code fragment evaluated outside any class.
    pub fn from_code(code: &str) -> std::result::Result<Self, LexError> {
        let tokens = lexer::tokenize_code(code)?
            .into_iter()
            .filter(|t| !t.is_trivia() && t.kind != TokenKind::DocComment)
            .collect();
        Ok(Self {
            raw: code.trim().to_string(),
            tokens,
            scope: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantInfo {
    pub name: String,
    /// Visibility keyword written on the declaration, if any.
    pub visibility: Option<Modifiers>,
    pub modifiers: Modifiers,
    pub doc_comment: Option<String>,
    pub value: ConstExpr,
    pub line: usize,
    pub declaring_class: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_: Option<ReflectedType>,
    pub default: Option<ConstExpr>,
    pub doc_comment: Option<String>,
    /// Declared through constructor promotion.
    pub promoted: bool,
    pub line: usize,
    pub declaring_class: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub type_: Option<ReflectedType>,
    pub default: Option<ConstExpr>,
    pub variadic: bool,
    pub by_ref: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub modifiers: Modifiers,
    pub doc_comment: Option<String>,
    /// Resolved attribute class names.
    pub attributes: Vec<String>,
    pub params: Vec<ParamInfo>,
    pub return_type: Option<ReflectedType>,
    /// Line of the `function` keyword.
    pub function_line: usize,
    /// Line of the opening `{`, or of the `;` for body-less methods.
    pub start_line: usize,
    pub end_line: usize,
    pub declaring_class: String,
    pub file: Option<PathBuf>,
}

impl MethodInfo {
    pub fn has_deprecated_attribute(&self) -> bool {
        self.attributes.iter().any(|a| {
            a.rsplit('\\')
                .next()
                .is_some_and(|short| short.eq_ignore_ascii_case("Deprecated"))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    /// Fully qualified name without a leading `\`.
    pub name: String,
    pub short_name: String,
    pub namespace: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub doc_comment: Option<String>,
    pub file: Option<PathBuf>,
    pub start_line: usize,
    pub end_line: usize,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub traits: Vec<String>,
    pub constants: Vec<ConstantInfo>,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
    pub names: NameContext,
}

/// Every class-like declaration found in the indexed sources.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: Vec<ClassInfo>,
    by_name: HashMap<String, usize>,
}

fn index_key(name: &str) -> String {
    name.trim().trim_start_matches('\\').to_ascii_lowercase()
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every readable file; failures are logged and skipped.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut index = Self::new();
        for path in paths {
            if let Err(e) = index.add_file(path.as_ref()) {
                warn!("skipping {}: {e}", path.as_ref().display());
            }
        }
        index
    }

    pub fn add_file(&mut self, path: &Path) -> Result<usize> {
        let src = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.add_source(&src, Some(path))
    }

    /// Index declarations from source text, attributing them to `file`.
    pub fn add_source(&mut self, src: &str, file: Option<&Path>) -> Result<usize> {
        let classes = parser::parse_source(src, file).map_err(|e| Error::Parse {
            source_name: file.map_or_else(|| "<source>".to_string(), |p| p.display().to_string()),
            line: e.line,
            message: e.message,
        })?;
        let mut added = 0;
        for class in classes {
            let key = index_key(&class.name);
            if self.by_name.contains_key(&key) {
                warn!("duplicate declaration of {} ignored", class.name);
                continue;
            }
            debug!("indexed {}", class.name);
            self.by_name.insert(key, self.classes.len());
            self.classes.push(class);
            added += 1;
        }
        Ok(added)
    }

    /// Case-insensitive lookup by (optionally `\`-prefixed) class name.
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.by_name
            .get(&index_key(name))
            .map(|&i| &self.classes[i])
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes declared in `namespace` or below it, sorted by name.
    pub fn classes_in_namespace(&self, namespace: &str) -> Vec<&ClassInfo> {
        let prefix = format!("{}\\", index_key(namespace).trim_end_matches('\\'));
        let mut found: Vec<&ClassInfo> = self
            .classes
            .iter()
            .filter(|c| c.name.to_ascii_lowercase().starts_with(&prefix))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

impl ClassLookup for ClassIndex {
    fn canonical_class_name(&self, name: &str) -> Option<String> {
        self.get(name).map(|c| c.name.clone())
    }
}

/// A class with inherited members merged in, as reflection reports it.
#[derive(Debug, Clone)]
pub struct ReflectedClass {
    info: ClassInfo,
    constants: Vec<ConstantInfo>,
    properties: Vec<PropertyInfo>,
    methods: Vec<MethodInfo>,
}

impl ReflectedClass {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn short_name(&self) -> &str {
        &self.info.short_name
    }

    pub fn namespace_name(&self) -> &str {
        &self.info.namespace
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.info.doc_comment.as_deref()
    }

    pub fn is_interface(&self) -> bool {
        self.info.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.info.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn names(&self) -> &NameContext {
        &self.info.names
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn constants(&self) -> &[ConstantInfo] {
        &self.constants
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.constant(name).is_some()
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantInfo> {
        self.constants.iter().find(|c| c.name == name)
    }

    fn merge_methods(&mut self, inherited: &[MethodInfo]) {
        for method in inherited {
            if !self.has_method(&method.name) {
                self.methods.push(method.clone());
            }
        }
    }

    fn merge_properties(&mut self, inherited: &[PropertyInfo], include_private: bool) {
        for property in inherited {
            if !include_private && property.modifiers.contains(Modifiers::PRIVATE) {
                continue;
            }
            if !self.has_property(&property.name) {
                self.properties.push(property.clone());
            }
        }
    }

    fn merge_constants(&mut self, inherited: &[ConstantInfo], include_private: bool) {
        for constant in inherited {
            if !include_private && constant.visibility == Some(Modifiers::PRIVATE) {
                continue;
            }
            if !self.has_constant(&constant.name) {
                self.constants.push(constant.clone());
            }
        }
    }
}

/// Reflection session over an index, memoizing flattened classes.
pub struct Reflector<'a> {
    index: &'a ClassIndex,
    cache: RefCell<HashMap<String, Rc<ReflectedClass>>>,
}

impl<'a> Reflector<'a> {
    pub fn new(index: &'a ClassIndex) -> Self {
        Self {
            index,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn index(&self) -> &'a ClassIndex {
        self.index
    }

    pub fn reflect(&self, name: &str) -> Option<Rc<ReflectedClass>> {
        self.reflect_at(name, 0)
    }

    fn reflect_at(&self, name: &str, depth: usize) -> Option<Rc<ReflectedClass>> {
        let key = index_key(name);
        let cached = self.cache.borrow().get(&key).cloned();
        if let Some(hit) = cached {
            return Some(hit);
        }
        let info = self.index.get(name)?;
        let mut class = ReflectedClass {
            info: info.clone(),
            constants: info.constants.clone(),
            properties: info.properties.clone(),
            methods: info.methods.clone(),
        };
        if depth >= MAX_INHERITANCE_DEPTH {
            warn!("inheritance of {} is too deep, stopping", info.name);
            return Some(Rc::new(class));
        }
        for trait_name in &info.traits {
            if let Some(used) = self.reflect_at(trait_name, depth + 1) {
                class.merge_methods(&used.methods);
                class.merge_properties(&used.properties, true);
                class.merge_constants(&used.constants, true);
            }
        }
        if let Some(parent) = info
            .parent
            .as_deref()
            .and_then(|p| self.reflect_at(p, depth + 1))
        {
            class.merge_methods(&parent.methods);
            class.merge_properties(&parent.properties, false);
            class.merge_constants(&parent.constants, false);
        }
        for interface in &info.interfaces {
            if let Some(iface) = self.reflect_at(interface, depth + 1) {
                class.merge_methods(&iface.methods);
                class.merge_constants(&iface.constants, false);
            }
        }
        let class = Rc::new(class);
        self.cache.borrow_mut().insert(key, Rc::clone(&class));
        Some(class)
    }
}

impl ConstantLookup for Reflector<'_> {
    fn class_constant(&self, class: &str, name: &str, depth: usize) -> Option<Value> {
        let reflected = self.reflect(class)?;
        let constant = reflected.constant(name)?;
        Some(eval::evaluate(&constant.value, self, depth))
    }
}
