//! Type model and resolution of declared and documented types.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::reflect::names::{is_builtin_type, NameContext};
use crate::reflect::ReflectedType;

/// A resolved type, rendered as a single PHP type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Named(String),
    Nullable(Box<Type>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
}

impl Type {
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    pub fn mixed() -> Self {
        Self::named("mixed")
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Named(name) if name.eq_ignore_ascii_case("void"))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Nullable(inner) => write!(f, "?{inner}"),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match member {
                        Self::Intersection(_) => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                Ok(())
            }
            Self::Intersection(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Source of canonical class names for type resolution.
pub trait ClassLookup {
    /// Declared name of a known class or interface, without a leading `\`.
    fn canonical_class_name(&self, name: &str) -> Option<String>;
}

pub struct TypeResolver<'a> {
    lookup: &'a dyn ClassLookup,
}

impl<'a> TypeResolver<'a> {
    pub fn new(lookup: &'a dyn ClassLookup) -> Self {
        Self { lookup }
    }

    /// Resolve a declared type; no declaration at all means `mixed`.
    pub fn resolve(&self, reflected: Option<&ReflectedType>) -> Type {
        match reflected {
            Some(ty) => self.resolve_reflected(ty),
            None => Type::mixed(),
        }
    }

    /// Resolve a declared return type; `void` and undeclared yield `None`.
    pub fn resolve_return(&self, reflected: Option<&ReflectedType>) -> Option<Type> {
        let ty = self.resolve_reflected(reflected?);
        (!ty.is_void()).then_some(ty)
    }

    /// Resolve a parameter type. The `?` marker is applied to an explicitly
    /// nullable named type and to a typed parameter defaulting to `null`,
    /// never to `mixed`, `null` or composite types.
    pub fn resolve_parameter(&self, reflected: Option<&ReflectedType>, defaults_to_null: bool) -> Type {
        match reflected {
            Some(ReflectedType::Named { name, nullable }) => {
                let named = Type::Named(self.class_or_builtin(name));
                let markable = name != "mixed" && name != "null";
                if markable && (*nullable || defaults_to_null) {
                    Type::Nullable(Box::new(named))
                } else {
                    named
                }
            }
            Some(other) => self.resolve_reflected(other),
            None => Type::mixed(),
        }
    }

    fn resolve_reflected(&self, ty: &ReflectedType) -> Type {
        match ty {
            ReflectedType::Named { name, nullable } => {
                let named = Type::Named(self.class_or_builtin(name));
                if *nullable && name != "mixed" && name != "null" {
                    Type::Nullable(Box::new(named))
                } else {
                    named
                }
            }
            ReflectedType::Union(members) => {
                Type::Union(members.iter().map(|m| self.resolve_reflected(m)).collect())
            }
            ReflectedType::Intersection(members) => Type::Intersection(
                members
                    .iter()
                    .map(|m| match m {
                        ReflectedType::Named { name, .. } => Type::Named(self.class_or_builtin(name)),
                        other => self.resolve_reflected(other),
                    })
                    .collect(),
            ),
        }
    }

    /// `\FQCN` for known classes, the name verbatim otherwise.
    fn class_or_builtin(&self, name: &str) -> String {
        if is_builtin_type(name) {
            return name.to_string();
        }
        match self.lookup.canonical_class_name(name) {
            Some(canonical) => format!("\\{canonical}"),
            None => name.to_string(),
        }
    }

    /// Resolve a type written in a doc comment, relative to `names`.
    ///
    /// Known classes become `\FQCN`; everything else (pseudo-types, generics,
    /// unknown names) is kept as written.
    pub fn resolve_doc_type(&self, text: &str, names: &NameContext) -> Type {
        let text = text.trim();
        let unions = split_top_level(text, '|');
        if unions.len() > 1 {
            return Type::Union(unions.iter().map(|p| self.resolve_doc_type(p, names)).collect());
        }
        let intersections = split_top_level(text, '&');
        if intersections.len() > 1 {
            return Type::Intersection(
                intersections
                    .iter()
                    .map(|p| self.resolve_doc_type(p, names))
                    .collect(),
            );
        }
        if let Some(inner) = text.strip_prefix('?') {
            return Type::Nullable(Box::new(self.resolve_doc_type(inner, names)));
        }
        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            return self.resolve_doc_type(inner, names);
        }
        let base_len = text
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\\'))
            .unwrap_or(text.len());
        let (base, suffix) = text.split_at(base_len);
        if base.is_empty() || is_builtin_type(base) {
            return Type::named(text);
        }
        let qualified = names.resolve_class(base);
        match self.lookup.canonical_class_name(&qualified) {
            Some(canonical) => Type::Named(format!("\\{canonical}{suffix}")),
            None => Type::named(text),
        }
    }
}

/// Split on `sep` outside of `<>`, `{}`, `()` and `[]`.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Known(&'static [&'static str]);

    impl ClassLookup for Known {
        fn canonical_class_name(&self, name: &str) -> Option<String> {
            let name = name.trim_start_matches('\\');
            self.0
                .iter()
                .find(|k| k.eq_ignore_ascii_case(name))
                .map(|k| k.to_string())
        }
    }

    static KNOWN: Known = Known(&["MyFirstClass", "Acme\\Model\\User", "Acme\\Model\\Post"]);

    fn named(name: &str) -> ReflectedType {
        ReflectedType::named(name)
    }

    #[test]
    fn known_classes_are_fully_qualified() {
        let resolver = TypeResolver::new(&KNOWN);
        assert_eq!(resolver.resolve(Some(&named("myfirstclass"))).to_string(), "\\MyFirstClass");
        assert_eq!(resolver.resolve(Some(&named("Unknown\\Thing"))).to_string(), "Unknown\\Thing");
        assert_eq!(resolver.resolve(Some(&named("int"))).to_string(), "int");
    }

    #[test]
    fn missing_type_is_mixed() {
        let resolver = TypeResolver::new(&KNOWN);
        assert_eq!(resolver.resolve(None), Type::mixed());
    }

    #[test]
    fn void_return_is_none() {
        let resolver = TypeResolver::new(&KNOWN);
        assert_eq!(resolver.resolve_return(Some(&named("void"))), None);
        assert_eq!(resolver.resolve_return(None), None);
        assert_eq!(
            resolver.resolve_return(Some(&named("MyFirstClass"))),
            Some(Type::named("\\MyFirstClass"))
        );
    }

    #[test]
    fn nullable_union_and_intersection_rendering() {
        let resolver = TypeResolver::new(&KNOWN);
        let nullable = ReflectedType::Named {
            name: "Acme\\Model\\User".into(),
            nullable: true,
        };
        assert_eq!(resolver.resolve(Some(&nullable)).to_string(), "?\\Acme\\Model\\User");
        let union = ReflectedType::Union(vec![named("int"), named("string"), named("null")]);
        assert_eq!(resolver.resolve(Some(&union)).to_string(), "int|string|null");
        let dnf = ReflectedType::Union(vec![
            ReflectedType::Intersection(vec![named("Acme\\Model\\User"), named("Countable")]),
            named("null"),
        ]);
        assert_eq!(
            resolver.resolve(Some(&dnf)).to_string(),
            "(\\Acme\\Model\\User&Countable)|null"
        );
    }

    #[test]
    fn parameter_nullable_marker_rules() {
        let resolver = TypeResolver::new(&KNOWN);
        assert_eq!(resolver.resolve_parameter(Some(&named("int")), true).to_string(), "?int");
        assert_eq!(resolver.resolve_parameter(Some(&named("int")), false).to_string(), "int");
        assert_eq!(resolver.resolve_parameter(Some(&named("mixed")), true).to_string(), "mixed");
        assert_eq!(resolver.resolve_parameter(None, true).to_string(), "mixed");
        let union = ReflectedType::Union(vec![named("int"), named("null")]);
        assert_eq!(resolver.resolve_parameter(Some(&union), true).to_string(), "int|null");
    }

    #[test]
    fn doc_types_resolve_through_imports() {
        let resolver = TypeResolver::new(&KNOWN);
        let mut names = NameContext::new("Acme\\Service");
        names.import("Acme\\Model\\User", None);
        assert_eq!(resolver.resolve_doc_type("User", &names).to_string(), "\\Acme\\Model\\User");
        assert_eq!(resolver.resolve_doc_type("User[]", &names).to_string(), "\\Acme\\Model\\User[]");
        assert_eq!(
            resolver.resolve_doc_type("\\Acme\\Model\\Post|null", &names).to_string(),
            "\\Acme\\Model\\Post|null"
        );
        assert_eq!(
            resolver.resolve_doc_type("array<string, User>", &names).to_string(),
            "array<string, User>"
        );
        assert_eq!(resolver.resolve_doc_type("Missing", &names).to_string(), "Missing");
        assert_eq!(resolver.resolve_doc_type("?string", &names).to_string(), "?string");
    }

    #[test]
    fn split_respects_brackets() {
        assert_eq!(
            split_top_level("array<int|string>|null", '|'),
            vec!["array<int|string>", "null"]
        );
    }

    #[test]
    fn serializes_as_string() {
        let ty = Type::Nullable(Box::new(Type::named("int")));
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"?int\"");
    }
}
