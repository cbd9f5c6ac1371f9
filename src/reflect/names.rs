//! Namespace and import context for resolving class names.

use std::collections::HashMap;

/// Keywords that name built-in types and are never namespaced.
const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "string", "bool", "array", "mixed", "void", "null", "never", "callable",
    "iterable", "object", "self", "static", "parent", "false", "true",
];

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.iter().any(|b| b.eq_ignore_ascii_case(name))
}

/// The namespace and `use` imports in effect at a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    pub namespace: String,
    /// Lower-cased alias to fully qualified name (no leading `\`).
    imports: HashMap<String, String>,
}

impl NameContext {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.trim_matches('\\').to_string(),
            imports: HashMap::new(),
        }
    }

    /// Register `use Name [as Alias]`.
    pub fn import(&mut self, name: &str, alias: Option<&str>) {
        let name = name.trim_start_matches('\\');
        let alias = alias.unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(name));
        self.imports
            .insert(alias.to_ascii_lowercase(), name.to_string());
    }

    /// Resolve a class reference as the PHP compiler would.
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(qualified) = name.strip_prefix('\\') {
            return qualified.to_string();
        }
        if let Some(relative) = name
            .get(..10)
            .filter(|prefix| prefix.eq_ignore_ascii_case("namespace\\"))
            .and_then(|_| name.get(10..))
        {
            return self.qualify(relative);
        }
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(imported) = self.imports.get(&first.to_ascii_lowercase()) {
            return match rest {
                Some(rest) => format!("{imported}\\{rest}"),
                None => imported.clone(),
            };
        }
        self.qualify(name)
    }

    /// Resolve a name in type position; built-in type keywords are lower-cased
    /// and left unqualified.
    pub fn resolve_type(&self, name: &str) -> String {
        if is_builtin_type(name) {
            name.to_ascii_lowercase()
        } else {
            self.resolve_class(name)
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }
}
