//! Documentation model produced by extraction and consumed by renderers.

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

use crate::types::Type;

bitflags! {
    /// Modifier bits, numbered like PHP's reflection `IS_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const PUBLIC = 1;
        const PROTECTED = 2;
        const PRIVATE = 4;
        const STATIC = 16;
        const FINAL = 32;
        const ABSTRACT = 64;
        const READONLY = 128;
    }
}

impl Modifiers {
    pub const VISIBILITY: Self = Self::PUBLIC.union(Self::PROTECTED).union(Self::PRIVATE);

    /// Bit for a modifier name accepted in `allowedModifiers`.
    pub fn from_keyword(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::PUBLIC),
            "protected" => Some(Self::PROTECTED),
            "private" => Some(Self::PRIVATE),
            "static" => Some(Self::STATIC),
            "final" => Some(Self::FINAL),
            "abstract" => Some(Self::ABSTRACT),
            _ => None,
        }
    }

    /// OR of the named bits; unknown names are ignored.
    pub fn sum_of<S: AsRef<str>>(names: &[S]) -> Self {
        names
            .iter()
            .filter_map(|n| Self::from_keyword(n.as_ref()))
            .fold(Self::empty(), |acc, bit| acc | bit)
    }

    pub fn visibility(self) -> Self {
        self & Self::VISIBILITY
    }
}

/// A single modifier keyword attached to a component or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Readonly,
    Final,
    Abstract,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Readonly => "readonly",
            Self::Final => "final",
            Self::Abstract => "abstract",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Class,
    Interface,
}

/// The documented class or interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub kind: ComponentKind,
    pub namespace: String,
    pub short_name: String,
    pub modifiers: Vec<Modifier>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Constant,
    Property,
    Method,
}

/// Capabilities shared by every member record.
pub trait Member {
    fn name(&self) -> &str;
    fn kind(&self) -> MemberKind;
    fn modifiers(&self) -> &[Modifier];
    fn description(&self) -> &str;
    fn source_excerpt(&self) -> &str;
    /// 1-based line the declaration starts on, when it could be located.
    fn line(&self) -> Option<usize>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantMember {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub description: String,
    pub source_excerpt: String,
    pub line: Option<usize>,
    pub value_literal: String,
    pub value_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMember {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub description: String,
    pub source_excerpt: String,
    pub line: Option<usize>,
    pub default_value_literal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodMember {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub description: String,
    pub source_excerpt: String,
    pub line: Option<usize>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Type>,
    pub return_description: String,
    pub signature_parameters: String,
}

impl Member for ConstantMember {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> MemberKind {
        MemberKind::Constant
    }
    fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn source_excerpt(&self) -> &str {
        &self.source_excerpt
    }
    fn line(&self) -> Option<usize> {
        self.line
    }
}

impl Member for PropertyMember {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> MemberKind {
        MemberKind::Property
    }
    fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn source_excerpt(&self) -> &str {
        &self.source_excerpt
    }
    fn line(&self) -> Option<usize> {
        self.line
    }
}

impl Member for MethodMember {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> MemberKind {
        MemberKind::Method
    }
    fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn source_excerpt(&self) -> &str {
        &self.source_excerpt
    }
    fn line(&self) -> Option<usize> {
        self.line
    }
}

/// A documented method parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub type_: Type,
    /// Parameter name including the `$` sigil.
    pub name: String,
    pub description: String,
    pub default_literal: Option<String>,
    pub is_variadic: bool,
    pub is_by_reference: bool,
}

impl Parameter {
    pub fn is_optional(&self) -> bool {
        self.default_literal.is_some() || self.is_variadic
    }

    /// `type ...&$name = default` as written in a method signature.
    pub fn signature(&self) -> String {
        let mut out = format!("{} ", self.type_);
        if self.is_variadic {
            out.push_str("...");
        }
        if self.is_by_reference {
            out.push('&');
        }
        out.push_str(&self.name);
        if let Some(default) = &self.default_literal {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// Output switches carried alongside the extracted records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub include_class_comment: bool,
    pub include_member_comment: bool,
    pub include_method_parameters: bool,
    pub with_code: bool,
    pub noindex_in_class: bool,
    pub noindex_in_class_members: bool,
    /// Link to the class source file, already joined with the class path.
    pub github_link: Option<String>,
}

/// Everything extracted for one class under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub component: Component,
    pub constants: Vec<ConstantMember>,
    pub properties: Vec<PropertyMember>,
    pub methods: Vec<MethodMember>,
    pub settings: RenderSettings,
}
