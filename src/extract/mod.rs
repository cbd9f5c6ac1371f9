//! Reflection-to-document extraction.
//!
//! An [`Extractor`] owns one reflection session over a [`ClassIndex`] and turns
//! a class plus an [`ExtractionConfig`] into an [`Extraction`]: the component
//! record and the surviving constant, property and method records, in order.
//! Members excluded by policy are dropped silently; only lookup failures are
//! errors.

mod component;
mod constant;
mod method;
mod property;

use std::path::Path;

use tracing::{debug, warn};

use crate::config::{ExtractionConfig, VisibilityFilter};
use crate::docblock::{self, DocBlock};
use crate::error::Result;
use crate::model::{Extraction, Modifier, Modifiers};
use crate::reflect::names::NameContext;
use crate::reflect::{ClassIndex, Reflector};
use crate::source::SourceFile;
use crate::types::TypeResolver;

/// Extraction session; reflected classes are memoized for its lifetime.
pub struct Extractor<'a> {
    reflector: Reflector<'a>,
    resolver: TypeResolver<'a>,
}

impl<'a> Extractor<'a> {
    pub fn new(index: &'a ClassIndex) -> Self {
        Self {
            reflector: Reflector::new(index),
            resolver: TypeResolver::new(index),
        }
    }

    pub fn index(&self) -> &'a ClassIndex {
        self.reflector.index()
    }

    /// Extract the class named by `config`.
    pub fn extract(&self, config: &ExtractionConfig) -> Result<Extraction> {
        config.validate()?;
        self.extract_class(config)
    }

    /// Import table of the class that declares a member.
    fn names_of(&self, declaring_class: &str) -> Option<&'a NameContext> {
        self.index().get(declaring_class).map(|c| &c.names)
    }
}

/// Allowed-modifier test applied to every member.
#[derive(Debug, Clone, Copy)]
pub struct MemberFilter {
    modifier_sum: Modifiers,
    visibility_filter: VisibilityFilter,
}

impl MemberFilter {
    pub fn new(modifier_sum: Modifiers, visibility_filter: VisibilityFilter) -> Self {
        Self {
            modifier_sum,
            visibility_filter,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.modifier_sum(), config.visibility_filter)
    }

    /// Visibility gate for constants and properties.
    pub fn admits_visibility(&self, visibility: Modifiers) -> bool {
        match self.visibility_filter {
            VisibilityFilter::Strict => self.modifier_sum.intersects(visibility),
            VisibilityFilter::Legacy => {
                !visibility.intersects(Modifiers::PROTECTED | Modifiers::PRIVATE)
                    || self.modifier_sum.intersects(visibility)
            }
        }
    }

    /// Mask gate for methods: any shared bit admits.
    pub fn admits_mask(&self, modifiers: Modifiers) -> bool {
        self.modifier_sum.intersects(modifiers)
    }
}

// -- Shared helpers -----------------------------------------------------------

/// Parse a doc comment, treating a malformed one as absent.
fn parse_doc(raw: Option<&str>, owner: &str) -> Option<DocBlock> {
    match docblock::parse(raw?) {
        Ok(block) => Some(block),
        Err(e) => {
            debug!("ignoring doc comment of {owner}: {e}");
            None
        }
    }
}

fn open_source(path: &Path) -> Option<SourceFile> {
    match SourceFile::open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("no source excerpt available: {e}");
            None
        }
    }
}

/// Lines from `line` through the first one ending the statement.
fn statement_excerpt(file: &SourceFile, line: usize) -> String {
    let last = (line..line + 200)
        .take_while(|&n| file.line(n).is_some())
        .find(|&n| file.line(n).is_some_and(|l| l.contains(';')))
        .unwrap_or(line);
    file.excerpt(line, last)
}

/// Modifier keywords present in `bits`, in the given order.
fn modifier_list(bits: Modifiers, order: &[(Modifiers, Modifier)]) -> Vec<Modifier> {
    order
        .iter()
        .filter(|(bit, _)| bits.contains(*bit))
        .map(|(_, modifier)| *modifier)
        .collect()
}
