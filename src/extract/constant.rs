use regex::Regex;
use tracing::debug;

use crate::literal::render_literal;
use crate::model::{ConstantMember, Modifier, Modifiers};
use crate::reflect::eval::evaluate;
use crate::reflect::ConstantInfo;
use crate::text::convert_fences;

use super::{modifier_list, open_source, parse_doc, statement_excerpt, Extractor, MemberFilter};

const CONSTANT_MODIFIERS: &[(Modifiers, Modifier)] = &[
    (Modifiers::PUBLIC, Modifier::Public),
    (Modifiers::PROTECTED, Modifier::Protected),
    (Modifiers::PRIVATE, Modifier::Private),
    (Modifiers::FINAL, Modifier::Final),
];

/// Declaration line pattern; the optional group is a typed constant's type.
fn declaration_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"\bconst\s*(?:[\w\\?|&()]+\s+)?{}\s*=\s*[^;]*;",
        regex::escape(name)
    ))
    .ok()
}

/// Visibility written on a declaration line; no keyword means public.
fn visibility_from_line(line: &str) -> Modifiers {
    if line.contains("protected") {
        Modifiers::PROTECTED
    } else if line.contains("private") {
        Modifiers::PRIVATE
    } else {
        Modifiers::PUBLIC
    }
}

impl Extractor<'_> {
    pub(super) fn constant(&self, info: &ConstantInfo, filter: &MemberFilter) -> Option<ConstantMember> {
        let file = open_source(info.file.as_deref()?)?;
        let located = declaration_pattern(&info.name).and_then(|re| file.find_line(&re));
        let line = located.unwrap_or(info.line);
        let visibility = info.visibility.unwrap_or_else(|| {
            file.line(line)
                .map_or(Modifiers::PUBLIC, visibility_from_line)
        });
        if !filter.admits_visibility(visibility) {
            debug!("constant {}::{} filtered by visibility", info.declaring_class, info.name);
            return None;
        }

        let value = evaluate(&info.value, &self.reflector, 0);
        let description = parse_doc(info.doc_comment.as_deref(), &info.name)
            .map(|doc| convert_fences(&doc.text()))
            .unwrap_or_default();
        Some(ConstantMember {
            name: info.name.clone(),
            modifiers: modifier_list(visibility | (info.modifiers & Modifiers::FINAL), CONSTANT_MODIFIERS),
            description,
            source_excerpt: statement_excerpt(&file, line),
            line: Some(line),
            value_literal: render_literal(&value),
            value_type_name: value.type_name().to_string(),
        })
    }
}
