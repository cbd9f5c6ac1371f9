use regex::Regex;
use tracing::debug;

use crate::literal::render_literal;
use crate::model::{Modifier, Modifiers, PropertyMember};
use crate::reflect::eval::evaluate;
use crate::reflect::PropertyInfo;
use crate::text::convert_fences;

use super::{modifier_list, open_source, parse_doc, statement_excerpt, Extractor, MemberFilter};

const PROPERTY_MODIFIERS: &[(Modifiers, Modifier)] = &[
    (Modifiers::PROTECTED, Modifier::Protected),
    (Modifiers::PRIVATE, Modifier::Private),
    (Modifiers::STATIC, Modifier::Static),
    (Modifiers::READONLY, Modifier::Readonly),
    (Modifiers::PUBLIC, Modifier::Public),
];

fn declaration_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"(private|protected|public)[^$]*\${}(\s*=\s*[^;]*)?;",
        regex::escape(name)
    ))
    .ok()
}

impl Extractor<'_> {
    pub(super) fn property(&self, info: &PropertyInfo, filter: &MemberFilter) -> Option<PropertyMember> {
        let file = open_source(info.file.as_deref()?)?;
        if !filter.admits_visibility(info.modifiers.visibility()) {
            debug!("property {}::${} filtered by visibility", info.declaring_class, info.name);
            return None;
        }

        let located = declaration_pattern(&info.name).and_then(|re| file.find_line(&re));
        let line = located.unwrap_or(info.line);
        let source_excerpt = if info.promoted && located.is_none() {
            file.excerpt(line, line)
        } else {
            statement_excerpt(&file, line)
        };
        let default_value_literal = match &info.default {
            Some(expr) => render_literal(&evaluate(expr, &self.reflector, 0)),
            None if info.type_.is_none() && !info.promoted => "null".to_string(),
            None => String::new(),
        };
        let description = parse_doc(info.doc_comment.as_deref(), &info.name)
            .map(|doc| convert_fences(&doc.text()))
            .unwrap_or_default();

        Some(PropertyMember {
            name: info.name.clone(),
            modifiers: modifier_list(info.modifiers, PROPERTY_MODIFIERS),
            description,
            source_excerpt,
            line: Some(line),
            default_value_literal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::index_source;
    use super::*;
    use crate::config::VisibilityFilter;

    const SOURCE: &str = r#"<?php
namespace Acme;

class Account
{
    /**
     * The display name.
     */
    public string $myVariable = 'myValue';
    protected static ?int $counter = null;
    private $secret;
    public $untyped;
    public readonly array $tags;
    public array $options = ['limit' => 10];

    public function __construct(
        protected readonly string $owner,
    ) {}

    /**
     * Holds a callback:
     *
     * ```js
     * run();
     * ```
     */
    public $callback;
}
"#;

    fn extract(name: &str, allowed: Modifiers) -> Option<PropertyMember> {
        let (_dir, index) = index_source(SOURCE);
        let extractor = Extractor::new(&index);
        let class = extractor.reflector.reflect("Acme\\Account").unwrap();
        let info = class.property(name).unwrap().clone();
        extractor.property(&info, &MemberFilter::new(allowed, VisibilityFilter::Strict))
    }

    #[test]
    fn public_property_with_default() {
        let member = extract("myVariable", Modifiers::PUBLIC).unwrap();
        assert_eq!(member.default_value_literal, "'myValue'");
        assert_eq!(member.modifiers, vec![Modifier::Public]);
        assert_eq!(member.description, "The display name.");
        assert_eq!(member.line, Some(9));
        assert_eq!(
            member.source_excerpt,
            "    public string $myVariable = 'myValue';\n"
        );
    }

    #[test]
    fn modifier_order_puts_visibility_keywords_first() {
        let member = extract("counter", Modifiers::PROTECTED).unwrap();
        assert_eq!(member.modifiers, vec![Modifier::Protected, Modifier::Static]);
        assert_eq!(member.default_value_literal, "null");
        let tags = extract("tags", Modifiers::PUBLIC).unwrap();
        assert_eq!(tags.modifiers, vec![Modifier::Readonly, Modifier::Public]);
    }

    #[test]
    fn hidden_visibilities_are_filtered() {
        assert!(extract("counter", Modifiers::PUBLIC).is_none());
        assert!(extract("secret", Modifiers::PUBLIC).is_none());
        assert!(extract("secret", Modifiers::PRIVATE).is_some());
    }

    #[test]
    fn missing_defaults() {
        assert_eq!(extract("untyped", Modifiers::PUBLIC).unwrap().default_value_literal, "null");
        assert_eq!(extract("tags", Modifiers::PUBLIC).unwrap().default_value_literal, "");
    }

    #[test]
    fn array_default_is_rendered() {
        let member = extract("options", Modifiers::PUBLIC).unwrap();
        assert_eq!(member.default_value_literal, "[\n  'limit' => 10,\n]");
    }

    #[test]
    fn description_fences_become_code_blocks() {
        let member = extract("callback", Modifiers::PUBLIC).unwrap();
        assert_eq!(
            member.description,
            "Holds a callback:\n\n..  code-block:: js\n\n    run();"
        );
    }

    #[test]
    fn promoted_property_has_no_default() {
        let member = extract("owner", Modifiers::PROTECTED).unwrap();
        assert_eq!(member.default_value_literal, "");
        assert_eq!(member.modifiers, vec![Modifier::Protected, Modifier::Readonly]);
        assert_eq!(member.line, Some(17));
        assert_eq!(member.source_excerpt, "        protected readonly string $owner,\n");
    }
}
