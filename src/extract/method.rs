use tracing::debug;

use crate::config::ExtractionConfig;
use crate::docblock::{self, DocBlock};
use crate::literal::render_literal;
use crate::model::{MethodMember, Modifier, Modifiers, Parameter};
use crate::reflect::eval::evaluate;
use crate::reflect::names::NameContext;
use crate::reflect::{MethodInfo, ReflectedClass};
use crate::text::convert_fences;
use crate::types::Type;
use crate::value::Value;

use super::{modifier_list, open_source, parse_doc, Extractor, MemberFilter};

const METHOD_MODIFIERS: &[(Modifiers, Modifier)] = &[
    (Modifiers::PUBLIC, Modifier::Public),
    (Modifiers::PROTECTED, Modifier::Protected),
    (Modifiers::PRIVATE, Modifier::Private),
    (Modifiers::STATIC, Modifier::Static),
    (Modifiers::ABSTRACT, Modifier::Abstract),
    (Modifiers::FINAL, Modifier::Final),
];

fn is_deprecated(method: &MethodInfo) -> bool {
    method.has_deprecated_attribute()
        || method
            .doc_comment
            .as_deref()
            .is_some_and(|doc| doc.contains("@deprecated"))
}

fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compare type names the way a reader would: case-insensitive, ignoring a
/// leading namespace separator.
fn same_type_name(a: &str, b: &str) -> bool {
    a.trim_start_matches('\\')
        .eq_ignore_ascii_case(b.trim_start_matches('\\'))
}

impl Extractor<'_> {
    pub(super) fn method(
        &self,
        class: &ReflectedClass,
        info: &MethodInfo,
        config: &ExtractionConfig,
        filter: &MemberFilter,
    ) -> Option<MethodMember> {
        let owner = format!("{}::{}", class.name(), info.name);
        if !config.allow_internal && info.doc_comment.as_deref().is_some_and(docblock::is_internal) {
            debug!("method {owner} is internal");
            return None;
        }
        if !config.allow_deprecated && is_deprecated(info) {
            debug!("method {owner} is deprecated");
            return None;
        }
        if !filter.admits_mask(info.modifiers) {
            debug!("method {owner} filtered by modifiers");
            return None;
        }
        if !config.include_constructor && info.name.eq_ignore_ascii_case("__construct") {
            return None;
        }
        let path = info.file.as_deref()?;

        let source = open_source(path);
        let signature_line = source
            .as_ref()
            .and_then(|file| file.find_signature_start(info.start_line, &info.name))
            .unwrap_or(info.function_line);
        let source_excerpt = source
            .as_ref()
            .map(|file| file.excerpt(signature_line, info.end_line))
            .unwrap_or_default();

        let names = self.names_of(&info.declaring_class).unwrap_or(class.names());
        let mut parameters = self.parameters(info);
        let mut return_type = self.resolver.resolve_return(info.return_type.as_ref());
        let mut return_description = String::new();
        let mut description = String::new();

        if let Some(doc) = parse_doc(info.doc_comment.as_deref(), &owner) {
            description = convert_fences(&doc.text());
            self.merge_param_tags(&doc, info, names, &mut parameters);
            self.apply_return_tag(&doc, names, &mut return_type, &mut return_description);
        }
        for param in &mut parameters {
            if param.description.is_empty() {
                param.description = format!("the {}", param.name.trim_start_matches('$'));
            }
        }
        let signature_parameters = parameters
            .iter()
            .map(Parameter::signature)
            .collect::<Vec<_>>()
            .join(", ");

        Some(MethodMember {
            name: info.name.clone(),
            modifiers: modifier_list(info.modifiers, METHOD_MODIFIERS),
            description,
            source_excerpt,
            line: Some(signature_line),
            parameters,
            return_type,
            return_description,
            signature_parameters,
        })
    }

    fn parameters(&self, info: &MethodInfo) -> Vec<Parameter> {
        info.params
            .iter()
            .map(|param| {
                let default = param
                    .default
                    .as_ref()
                    .map(|expr| evaluate(expr, &self.reflector, 0));
                let defaults_to_null = matches!(default, Some(Value::Null));
                Parameter {
                    type_: self
                        .resolver
                        .resolve_parameter(param.type_.as_ref(), defaults_to_null),
                    name: format!("${}", param.name),
                    description: String::new(),
                    default_literal: default.as_ref().map(render_literal),
                    is_variadic: param.variadic,
                    is_by_reference: param.by_ref,
                }
            })
            .collect()
    }

    /// `@param` tags fill in a missing type and the description.
    fn merge_param_tags(
        &self,
        doc: &DocBlock,
        info: &MethodInfo,
        names: &NameContext,
        parameters: &mut [Parameter],
    ) {
        for tag in doc.params() {
            let Some(index) = parameters.iter().position(|p| p.name == tag.name) else {
                continue;
            };
            let param = &mut parameters[index];
            if info.params[index].type_.is_none() && !tag.type_.is_empty() {
                param.type_ = self.resolver.resolve_doc_type(&tag.type_, names);
            }
            if !tag.description.is_empty() {
                param.description = tag.description;
            }
        }
    }

    /// A simple `@return` type replaces a differing declared one; a complex
    /// one is taken verbatim and its free text dropped.
    fn apply_return_tag(
        &self,
        doc: &DocBlock,
        names: &NameContext,
        return_type: &mut Option<Type>,
        return_description: &mut String,
    ) {
        let Some(tag) = doc.return_tag() else {
            return;
        };
        if tag.has_complex_type() {
            *return_type = Some(self.resolver.resolve_doc_type(&tag.type_, names));
            return_description.clear();
            return;
        }
        let documented = self.resolver.resolve_doc_type(&tag.type_, names);
        let keeps_declared = return_type
            .as_ref()
            .is_some_and(|declared| same_type_name(&declared.to_string(), &documented.to_string()));
        if !keeps_declared {
            *return_type = (!documented.is_void()).then_some(documented);
        }
        *return_description = ucfirst(&tag.description);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::index_source;
    use super::*;
    use crate::config::VisibilityFilter;

    const SOURCE: &str = r#"<?php
namespace Vendor\Extension\MyNamespace;

use Acme\Model\User;

class MyFirstClass
{
    /**
     * Create my first object.
     *
     * @param array $options the options
     * @param int $limit
     * @return MyFirstClass
     */
    public function createMyFirstObject(array $options, int $limit = 0): MyFirstClass
    {
        return new MyFirstClass();
    }

    public function myMethod(): void
    {
    }

    /**
     * @param $name the name
     * @return string the greeting
     */
    public function greet(
        $name,
        ?string $suffix = null,
        string ...$rest
    ): string {
        return 'hi';
    }

    /** @internal */
    public function internalHelper() {}

    /** @deprecated use greet() */
    public function oldGreet() {}

    #[\Deprecated]
    public function attributed() {}

    protected function hidden() {}

    public function __construct() {}

    public static function byRef(array &$items, int|string|null $key = null) {}

    /** @return array<string, User> the users */
    public function users(): array { return []; }

    /** @return User|null some user */
    public function find(): ?object { return null; }

    /** @return void nothing */
    public function untypedVoid() {}

    /** @return \Vendor\Extension\MyNamespace\MyFirstClass */
    public function same(): MyFirstClass { return $this; }

    /** @param array<string, int $broken */
    public function malformed(array $x) {}
}
"#;

    fn extract_with(name: &str, config: &ExtractionConfig) -> Option<MethodMember> {
        let (_dir, index) = index_source(SOURCE);
        let extractor = Extractor::new(&index);
        let class = extractor
            .reflector
            .reflect("Vendor\\Extension\\MyNamespace\\MyFirstClass")
            .unwrap();
        let info = class.method(name).unwrap().clone();
        let filter = MemberFilter::from_config(config);
        extractor.method(&class, &info, config, &filter)
    }

    fn extract(name: &str) -> Option<MethodMember> {
        extract_with(name, &ExtractionConfig::new("Vendor\\Extension\\MyNamespace\\MyFirstClass"))
    }

    #[test]
    fn signature_and_return_type() {
        let method = extract("createMyFirstObject").unwrap();
        assert_eq!(method.signature_parameters, "array $options, int $limit = 0");
        assert_eq!(
            method.return_type.as_ref().map(Type::to_string).as_deref(),
            Some("\\Vendor\\Extension\\MyNamespace\\MyFirstClass")
        );
        assert_eq!(method.description, "Create my first object.");
        assert_eq!(method.parameters[0].description, "the options");
        assert_eq!(method.parameters[1].description, "the limit");
        assert_eq!(method.modifiers, vec![Modifier::Public]);
        assert_eq!(method.line, Some(15));
        assert!(method.source_excerpt.starts_with("    public function createMyFirstObject("));
        assert!(method.source_excerpt.ends_with("    }\n"));
    }

    #[test]
    fn void_return_is_absent() {
        let method = extract("myMethod").unwrap();
        assert_eq!(method.return_type, None);
        assert_eq!(method.signature_parameters, "");
    }

    #[test]
    fn multiline_signature_and_doc_types() {
        let method = extract("greet").unwrap();
        assert_eq!(
            method.signature_parameters,
            "mixed $name, ?string $suffix = null, string ...$rest"
        );
        assert_eq!(method.parameters[0].description, "the name");
        assert_eq!(method.return_description, "The greeting");
        assert_eq!(method.line, Some(28));
    }

    #[test]
    fn policy_exclusions() {
        assert!(extract("internalHelper").is_none());
        assert!(extract("oldGreet").is_none());
        assert!(extract("attributed").is_none());
        assert!(extract("hidden").is_none());
        assert!(extract("__construct").is_none());
    }

    #[test]
    fn policy_switches_admit_members() {
        let mut config = ExtractionConfig::new("Vendor\\Extension\\MyNamespace\\MyFirstClass");
        config.allow_internal = true;
        config.allow_deprecated = true;
        config.include_constructor = true;
        config.allowed_modifiers = vec!["public".into(), "protected".into()];
        config.visibility_filter = VisibilityFilter::Strict;
        assert!(extract_with("internalHelper", &config).is_some());
        let old = extract_with("oldGreet", &config).unwrap();
        assert_eq!(old.description, "**Deprecated:** use greet()");
        assert!(extract_with("attributed", &config).is_some());
        assert!(extract_with("hidden", &config).is_some());
        assert!(extract_with("__construct", &config).is_some());
    }

    #[test]
    fn by_reference_and_union_parameters() {
        let method = extract("byRef").unwrap();
        assert_eq!(
            method.signature_parameters,
            "array &$items, int|string|null $key = null"
        );
        assert_eq!(method.modifiers, vec![Modifier::Public, Modifier::Static]);
    }

    #[test]
    fn complex_return_tag_is_authoritative() {
        let method = extract("users").unwrap();
        assert_eq!(
            method.return_type.as_ref().map(Type::to_string).as_deref(),
            Some("array<string, User>")
        );
        assert_eq!(method.return_description, "");
    }

    #[test]
    fn simple_return_tag_overrides_declared_type() {
        let method = extract("find").unwrap();
        assert_eq!(
            method.return_type.as_ref().map(Type::to_string).as_deref(),
            Some("User|null")
        );
        assert_eq!(method.return_description, "Some user");
    }

    #[test]
    fn documented_void_clears_return_type() {
        let method = extract("untypedVoid").unwrap();
        assert_eq!(method.return_type, None);
        assert_eq!(method.return_description, "Nothing");
    }

    #[test]
    fn matching_return_tag_keeps_declared_type() {
        let method = extract("same").unwrap();
        assert_eq!(
            method.return_type.as_ref().map(Type::to_string).as_deref(),
            Some("\\Vendor\\Extension\\MyNamespace\\MyFirstClass")
        );
    }

    #[test]
    fn malformed_doc_comment_keeps_reflection_data() {
        let method = extract("malformed").unwrap();
        assert_eq!(method.description, "");
        assert_eq!(method.signature_parameters, "array $x");
        assert_eq!(method.parameters[0].description, "the x");
    }
}
