//! reStructuredText renderer using the Sphinx PHP domain.
//!
//! One `php:class` (or `php:interface`) directive per extraction, with the
//! constants, properties and methods nested inside it in that order.

use crate::model::*;
use crate::render::Renderer;
use crate::text::{escape_rst, indent};

pub struct RstRenderer;

const BODY_INDENT: &str = "    ";

impl Renderer for RstRenderer {
    fn render(&self, extraction: &Extraction) -> String {
        let settings = &extraction.settings;
        let component = &extraction.component;
        let mut output = String::new();

        if !component.namespace.is_empty() {
            output.push_str(&format!("..  php:namespace::  {}\n\n", component.namespace));
        }

        let mut options = Vec::new();
        if settings.noindex_in_class {
            options.push(":noindex:".to_string());
        }
        options.extend(component.modifiers.iter().map(|m| format!(":{m}:")));

        let mut body: Vec<String> = Vec::new();
        let comment = github_paragraph(&component.description, settings.github_link.as_deref());
        if !comment.is_empty() {
            body.push(comment);
        }
        for constant in &extraction.constants {
            body.push(render_constant(constant, settings));
        }
        for property in &extraction.properties {
            body.push(render_property(property, settings));
        }
        for method in &extraction.methods {
            body.push(render_method(method, settings));
        }

        let kind = match component.kind {
            ComponentKind::Class => "class",
            ComponentKind::Interface => "interface",
        };
        output.push_str(&directive(kind, &component.short_name, &options, &body.join("\n\n")));
        output.push('\n');
        output
    }

    fn file_extension(&self) -> &str {
        "rst"
    }
}

/// `..  php:<name>:: <argument>` with options and an indented body.
fn directive(name: &str, argument: &str, options: &[String], body: &str) -> String {
    let mut lines = vec![format!("..  php:{name}:: {argument}")];
    lines.extend(options.iter().map(|option| format!("{BODY_INDENT}{option}")));
    let body = body.trim_end();
    if !body.is_empty() {
        lines.push(String::new());
        lines.push(indent(body, BODY_INDENT));
    }
    lines.join("\n")
}

fn member_options<M: Member>(member: &M, settings: &RenderSettings) -> Vec<String> {
    let mut options = Vec::new();
    if settings.noindex_in_class_members {
        options.push(":noindex:".to_string());
    }
    options.extend(
        member
            .modifiers()
            .iter()
            .filter(|m| **m != Modifier::Public)
            .map(|m| format!(":{m}:")),
    );
    options
}

fn code_block(excerpt: &str) -> String {
    format!(
        "..  code-block:: php\n\n{}",
        indent(excerpt.trim_end_matches('\n'), BODY_INDENT)
    )
}

/// Text followed by the "See source code" paragraph when a link is known.
fn github_paragraph(text: &str, link: Option<&str>) -> String {
    let mut out = text.trim().to_string();
    if let Some(link) = link {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("See source code on `GitHub <{link}>`__."));
    }
    out
}

/// Collapse a multi-line literal onto one line.
fn inline(literal: &str) -> String {
    literal
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_constant(constant: &ConstantMember, settings: &RenderSettings) -> String {
    let mut body: Vec<String> = Vec::new();
    if settings.include_member_comment {
        if constant.value_literal.contains('\n') {
            body.push(format!("Type {}", constant.value_type_name));
            body.push(code_block(&constant.value_literal));
        } else {
            body.push(format!(
                ":php:`{}`, type {}",
                constant.value_literal, constant.value_type_name
            ));
        }
        if !constant.description.is_empty() {
            body.push(constant.description.clone());
        }
        if settings.with_code && !constant.source_excerpt.is_empty() {
            body.push(code_block(&constant.source_excerpt));
        }
    }
    directive(
        "const",
        &escape_rst(&constant.name),
        &member_options(constant, settings),
        &body.join("\n\n"),
    )
}

fn render_property(property: &PropertyMember, settings: &RenderSettings) -> String {
    let mut body: Vec<String> = Vec::new();
    if settings.include_member_comment {
        if !property.description.is_empty() {
            body.push(property.description.clone());
        }
        if settings.with_code && !property.source_excerpt.is_empty() {
            body.push(code_block(&property.source_excerpt));
        }
    }
    directive(
        "attr",
        &escape_rst(&property.name),
        &member_options(property, settings),
        &body.join("\n\n"),
    )
}

fn render_method(method: &MethodMember, settings: &RenderSettings) -> String {
    let mut options = member_options(method, settings);
    if settings.include_method_parameters {
        let returns = if !method.return_description.is_empty() {
            Some(method.return_description.clone())
        } else {
            method.return_type.as_ref().map(ToString::to_string)
        };
        if let Some(returns) = returns {
            options.push(format!(":returns: `{returns}`"));
        }
    }

    let mut body: Vec<String> = Vec::new();
    if settings.include_member_comment {
        let link = settings.github_link.as_deref().map(|link| match method.line {
            Some(line) => format!("{link}#L{line}"),
            None => link.to_string(),
        });
        let comment = github_paragraph(&method.description, link.as_deref());
        if !comment.is_empty() {
            body.push(comment);
        }
    }
    if settings.with_code && !method.source_excerpt.is_empty() {
        body.push(code_block(&method.source_excerpt));
    }
    if settings.include_method_parameters && !method.parameters.is_empty() {
        let params: Vec<String> = method
            .parameters
            .iter()
            .map(|param| {
                let mut line = format!(":param {} {}: {}", param.type_, param.name, param.description);
                if let Some(default) = &param.default_literal {
                    line.push_str(", default: ");
                    line.push_str(&inline(default));
                }
                line
            })
            .collect();
        body.push(params.join("\n"));
    }

    directive(
        "method",
        &format!("{}({})", method.name, method.signature_parameters),
        &options,
        &body.join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::sample_extraction;

    #[test]
    fn renders_full_class() {
        let extraction = sample_extraction();
        let expected = "\
..  php:namespace::  Vendor\\Extension\\MyNamespace

..  php:class:: MyFirstClass

    Demonstrates the renderer.

    ..  php:const:: MY_CONSTANT

        :php:`'MY_CONSTANT'`, type string

    ..  php:attr:: myVariable

        A variable.

    ..  php:method:: createMyFirstObject(array $options, int $limit = 0)
        :returns: `\\Vendor\\Extension\\MyNamespace\\MyFirstClass`

        Create my first object.

        :param array $options: the options
        :param int $limit: the limit, default: 0
";
        assert_eq!(RstRenderer.render(&extraction), expected);
    }

    #[test]
    fn noindex_and_github_links() {
        let mut extraction = sample_extraction();
        extraction.settings.noindex_in_class = true;
        extraction.settings.noindex_in_class_members = true;
        extraction.settings.github_link = Some("https://github.com/acme/lib/blob/main/MyFirstClass.php".into());
        let out = RstRenderer.render(&extraction);
        assert!(out.contains("..  php:class:: MyFirstClass\n    :noindex:\n"));
        assert!(out.contains("    ..  php:const:: MY_CONSTANT\n        :noindex:\n"));
        assert!(out.contains(
            "    See source code on `GitHub <https://github.com/acme/lib/blob/main/MyFirstClass.php>`__."
        ));
        assert!(out.contains(
            "        See source code on `GitHub <https://github.com/acme/lib/blob/main/MyFirstClass.php#L15>`__."
        ));
    }

    #[test]
    fn code_excerpts_with_code() {
        let mut extraction = sample_extraction();
        extraction.settings.with_code = true;
        let out = RstRenderer.render(&extraction);
        assert!(out.contains(
            "        ..  code-block:: php\n\n                public const MY_CONSTANT = 'MY_CONSTANT';\n"
        ));
    }

    #[test]
    fn comments_and_parameters_can_be_left_out() {
        let mut extraction = sample_extraction();
        extraction.settings.include_member_comment = false;
        extraction.settings.include_method_parameters = false;
        let out = RstRenderer.render(&extraction);
        assert!(!out.contains("Create my first object."));
        assert!(!out.contains(":param"));
        assert!(!out.contains(":returns:"));
        assert!(out.contains("    ..  php:method:: createMyFirstObject(array $options, int $limit = 0)\n"));
    }

    #[test]
    fn interface_and_modifier_options() {
        let mut extraction = sample_extraction();
        extraction.component.kind = ComponentKind::Interface;
        extraction.methods[0].modifiers = vec![Modifier::Public, Modifier::Static];
        let out = RstRenderer.render(&extraction);
        assert!(out.contains("..  php:interface:: MyFirstClass\n"));
        assert!(out.contains("createMyFirstObject(array $options, int $limit = 0)\n        :static:\n"));
    }

    #[test]
    fn multiline_constant_value_uses_code_block() {
        let mut extraction = sample_extraction();
        extraction.constants[0].value_literal = "[\n  0 => 'a',\n]".into();
        extraction.constants[0].value_type_name = "array".into();
        let out = RstRenderer.render(&extraction);
        assert!(out.contains(
            "        Type array\n\n        ..  code-block:: php\n\n            [\n              0 => 'a',\n            ]\n"
        ));
    }

    #[test]
    fn global_namespace_has_no_namespace_directive() {
        let mut extraction = sample_extraction();
        extraction.component.namespace = String::new();
        assert!(RstRenderer.render(&extraction).starts_with("..  php:class:: MyFirstClass\n"));
    }
}
