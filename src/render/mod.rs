//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod rst;

use anyhow::{anyhow, Result};

use crate::model::Extraction;

/// Renders an extraction into one output format.
pub trait Renderer {
    fn render(&self, extraction: &Extraction) -> String;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "rst" | "restructuredtext" => Ok(Box::new(rst::RstRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use rst or json", format)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::*;
    use crate::types::Type;

    /// A small class with one member of each kind.
    pub fn sample_extraction() -> Extraction {
        Extraction {
            component: Component {
                kind: ComponentKind::Class,
                namespace: "Vendor\\Extension\\MyNamespace".into(),
                short_name: "MyFirstClass".into(),
                modifiers: Vec::new(),
                description: "Demonstrates the renderer.".into(),
            },
            constants: vec![ConstantMember {
                name: "MY_CONSTANT".into(),
                modifiers: vec![Modifier::Public],
                description: String::new(),
                source_excerpt: "    public const MY_CONSTANT = 'MY_CONSTANT';\n".into(),
                line: Some(7),
                value_literal: "'MY_CONSTANT'".into(),
                value_type_name: "string".into(),
            }],
            properties: vec![PropertyMember {
                name: "myVariable".into(),
                modifiers: vec![Modifier::Public],
                description: "A variable.".into(),
                source_excerpt: "    public string $myVariable = 'myValue';\n".into(),
                line: Some(9),
                default_value_literal: "'myValue'".into(),
            }],
            methods: vec![MethodMember {
                name: "createMyFirstObject".into(),
                modifiers: vec![Modifier::Public],
                description: "Create my first object.".into(),
                source_excerpt: "    public function createMyFirstObject(array $options, int $limit = 0): MyFirstClass\n    {\n    }\n".into(),
                line: Some(15),
                parameters: vec![
                    Parameter {
                        type_: Type::named("array"),
                        name: "$options".into(),
                        description: "the options".into(),
                        default_literal: None,
                        is_variadic: false,
                        is_by_reference: false,
                    },
                    Parameter {
                        type_: Type::named("int"),
                        name: "$limit".into(),
                        description: "the limit".into(),
                        default_literal: Some("0".into()),
                        is_variadic: false,
                        is_by_reference: false,
                    },
                ],
                return_type: Some(Type::named("\\Vendor\\Extension\\MyNamespace\\MyFirstClass")),
                return_description: String::new(),
                signature_parameters: "array $options, int $limit = 0".into(),
            }],
            settings: RenderSettings {
                include_class_comment: true,
                include_member_comment: true,
                include_method_parameters: true,
                with_code: false,
                noindex_in_class: false,
                noindex_in_class_members: false,
                github_link: None,
            },
        }
    }
}
