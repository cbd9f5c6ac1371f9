use tracing::debug;

use crate::config::ExtractionConfig;
use crate::docblock;
use crate::error::{Error, Result};
use crate::model::{Component, ComponentKind, Extraction, Modifier};
use crate::reflect::ReflectedClass;
use crate::text::convert_fences;

use super::{parse_doc, Extractor, MemberFilter};

impl Extractor<'_> {
    pub(super) fn extract_class(&self, config: &ExtractionConfig) -> Result<Extraction> {
        let class = self
            .reflector
            .reflect(config.class_name())
            .ok_or_else(|| Error::ClassNotFound {
                class: config.class_name().to_string(),
            })?;
        if !config.include_internal && class.doc_comment().is_some_and(docblock::is_internal) {
            return Err(Error::ClassNotPublic {
                class: class.name().to_string(),
            });
        }

        let filter = MemberFilter::from_config(config);
        let mut constants = Vec::new();
        let mut properties = Vec::new();
        let mut methods = Vec::new();

        if config.members.is_empty() {
            methods.extend(
                class
                    .methods()
                    .iter()
                    .filter_map(|m| self.method(&class, m, config, &filter)),
            );
            properties.extend(
                class
                    .properties()
                    .iter()
                    .filter_map(|p| self.property(p, &filter)),
            );
            constants.extend(
                class
                    .constants()
                    .iter()
                    .filter_map(|c| self.constant(c, &filter)),
            );
        } else {
            for member in &config.members {
                let member = member.trim();
                if let Some(info) = class.method(member) {
                    methods.extend(self.method(&class, info, config, &filter));
                } else if let Some(info) = class.property(member.trim_start_matches('$')) {
                    properties.extend(self.property(info, &filter));
                } else if let Some(info) = class.constant(member) {
                    constants.extend(self.constant(info, &filter));
                } else {
                    return Err(Error::MemberNotFound {
                        member: member.to_string(),
                        class: class.name().to_string(),
                    });
                }
            }
        }
        debug!(
            "{}: {} constants, {} properties, {} methods",
            class.name(),
            constants.len(),
            properties.len(),
            methods.len()
        );

        Ok(Extraction {
            component: component(&class, config.include_class_comment),
            constants,
            properties,
            methods,
            settings: config.render_settings(class.name()),
        })
    }
}

fn component(class: &ReflectedClass, include_comment: bool) -> Component {
    let (kind, modifiers) = if class.is_interface() {
        (ComponentKind::Interface, Vec::new())
    } else if class.is_abstract() {
        (ComponentKind::Class, vec![Modifier::Abstract])
    } else {
        (ComponentKind::Class, Vec::new())
    };
    let description = if include_comment {
        parse_doc(class.doc_comment(), class.name())
            .map(|doc| {
                let mut text = doc.summary;
                if !doc.description.is_empty() {
                    text.push_str("\n\n");
                    text.push_str(&doc.description);
                }
                convert_fences(text.trim())
            })
            .unwrap_or_default()
    } else {
        String::new()
    };
    Component {
        kind,
        namespace: class.namespace_name().to_string(),
        short_name: class.short_name().to_string(),
        modifiers,
        description,
    }
}
