//! Extraction configuration, decoded from camelCase JSON maps or built by the CLI.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Modifiers, RenderSettings};

/// How constant and property visibility is matched against `allowedModifiers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    /// The member's visibility bit must be in the allowed set.
    #[default]
    Strict,
    /// Only protected/private members whose bit is missing are rejected.
    Legacy,
}

/// Options for documenting one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    pub class: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default = "default_allowed_modifiers")]
    pub allowed_modifiers: Vec<String>,
    #[serde(default)]
    pub allow_internal: bool,
    #[serde(default)]
    pub allow_deprecated: bool,
    #[serde(default)]
    pub include_constructor: bool,
    #[serde(default = "default_true")]
    pub include_class_comment: bool,
    #[serde(default = "default_true")]
    pub include_member_comment: bool,
    #[serde(default = "default_true")]
    pub include_method_parameters: bool,
    #[serde(default)]
    pub include_internal: bool,
    #[serde(default)]
    pub visibility_filter: VisibilityFilter,
    #[serde(default)]
    pub with_code: bool,
    #[serde(default)]
    pub noindex_in_class: bool,
    #[serde(default)]
    pub noindex_in_class_members: bool,
    #[serde(default, rename = "gitHubLink")]
    pub github_link: Option<String>,
    #[serde(default)]
    pub main_namespace: Option<String>,
    #[serde(default)]
    pub target_file_name: Option<String>,
}

fn default_allowed_modifiers() -> Vec<String> {
    vec!["public".to_string()]
}

fn default_true() -> bool {
    true
}

impl ExtractionConfig {
    /// Defaults for `class`, matching an otherwise empty configuration map.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            members: Vec::new(),
            allowed_modifiers: default_allowed_modifiers(),
            allow_internal: false,
            allow_deprecated: false,
            include_constructor: false,
            include_class_comment: true,
            include_member_comment: true,
            include_method_parameters: true,
            include_internal: false,
            visibility_filter: VisibilityFilter::Strict,
            with_code: false,
            noindex_in_class: false,
            noindex_in_class_members: false,
            github_link: None,
            main_namespace: None,
            target_file_name: None,
        }
    }

    /// Decode a single configuration map.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.class.trim().is_empty() {
            return Err(Error::invalid_config("\"class\" must name a class"));
        }
        if self.members.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::invalid_config("\"members\" contains an empty name"));
        }
        if let Some(target) = &self.target_file_name {
            if escapes_root(target) {
                return Err(Error::invalid_config(format!(
                    "\"targetFileName\" must stay below the output directory: {target}"
                )));
            }
        }
        Ok(())
    }

    /// Class name without a leading namespace separator.
    pub fn class_name(&self) -> &str {
        self.class.trim().trim_start_matches('\\')
    }

    pub fn modifier_sum(&self) -> Modifiers {
        Modifiers::sum_of(&self.allowed_modifiers)
    }

    /// Render switches, with the GitHub link joined to the class path.
    pub fn render_settings(&self, class_name: &str) -> RenderSettings {
        RenderSettings {
            include_class_comment: self.include_class_comment,
            include_member_comment: self.include_member_comment,
            include_method_parameters: self.include_method_parameters,
            with_code: self.with_code,
            noindex_in_class: self.noindex_in_class,
            noindex_in_class_members: self.noindex_in_class_members,
            github_link: self
                .github_link
                .as_deref()
                .filter(|base| !base.is_empty())
                .map(|base| github_source_link(base, class_name, self.main_namespace.as_deref())),
        }
    }
}

/// Whether a relative output path climbs out of its root through `..`.
pub fn escapes_root(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// `<base><class path below main_namespace>.php`
fn github_source_link(base: &str, class_name: &str, main_namespace: Option<&str>) -> String {
    let mut relative = class_name.trim_start_matches('\\');
    if let Some(ns) = main_namespace.map(|ns| ns.trim_matches('\\')) {
        if !ns.is_empty() {
            if let Some(rest) = relative.strip_prefix(ns) {
                relative = rest;
            }
        }
    }
    let relative = relative.trim_start_matches('\\').replace('\\', "/");
    let base = base.trim_end_matches('/');
    format!("{base}/{relative}.php")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_minimal_map() {
        let config = ExtractionConfig::from_json(r#"{"class": "Foo\\Bar"}"#).unwrap();
        assert_eq!(config, ExtractionConfig::new("Foo\\Bar"));
        assert_eq!(config.modifier_sum(), Modifiers::PUBLIC);
        assert!(config.include_method_parameters);
        assert!(!config.include_internal);
        assert_eq!(config.visibility_filter, VisibilityFilter::Strict);
    }

    #[test]
    fn camel_case_keys() {
        let config = ExtractionConfig::from_json(
            r#"{
                "class": "\\Foo",
                "members": ["a", "b"],
                "allowedModifiers": ["public", "protected"],
                "includeConstructor": true,
                "visibilityFilter": "legacy",
                "gitHubLink": "https://github.com/acme/lib/blob/main/src",
                "noindexInClassMembers": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.class_name(), "Foo");
        assert_eq!(config.members, vec!["a", "b"]);
        assert_eq!(config.modifier_sum(), Modifiers::PUBLIC | Modifiers::PROTECTED);
        assert!(config.include_constructor);
        assert_eq!(config.visibility_filter, VisibilityFilter::Legacy);
        assert!(config.noindex_in_class_members);
    }

    #[test]
    fn target_outside_output_root_is_rejected() {
        assert!(matches!(
            ExtractionConfig::from_json(r#"{"class": "A", "targetFileName": "../../etc/A.rst"}"#),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            ExtractionConfig::from_json(r#"{"class": "A", "targetFileName": "Docs/../../A.rst"}"#),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(ExtractionConfig::from_json(r#"{"class": "A", "targetFileName": "/Docs/A.rst"}"#).is_ok());
        assert!(!escapes_root("Docs/..data/A.rst"));
    }

    #[test]
    fn missing_class_is_an_error() {
        assert!(matches!(
            ExtractionConfig::from_json(r#"{"members": []}"#),
            Err(Error::ConfigFormat(_))
        ));
        assert!(matches!(
            ExtractionConfig::from_json(r#"{"class": " "}"#),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn unknown_visibility_filter_is_rejected() {
        assert!(ExtractionConfig::from_json(r#"{"class": "A", "visibilityFilter": "loose"}"#).is_err());
    }

    #[test]
    fn github_link_strips_main_namespace() {
        let mut config = ExtractionConfig::new("Acme\\Lib\\Domain\\User");
        config.github_link = Some("https://github.com/acme/lib/blob/main/Classes/".to_string());
        config.main_namespace = Some("Acme\\Lib".to_string());
        let settings = config.render_settings(config.class_name());
        assert_eq!(
            settings.github_link.as_deref(),
            Some("https://github.com/acme/lib/blob/main/Classes/Domain/User.php")
        );
    }

    #[test]
    fn github_link_without_main_namespace_uses_full_path() {
        let mut config = ExtractionConfig::new("Acme\\User");
        config.github_link = Some("https://example.org/src".to_string());
        let settings = config.render_settings(config.class_name());
        assert_eq!(
            settings.github_link.as_deref(),
            Some("https://example.org/src/Acme/User.php")
        );
    }
}
