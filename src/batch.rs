//! Batch configuration files and namespace-wide documentation.
//!
//! A configuration file is JSON holding a single extraction map, an array of
//! them, or an object with `phpDomain` (extraction maps) and `namespaces`
//! (namespace jobs). Namespace jobs document every public class below a
//! namespace and lay out an include file, a wrapper page and an `Index.rst`
//! toctree per namespace level.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{escapes_root, ExtractionConfig};
use crate::error::{Error, Result};
use crate::extract::Extractor;
use crate::render::Renderer;
use crate::text::escape_rst;

const TITLE_RULE: &str =
    "================================================================================";

/// Where each documented class lands below the job's `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// `<path>/<ShortName>`
    #[default]
    Flat,
    /// `<path>/<Sub/Namespace>/<ShortName>`
    Recursive,
}

/// Document every class of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceJob {
    pub namespace: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_mode: PathMode,
    #[serde(default, rename = "gitHubLink", alias = "githubLink")]
    pub github_link: Option<String>,
    #[serde(default)]
    pub main_namespace: Option<String>,
    #[serde(default)]
    pub overwrite_rst: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Sections {
    #[serde(default)]
    php_domain: Vec<ExtractionConfig>,
    #[serde(default)]
    namespaces: Vec<NamespaceJob>,
}

/// Every job found in a configuration file.
#[derive(Debug, Default)]
pub struct BatchConfig {
    pub extractions: Vec<ExtractionConfig>,
    pub namespaces: Vec<NamespaceJob>,
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let batch = if value.is_array() {
            Self {
                extractions: serde_json::from_value(value)?,
                namespaces: Vec::new(),
            }
        } else if value.get("class").is_some() {
            Self {
                extractions: vec![serde_json::from_value(value)?],
                namespaces: Vec::new(),
            }
        } else if value.is_object() {
            let sections: Sections = serde_json::from_value(value)?;
            Self {
                extractions: sections.php_domain,
                namespaces: sections.namespaces,
            }
        } else {
            return Err(Error::invalid_config(
                "configuration must be an object or an array of objects",
            ));
        };
        for config in &batch.extractions {
            config.validate()?;
        }
        for job in &batch.namespaces {
            if job.namespace.trim().is_empty() {
                return Err(Error::invalid_config("parameter namespace is required"));
            }
            if escapes_root(&job.path) {
                return Err(Error::invalid_config(format!(
                    "namespace path must stay below the output directory: {}",
                    job.path
                )));
            }
        }
        Ok(batch)
    }
}

/// A file to write, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
    /// Replace an existing file.
    pub overwrite: bool,
}

/// Write `files` below `root`, returning how many were written.
pub fn write_outputs(root: &Path, files: &[OutputFile]) -> Result<usize> {
    let mut written = 0;
    for file in files {
        let target = root.join(&file.path);
        if !file.overwrite && target.exists() {
            debug!("keeping existing {}", target.display());
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&target, &file.content).map_err(|e| Error::io(&target, e))?;
        debug!("wrote {}", target.display());
        written += 1;
    }
    Ok(written)
}

/// Render one extraction map into the file named by its `targetFileName`.
pub fn render_target(
    extractor: &Extractor<'_>,
    config: &ExtractionConfig,
    renderer: &dyn Renderer,
) -> Result<(Option<PathBuf>, String)> {
    let extraction = extractor.extract(config)?;
    let target = config
        .target_file_name
        .as_deref()
        .map(|name| PathBuf::from(name.trim_start_matches('/')));
    Ok((target, renderer.render(&extraction)))
}

#[derive(Debug, Default)]
struct IndexLevel {
    short: String,
    has_sub_dirs: bool,
    has_children: bool,
}

fn join_path(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{rest}"),
    }
}

/// Document every public class below `job.namespace`.
pub fn document_namespace(
    extractor: &Extractor<'_>,
    job: &NamespaceJob,
    renderer: &dyn Renderer,
) -> Result<Vec<OutputFile>> {
    let namespace = job.namespace.trim().trim_matches('\\');
    let base = job.path.trim().trim_end_matches('/');
    let classes = extractor.index().classes_in_namespace(namespace);
    if classes.is_empty() {
        warn!("no classes found in namespace {namespace}");
    }

    let mut files = Vec::new();
    let mut levels: BTreeMap<String, IndexLevel> = BTreeMap::new();
    for class in classes {
        let relative = class.name.get(namespace.len() + 1..).unwrap_or(&class.name);
        let (sub_namespace, short) = relative.rsplit_once('\\').unwrap_or(("", relative));
        let output_path = match job.path_mode {
            PathMode::Flat => join_path(base, short),
            PathMode::Recursive => join_path(base, &relative.replace('\\', "/")),
        };

        let mut config = ExtractionConfig::new(class.name.as_str());
        config.github_link = job.github_link.clone();
        config.main_namespace = job.main_namespace.clone();
        let extraction = match extractor.extract(&config) {
            Ok(extraction) => extraction,
            Err(Error::ClassNotPublic { class }) => {
                info!("skipping internal class {class}");
                continue;
            }
            Err(e) => return Err(e),
        };

        let ext = renderer.file_extension();
        files.push(OutputFile {
            path: PathBuf::from(format!("CodeSnippets/{output_path}.{ext}.txt")),
            content: renderer.render(&extraction),
            overwrite: true,
        });
        files.push(OutputFile {
            path: PathBuf::from(format!("{output_path}.rst")),
            content: format!(
                "..  include:: /Includes.rst.txt\n\n{TITLE_RULE}\n{}\n{TITLE_RULE}\n\n..  include:: /CodeSnippets/{output_path}.{ext}.txt\n",
                escape_rst(short)
            ),
            overwrite: job.overwrite_rst,
        });

        let sub_namespace = match job.path_mode {
            PathMode::Flat => "",
            PathMode::Recursive => sub_namespace,
        };
        record_levels(&mut levels, sub_namespace);
    }

    for (level, entry) in &levels {
        let full_namespace = if level.is_empty() {
            namespace.to_string()
        } else {
            format!("{namespace}\\{level}")
        };
        let title = if entry.short.is_empty() {
            namespace.rsplit('\\').next().unwrap_or(namespace)
        } else {
            entry.short.as_str()
        };
        let mut tree = String::new();
        if entry.has_sub_dirs {
            tree.push_str("    */Index\n");
        }
        if entry.has_children {
            tree.push_str("    *\n");
        }
        let dir = join_path(base, &level.replace('\\', "/"));
        files.push(OutputFile {
            path: PathBuf::from(join_path(&dir, "Index.rst")),
            content: format!(
                "..  include:: /Includes.rst.txt\n\n{TITLE_RULE}\n{}\n{TITLE_RULE}\n\n\
                 The following list contains all public classes in namespace :php:`{full_namespace}`.\n\n\
                 ..  toctree::\n   :titlesonly:\n   :maxdepth: 1\n   :caption: {full_namespace}\n   :glob:\n\n{tree}",
                escape_rst(title)
            ),
            overwrite: true,
        });
    }
    Ok(files)
}

/// Mark every level on the way to `sub_namespace`; the last one holds classes.
fn record_levels(levels: &mut BTreeMap<String, IndexLevel>, sub_namespace: &str) {
    levels.entry(String::new()).or_default();
    if sub_namespace.is_empty() {
        if let Some(root) = levels.get_mut("") {
            root.has_children = true;
        }
        return;
    }
    let mut parent = String::new();
    for part in sub_namespace.split('\\') {
        if let Some(entry) = levels.get_mut(&parent) {
            entry.has_sub_dirs = true;
        }
        let key = if parent.is_empty() {
            part.to_string()
        } else {
            format!("{parent}\\{part}")
        };
        levels.entry(key.clone()).or_insert_with(|| IndexLevel {
            short: part.to_string(),
            ..IndexLevel::default()
        });
        parent = key;
    }
    if let Some(leaf) = levels.get_mut(&parent) {
        leaf.has_children = true;
    }
}
