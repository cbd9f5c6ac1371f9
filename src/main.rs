//! phpdomain: generate Sphinx PHP-domain documentation from PHP sources.
//!
//! Three modes, all reading the PHP sources given as arguments:
//!
//! - **class mode**: `phpdomain src/ --class 'Vendor\Ns\MyClass'`
//! - **config mode**: `phpdomain src/ --config codesnippets.json -o Documentation`
//! - **namespace mode**: `phpdomain src/ --namespace 'Vendor\Ns' -o Documentation/Api`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{debug, info, warn};

use phpdomain::batch::{self, BatchConfig, NamespaceJob, OutputFile, PathMode};
use phpdomain::logger::init_logger;
use phpdomain::render::{self, Renderer};
use phpdomain::{ClassIndex, ExtractionConfig, Extractor, VisibilityFilter};

#[derive(Parser)]
#[command(
    name = "phpdomain",
    about = "Generate reStructuredText PHP-domain documentation from PHP class sources"
)]
#[command(group(ArgGroup::new("mode").required(true).args(["class", "config", "namespace"])))]
struct Cli {
    /// PHP files, directories (scanned recursively) or glob patterns to index
    #[arg(required = true)]
    sources: Vec<String>,

    /// Fully qualified name of the class to document
    #[arg(short = 'c', long)]
    class: Option<String>,

    /// Only these members, in this order (comma separated)
    #[arg(long, value_delimiter = ',')]
    members: Vec<String>,

    /// Modifiers a member must carry to be documented
    #[arg(long, value_delimiter = ',', default_value = "public")]
    allowed_modifiers: Vec<String>,

    /// Include methods marked @internal
    #[arg(long)]
    allow_internal: bool,

    /// Include deprecated methods
    #[arg(long)]
    allow_deprecated: bool,

    /// Include the constructor
    #[arg(long)]
    include_constructor: bool,

    /// Document classes marked @internal
    #[arg(long)]
    include_internal: bool,

    /// Leave out the class doc comment
    #[arg(long)]
    no_class_comment: bool,

    /// Leave out member doc comments
    #[arg(long)]
    no_member_comment: bool,

    /// Leave out method parameter and return fields
    #[arg(long)]
    no_method_parameters: bool,

    /// How constant and property visibility is filtered: strict or legacy
    #[arg(long, default_value = "strict")]
    visibility_filter: String,

    /// Embed member source code
    #[arg(long)]
    with_code: bool,

    /// Mark the class directive :noindex:
    #[arg(long)]
    noindex_in_class: bool,

    /// Mark member directives :noindex:
    #[arg(long)]
    noindex_in_class_members: bool,

    /// Base URL of the source tree for "See source code on GitHub" links
    #[arg(long)]
    github_link: Option<String>,

    /// Namespace prefix that maps to the root of --github-link
    #[arg(long)]
    main_namespace: Option<String>,

    /// JSON file with extraction maps and namespace jobs
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document every public class below this namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Mirror sub-namespaces as directories in namespace mode
    #[arg(long)]
    recursive: bool,

    /// Replace existing wrapper pages in namespace mode
    #[arg(long)]
    overwrite_rst: bool,

    /// Output directory (stdout when omitted in class mode)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: rst (default) or json
    #[arg(short = 'f', long, default_value = "rst")]
    format: String,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Errors only
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let renderer = render::create_renderer(&cli.format)?;
    let sources = expand_sources(&cli.sources)?;
    if sources.is_empty() {
        bail!("no PHP sources found");
    }
    let index = ClassIndex::from_paths(&sources);
    info!("indexed {} classes from {} files", index.len(), sources.len());
    let extractor = Extractor::new(&index);

    if let Some(path) = &cli.config {
        config_mode(&cli, path, &extractor, renderer.as_ref())
    } else if let Some(namespace) = &cli.namespace {
        namespace_mode(&cli, namespace, &extractor, renderer.as_ref())
    } else {
        class_mode(&cli, &extractor, renderer.as_ref())
    }
}

/// Build the extraction map described by the command-line flags.
fn extraction_config(cli: &Cli, class: &str) -> Result<ExtractionConfig> {
    let visibility_filter = match cli.visibility_filter.as_str() {
        "strict" => VisibilityFilter::Strict,
        "legacy" => VisibilityFilter::Legacy,
        other => bail!("unknown visibility filter: {}. Use strict or legacy", other),
    };
    let mut config = ExtractionConfig::new(class);
    config.members = cli.members.clone();
    config.allowed_modifiers = cli.allowed_modifiers.clone();
    config.allow_internal = cli.allow_internal;
    config.allow_deprecated = cli.allow_deprecated;
    config.include_constructor = cli.include_constructor;
    config.include_internal = cli.include_internal;
    config.include_class_comment = !cli.no_class_comment;
    config.include_member_comment = !cli.no_member_comment;
    config.include_method_parameters = !cli.no_method_parameters;
    config.visibility_filter = visibility_filter;
    config.with_code = cli.with_code;
    config.noindex_in_class = cli.noindex_in_class;
    config.noindex_in_class_members = cli.noindex_in_class_members;
    config.github_link = cli.github_link.clone();
    config.main_namespace = cli.main_namespace.clone();
    Ok(config)
}

/// class mode: one class to stdout, or to `<output>/<ShortName>.<ext>`.
fn class_mode(cli: &Cli, extractor: &Extractor<'_>, renderer: &dyn Renderer) -> Result<()> {
    let class = cli.class.as_deref().context("--class is required")?;
    let config = extraction_config(cli, class)?;
    let extraction = extractor
        .extract(&config)
        .with_context(|| format!("failed to document {class}"))?;
    let content = renderer.render(&extraction);
    match &cli.output {
        Some(dir) => {
            let file = OutputFile {
                path: PathBuf::from(format!(
                    "{}.{}",
                    extraction.component.short_name,
                    renderer.file_extension()
                )),
                content,
                overwrite: true,
            };
            batch::write_outputs(dir, &[file])?;
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// config mode: every job of a configuration file. Relative targets land
/// below --output, or next to the configuration file.
fn config_mode(
    cli: &Cli,
    path: &Path,
    extractor: &Extractor<'_>,
    renderer: &dyn Renderer,
) -> Result<()> {
    let batch_config =
        BatchConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    let root = match &cli.output {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let mut files = Vec::new();
    for config in &batch_config.extractions {
        let (target, content) = batch::render_target(extractor, config, renderer)
            .with_context(|| format!("failed to document {}", config.class_name()))?;
        match target {
            Some(target) => files.push(OutputFile {
                path: target,
                content,
                overwrite: true,
            }),
            None => print!("{content}"),
        }
    }
    for job in &batch_config.namespaces {
        files.extend(
            batch::document_namespace(extractor, job, renderer)
                .with_context(|| format!("failed to document namespace {}", job.namespace))?,
        );
    }
    let written = batch::write_outputs(&root, &files)?;
    info!("wrote {written} files below {}", root.display());
    Ok(())
}

/// namespace mode: the --namespace job, written below --output.
fn namespace_mode(
    cli: &Cli,
    namespace: &str,
    extractor: &Extractor<'_>,
    renderer: &dyn Renderer,
) -> Result<()> {
    let output = cli
        .output
        .as_deref()
        .context("--output is required in namespace mode")?;
    let job = NamespaceJob {
        namespace: namespace.to_string(),
        path: String::new(),
        path_mode: if cli.recursive {
            PathMode::Recursive
        } else {
            PathMode::Flat
        },
        github_link: cli.github_link.clone(),
        main_namespace: cli.main_namespace.clone(),
        overwrite_rst: cli.overwrite_rst,
    };
    let files = batch::document_namespace(extractor, &job, renderer)
        .with_context(|| format!("failed to document namespace {namespace}"))?;
    let written = batch::write_outputs(output, &files)?;
    info!("wrote {written} files below {}", output.display());
    Ok(())
}

fn is_php(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("php")
}

/// Collect `.php` files below `dir`, descending into subdirectories but not
/// into symlinked ones.
fn walk_php_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if file_type.is_dir() {
            walk_php_files(&path, files)?;
        } else if file_type.is_symlink() && path.is_dir() {
            debug!("not following symlinked directory {}", path.display());
        } else if path.is_file() && is_php(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Expand files, directories and glob patterns into a sorted list of PHP files.
fn expand_sources(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            walk_php_files(path, &mut files)?;
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}
