//! phpdomain: PHP class documentation as reStructuredText.
//!
//! PHP sources are indexed statically ([`reflect::ClassIndex`]), a class is
//! extracted under an [`ExtractionConfig`] into an [`Extraction`], and a
//! [`render::Renderer`] turns that into Sphinx PHP-domain markup or JSON.
//!
//! ```no_run
//! use phpdomain::{ClassIndex, ExtractionConfig, Extractor};
//! use phpdomain::render::create_renderer;
//!
//! let index = ClassIndex::from_paths(&["src/MyFirstClass.php"]);
//! let extractor = Extractor::new(&index);
//! let extraction = extractor.extract(&ExtractionConfig::new("Vendor\\MyFirstClass"))?;
//! print!("{}", create_renderer("rst")?.render(&extraction));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod batch;
pub mod config;
pub mod docblock;
pub mod error;
pub mod extract;
pub mod literal;
pub mod logger;
pub mod model;
pub mod reflect;
pub mod render;
pub mod source;
pub mod text;
pub mod types;
pub mod value;

pub use config::{ExtractionConfig, VisibilityFilter};
pub use error::{Error, Result};
pub use extract::{Extractor, MemberFilter};
pub use model::{Extraction, Member};
pub use reflect::{ClassIndex, Reflector};
