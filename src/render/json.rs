//! JSON renderer: the extraction model as structured output for tooling.

use tracing::error;

use crate::model::Extraction;
use crate::render::Renderer;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, extraction: &Extraction) -> String {
        match serde_json::to_string_pretty(extraction) {
            Ok(mut out) => {
                out.push('\n');
                out
            }
            Err(e) => {
                error!("failed to serialize {}: {e}", extraction.component.short_name);
                String::new()
            }
        }
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
