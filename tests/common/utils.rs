use formmaster::dom::document::HtmlDocument;
use formmaster::form::control_model::{ControlDescriptor, ExtractedControls};
use formmaster::form::extractor::FormControlExtractor;

pub fn fixture(name: &str) -> String {
    let base = std::env::current_dir().unwrap();
    let path = base.join("tests").join("fixtures").join(name);

    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {}", path.display(), e))
}

/// Parse and extract in one step.
pub fn extract(html: &str) -> (HtmlDocument, ExtractedControls) {
    let doc = HtmlDocument::parse(html);
    let controls = FormControlExtractor::new().extract_document(&doc, None).unwrap();
    (doc, controls)
}

/// Wrap a body fragment in a minimal page.
pub fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>t</title></head><body>{}</body></html>", body)
}

pub fn by_key<'a>(controls: &'a ExtractedControls, key: &str) -> &'a ControlDescriptor {
    controls
        .fillable()
        .chain(&controls.buttons)
        .find(|c| c.field_key() == key)
        .unwrap_or_else(|| panic!("no control '{}'", key))
}
