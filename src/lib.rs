use crate::{
    dom::document::HtmlDocument,
    fill::{plan::FillReport, session::PageSession},
    form::{control_model::ExtractedControls, extractor::FormControlExtractor},
};

pub mod bridge;
pub mod cli;
pub mod coerce;
pub mod dom;
pub mod error;
pub mod fill;
pub mod form;
pub mod report;
pub mod resolve;
pub mod trace;

pub use error::{FormMasterError, Result};

/// Everything one fill pass produced.
pub struct FillRun {
    pub document: HtmlDocument,
    pub controls: ExtractedControls,
    pub report: FillReport,
}

/// Parse `html`, extract its controls (optionally below `scope`), fill them
/// from `session` and, when asked, mark the filled controls.
pub fn run_fill(html: &str, scope: Option<&str>, session: &PageSession, annotate: bool) -> Result<FillRun> {
    let mut document = HtmlDocument::parse(html);
    // Markers left by an earlier pass must not be read as label text.
    session.clear_indicators(&mut document);
    let controls = FormControlExtractor::new().extract_document(&document, scope)?;

    let report = session.fill(&mut document, &controls);
    if annotate {
        session.annotate(&mut document, &controls, &report);
    }

    Ok(FillRun {
        document,
        controls,
        report,
    })
}
