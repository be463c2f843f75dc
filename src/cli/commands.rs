use tracing::{info, warn};

use crate::bridge::source::{FileValueSource, HttpValueSource, ValueSource};
use crate::cli::config::{FillSettings, parse_option_flag};
use crate::coerce::coercer::ValueCoercer;
use crate::dom::document::HtmlDocument;
use crate::fill::session::PageSession;
use crate::form::control_model::{ControlKind, ControlOption};
use crate::form::extractor::FormControlExtractor;
use crate::report::console::{format_controls, format_fill_report};
use crate::resolve::mapping::{DataDocument, SiteMappings};
use crate::resolve::profile::UserProfile;
use crate::resolve::value_map::RawValue;
use crate::run_fill;
use crate::trace::logger::TraceLogger;

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(html_path: &str, scope: Option<&str>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let html = std::fs::read_to_string(html_path)?;
    let doc = HtmlDocument::parse(&html);
    let controls = FormControlExtractor::new().extract_document(&doc, scope)?;

    let output = match format {
        "json" => serde_json::to_string_pretty(&controls)?,
        _ => format_controls(&controls),
    };
    println!("{}", output);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Fill a page and return whether every attempted control went through
/// without a problem.
pub fn cmd_fill(
    html_path: &str,
    url: &str,
    settings: &FillSettings,
    scope: Option<&str>,
    output: Option<&str>,
    annotate: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let html = std::fs::read_to_string(html_path)?;
    let mut session = build_session(url, settings)?;

    let source = build_source(settings)?;
    match source {
        Some(source) => {
            let count = session.load_from(source.as_ref())?;
            info!(count, "value records loaded");
        }
        None => warn!("no value source configured; only mappings and profile apply"),
    }

    let run = run_fill(&html, scope, &session, annotate)?;

    let trace = settings
        .trace
        .as_deref()
        .map(TraceLogger::new)
        .unwrap_or_else(TraceLogger::disabled);
    trace.log_report(&run.report);

    let rendered = match settings.format.as_str() {
        "json" => serde_json::to_string_pretty(&run.report)?,
        _ => format_fill_report(&run.report),
    };
    print!("{}", rendered);

    if let Some(path) = output {
        std::fs::write(path, run.document.to_html())?;
        info!(path, "wrote filled page");
    }

    Ok(run.report.problems() == 0)
}

fn build_session(url: &str, settings: &FillSettings) -> Result<PageSession, Box<dyn std::error::Error>> {
    let mut session = PageSession::new(url).with_profile_fallback(settings.profile_fallback);

    if let Some(path) = &settings.profile {
        session = session.with_profile(UserProfile::from_file(path)?);
    }
    if let Some(path) = &settings.mappings {
        session = session.with_mappings(SiteMappings::from_file(path)?);
    }
    if let Some(path) = &settings.data {
        session = session.with_data(DataDocument::from_json_file(path)?);
    }
    Ok(session)
}

/// `--values` file wins over an endpoint.
fn build_source(settings: &FillSettings) -> Result<Option<Box<dyn ValueSource>>, Box<dyn std::error::Error>> {
    if let Some(path) = &settings.values {
        return Ok(Some(Box::new(FileValueSource::new(path.clone()))));
    }
    match &settings.endpoint {
        Some(endpoint) => Ok(Some(Box::new(HttpValueSource::new(endpoint, settings.timeout_ms)?))),
        None => Ok(None),
    }
}

// ============================================================================
// coerce subcommand
// ============================================================================

pub fn cmd_coerce(kind: &str, value: &str, options: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let kind = ControlKind::from_type_str(kind);
    let options: Vec<ControlOption> = options
        .iter()
        .map(|raw| {
            let (value, text) = parse_option_flag(raw);
            ControlOption::new(value, text)
        })
        .collect();

    let coerced = ValueCoercer::new().coerce(&RawValue::text(value), kind, &options);
    println!("{}", serde_json::to_string(&coerced)?);
    Ok(())
}
