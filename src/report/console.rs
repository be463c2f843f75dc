use crate::fill::plan::{FillOutcome, FillReport, ValueOrigin};
use crate::form::control_model::{ControlDescriptor, ExtractedControls};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a fill report for terminal output.
///
/// Produces output like:
/// ```text
/// === Fill: https://example.com/signup ===
///
/// ✓ FILLED     first_name (text) = "Ada" [value-map: Id via 'first_name']
/// · UNMATCHED  nickname (text)
/// ✗ NO OPTION  country (select) = "Atlantis"
///
/// === Results: 1 filled, 1 unmatched, 1 problems (3 total) ===
/// ```
pub fn format_fill_report(report: &FillReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Fill: {} ===\n\n", report.url));

    for result in &report.results {
        let (marker, status) = outcome_marker(&result.outcome);
        let name = if result.field.is_empty() {
            result.label.as_deref().unwrap_or("<unnamed>")
        } else {
            result.field.as_str()
        };

        out.push_str(&format!("{} {:<10} {} ({})", marker, status, name, result.kind.as_str()));

        match &result.outcome {
            FillOutcome::Filled { value } | FillOutcome::NoOptionMatched { value } => {
                out.push_str(&format!(" = {:?}", value));
            }
            FillOutcome::Skipped { reason } | FillOutcome::MappingFailed { reason } => {
                out.push_str(&format!(": {}", reason));
            }
            FillOutcome::Unmatched | FillOutcome::ElementNotFound => {}
        }

        if let Some(origin) = &result.origin {
            out.push_str(&format!(" [{}]", describe_origin(origin)));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\n=== Results: {} filled, {} unmatched, {} problems ({} total) ===\n",
        report.filled(),
        report.unmatched(),
        report.problems(),
        report.results.len()
    ));

    out
}

fn outcome_marker(outcome: &FillOutcome) -> (&'static str, &'static str) {
    match outcome {
        FillOutcome::Filled { .. } => ("\u{2713}", "FILLED"),
        FillOutcome::Unmatched => ("\u{b7}", "UNMATCHED"),
        FillOutcome::Skipped { .. } => ("\u{b7}", "SKIPPED"),
        FillOutcome::NoOptionMatched { .. } => ("\u{2717}", "NO OPTION"),
        FillOutcome::MappingFailed { .. } => ("\u{2717}", "MAPPING"),
        FillOutcome::ElementNotFound => ("\u{2717}", "MISSING"),
    }
}

fn describe_origin(origin: &ValueOrigin) -> String {
    match origin {
        ValueOrigin::Mapping { key } => format!("mapping: {}", key),
        ValueOrigin::ValueMap { strategy, matched_key } => {
            format!("value-map: {:?} via '{}'", strategy, matched_key)
        }
        ValueOrigin::Profile { path } => format!("profile: {}", path),
    }
}

/// Format extracted controls grouped by category.
pub fn format_controls(controls: &ExtractedControls) -> String {
    let mut out = String::new();

    let groups: [(&str, &[ControlDescriptor]); 6] = [
        ("Inputs", &controls.inputs),
        ("Selects", &controls.selects),
        ("Textareas", &controls.textareas),
        ("Radio groups", &controls.radios),
        ("Checkboxes", &controls.checkboxes),
        ("Buttons", &controls.buttons),
    ];

    for (title, group) in groups {
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("{} ({}):\n", title, group.len()));
        for control in group {
            out.push_str(&format!("  - {}\n", describe_control(control)));
            for option in &control.options {
                let marker = if option.selected { "*" } else { " " };
                out.push_str(&format!("      {} {} = {:?}\n", marker, option.value, option.text));
            }
        }
    }

    out.push_str(&format!("\n{} controls\n", controls.len()));
    out
}

fn describe_control(control: &ControlDescriptor) -> String {
    let mut parts = vec![control.kind().as_str().to_string()];
    if !control.id.is_empty() {
        parts.push(format!("#{}", control.id));
    }
    if !control.name.is_empty() {
        parts.push(format!("name={}", control.name));
    }
    if let Some(label) = control.label.as_deref().filter(|l| !l.is_empty()) {
        parts.push(format!("label={:?}", label));
    }
    if control.required {
        parts.push("required".to_string());
    }
    parts.join(" ")
}
