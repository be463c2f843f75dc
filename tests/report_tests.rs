mod common;

use common::utils::{extract, fixture};
use formmaster::fill::plan::{FieldResult, FillOutcome, FillReport, ValueOrigin};
use formmaster::form::control_model::{ControlDescriptor, ControlKind};
use formmaster::report::console::{format_controls, format_fill_report};
use formmaster::resolve::resolver::MatchStrategy;

fn mixed_report() -> FillReport {
    let mut report = FillReport::new("https://example.com/signup");
    report.push(FieldResult::new(
        &ControlDescriptor::new(ControlKind::Text).with_id("first_name"),
        Some(ValueOrigin::ValueMap {
            strategy: MatchStrategy::Id,
            matched_key: "first_name".into(),
        }),
        FillOutcome::Filled { value: "Ada".into() },
    ));
    report.push(FieldResult::new(
        &ControlDescriptor::new(ControlKind::Text).with_name("nickname"),
        None,
        FillOutcome::Unmatched,
    ));
    report.push(FieldResult::new(
        &ControlDescriptor::new(ControlKind::Select).with_id("country"),
        Some(ValueOrigin::Mapping { key: "country".into() }),
        FillOutcome::NoOptionMatched {
            value: "Atlantis".into(),
        },
    ));
    report.push(FieldResult::new(
        &ControlDescriptor::new(ControlKind::Password).with_id("pw"),
        None,
        FillOutcome::Skipped {
            reason: "password fields are never filled".into(),
        },
    ));
    report
}

// ============================================================================
// Fill report
// ============================================================================

#[test]
fn fill_report_counts() {
    let report = mixed_report();
    assert_eq!(report.filled(), 1);
    assert_eq!(report.unmatched(), 1);
    assert_eq!(report.problems(), 1);
    assert_eq!(report.results.len(), 4);
}

#[test]
fn console_report_markers() {
    let output = format_fill_report(&mixed_report());
    assert!(output.contains("=== Fill: https://example.com/signup ==="));
    assert!(output.contains("\u{2713} FILLED     first_name (text) = \"Ada\" [value-map: Id via 'first_name']"));
    assert!(output.contains("\u{b7} UNMATCHED  nickname (text)"));
    assert!(output.contains("\u{2717} NO OPTION  country (select) = \"Atlantis\" [mapping: country]"));
    assert!(output.contains("SKIPPED    pw (password): password fields are never filled"));
}

#[test]
fn console_report_summary_line() {
    let output = format_fill_report(&mixed_report());
    assert!(output.contains("=== Results: 1 filled, 1 unmatched, 1 problems (4 total) ==="));
}

#[test]
fn unnamed_control_falls_back_to_label() {
    let mut report = FillReport::new("u");
    report.push(FieldResult::new(
        &ControlDescriptor::new(ControlKind::Text).with_label("Favourite colour"),
        None,
        FillOutcome::Unmatched,
    ));
    assert!(format_fill_report(&report).contains("UNMATCHED  Favourite colour (text)"));
}

#[test]
fn fill_report_json_uses_tagged_outcomes() {
    let json = serde_json::to_value(mixed_report()).unwrap();
    let first = &json["results"][0];
    assert_eq!(first["field"], "first_name");
    assert_eq!(first["type"], "text");
    assert_eq!(first["outcome"]["status"], "filled");
    assert_eq!(first["origin"]["source"], "value-map");
    assert_eq!(json["results"][2]["outcome"]["status"], "no-option-matched");
}

// ============================================================================
// Extracted controls
// ============================================================================

#[test]
fn controls_listing_groups_by_category() {
    let (_, controls) = extract(&fixture("signup_form.html"));
    let output = format_controls(&controls);

    assert!(output.contains("Inputs (7):"));
    assert!(output.contains("Selects (1):"));
    assert!(output.contains("Radio groups (1):"));
    assert!(output.contains("Buttons (2):"));
    assert!(output.contains("  - text #fn name=first_name label=\"First name\" required"));
    assert!(output.contains("CA = \"Canada\""));
    assert!(output.contains(&format!("\n{} controls\n", controls.len())));
}
