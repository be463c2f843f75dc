mod common;

use std::io::Write;

use common::utils::{by_key, extract, fixture, page};
use formmaster::bridge::source::FileValueSource;
use formmaster::dom::accessor::{DomEvent, ElementAccessor, ElementMutator};
use formmaster::fill::plan::{FillOutcome, FillReport, ValueOrigin};
use formmaster::fill::session::{INDICATOR_ATTR, PageSession};
use formmaster::resolve::mapping::{FieldMapping, MappingRule, MappingSet, RegexSource, SiteMappings};
use formmaster::resolve::profile::UserProfile;
use formmaster::resolve::resolver::MatchStrategy;
use formmaster::resolve::value_map::{RawValue, ValueMapEntry};
use formmaster::run_fill;
use serde_json::json;

const URL: &str = "https://example.com/signup";

fn signup_values() -> Vec<ValueMapEntry> {
    vec![
        ValueMapEntry::new("first_name", "Ada"),
        ValueMapEntry::new("last name", "Lovelace"),
        ValueMapEntry::new("email", "ada@example.com"),
        ValueMapEntry::new("mobile", "555 123 4567"),
        ValueMapEntry::new("website", "adalovelace.dev"),
        ValueMapEntry::new("dob", "December 10, 1815"),
        ValueMapEntry::new("country", "Canada"),
        ValueMapEntry::new("contact_pref", "Phone"),
        ValueMapEntry::new("newsletter", "yes"),
        ValueMapEntry::new("password", "hunter2"),
    ]
}

fn session_with(entries: Vec<ValueMapEntry>) -> PageSession {
    let mut session = PageSession::new(URL);
    session.initialize(entries);
    session
}

fn outcome<'a>(report: &'a FillReport, field: &str) -> &'a FillOutcome {
    &report
        .result_for(field)
        .unwrap_or_else(|| panic!("no result for '{}'", field))
        .outcome
}

fn filled(value: &str) -> FillOutcome {
    FillOutcome::Filled {
        value: value.to_string(),
    }
}

// =========================================================================
// Full page
// =========================================================================

#[test]
fn fills_the_signup_form() {
    let session = session_with(signup_values());
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();
    let report = &run.report;

    assert_eq!(outcome(report, "fn"), &filled("Ada"));
    assert_eq!(outcome(report, "ln"), &filled("Lovelace"));
    assert_eq!(outcome(report, "contact_email"), &filled("ada@example.com"));
    assert_eq!(outcome(report, "mobile_number"), &filled("(555) 123-4567"));
    assert_eq!(outcome(report, "site"), &filled("https://adalovelace.dev"));
    assert_eq!(outcome(report, "dob"), &filled("1815-12-10"));
    assert_eq!(outcome(report, "country"), &filled("CA"));
    assert_eq!(outcome(report, "contact_pref"), &filled("phone"));
    assert_eq!(outcome(report, "newsletter"), &filled("true"));
    assert!(matches!(outcome(report, "pw"), FillOutcome::Skipped { .. }));
    assert_eq!(outcome(report, "bio"), &FillOutcome::Unmatched);

    assert_eq!(report.filled(), 9);
    assert_eq!(report.unmatched(), 1);
    assert_eq!(report.problems(), 0);
    assert_eq!(report.results.len(), run.controls.fillable().count());
}

#[test]
fn report_names_the_waterfall_step_used() {
    let session = session_with(signup_values());
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    let origin = |field: &str| run.report.result_for(field).unwrap().origin.clone();
    assert_eq!(
        origin("fn"),
        Some(ValueOrigin::ValueMap {
            strategy: MatchStrategy::Name,
            matched_key: "first_name".into()
        })
    );
    assert_eq!(
        origin("ln"),
        Some(ValueOrigin::ValueMap {
            strategy: MatchStrategy::Label,
            matched_key: "last name".into()
        })
    );
    assert_eq!(
        origin("contact_email"),
        Some(ValueOrigin::ValueMap {
            strategy: MatchStrategy::PartialLabel,
            matched_key: "email".into()
        })
    );
    assert_eq!(origin("bio"), None);
}

#[test]
fn assignments_reach_the_document_and_notify_scripts() {
    let session = session_with(signup_values());
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();
    let doc = &run.document;

    let first = by_key(&run.controls, "fn").element.unwrap();
    assert_eq!(doc.current_value(first), "Ada");
    assert_eq!(doc.events_for(first), vec![DomEvent::Change, DomEvent::Input]);

    let country = by_key(&run.controls, "country").element.unwrap();
    assert_eq!(doc.current_value(country), "CA");
    assert_eq!(doc.events_for(country), vec![DomEvent::Change]);

    let newsletter = by_key(&run.controls, "newsletter").element.unwrap();
    assert!(doc.attr(newsletter, "checked").is_some());

    let phone = doc.element_by_id("pref-phone").unwrap();
    let email = doc.element_by_id("pref-email").unwrap();
    assert!(doc.attr(phone, "checked").is_some());
    assert!(doc.attr(email, "checked").is_none());
    assert_eq!(doc.events_for(phone), vec![DomEvent::Change, DomEvent::Click]);

    let password = by_key(&run.controls, "pw").element.unwrap();
    assert!(doc.events_for(password).is_empty());
    assert!(run.document.to_html().contains(r#"value="Ada""#));
}

// =========================================================================
// Choice controls
// =========================================================================

#[test]
fn select_without_matching_option_is_reported() {
    let session = session_with(vec![ValueMapEntry::new("country", "Mexico")]);
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    assert_eq!(
        outcome(&run.report, "country"),
        &FillOutcome::NoOptionMatched {
            value: "Mexico".into()
        }
    );
    assert_eq!(run.report.problems(), 1);
}

#[test]
fn radio_without_matching_member_checks_nothing() {
    let session = session_with(vec![ValueMapEntry::new("contact_pref", "fax")]);
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    assert!(matches!(outcome(&run.report, "contact_pref"), FillOutcome::NoOptionMatched { .. }));
    for id in ["pref-email", "pref-phone"] {
        let radio = run.document.element_by_id(id).unwrap();
        assert!(run.document.attr(radio, "checked").is_none());
        assert!(run.document.events_for(radio).is_empty());
    }
}

#[test]
fn radio_matches_by_label_text() {
    let html = page(
        r#"<div class="radio-group">
             <label><input type="radio" name="size" value="s"> Small</label>
             <label><input type="radio" name="size" value="l"> Large</label>
           </div>"#,
    );
    let session = session_with(vec![ValueMapEntry::new("size", "Large")]);
    let run = run_fill(&html, None, &session, false).unwrap();
    assert_eq!(outcome(&run.report, "size"), &filled("l"));
}

#[test]
fn null_value_leaves_select_untouched() {
    let session = session_with(vec![ValueMapEntry::new("country", RawValue::Null)]);
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    assert!(matches!(outcome(&run.report, "country"), FillOutcome::Skipped { .. }));
    let country = by_key(&run.controls, "country").element.unwrap();
    assert!(run.document.events_for(country).is_empty());
}

// =========================================================================
// Page mutation
// =========================================================================

#[test]
fn detached_control_does_not_stop_the_pass() {
    let (mut doc, controls) = extract(&fixture("signup_form.html"));
    let first = by_key(&controls, "fn").element.unwrap();
    doc.detach(first);

    let session = session_with(signup_values());
    let report = session.fill(&mut doc, &controls);

    assert_eq!(outcome(&report, "fn"), &FillOutcome::ElementNotFound);
    assert_eq!(outcome(&report, "ln"), &filled("Lovelace"));
    assert_eq!(report.filled(), 8);
    assert_eq!(report.problems(), 1);
    assert!(doc.events_for(first).is_empty());
}

// =========================================================================
// Mappings and profile
// =========================================================================

#[test]
fn site_mapping_overrides_the_value_map() {
    let mut set = MappingSet::default();
    set.insert("fn", FieldMapping::Direct("Augusta".into()));
    set.insert(
        "ln",
        FieldMapping::Rule(MappingRule::Regex {
            pattern: "([".into(),
            source: RegexSource::Text,
        }),
    );
    let mut sites = SiteMappings::default();
    sites.insert("https://example.com", set);

    let mut session = PageSession::new(URL).with_mappings(sites);
    session.initialize(signup_values());
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    assert_eq!(outcome(&run.report, "fn"), &filled("Augusta"));
    assert_eq!(
        run.report.result_for("fn").unwrap().origin,
        Some(ValueOrigin::Mapping { key: "fn".into() })
    );
    assert!(matches!(outcome(&run.report, "ln"), FillOutcome::MappingFailed { .. }));
    assert_eq!(outcome(&run.report, "contact_email"), &filled("ada@example.com"));
}

#[test]
fn profile_fills_what_the_value_map_misses() {
    let profile = UserProfile::new(json!({
        "personal": {"firstName": "Ada", "lastName": "King"}
    }));
    let session = PageSession::new(URL).with_profile(profile.clone());
    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();

    assert_eq!(outcome(&run.report, "fn"), &filled("Ada"));
    assert_eq!(outcome(&run.report, "ln"), &filled("King"));
    assert_eq!(
        run.report.result_for("ln").unwrap().origin,
        Some(ValueOrigin::Profile {
            path: "personal.lastName".into()
        })
    );

    let disabled = PageSession::new(URL)
        .with_profile(profile)
        .with_profile_fallback(false);
    let run = run_fill(&fixture("signup_form.html"), None, &disabled, false).unwrap();
    assert_eq!(outcome(&run.report, "fn"), &FillOutcome::Unmatched);
}

// =========================================================================
// Session state
// =========================================================================

#[test]
fn reinitialising_replaces_the_value_map() {
    let mut session = PageSession::new(URL);
    session.initialize(signup_values());
    session.initialize(vec![ValueMapEntry::new("bio", "Mathematician")]);

    assert_eq!(session.values().len(), 1);
    assert!(session.values().get("first_name").is_none());

    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();
    assert_eq!(outcome(&run.report, "bio"), &filled("Mathematician"));
    assert_eq!(outcome(&run.report, "fn"), &FillOutcome::Unmatched);
}

#[test]
fn annotating_twice_does_not_stack_indicators() {
    let session = session_with(signup_values());
    let mut run = run_fill(&fixture("signup_form.html"), None, &session, true).unwrap();

    let marker = format!("{}=", INDICATOR_ATTR);
    let first_pass = run.document.to_html().matches(&marker).count();
    assert_eq!(first_pass, run.report.filled());

    let added = session.annotate(&mut run.document, &run.controls, &run.report);
    assert_eq!(added, first_pass);
    assert_eq!(run.document.to_html().matches(&marker).count(), first_pass);

    assert_eq!(session.clear_indicators(&mut run.document), first_pass);
    assert_eq!(run.document.to_html().matches(&marker).count(), 0);
}

#[test]
fn refilling_annotated_output_resolves_the_same_way() {
    let session = session_with(vec![
        ValueMapEntry::new("name", "Ada Lovelace"),
        ValueMapEntry::new("last name", "Lovelace"),
    ]);
    let html = page(r#"<div><label>Last name <input name="x1"></label></div>"#);
    let expected_origin = Some(ValueOrigin::ValueMap {
        strategy: MatchStrategy::Label,
        matched_key: "last name".into(),
    });

    let first = run_fill(&html, None, &session, true).unwrap();
    assert_eq!(outcome(&first.report, "x1"), &filled("Lovelace"));
    let label = first.document.select_first("label").unwrap().unwrap();
    assert!(!first.document.text_content(label).contains('\u{2713}'));

    let second = run_fill(&first.document.to_html(), None, &session, true).unwrap();
    assert_eq!(outcome(&second.report, "x1"), &filled("Lovelace"));
    assert_eq!(second.report.result_for("x1").unwrap().origin, expected_origin);
    assert_eq!(first.report.result_for("x1").unwrap().origin, expected_origin);

    let marker = format!("{}=", INDICATOR_ATTR);
    assert_eq!(second.document.to_html().matches(&marker).count(), 1);
}

#[test]
fn values_load_from_a_file_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"success": true, "fields": [
            {{"key": "first_name", "value": "Ada"}},
            {{"key": "news", "name": "newsletter", "label": "Send me news", "value": false}}
        ]}}"#
    )
    .unwrap();

    let mut session = PageSession::new(URL);
    let count = session
        .load_from(&FileValueSource::new(file.path().to_str().unwrap()))
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(session.values().len(), 4);

    let run = run_fill(&fixture("signup_form.html"), None, &session, false).unwrap();
    assert_eq!(outcome(&run.report, "fn"), &filled("Ada"));
    assert_eq!(outcome(&run.report, "newsletter"), &filled("false"));
}

#[test]
fn scope_limits_the_fill() {
    let html = page(
        r#"<form id="a"><input id="city"></form>
           <form id="b"><input id="city2" name="city"></form>"#,
    );
    let session = session_with(vec![ValueMapEntry::new("city", "Paris")]);
    let run = run_fill(&html, Some("#b"), &session, false).unwrap();

    assert_eq!(run.report.results.len(), 1);
    assert_eq!(outcome(&run.report, "city2"), &filled("Paris"));
}
