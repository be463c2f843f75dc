use formmaster::coerce::coercer::{CoercedValue, ValueCoercer};
use formmaster::form::control_model::{ControlKind, ControlOption};
use formmaster::resolve::profile::UserProfile;
use formmaster::resolve::value_map::RawValue;
use serde_json::json;

fn coerce(raw: impl Into<RawValue>, kind: ControlKind) -> CoercedValue {
    ValueCoercer::new().coerce(&raw.into(), kind, &[])
}

fn text(s: &str) -> CoercedValue {
    CoercedValue::Text(s.to_string())
}

fn countries() -> Vec<ControlOption> {
    vec![
        ControlOption::new("US", "United States"),
        ControlOption::new("CA", "Canada"),
    ]
}

// =========================================================================
// Checkbox
// =========================================================================

#[test]
fn checkbox_canonical_tokens() {
    assert_eq!(coerce("TRUE", ControlKind::Checkbox), CoercedValue::Bool(true));
    assert_eq!(coerce("off", ControlKind::Checkbox), CoercedValue::Bool(false));
    assert_eq!(coerce(true, ControlKind::Checkbox), CoercedValue::Bool(true));
    assert_eq!(coerce(" Unchecked ", ControlKind::Checkbox), CoercedValue::Bool(false));
    assert_eq!(coerce("enabled", ControlKind::Checkbox), CoercedValue::Bool(true));
}

#[test]
fn checkbox_other_strings_follow_emptiness() {
    assert_eq!(coerce("maybe", ControlKind::Checkbox), CoercedValue::Bool(true));
    assert_eq!(coerce("   ", ControlKind::Checkbox), CoercedValue::Bool(false));
    assert_eq!(coerce(RawValue::Number(0.0), ControlKind::Checkbox), CoercedValue::Bool(false));
}

// =========================================================================
// Select and radio
// =========================================================================

#[test]
fn select_matches_exact_then_fuzzy() {
    let coercer = ValueCoercer::new();
    let options = countries();
    let select = |raw: &str| coercer.coerce(&RawValue::text(raw), ControlKind::Select, &options);

    assert_eq!(select("Canada"), text("CA"));
    assert_eq!(select("canad"), text("CA"));
    assert_eq!(select("us"), text("US"));
    assert_eq!(select("Mexico"), text("Mexico"));
}

#[test]
fn select_option_without_value_yields_its_text() {
    let options = vec![ControlOption::new("", "Choose one"), ControlOption::new("", "Blue")];
    let coerced = ValueCoercer::new().coerce(&RawValue::text("blue"), ControlKind::Select, &options);
    assert_eq!(coerced, text("Blue"));
}

#[test]
fn null_leaves_choices_unset_and_blanks_the_rest() {
    assert_eq!(coerce(RawValue::Null, ControlKind::Select), CoercedValue::Unset);
    assert_eq!(coerce(RawValue::Null, ControlKind::Radio), CoercedValue::Unset);
    assert_eq!(coerce(RawValue::Null, ControlKind::Text), text(""));
    assert_eq!(coerce(RawValue::Null, ControlKind::Date), text(""));
    assert_eq!(coerce(RawValue::Null, ControlKind::Checkbox), text(""));
}

#[test]
fn radio_value_is_only_trimmed() {
    assert_eq!(coerce("  Email ", ControlKind::Radio), text("Email"));
}

// =========================================================================
// Text-like kinds
// =========================================================================

#[test]
fn phone_formats_ten_digits_only() {
    assert_eq!(coerce("1234567890", ControlKind::Tel), text("(123) 456-7890"));
    assert_eq!(coerce("123.456.7890", ControlKind::Tel), text("(123) 456-7890"));
    assert_eq!(coerce(" 12345 ", ControlKind::Tel), text("12345"));
    assert_eq!(coerce("+44 20 7946 0958", ControlKind::Tel), text("+44 20 7946 0958"));
}

#[test]
fn url_gains_a_scheme_when_missing() {
    assert_eq!(coerce("example.com", ControlKind::Url), text("https://example.com"));
    assert_eq!(coerce("http://example.com", ControlKind::Url), text("http://example.com"));
    assert_eq!(coerce("HTTPS://Example.com", ControlKind::Url), text("HTTPS://Example.com"));
}

#[test]
fn passwords_are_never_filled() {
    assert_eq!(coerce("hunter2", ControlKind::Password), text(""));
    assert_eq!(coerce(true, ControlKind::Password), text(""));
}

#[test]
fn textarea_keeps_inner_newlines() {
    assert_eq!(
        coerce("  line one\nline two  \n", ControlKind::Textarea),
        text("line one\nline two")
    );
}

#[test]
fn text_passes_trimmed_value_through() {
    assert_eq!(coerce(" Ada ", ControlKind::Text), text("Ada"));
    assert_eq!(coerce(RawValue::Number(7.0), ControlKind::Text), text("7"));
}

#[test]
fn email_without_at_sign_uses_profile_address() {
    let profile = UserProfile::new(json!({"personal": {"email": "ada@example.com"}}));
    let with_profile = ValueCoercer::with_profile(&profile);

    assert_eq!(
        with_profile.coerce(&RawValue::text("ada"), ControlKind::Email, &[]),
        text("ada@example.com")
    );
    assert_eq!(
        with_profile.coerce(&RawValue::text("ada@work.org"), ControlKind::Email, &[]),
        text("ada@work.org")
    );
    assert_eq!(coerce("ada", ControlKind::Email), text("ada"));
}

// =========================================================================
// Numbers, dates and times
// =========================================================================

#[test]
fn numbers_parse_or_pass_through() {
    assert_eq!(coerce("42", ControlKind::Number), CoercedValue::Number(42.0));
    assert_eq!(coerce("3.5 kg", ControlKind::Range), CoercedValue::Number(3.5));
    assert_eq!(coerce(" lots ", ControlKind::Number), text("lots"));
    assert_eq!(CoercedValue::Number(42.0).as_text(), "42");
}

#[test]
fn large_numbers_are_written_back_unchanged() {
    let written = coerce("12345678901234567890", ControlKind::Number).as_text();
    assert_eq!(written.len(), 20);
    assert_eq!(written.parse::<f64>().unwrap(), 12345678901234567890.0);
    assert_ne!(written, i64::MAX.to_string());

    assert_eq!(coerce("1e20", ControlKind::Range).as_text(), "100000000000000000000");
}

#[test]
fn dates_normalise_to_iso() {
    assert_eq!(coerce("03/15/2024", ControlKind::Date), text("2024-03-15"));
    assert_eq!(coerce("2024-03-15T23:30:00Z", ControlKind::Date), text("2024-03-15"));
    assert_eq!(coerce("March 15, 2024", ControlKind::Date), text("2024-03-15"));
    assert_eq!(coerce("2024-03", ControlKind::Date), text("2024-03-01"));
}

#[test]
fn malformed_dates_and_times_pass_through() {
    assert_eq!(coerce(" someday ", ControlKind::Date), text("someday"));
    assert_eq!(coerce("", ControlKind::Date), text(""));
    assert_eq!(coerce("25:99", ControlKind::Time), text("25:99"));
}

#[test]
fn times_render_as_hours_and_minutes() {
    assert_eq!(coerce("14:30:15", ControlKind::Time), text("14:30"));
    assert_eq!(coerce("09:05", ControlKind::Time), text("09:05"));
}
