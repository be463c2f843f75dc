use tracing::{debug, warn};

use crate::coerce::coercer::CoercedValue;
use crate::dom::accessor::{DomEvent, ElementMutator, NodeId};
use crate::error::FillError;
use crate::form::control_model::{ControlDescriptor, ControlKind};
use crate::fill::plan::{FieldResult, FillCommand, FillOutcome, FillReport, PlannedAction, PlannedField};

/// Write every planned value into `dom` and collect one result per control.
///
/// A vanished element only affects its own control; the pass always runs
/// to the end.
pub fn apply_fill<D: ElementMutator>(dom: &mut D, url: &str, planned: &[PlannedField]) -> FillReport {
    let mut report = FillReport::new(url);

    for field in planned {
        let result = match &field.action {
            PlannedAction::Settle(outcome) => FieldResult::new(&field.control, None, outcome.clone()),
            PlannedAction::Assign(command) => {
                let outcome = match apply_command(dom, &field.control, command) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(error = %e, "fill abandoned for control");
                        FillOutcome::ElementNotFound
                    }
                };
                FieldResult::new(&field.control, Some(command.origin.clone()), outcome)
            }
        };
        report.push(result);
    }

    debug!(
        url,
        filled = report.filled(),
        unmatched = report.unmatched(),
        problems = report.problems(),
        "fill pass complete"
    );
    report
}

pub fn apply_command<D: ElementMutator>(
    dom: &mut D,
    control: &ControlDescriptor,
    command: &FillCommand,
) -> Result<FillOutcome, FillError> {
    let value = &command.value;

    match control.kind() {
        ControlKind::Radio => fill_radio(dom, control, value),
        ControlKind::Checkbox => {
            let el = live_element(dom, control)?;
            let checked = value.is_truthy();
            if checked {
                dom.set_attr(el, "checked", "");
            } else {
                dom.remove_attr(el, "checked");
            }
            dom.dispatch(el, DomEvent::Change);
            dom.dispatch(el, DomEvent::Input);
            Ok(FillOutcome::Filled {
                value: checked.to_string(),
            })
        }
        ControlKind::Select | ControlKind::SelectMultiple => {
            let el = live_element(dom, control)?;
            let text = value.as_text();
            let outcome = if select_option(dom, el, &text) {
                FillOutcome::Filled { value: text }
            } else {
                dom.set_value(el, &text);
                FillOutcome::NoOptionMatched { value: text }
            };
            dom.dispatch(el, DomEvent::Change);
            Ok(outcome)
        }
        ControlKind::Button => Ok(FillOutcome::Skipped {
            reason: "buttons are never filled".to_string(),
        }),
        ControlKind::Text
        | ControlKind::Search
        | ControlKind::Email
        | ControlKind::Password
        | ControlKind::Date
        | ControlKind::Time
        | ControlKind::Number
        | ControlKind::Range
        | ControlKind::Tel
        | ControlKind::Url
        | ControlKind::Hidden
        | ControlKind::Textarea => {
            let el = live_element(dom, control)?;
            let text = value.as_text();
            dom.set_value(el, &text);
            dom.dispatch(el, DomEvent::Change);
            dom.dispatch(el, DomEvent::Input);
            Ok(FillOutcome::Filled { value: text })
        }
    }
}

fn is_attached<D: ElementMutator>(dom: &D, el: NodeId) -> bool {
    dom.tag_name(el).is_some() && dom.contains(dom.body(), el)
}

fn live_element<D: ElementMutator>(dom: &D, control: &ControlDescriptor) -> Result<NodeId, FillError> {
    control
        .element
        .filter(|&el| is_attached(dom, el))
        .ok_or_else(|| FillError::ElementNotFound {
            target: control.field_key().to_string(),
            context: format!("{} control is no longer attached", control.kind().as_str()),
        })
}

/// Mark the first option whose value, then text, equals `value`.
fn select_option<D: ElementMutator>(dom: &mut D, select: NodeId, value: &str) -> bool {
    let options = dom.query_tags(select, &["option"]);
    let chosen = options
        .iter()
        .copied()
        .find(|&o| dom.option_value(o) == value)
        .or_else(|| {
            options
                .iter()
                .copied()
                .find(|&o| dom.text_content(o).trim() == value)
        });

    let Some(chosen) = chosen else {
        return false;
    };
    for option in options {
        if option == chosen {
            dom.set_attr(option, "selected", "");
        } else {
            dom.remove_attr(option, "selected");
        }
    }
    true
}

/// Pick the group member for `value`: exact value, case-insensitive value,
/// value or id containing the value, then option label text.
fn fill_radio<D: ElementMutator>(
    dom: &mut D,
    control: &ControlDescriptor,
    value: &CoercedValue,
) -> Result<FillOutcome, FillError> {
    let view: &D = dom;
    let members: Vec<_> = control
        .options
        .iter()
        .filter_map(|o| o.element.map(|el| (o, el)))
        .filter(|&(_, el)| is_attached(view, el))
        .collect();
    if members.is_empty() {
        return Err(FillError::ElementNotFound {
            target: control.field_key().to_string(),
            context: "no radio of the group is attached".to_string(),
        });
    }

    let wanted = value.as_text();
    let lowered = wanted.to_lowercase();

    let chosen = members
        .iter()
        .find(|(o, _)| o.value == wanted)
        .or_else(|| members.iter().find(|(o, _)| o.value.to_lowercase() == lowered))
        .or_else(|| {
            members.iter().find(|(o, _)| {
                o.value.to_lowercase().contains(&lowered) || (!o.id.is_empty() && o.id.to_lowercase().contains(&lowered))
            })
        })
        .or_else(|| {
            members.iter().find(|(o, _)| {
                let text = o.text.to_lowercase();
                !text.is_empty() && (text == lowered || text.contains(&lowered))
            })
        })
        .map(|&(o, el)| (o.value.clone(), el));

    let Some((chosen_value, chosen_el)) = chosen else {
        return Ok(FillOutcome::NoOptionMatched { value: wanted });
    };

    for &(_, el) in &members {
        if el == chosen_el {
            dom.set_attr(el, "checked", "");
        } else {
            dom.remove_attr(el, "checked");
        }
    }
    dom.dispatch(chosen_el, DomEvent::Change);
    dom.dispatch(chosen_el, DomEvent::Click);

    Ok(FillOutcome::Filled { value: chosen_value })
}
