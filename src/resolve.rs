//! Element resolution: turning a schema subtree plus the current field
//! values into the ordered, flattened list of elements to render.
//!
//! Resolution is pure and restartable — it never mutates the store or the
//! config, so callers can re-resolve after every edit.

use log::debug;
use serde_json::Value;

use crate::enums::ComponentKind;
use crate::primitives::{value_is_empty, value_to_bool, value_to_string};
use crate::store::ValueLookup;
use crate::types::Element;

// ─── Widget dispatch ────────────────────────────────────────────────────────

/// Render target for an element. One table maps the closed component
/// catalog onto widgets; anything outside the catalog becomes the
/// diagnostic placeholder instead of falling through silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Widget {
    TextInput,
    SelectOne,
    SelectMany,
    RadioGroup,
    Checkbox,
    TextArea,
    ImageUpload,
    ImageGallery,
    LocationCapture,
    InfoLabel,
    PincodeInput,
    /// Placeholder for unrecognized component tags; renders the tag,
    /// api key and label so the schema author sees what went wrong.
    Unrecognized,
}

pub fn widget_for(kind: &ComponentKind) -> Widget {
    match kind {
        ComponentKind::TextField => Widget::TextInput,
        ComponentKind::Dropdown => Widget::SelectOne,
        ComponentKind::MultiDropdown => Widget::SelectMany,
        ComponentKind::RadioButton | ComponentKind::RadioButtonGroup => Widget::RadioGroup,
        ComponentKind::Checkbox => Widget::Checkbox,
        ComponentKind::TextArea => Widget::TextArea,
        ComponentKind::Image => Widget::ImageUpload,
        ComponentKind::DynamicImages => Widget::ImageGallery,
        ComponentKind::Location => Widget::LocationCapture,
        ComponentKind::Label => Widget::InfoLabel,
        ComponentKind::Pincode => Widget::PincodeInput,
        ComponentKind::Unrecognized(_) => Widget::Unrecognized,
    }
}

/// One entry of the resolved render list.
#[derive(Clone, Debug)]
pub struct RenderedElement<'a> {
    pub element: &'a Element,
    pub widget: Widget,
    /// Nesting level: 0 for top-level elements, +1 per dependent group.
    pub depth: usize,
}

// ─── Visibility resolution ──────────────────────────────────────────────────

/// Resolve a section's element list into the elements that should render
/// right now. Output order matches input order, with expanded dependent
/// groups spliced immediately after their trigger element.
pub fn resolve_visible<'a>(
    elements: &'a [Element],
    values: &impl ValueLookup,
) -> Vec<RenderedElement<'a>> {
    let mut out = Vec::new();
    resolve_into(elements, values, 0, &mut out);
    out
}

fn resolve_into<'a>(
    elements: &'a [Element],
    values: &impl ValueLookup,
    depth: usize,
    out: &mut Vec<RenderedElement<'a>>,
) {
    for element in elements {
        if !element.visible {
            continue;
        }

        let widget = widget_for(&element.component);
        if widget == Widget::Unrecognized {
            debug!(
                "unrecognized component tag '{}' (apiKey: {:?})",
                element.component.as_tag(),
                element.api_key
            );
        }
        out.push(RenderedElement { element, widget, depth });

        let current = element
            .api_key
            .as_deref()
            .map(|k| values.current(k))
            .unwrap_or(&Value::Null);
        if should_expand_dependents(element, current) {
            resolve_into(element.dependents(), values, depth + 1, out);
        }
    }
}

/// Whether an element's dependent fields are revealed by its current value.
///
/// The comparison follows the trigger's runtime type: a boolean trigger
/// casts the current value to boolean (so `true` and `"true"` agree), a
/// string trigger casts the current value to string, anything else
/// compares directly. An empty current value never expands — no answer is
/// not the same as answering `false`.
pub fn should_expand_dependents(element: &Element, current: &Value) -> bool {
    if element.dependents().is_empty() {
        return false;
    }
    let Some(trigger) = element.trigger_value.as_ref() else {
        return false;
    };
    if trigger.is_null() || value_is_empty(current) {
        return false;
    }

    if element.component.is_single_select() {
        return match trigger {
            Value::Bool(b) => value_to_bool(current) == *b,
            Value::String(s) => value_to_string(current) == *s,
            other => current == other,
        };
    }

    if element.component.is_checkbox_like() {
        return current == &Value::Bool(true);
    }

    false
}

/// The auxiliary info elements shown when the current value equals the
/// element's restricting value; empty otherwise.
pub fn restricted_details_for<'a>(element: &'a Element, current: &Value) -> &'a [Element] {
    let Some(restrict) = element.restrict_value.as_ref() else {
        return &[];
    };
    let Some(details) = element.restricted_details.as_deref() else {
        return &[];
    };
    if value_is_empty(current) {
        return &[];
    }

    let matches = match restrict {
        Value::Bool(b) => value_to_bool(current) == *b,
        Value::String(s) => value_to_string(current) == *s,
        other => current == other,
    };
    if matches { details } else { &[] }
}

// ─── Key collection ─────────────────────────────────────────────────────────

/// Every api key reachable from the given elements, including nested
/// dependent and restricted subtrees regardless of current visibility.
/// This is the key set a section reset clears.
pub fn collect_api_keys(elements: &[Element]) -> Vec<String> {
    let mut keys = Vec::new();
    collect_into(elements, &mut keys);
    keys
}

fn collect_into(elements: &[Element], keys: &mut Vec<String>) {
    for element in elements {
        if let Some(key) = &element.api_key {
            keys.push(key.clone());
        }
        collect_into(element.dependents(), keys);
        if let Some(details) = element.restricted_details.as_deref() {
            collect_into(details, keys);
        }
    }
}
