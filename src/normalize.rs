use crate::enums::{ComponentKind, FieldKind};
use crate::types::{Element, PageConfig, ValidationRules};

/// Pincode elements validate against a fixed six-digit format.
const PINCODE_PATTERN: &str = "^[0-9]{6}$";
const PINCODE_MESSAGE: &str = "Please enter a valid 6-digit pincode";

/// Normalize a validated page config into its canonical fully-expanded
/// form: field kinds are materialized and kind-specific defaults applied.
///
/// This is idempotent: `normalize(normalize(config)) == normalize(config)`.
pub fn normalize(mut config: PageConfig) -> PageConfig {
    for_each_element_mut(&mut config, &mut |element| {
        materialize_field_kind(element);
        expand_pincode(element);
    });
    config
}

fn for_each_element_mut(config: &mut PageConfig, f: &mut impl FnMut(&mut Element)) {
    for tab in &mut config.tabs {
        for section in &mut tab.sections {
            visit_mut(&mut section.elements, f);
        }
    }
}

fn visit_mut(elements: &mut [Element], f: &mut impl FnMut(&mut Element)) {
    for element in elements {
        f(element);
        if let Some(deps) = &mut element.dependent_fields {
            visit_mut(deps, f);
        }
        if let Some(details) = &mut element.restricted_details {
            visit_mut(details, f);
        }
    }
}

/// Elements without an explicit `type` get the natural kind for their
/// component, so validation dispatch never sees an absent kind.
fn materialize_field_kind(element: &mut Element) {
    if element.field_type.is_some() {
        return;
    }
    element.field_type = Some(match &element.component {
        ComponentKind::Dropdown | ComponentKind::MultiDropdown => FieldKind::Dropdown,
        ComponentKind::RadioButton | ComponentKind::RadioButtonGroup => FieldKind::Radio,
        ComponentKind::Checkbox => FieldKind::Boolean,
        ComponentKind::Image | ComponentKind::DynamicImages => FieldKind::Image,
        ComponentKind::Label => FieldKind::Info,
        _ => FieldKind::Text,
    });
}

/// A pincode element is a text field with the built-in six-digit pattern;
/// an author-supplied pattern wins.
fn expand_pincode(element: &mut Element) {
    if element.component != ComponentKind::Pincode {
        return;
    }
    element.field_type = Some(FieldKind::Text);
    let rules = element.validation.get_or_insert_with(ValidationRules::default);
    if rules.pattern.is_none() {
        rules.pattern = Some(PINCODE_PATTERN.to_string());
    }
    if rules.pattern_message.is_none() {
        rules.pattern_message = Some(PINCODE_MESSAGE.to_string());
    }
}
