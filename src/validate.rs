//! Validation, in two layers.
//!
//! Config conformance: `validate` checks a parsed page config against the
//! engine's structural rules and returns **all** errors and warnings, not
//! just the first. Validation does not modify the config.
//!
//! Field validation: `validate_value` / `validate_section` apply the
//! generic per-field algorithm uniformly across field kinds. Both are pure
//! — same inputs, same result — so a section can be re-validated freely.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::enums::{ComponentKind, FieldKind};
use crate::error::*;
use crate::primitives::{value_as_number, value_is_empty};
use crate::resolve::should_expand_dependents;
use crate::store::ValueLookup;
use crate::types::{Element, PageConfig, ValidationRules};

// ─── Cached built-in format regexes ─────────────────────────────────────────

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

// ─── Config conformance ─────────────────────────────────────────────────────

/// Validate a parsed page config against all conformance rules.
/// Returns a ValidationResult containing every error and warning found.
pub fn validate(config: &PageConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_unique_tab_keys(config, &mut errors);
    check_unique_section_keys(config, &mut errors);
    check_unique_api_keys(config, &mut errors);
    check_pattern_validity(config, &mut errors);
    check_bounds_consistency(config, &mut errors);

    check_options_presence(config, &mut warnings);
    check_dependent_triggers(config, &mut warnings);
    check_component_tags(config, &mut warnings);

    ValidationResult { errors, warnings }
}

/// Walk every element in the config (dependent and restricted subtrees
/// included), handing each one to `f` along with its config path.
fn for_each_element<'a>(config: &'a PageConfig, f: &mut impl FnMut(&'a Element, &str)) {
    for (ti, tab) in config.tabs.iter().enumerate() {
        for (si, section) in tab.sections.iter().enumerate() {
            let base = format!("tabs[{}].sections[{}].elements", ti, si);
            visit_elements(&section.elements, &base, f);
        }
    }
}

fn visit_elements<'a>(
    elements: &'a [Element],
    path: &str,
    f: &mut impl FnMut(&'a Element, &str),
) {
    for (i, element) in elements.iter().enumerate() {
        let p = format!("{}[{}]", path, i);
        f(element, &p);
        if let Some(deps) = &element.dependent_fields {
            visit_elements(deps, &format!("{}.dependentFields", p), f);
        }
        if let Some(details) = &element.restricted_details {
            visit_elements(details, &format!("{}.restrictedLabelDetails", p), f);
        }
    }
}

fn check_unique_tab_keys(config: &PageConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, tab) in config.tabs.iter().enumerate() {
        if let Some(first) = seen.insert(tab.key.as_str(), i) {
            errors.push(ValidationError {
                rule: "duplicate_tab_key".to_string(),
                path: format!("tabs[{}]", i),
                message: format!("tab key '{}' already used by tabs[{}]", tab.key, first),
            });
        }
    }
}

fn check_unique_section_keys(config: &PageConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<&str, String> = HashMap::new();
    for (ti, tab) in config.tabs.iter().enumerate() {
        for (si, section) in tab.sections.iter().enumerate() {
            let path = format!("tabs[{}].sections[{}]", ti, si);
            if let Some(first) = seen.insert(section.key.as_str(), path.clone()) {
                errors.push(ValidationError {
                    rule: "duplicate_section_key".to_string(),
                    path,
                    message: format!("section key '{}' already used by {}", section.key, first),
                });
            }
        }
    }
}

/// Two elements must never write to the same store key. Tabs share one
/// value store and a parent's dependents all reveal together, so any
/// duplicated api key is a real collision, not an alternate branch.
fn check_unique_api_keys(config: &PageConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<&str, String> = HashMap::new();
    for_each_element(config, &mut |element, path| {
        if let Some(key) = element.api_key.as_deref()
            && let Some(first) = seen.insert(key, path.to_string())
        {
            errors.push(ValidationError {
                rule: "duplicate_api_key".to_string(),
                path: path.to_string(),
                message: format!("apiKey '{}' already used by {}", key, first),
            });
        }
    });
}

fn check_pattern_validity(config: &PageConfig, errors: &mut Vec<ValidationError>) {
    for_each_element(config, &mut |element, path| {
        if let Some(pattern) = element.validation.as_ref().and_then(|v| v.pattern.as_deref())
            && let Err(e) = Regex::new(pattern)
        {
            errors.push(ValidationError {
                rule: "invalid_pattern".to_string(),
                path: format!("{}.validation.pattern", path),
                message: format!("pattern does not compile: {}", e),
            });
        }
    });
}

fn check_bounds_consistency(config: &PageConfig, errors: &mut Vec<ValidationError>) {
    for_each_element(config, &mut |element, path| {
        let Some(rules) = element.validation.as_ref() else {
            return;
        };
        if let (Some(min), Some(max)) = (rules.min_length, rules.max_length)
            && min > max
        {
            errors.push(ValidationError {
                rule: "bounds_conflict".to_string(),
                path: format!("{}.validation", path),
                message: format!("minLength {} exceeds maxLength {}", min, max),
            });
        }
        if let (Some(min), Some(max)) = (rules.min, rules.max)
            && min > max
        {
            errors.push(ValidationError {
                rule: "bounds_conflict".to_string(),
                path: format!("{}.validation", path),
                message: format!("min {} exceeds max {}", min, max),
            });
        }
    });
}

fn check_options_presence(config: &PageConfig, warnings: &mut Vec<Diagnostic>) {
    for_each_element(config, &mut |element, path| {
        let has_static = element.options.as_ref().is_some_and(|o| !o.is_empty());
        if element.component.wants_options() && !has_static && element.options_source.is_none() {
            warnings.push(Diagnostic {
                severity: DiagnosticSeverity::Warning,
                code: "missing_options".to_string(),
                path: Some(path.to_string()),
                message: format!(
                    "'{}' element has neither static options nor an options source",
                    element.component.as_tag()
                ),
            });
        }
    });
}

fn check_dependent_triggers(config: &PageConfig, warnings: &mut Vec<Diagnostic>) {
    for_each_element(config, &mut |element, path| {
        if element.dependents().is_empty() {
            return;
        }
        if element.trigger_value.is_none() {
            warnings.push(Diagnostic {
                severity: DiagnosticSeverity::Warning,
                code: "unreachable_dependents".to_string(),
                path: Some(path.to_string()),
                message: "dependentFields present but no trigger value is declared".to_string(),
            });
        } else if !element.component.is_single_select() && !element.component.is_checkbox_like() {
            warnings.push(Diagnostic {
                severity: DiagnosticSeverity::Warning,
                code: "unreachable_dependents".to_string(),
                path: Some(path.to_string()),
                message: format!(
                    "'{}' elements never reveal dependent fields",
                    element.component.as_tag()
                ),
            });
        }
    });
}

fn check_component_tags(config: &PageConfig, warnings: &mut Vec<Diagnostic>) {
    for_each_element(config, &mut |element, path| {
        if let ComponentKind::Unrecognized(tag) = &element.component {
            warnings.push(Diagnostic {
                severity: DiagnosticSeverity::Warning,
                code: "unknown_component".to_string(),
                path: Some(path.to_string()),
                message: format!("unknown component tag: '{}'", tag),
            });
        }
    });
}

// ─── Field validation ───────────────────────────────────────────────────────

/// Validate one field value against its rules. Returns the first failing
/// check's message; only one error surfaces per field.
///
/// Check order: required, empty short-circuit, string length, numeric
/// parse + bounds, pattern, built-in kind formats.
pub fn validate_value(
    value: &Value,
    rules: Option<&ValidationRules>,
    kind: &FieldKind,
) -> Option<String> {
    let rules = rules?;

    if rules.required {
        if value_is_empty(value) {
            return Some("This field is required".to_string());
        }
        if kind.is_boolean() && rules.required_true && value != &Value::Bool(true) {
            return Some("This field must be selected".to_string());
        }
    }

    // Optional and unfilled: nothing else applies.
    if !rules.required && value_is_empty(value) {
        return None;
    }

    if let Value::String(s) = value {
        let len = s.chars().count();
        if let Some(min) = rules.min_length
            && len < min
        {
            return Some(format!("Minimum length is {} characters", min));
        }
        if let Some(max) = rules.max_length
            && len > max
        {
            return Some(format!("Maximum length is {} characters", max));
        }
    }

    if kind.is_numeric() {
        match value_as_number(value) {
            None => return Some("Please enter a valid number".to_string()),
            Some(n) => {
                if let Some(min) = rules.min
                    && n < min
                {
                    return Some(format!("Minimum value is {}", min));
                }
                if let Some(max) = rules.max
                    && n > max
                {
                    return Some(format!("Maximum value is {}", max));
                }
            }
        }
    }

    if let (Some(pattern), Value::String(s)) = (rules.pattern.as_deref(), value) {
        // Conformance flags patterns that do not compile; one that still
        // fails here is skipped rather than failing the field.
        if let Ok(re) = Regex::new(pattern)
            && !re.is_match(s)
        {
            return Some(
                rules
                    .pattern_message
                    .clone()
                    .unwrap_or_else(|| "Invalid format".to_string()),
            );
        }
    }

    if let Value::String(s) = value {
        match kind {
            FieldKind::Email => {
                if !EMAIL_RE.is_match(s) {
                    return Some("Please enter a valid email address".to_string());
                }
            }
            FieldKind::Tel => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                if !PHONE_RE.is_match(&digits) {
                    return Some("Please enter a valid 10-digit phone number".to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Aggregated result of validating one section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionValidation {
    pub errors: HashMap<String, String>,
    pub is_valid: bool,
}

/// Validate every visible element of a section, recursing into dependent
/// groups that are currently expanded. Pure and idempotent.
pub fn validate_section(values: &impl ValueLookup, elements: &[Element]) -> SectionValidation {
    let mut errors = HashMap::new();
    collect_field_errors(values, elements, &mut errors);
    SectionValidation { is_valid: errors.is_empty(), errors }
}

fn collect_field_errors(
    values: &impl ValueLookup,
    elements: &[Element],
    errors: &mut HashMap<String, String>,
) {
    for element in elements {
        if !element.visible {
            continue;
        }

        let current = element
            .api_key
            .as_deref()
            .map(|k| values.current(k))
            .unwrap_or(&Value::Null);

        if let Some(key) = &element.api_key
            && let Some(message) = validate_value(current, element.validation.as_ref(), &element.kind())
        {
            errors.insert(key.clone(), message);
        }

        if should_expand_dependents(element, current) {
            collect_field_errors(values, element.dependents(), errors);
        }
    }
}
