use dynform::resolve::{
    Widget, collect_api_keys, resolve_visible, restricted_details_for, should_expand_dependents,
};
use dynform::types::Element;
use serde_json::{Value, json};
use std::collections::HashMap;

fn element(spec: serde_json::Value) -> Element {
    serde_json::from_value(spec).expect("element fixture should deserialize")
}

fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn yes_no_radio(api_key: &str, trigger: Value, dependents: serde_json::Value) -> Element {
    element(json!({
        "component": "radioButton",
        "apiKey": api_key,
        "label": api_key,
        "type": "radio",
        "options": [ { "label": "Yes", "value": true }, { "label": "No", "value": false } ],
        "visible": true,
        "optionToRenderDependentFields": trigger,
        "dependentFields": dependents
    }))
}

// ─── Visibility ─────────────────────────────────────────────────────────────

#[test]
fn invisible_elements_and_their_dependents_are_excluded() {
    let elements = vec![
        element(json!({
            "component": "radioButton", "apiKey": "hidden", "visible": false,
            "optionToRenderDependentFields": true,
            "dependentFields": [
                { "component": "textfield", "apiKey": "child", "visible": true }
            ]
        })),
        element(json!({ "component": "textfield", "apiKey": "shown", "visible": true })),
    ];
    // Even a triggering value cannot resurface an invisible parent.
    let vals = values(&[("hidden", json!(true))]);

    let resolved = resolve_visible(&elements, &vals);
    let keys: Vec<_> = resolved
        .iter()
        .map(|r| r.element.api_key.as_deref().unwrap())
        .collect();
    assert_eq!(keys, vec!["shown"]);
}

#[test]
fn dependents_splice_after_parent_in_order() {
    let elements = vec![
        element(json!({ "component": "textfield", "apiKey": "first", "visible": true })),
        yes_no_radio(
            "parent",
            json!(true),
            json!([
                { "component": "textfield", "apiKey": "childA", "visible": true },
                { "component": "textfield", "apiKey": "childB", "visible": true }
            ]),
        ),
        element(json!({ "component": "textfield", "apiKey": "last", "visible": true })),
    ];
    let vals = values(&[("parent", json!(true))]);

    let resolved = resolve_visible(&elements, &vals);
    let keys: Vec<_> = resolved
        .iter()
        .map(|r| r.element.api_key.as_deref().unwrap())
        .collect();
    assert_eq!(keys, vec!["first", "parent", "childA", "childB", "last"]);

    assert_eq!(resolved[1].depth, 0);
    assert_eq!(resolved[2].depth, 1);
    assert_eq!(resolved[3].depth, 1);
}

#[test]
fn collapsed_dependents_do_not_render() {
    let elements = vec![yes_no_radio(
        "parent",
        json!(true),
        json!([ { "component": "textfield", "apiKey": "child", "visible": true } ]),
    )];
    let vals = values(&[("parent", json!(false))]);

    let resolved = resolve_visible(&elements, &vals);
    assert_eq!(resolved.len(), 1);
}

#[test]
fn nested_dependents_resolve_recursively() {
    let elements = vec![yes_no_radio(
        "outer",
        json!(true),
        json!([{
            "component": "dropdown", "apiKey": "inner", "visible": true,
            "options": [ { "label": "Other", "value": "other" } ],
            "optionToRenderDependentFields": "other",
            "dependentFields": [
                { "component": "textfield", "apiKey": "detail", "visible": true }
            ]
        }]),
    )];
    let vals = values(&[("outer", json!(true)), ("inner", json!("other"))]);

    let resolved = resolve_visible(&elements, &vals);
    let keys: Vec<_> = resolved
        .iter()
        .map(|r| r.element.api_key.as_deref().unwrap())
        .collect();
    assert_eq!(keys, vec!["outer", "inner", "detail"]);
    assert_eq!(resolved[2].depth, 2);
}

// ─── Trigger coercion ───────────────────────────────────────────────────────

#[test]
fn boolean_trigger_matches_string_form() {
    let on_true = yes_no_radio(
        "p",
        json!(true),
        json!([ { "component": "textfield", "apiKey": "c", "visible": true } ]),
    );
    assert!(should_expand_dependents(&on_true, &json!(true)));
    assert!(should_expand_dependents(&on_true, &json!("true")));
    assert!(!should_expand_dependents(&on_true, &json!(false)));
    assert!(!should_expand_dependents(&on_true, &json!("false")));

    let on_false = yes_no_radio(
        "p",
        json!(false),
        json!([ { "component": "textfield", "apiKey": "c", "visible": true } ]),
    );
    assert!(should_expand_dependents(&on_false, &json!(false)));
    assert!(should_expand_dependents(&on_false, &json!("false")));
    assert!(!should_expand_dependents(&on_false, &json!(true)));
}

#[test]
fn empty_value_never_expands_even_with_false_trigger() {
    let on_false = yes_no_radio(
        "p",
        json!(false),
        json!([ { "component": "textfield", "apiKey": "c", "visible": true } ]),
    );
    // No answer yet is not the same as answering "No".
    assert!(!should_expand_dependents(&on_false, &Value::Null));
    assert!(!should_expand_dependents(&on_false, &json!("")));
}

#[test]
fn string_trigger_casts_current_value() {
    let el = element(json!({
        "component": "dropdown", "apiKey": "mode", "visible": true,
        "options": [ { "label": "Cash", "value": "Cash" } ],
        "optionToRenderDependentFields": "Cash",
        "dependentFields": [
            { "component": "textfield", "apiKey": "cashDetail", "visible": true }
        ]
    }));
    assert!(should_expand_dependents(&el, &json!("Cash")));
    assert!(!should_expand_dependents(&el, &json!("Bank")));
}

#[test]
fn checkbox_expands_only_on_strict_true() {
    let el = element(json!({
        "component": "checkbox", "apiKey": "agree", "visible": true,
        "optionToRenderDependentFields": true,
        "dependentFields": [
            { "component": "textfield", "apiKey": "why", "visible": true }
        ]
    }));
    assert!(should_expand_dependents(&el, &json!(true)));
    assert!(!should_expand_dependents(&el, &json!("true")));
    assert!(!should_expand_dependents(&el, &json!(false)));
}

#[test]
fn missing_trigger_never_expands() {
    let el = element(json!({
        "component": "radioButton", "apiKey": "p", "visible": true,
        "optionToRenderDependentFields": null,
        "dependentFields": [
            { "component": "textfield", "apiKey": "c", "visible": true }
        ]
    }));
    assert!(!should_expand_dependents(&el, &json!(true)));
}

#[test]
fn non_select_kinds_never_expand() {
    let el = element(json!({
        "component": "textfield", "apiKey": "t", "visible": true,
        "optionToRenderDependentFields": "x",
        "dependentFields": [
            { "component": "textfield", "apiKey": "c", "visible": true }
        ]
    }));
    assert!(!should_expand_dependents(&el, &json!("x")));
}

// ─── Placeholder dispatch ───────────────────────────────────────────────────

#[test]
fn unknown_component_resolves_to_placeholder() {
    let elements = vec![element(json!({
        "component": "spinner3000", "apiKey": "mystery", "label": "Mystery", "visible": true
    }))];
    let resolved = resolve_visible(&elements, &values(&[]));

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].widget, Widget::Unrecognized);
    // The placeholder keeps the diagnostic identifiers.
    assert_eq!(resolved[0].element.api_key.as_deref(), Some("mystery"));
    assert_eq!(resolved[0].element.label.as_deref(), Some("Mystery"));
}

#[test]
fn widgets_dispatch_from_the_component_table() {
    let cases = [
        ("textfield", Widget::TextInput),
        ("dropdown", Widget::SelectOne),
        ("multidropdown", Widget::SelectMany),
        ("radioButton", Widget::RadioGroup),
        ("radioButtonGroup", Widget::RadioGroup),
        ("textAreaSmall", Widget::TextArea),
        ("image", Widget::ImageUpload),
        ("dynamicImages", Widget::ImageGallery),
        ("LocationComponent", Widget::LocationCapture),
        ("LocationComponnet", Widget::LocationCapture),
        ("label", Widget::InfoLabel),
        ("pincode", Widget::PincodeInput),
    ];
    for (tag, widget) in cases {
        let el = element(json!({ "component": tag, "visible": true }));
        let resolved = resolve_visible(std::slice::from_ref(&el), &values(&[]));
        assert_eq!(resolved[0].widget, widget, "tag '{}'", tag);
    }
}

// ─── Restricted content ─────────────────────────────────────────────────────

#[test]
fn restricted_details_show_on_matching_value() {
    let el = element(json!({
        "component": "radioButton", "apiKey": "same", "visible": true,
        "options": [ { "label": "Yes", "value": true }, { "label": "No", "value": false } ],
        "optionToRestrictDependents": false,
        "restrictedLabelDetails": [
            { "component": "label", "type": "info", "label": "Captured on mobile" }
        ]
    }));

    assert_eq!(restricted_details_for(&el, &json!(false)).len(), 1);
    assert!(restricted_details_for(&el, &json!(true)).is_empty());
    assert!(restricted_details_for(&el, &Value::Null).is_empty());
}

// ─── Key collection ─────────────────────────────────────────────────────────

#[test]
fn collect_api_keys_includes_all_nested_subtrees() {
    let elements = vec![
        element(json!({ "component": "textfield", "apiKey": "a", "visible": true })),
        yes_no_radio(
            "b",
            json!(true),
            json!([{
                "component": "dropdown", "apiKey": "c", "visible": true,
                "optionToRenderDependentFields": "x",
                "dependentFields": [
                    { "component": "textfield", "apiKey": "d", "visible": true }
                ]
            }]),
        ),
        element(json!({ "component": "label", "label": "no key", "visible": true })),
    ];

    let keys = collect_api_keys(&elements);
    assert_eq!(keys, vec!["a", "b", "c", "d"]);
}
