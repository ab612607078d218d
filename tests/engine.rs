use dynform::engine::{
    Collaborators, ConfigSource, EngineOptions, FileUploader, FormEngine, LocationProvider,
    OptionsSource,
};
use dynform::error::{
    LocationError, LocationErrorKind, OptionsFetchError, SaveError, SchemaError, UploadError,
    UploadErrorKind,
};
use dynform::section::{SectionTransport, SubmitOutcome};
use dynform::types::{
    FieldOption, FilePayload, GeoPosition, SaveAck, UploadPolicy, UploadedFile,
};
use serde_json::{Map, Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ─── Collaborator doubles ───────────────────────────────────────────────────

struct StaticConfig(String);

impl ConfigSource for StaticConfig {
    fn fetch_page_config(&self) -> Result<String, SchemaError> {
        Ok(self.0.clone())
    }
}

struct FailingConfig;

impl ConfigSource for FailingConfig {
    fn fetch_page_config(&self) -> Result<String, SchemaError> {
        Err(SchemaError::Fetch("connection refused".to_string()))
    }
}

#[derive(Default)]
struct CountingOptions {
    calls: Rc<Cell<usize>>,
    fail: bool,
}

impl OptionsSource for CountingOptions {
    fn fetch_options(&self, source_key: &str) -> Result<Vec<FieldOption>, OptionsFetchError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(OptionsFetchError {
                source_key: source_key.to_string(),
                message: "service unavailable".to_string(),
            });
        }
        Ok(vec![
            FieldOption { label: "Own House".to_string(), value: json!("own_house") },
            FieldOption { label: "Rented".to_string(), value: json!("rented") },
        ])
    }
}

#[derive(Default)]
struct StubTransport {
    saves: RefCell<Vec<(String, Map<String, Value>)>>,
    fetch_result: Option<Map<String, Value>>,
}

impl SectionTransport for StubTransport {
    fn save_section(
        &self,
        endpoint: &str,
        payload: &Map<String, Value>,
    ) -> Result<SaveAck, SaveError> {
        self.saves.borrow_mut().push((endpoint.to_string(), payload.clone()));
        Ok(SaveAck { success: true, message: "Data saved successfully".to_string() })
    }

    fn fetch_section(&self, _endpoint: &str) -> Result<Map<String, Value>, SaveError> {
        Ok(self.fetch_result.clone().unwrap_or_default())
    }
}

#[derive(Default)]
struct CountingUploader {
    calls: Rc<Cell<usize>>,
    fail: bool,
}

impl FileUploader for CountingUploader {
    fn upload(&self, file: &FilePayload) -> Result<UploadedFile, UploadError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(UploadError {
                kind: UploadErrorKind::Transport,
                message: "connection reset".to_string(),
                file_name: Some(file.name.clone()),
            });
        }
        Ok(UploadedFile {
            url: format!("https://cdn.example.com/{}", file.name),
            name: file.name.clone(),
        })
    }
}

struct StubLocation {
    result: Result<GeoPosition, LocationError>,
}

impl LocationProvider for StubLocation {
    fn current_position(&self) -> Result<GeoPosition, LocationError> {
        self.result.clone()
    }
}

fn page_json() -> String {
    json!({
        "status": "Success",
        "data": { "page": {
            "pageName": "Field Investigation",
            "tabs": [{
                "rbackey": "applicant", "tabName": "Applicant",
                "sections": [
                    {
                        "rbackey": "details", "sectionName": "Details",
                        "webSectionAttributes": {
                            "fetchApiEndPoint": "v1/fetch-details",
                            "saveApiEndPoint": "v1/save-details"
                        },
                        "elements": [
                            { "component": "textfield", "apiKey": "name", "type": "text",
                              "visible": true, "validation": { "required": true } },
                            { "component": "dropdown", "apiKey": "residenceType",
                              "type": "dropdown", "api": "Residence Type", "visible": true },
                            { "component": "radioButton", "apiKey": "hasCattleShed",
                              "type": "radio", "visible": true,
                              "options": [ { "label": "Yes", "value": true },
                                           { "label": "No", "value": false } ],
                              "optionToRenderDependentFields": true,
                              "dependentFields": [
                                  { "component": "image", "apiKey": "shedPhoto",
                                    "type": "image", "visible": true }
                              ] },
                            { "component": "LocationComponnet", "apiKey": "currentLocation",
                              "visible": true }
                        ]
                    },
                    {
                        "rbackey": "display_only", "sectionName": "Display Only",
                        "elements": [
                            { "component": "label", "label": "Read-only summary", "visible": true }
                        ]
                    }
                ]
            }]
        }}
    })
    .to_string()
}

struct Harness {
    engine: FormEngine,
    option_calls: Rc<Cell<usize>>,
    upload_calls: Rc<Cell<usize>>,
}

fn harness_with(
    options_fail: bool,
    upload_fail: bool,
    location: Result<GeoPosition, LocationError>,
) -> Harness {
    let option_calls = Rc::new(Cell::new(0));
    let upload_calls = Rc::new(Cell::new(0));
    let collaborators = Collaborators {
        config: Box::new(StaticConfig(page_json())),
        options: Box::new(CountingOptions { calls: option_calls.clone(), fail: options_fail }),
        sections: Box::new(StubTransport {
            fetch_result: Some(
                serde_json::from_value(json!({
                    "name": "  Ganesh  ",
                    "residenceType": "own_house",
                    "ignored": ""
                }))
                .unwrap(),
            ),
            ..Default::default()
        }),
        uploader: Box::new(CountingUploader { calls: upload_calls.clone(), fail: upload_fail }),
        location: Box::new(StubLocation { result: location }),
    };
    Harness { engine: FormEngine::new(collaborators), option_calls, upload_calls }
}

fn harness() -> Harness {
    harness_with(false, false, Ok(sample_position()))
}

fn sample_position() -> GeoPosition {
    GeoPosition {
        latitude: 18.5204,
        longitude: 73.8567,
        accuracy: Some(12.0),
        timestamp: "2024-03-14T09:26:53Z".to_string(),
    }
}

// ─── Config lifecycle ───────────────────────────────────────────────────────

#[test]
fn load_runs_the_full_pipeline() {
    let mut h = harness();
    let config = h.engine.load().expect("load should succeed");
    assert_eq!(config.page_name, "Field Investigation");
    assert!(h.engine.page().is_some());
}

#[test]
fn fetch_failure_surfaces_as_schema_error() {
    let collaborators = Collaborators {
        config: Box::new(FailingConfig),
        options: Box::new(CountingOptions::default()),
        sections: Box::new(StubTransport::default()),
        uploader: Box::new(CountingUploader::default()),
        location: Box::new(StubLocation { result: Ok(sample_position()) }),
    };
    let mut engine = FormEngine::new(collaborators);
    match engine.load() {
        Err(SchemaError::Fetch(msg)) => assert_eq!(msg, "connection refused"),
        other => panic!("expected fetch error, got {:?}", other.map(|c| c.page_name.clone())),
    }
}

#[test]
fn nonconforming_config_fails_the_load() {
    let bad = json!({
        "pageName": "P",
        "tabs": [{
            "rbackey": "t", "tabName": "T",
            "sections": [{
                "rbackey": "s", "sectionName": "S",
                "elements": [
                    { "component": "textfield", "apiKey": "dup", "visible": true },
                    { "component": "textfield", "apiKey": "dup", "visible": true }
                ]
            }]
        }]
    })
    .to_string();

    let collaborators = Collaborators {
        config: Box::new(StaticConfig(bad)),
        options: Box::new(CountingOptions::default()),
        sections: Box::new(StubTransport::default()),
        uploader: Box::new(CountingUploader::default()),
        location: Box::new(StubLocation { result: Ok(sample_position()) }),
    };
    let mut engine = FormEngine::new(collaborators);
    match engine.load() {
        Err(SchemaError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.rule == "duplicate_api_key"));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|c| c.page_name.clone())),
    }
}

#[test]
fn reload_resets_runtime_state() {
    let mut h = harness();
    h.engine.load().unwrap();
    h.engine.set_value("name", json!("stale"));
    h.engine.options_for("residenceType");
    assert_eq!(h.option_calls.get(), 1);

    h.engine.reload().unwrap();

    assert!(h.engine.store().is_empty());
    // The options cache was dropped with the old config.
    h.engine.options_for("residenceType");
    assert_eq!(h.option_calls.get(), 2);
}

// ─── Rendering ──────────────────────────────────────────────────────────────

#[test]
fn visible_elements_resolve_through_the_store() {
    let mut h = harness();
    h.engine.load().unwrap();

    assert_eq!(h.engine.visible_elements("details").len(), 4);

    h.engine.set_value("hasCattleShed", json!(true));
    let resolved = h.engine.visible_elements("details");
    assert_eq!(resolved.len(), 5);
    assert!(
        resolved
            .iter()
            .any(|r| r.element.api_key.as_deref() == Some("shedPhoto"))
    );
}

#[test]
fn unknown_section_resolves_to_nothing() {
    let mut h = harness();
    h.engine.load().unwrap();
    assert!(h.engine.visible_elements("nope").is_empty());
}

// ─── Options ────────────────────────────────────────────────────────────────

#[test]
fn remote_options_are_fetched_once_and_cached() {
    let mut h = harness();
    h.engine.load().unwrap();

    let first = h.engine.options_for("residenceType");
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].label, "Own House");

    let second = h.engine.options_for("residenceType");
    assert_eq!(second, first);
    assert_eq!(h.option_calls.get(), 1);
}

#[test]
fn static_options_never_hit_the_collaborator() {
    let mut h = harness();
    h.engine.load().unwrap();

    let options = h.engine.options_for("hasCattleShed");
    assert_eq!(options.len(), 2);
    assert_eq!(h.option_calls.get(), 0);
}

#[test]
fn options_fetch_failure_yields_empty_and_retries_next_time() {
    let mut h = harness_with(true, false, Ok(sample_position()));
    h.engine.load().unwrap();

    assert!(h.engine.options_for("residenceType").is_empty());
    assert!(h.engine.options_for("residenceType").is_empty());
    // Failures are not cached.
    assert_eq!(h.option_calls.get(), 2);
}

#[test]
fn stale_options_for_unmounted_elements_are_discarded() {
    let mut h = harness();
    h.engine.load().unwrap();

    // shedPhoto is only mounted while the radio answer is Yes.
    let options = vec![FieldOption { label: "X".to_string(), value: json!("x") }];
    assert!(!h.engine.apply_fetched_options("shedPhoto", "Shed Source", options.clone()));

    h.engine.set_value("hasCattleShed", json!(true));
    assert!(h.engine.apply_fetched_options("shedPhoto", "Shed Source", options));
}

// ─── Section operations ─────────────────────────────────────────────────────

#[test]
fn hydrate_section_merges_sanitized_values() {
    let mut h = harness();
    h.engine.load().unwrap();

    let merged = h.engine.hydrate_section("details").expect("hydrate should succeed");
    assert_eq!(merged, 2);
    assert_eq!(h.engine.store().value("name"), &json!("Ganesh"));
    assert_eq!(h.engine.store().value("residenceType"), &json!("own_house"));
    // Empty strings are dropped, not merged.
    assert!(!h.engine.store().contains("ignored"));
}

#[test]
fn hydrate_without_endpoint_is_a_no_op() {
    let mut h = harness();
    h.engine.load().unwrap();
    assert_eq!(h.engine.hydrate_section("display_only").unwrap(), 0);
}

#[test]
fn submit_section_round_trips_through_the_controller() {
    let mut h = harness();
    h.engine.load().unwrap();

    // Missing required field first.
    assert_eq!(
        h.engine.submit_section("details"),
        SubmitOutcome::RejectedByValidation { error_count: 1 }
    );
    assert_eq!(h.engine.store().error("name"), Some("This field is required"));

    h.engine.set_value("name", json!("Ganesh"));
    assert_eq!(h.engine.submit_section("details"), SubmitOutcome::Saved);
    assert!(h.engine.section_state("details").is_some());
}

#[test]
fn submitting_a_readonly_section_changes_nothing() {
    let mut h = harness();
    h.engine.load().unwrap();
    assert_eq!(h.engine.submit_section("display_only"), SubmitOutcome::NotSubmittable);
    assert!(h.engine.store().is_empty());
}

#[test]
fn reset_section_clears_nested_keys_only() {
    let mut h = harness();
    h.engine.load().unwrap();
    h.engine.set_value("name", json!("keep?"));
    h.engine.set_value("hasCattleShed", json!(true));
    h.engine.set_value("shedPhoto", json!("https://cdn.example.com/shed.jpg"));

    h.engine.reset_section("details");

    assert!(!h.engine.store().contains("name"));
    assert!(!h.engine.store().contains("shedPhoto"));
}

#[test]
fn prefill_trims_and_drops_empties() {
    let mut h = harness();
    h.engine.load().unwrap();
    h.engine.prefill(vec![
        ("name".to_string(), json!("  spaced  ")),
        ("blank".to_string(), json!("")),
    ]);
    assert_eq!(h.engine.store().value("name"), &json!("spaced"));
    assert!(!h.engine.store().contains("blank"));
}

// ─── Uploads ────────────────────────────────────────────────────────────────

fn jpeg(size_bytes: u64) -> FilePayload {
    FilePayload { name: "shed.jpg".to_string(), mime_type: "image/jpeg".to_string(), size_bytes }
}

#[test]
fn oversized_files_are_rejected_before_transport() {
    let mut h = harness();
    h.engine.load().unwrap();

    let err = h.engine.upload_image("shedPhoto", &jpeg(6 * 1024 * 1024)).unwrap_err();
    assert_eq!(err.kind, UploadErrorKind::TooLarge);
    assert_eq!(h.upload_calls.get(), 0);
    assert_eq!(
        h.engine.store().error("shedPhoto"),
        Some("File size exceeds the maximum limit")
    );
}

#[test]
fn disallowed_mime_types_are_rejected_before_transport() {
    let mut h = harness();
    h.engine.load().unwrap();

    let file = FilePayload {
        name: "notes.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes: 1024,
    };
    let err = h.engine.upload_image("shedPhoto", &file).unwrap_err();
    assert_eq!(err.kind, UploadErrorKind::InvalidType);
    assert_eq!(h.upload_calls.get(), 0);
    assert_eq!(h.engine.store().error("shedPhoto"), Some("File type not supported"));
}

#[test]
fn successful_upload_stores_the_url() {
    let mut h = harness();
    h.engine.load().unwrap();

    let uploaded = h.engine.upload_image("shedPhoto", &jpeg(1024)).expect("upload");
    assert_eq!(uploaded.url, "https://cdn.example.com/shed.jpg");
    assert_eq!(
        h.engine.store().value("shedPhoto"),
        &json!("https://cdn.example.com/shed.jpg")
    );
    assert!(h.engine.store().is_touched("shedPhoto"));
}

#[test]
fn upload_transport_failure_becomes_a_field_error() {
    let mut h = harness_with(false, true, Ok(sample_position()));
    h.engine.load().unwrap();

    let err = h.engine.upload_image("shedPhoto", &jpeg(1024)).unwrap_err();
    assert_eq!(err.kind, UploadErrorKind::Transport);
    assert_eq!(h.engine.store().error("shedPhoto"), Some("Failed to upload image"));
}

#[test]
fn upload_policy_is_configurable() {
    let collaborators = Collaborators {
        config: Box::new(StaticConfig(page_json())),
        options: Box::new(CountingOptions::default()),
        sections: Box::new(StubTransport::default()),
        uploader: Box::new(CountingUploader::default()),
        location: Box::new(StubLocation { result: Ok(sample_position()) }),
    };
    let options = EngineOptions {
        upload: UploadPolicy {
            max_bytes: 1024,
            allowed_types: vec!["application/pdf".to_string()],
        },
    };
    let mut engine = FormEngine::with_options(collaborators, options);
    engine.load().unwrap();

    let pdf = FilePayload {
        name: "doc.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes: 512,
    };
    assert!(engine.upload_image("shedPhoto", &pdf).is_ok());
    assert!(engine.upload_image("shedPhoto", &jpeg(512)).is_err());
}

// ─── Geolocation ────────────────────────────────────────────────────────────

#[test]
fn captured_position_becomes_the_field_value() {
    let mut h = harness();
    h.engine.load().unwrap();

    let position = h.engine.capture_location("currentLocation").expect("capture");
    assert_eq!(position.latitude, 18.5204);

    let stored = h.engine.store().value("currentLocation");
    assert_eq!(stored.get("latitude"), Some(&json!(18.5204)));
    assert_eq!(stored.get("longitude"), Some(&json!(73.8567)));
    assert_eq!(stored.get("timestamp"), Some(&json!("2024-03-14T09:26:53Z")));
}

#[test]
fn location_failures_write_their_reason_message() {
    let cases = [
        (LocationErrorKind::PermissionDenied, "Location access denied by user"),
        (LocationErrorKind::Unavailable, "Location information unavailable"),
        (LocationErrorKind::Timeout, "Location request timed out"),
    ];
    for (kind, message) in cases {
        let mut h = harness_with(false, false, Err(LocationError::new(kind.clone())));
        h.engine.load().unwrap();

        let err = h.engine.capture_location("currentLocation").unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(h.engine.store().error("currentLocation"), Some(message));
        assert!(h.engine.store().is_touched("currentLocation"));
    }
}
