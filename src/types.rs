use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::enums::*;
use crate::error::{UploadError, UploadErrorKind};

fn default_true() -> bool {
    true
}

// ─── Page config ────────────────────────────────────────────────────────────

/// The top-level container for a parsed page configuration.
///
/// Fetched once at startup and held immutable until an explicit reload; the
/// engine never partially mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(rename = "pageName")]
    pub page_name: String,
    #[serde(rename = "pageAttributes", default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PageAttributes>,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    /// Passthrough fields not modeled by the engine.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl PageConfig {
    /// Find a section by key anywhere in the tab tree.
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.tabs
            .iter()
            .flat_map(|t| t.sections.iter())
            .find(|s| s.key == key)
    }

    /// All sections in tab order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.tabs.iter().flat_map(|t| t.sections.iter())
    }

    /// Find the element declaring `api_key`, searching dependent and
    /// restricted subtrees. Api keys are unique page-wide, so the first
    /// match is the only one.
    pub fn element(&self, api_key: &str) -> Option<&Element> {
        fn find<'a>(elements: &'a [Element], key: &str) -> Option<&'a Element> {
            for element in elements {
                if element.api_key.as_deref() == Some(key) {
                    return Some(element);
                }
                if let Some(found) = element.dependent_fields.as_deref().and_then(|d| find(d, key))
                {
                    return Some(found);
                }
                if let Some(found) =
                    element.restricted_details.as_deref().and_then(|d| find(d, key))
                {
                    return Some(found);
                }
            }
            None
        }
        self.sections().find_map(|s| find(&s.elements, api_key))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageAttributes {
    #[serde(rename = "fetchApiEndPoint", default, skip_serializing_if = "Option::is_none")]
    pub fetch_endpoint: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ─── Tab ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tab {
    #[serde(rename = "rbackey")]
    pub key: String,
    #[serde(rename = "tabName")]
    pub name: String,
    #[serde(rename = "staticPage", default)]
    pub static_page: bool,
    #[serde(rename = "profileCardData", default)]
    pub has_profile_card: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ─── Section ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "rbackey")]
    pub key: String,
    #[serde(rename = "sectionName")]
    pub name: String,
    /// Informational: the section's values were captured at an earlier
    /// stage of the workflow and arrive via pre-fill.
    #[serde(rename = "fromPreviousStage", default)]
    pub from_previous_stage: bool,
    #[serde(rename = "componentName", default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(rename = "webSectionAttributes", default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SectionAttributes>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Section {
    /// The save endpoint, when configured. Absence makes the section
    /// read-only: it renders but cannot be submitted.
    pub fn save_endpoint(&self) -> Option<&str> {
        self.attributes.as_ref()?.save_endpoint.as_deref()
    }

    /// The endpoint serving previously captured values for this section.
    pub fn fetch_endpoint(&self) -> Option<&str> {
        self.attributes.as_ref()?.fetch_endpoint.as_deref()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionAttributes {
    #[serde(rename = "fetchApiEndPoint", default, skip_serializing_if = "Option::is_none")]
    pub fetch_endpoint: Option<String>,
    #[serde(rename = "saveApiEndPoint", default, skip_serializing_if = "Option::is_none")]
    pub save_endpoint: Option<String>,
    #[serde(rename = "validationSchema", default, skip_serializing_if = "Option::is_none")]
    pub validation_schema: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ─── Element ────────────────────────────────────────────────────────────────

/// A node in the schema tree: one renderable form element, possibly owning
/// a subtree of conditionally revealed dependent elements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Element {
    pub component: ComponentKind,
    /// Store key for the element's value. Absent for pure display elements.
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldKind>,
    /// Remote key resolving this element's option list when no static
    /// `options` are embedded.
    #[serde(rename = "api", default, skip_serializing_if = "Option::is_none")]
    pub options_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(rename = "autoFocus", default)]
    pub auto_focus: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "alwaysDisabled", default)]
    pub always_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    /// The value of this element that reveals `dependent_fields`. Absent
    /// (or null) means dependents never auto-show.
    #[serde(
        rename = "optionToRenderDependentFields",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub trigger_value: Option<Value>,
    #[serde(rename = "dependentFields", default, skip_serializing_if = "Option::is_none")]
    pub dependent_fields: Option<Vec<Element>>,
    /// The value at which `restricted_details` info elements are shown.
    #[serde(
        rename = "optionToRestrictDependents",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub restrict_value: Option<Value>,
    #[serde(rename = "restrictedLabelDetails", default, skip_serializing_if = "Option::is_none")]
    pub restricted_details: Option<Vec<Element>>,
    /// Presentation-only passthrough fields (imageStyle, …).
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Element {
    /// The validation kind for this element, defaulting to text.
    pub fn kind(&self) -> FieldKind {
        self.field_type.clone().unwrap_or_default()
    }

    pub fn dependents(&self) -> &[Element] {
        self.dependent_fields.as_deref().unwrap_or(&[])
    }
}

/// One selectable option of a select-like element. Values are open-typed:
/// production configs carry strings and booleans.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
}

// ─── Validation rules ───────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub required: bool,
    /// Boolean kinds: a required value must be strictly `true`.
    #[serde(rename = "requiredTrue", default)]
    pub required_true: bool,
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "patternMessage", default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
}

// ─── Collaborator payloads ──────────────────────────────────────────────────

/// Acknowledgement returned by the section-save collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveAck {
    pub success: bool,
    pub message: String,
}

/// Local metadata for a file about to be uploaded. The engine's gate only
/// needs name, declared MIME type and size; the bytes stay with the
/// transport collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
}

/// Result of a completed upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub name: String,
}

/// A captured device position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: String,
}

// ─── Upload policy ──────────────────────────────────────────────────────────

/// Size and MIME constraints enforced locally before the upload
/// collaborator is invoked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(rename = "maxBytes")]
    pub max_bytes: u64,
    #[serde(rename = "allowedTypes")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        UploadPolicy {
            max_bytes: 5 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
        }
    }
}

impl UploadPolicy {
    /// Check a file against the policy. Rejections happen before any
    /// transport work.
    pub fn check(&self, file: &FilePayload) -> Result<(), UploadError> {
        if !self.allowed_types.iter().any(|t| t == &file.mime_type) {
            return Err(UploadError {
                kind: UploadErrorKind::InvalidType,
                message: "File type not supported".to_string(),
                file_name: Some(file.name.clone()),
            });
        }
        if file.size_bytes > self.max_bytes {
            return Err(UploadError {
                kind: UploadErrorKind::TooLarge,
                message: "File size exceeds the maximum limit".to_string(),
                file_name: Some(file.name.clone()),
            });
        }
        Ok(())
    }
}
