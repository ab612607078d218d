//! Closed enumerations used throughout the form schema.
//!
//! Component and field kinds are "closed with a catch-all": the defined
//! variants are the supported catalog, and anything else is preserved as
//! `Unrecognized`/`Other` so the original tag survives round-trips and can
//! be surfaced as a diagnostic instead of silently vanishing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Widget catalog tag carried in an element's `component` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    TextField,
    Dropdown,
    MultiDropdown,
    RadioButton,
    RadioButtonGroup,
    Checkbox,
    TextArea,
    Image,
    DynamicImages,
    Location,
    Label,
    Pincode,
    /// Any tag outside the catalog, kept verbatim for diagnostics.
    Unrecognized(String),
}

impl ComponentKind {
    pub fn from_tag(tag: &str) -> ComponentKind {
        match tag {
            "textfield" => ComponentKind::TextField,
            "dropdown" => ComponentKind::Dropdown,
            "multidropdown" => ComponentKind::MultiDropdown,
            "radioButton" => ComponentKind::RadioButton,
            "radioButtonGroup" => ComponentKind::RadioButtonGroup,
            "checkbox" => ComponentKind::Checkbox,
            "textAreaSmall" => ComponentKind::TextArea,
            "image" => ComponentKind::Image,
            "dynamicImages" => ComponentKind::DynamicImages,
            // The misspelled tag ships in production configs.
            "LocationComponent" | "LocationComponnet" => ComponentKind::Location,
            "label" => ComponentKind::Label,
            "pincode" => ComponentKind::Pincode,
            other => ComponentKind::Unrecognized(other.to_string()),
        }
    }

    /// The wire tag this kind serializes back to.
    pub fn as_tag(&self) -> &str {
        match self {
            ComponentKind::TextField => "textfield",
            ComponentKind::Dropdown => "dropdown",
            ComponentKind::MultiDropdown => "multidropdown",
            ComponentKind::RadioButton => "radioButton",
            ComponentKind::RadioButtonGroup => "radioButtonGroup",
            ComponentKind::Checkbox => "checkbox",
            ComponentKind::TextArea => "textAreaSmall",
            ComponentKind::Image => "image",
            ComponentKind::DynamicImages => "dynamicImages",
            ComponentKind::Location => "LocationComponent",
            ComponentKind::Label => "label",
            ComponentKind::Pincode => "pincode",
            ComponentKind::Unrecognized(tag) => tag,
        }
    }

    /// Kinds holding exactly one selected option. These are the kinds whose
    /// dependent fields expand by comparing the current value against the
    /// trigger value.
    pub fn is_single_select(&self) -> bool {
        matches!(
            self,
            ComponentKind::Dropdown | ComponentKind::RadioButton | ComponentKind::RadioButtonGroup
        )
    }

    /// Kinds whose dependent fields expand iff the value is strictly `true`.
    pub fn is_checkbox_like(&self) -> bool {
        matches!(self, ComponentKind::Checkbox)
    }

    /// Kinds that present an option list and therefore need `options` or an
    /// options source key.
    pub fn wants_options(&self) -> bool {
        matches!(
            self,
            ComponentKind::Dropdown
                | ComponentKind::MultiDropdown
                | ComponentKind::RadioButton
                | ComponentKind::RadioButtonGroup
        )
    }
}

impl Serialize for ComponentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for ComponentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ComponentKind::from_tag(&tag))
    }
}

/// Value kind carried in an element's `type` field; selects the validation
/// checks that apply (numeric parse, email/phone formats, strict-true).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Email,
    Tel,
    Boolean,
    Radio,
    Dropdown,
    Image,
    Info,
    Other(String),
}

impl FieldKind {
    pub fn from_tag(tag: &str) -> FieldKind {
        match tag {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "email" => FieldKind::Email,
            "tel" => FieldKind::Tel,
            "boolean" => FieldKind::Boolean,
            "radio" => FieldKind::Radio,
            "dropdown" => FieldKind::Dropdown,
            "image" => FieldKind::Image,
            "info" => FieldKind::Info,
            other => FieldKind::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Boolean => "boolean",
            FieldKind::Radio => "radio",
            FieldKind::Dropdown => "dropdown",
            FieldKind::Image => "image",
            FieldKind::Info => "info",
            FieldKind::Other(tag) => tag,
        }
    }

    /// Kinds validated by numeric parse + min/max bounds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Number)
    }

    /// Kinds where a required value must be strictly `true`.
    pub fn is_boolean(&self) -> bool {
        matches!(self, FieldKind::Boolean)
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FieldKind::from_tag(&tag))
    }
}
