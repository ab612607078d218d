//! Schema-driven dynamic form engine.
//!
//! A backend describes a whole form as a JSON tree of tabs → sections →
//! elements. This crate provides the complete pipeline for working with
//! that description without any form-specific code per field type:
//!
//! ```text
//! parse(json) → PageConfig → validate(config) → ValidationResult
//!                          → normalize(config) → PageConfig → serialize(config) → json
//! FormEngine::new(collaborators) → resolve / edit / validate / submit
//! ```
//!
//! The engine resolves which elements render for the current field values
//! (conditionally revealed dependent groups included), validates values
//! uniformly across heterogeneous field kinds, and assembles
//! section-scoped save payloads. External concerns — transport, uploads,
//! geolocation — are injected as collaborator traits.
//!
//! # Quick Start
//!
//! ```rust
//! let json = r#"{
//!   "pageName": "Onboarding",
//!   "tabs": [
//!     {
//!       "rbackey": "applicant",
//!       "tabName": "Applicant",
//!       "sections": [
//!         {
//!           "rbackey": "contact_details",
//!           "sectionName": "Contact Details",
//!           "elements": [
//!             {
//!               "component": "textfield",
//!               "apiKey": "firstName",
//!               "label": "First Name",
//!               "type": "text",
//!               "visible": true,
//!               "validation": { "required": true, "maxLength": 50 }
//!             }
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }"#;
//!
//! let result = dynform::load(json).expect("valid config");
//! println!("Loaded: {}", result.config.page_name);
//! ```

pub mod engine;
pub mod enums;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod primitives;
pub mod resolve;
pub mod section;
pub mod serialize;
pub mod store;
pub mod types;
pub mod validate;

pub use error::*;
pub use types::*;

// Re-export entry-point functions and the engine at the crate root for
// convenience.
pub use engine::FormEngine;
pub use normalize::normalize;
pub use parse::parse;
pub use serialize::serialize;
pub use store::FieldStore;
pub use validate::{validate, validate_section, validate_value};

/// Result of the [`load`] convenience entry point.
pub struct LoadResult {
    /// The normalized page config.
    pub config: PageConfig,
    /// Non-fatal warnings produced during validation.
    pub warnings: Vec<Diagnostic>,
}

/// Convenience entry point composing parse → validate → normalize.
///
/// Returns the normalized config and any warnings on success.
///
/// # Errors
///
/// Returns `Err(Vec<FormError>)` if parsing fails or validation finds
/// errors.
pub fn load(input: &str) -> Result<LoadResult, Vec<FormError>> {
    let config = match parse::parse(input) {
        Ok(config) => config,
        Err(e) => return Err(vec![FormError::Parse(e)]),
    };

    let result = validate::validate(&config);
    if !result.is_valid() {
        return Err(result.errors.into_iter().map(FormError::Validation).collect());
    }

    Ok(LoadResult {
        config: normalize::normalize(config),
        warnings: result.warnings,
    })
}
