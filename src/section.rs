//! Section lifecycle: the validation gate, save-payload assembly and the
//! per-section state machine.

use log::warn;
use serde_json::{Map, Value};

use crate::error::SaveError;
use crate::resolve::collect_api_keys;
use crate::store::{FieldStore, ValueLookup};
use crate::types::{Element, SaveAck, Section};
use crate::validate::validate_section;

/// Extension point for section persistence. Transport concerns (base URLs,
/// auth headers, timeouts, retries) live entirely behind this trait.
pub trait SectionTransport {
    /// Persist a section's payload to its configured endpoint.
    fn save_section(&self, endpoint: &str, payload: &Map<String, Value>)
    -> Result<SaveAck, SaveError>;

    /// Fetch previously captured values for a section, keyed by api key.
    fn fetch_section(&self, endpoint: &str) -> Result<Map<String, Value>, SaveError>;
}

/// Where a section instance currently is in its submit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionPhase {
    Idle,
    Validating,
    Saving,
    IdleWithError,
}

/// The last surfaced save outcome, for the section header UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveStatus {
    Success { message: String },
    Error { message: String },
}

/// What a submit attempt amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The section has no save endpoint; submitting is a configuration
    /// condition, not a failure, and changes nothing.
    NotSubmittable,
    /// Validation failed; every failing field's error was written to the
    /// store and the save collaborator was not invoked.
    RejectedByValidation { error_count: usize },
    Saved,
    /// The collaborator failed; its message is surfaced verbatim. An
    /// auth-expired failure must be escalated by the host.
    SaveFailed { auth_expired: bool },
}

/// Orchestrates one section: `Idle → Validating → (Saving →
/// Idle | IdleWithError) | IdleWithError`.
#[derive(Clone, Debug)]
pub struct SectionController {
    section: Section,
    phase: SectionPhase,
    status: Option<SaveStatus>,
}

impl SectionController {
    pub fn new(section: Section) -> Self {
        SectionController { section, phase: SectionPhase::Idle, status: None }
    }

    pub fn key(&self) -> &str {
        &self.section.key
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn phase(&self) -> SectionPhase {
        self.phase
    }

    pub fn status(&self) -> Option<&SaveStatus> {
        self.status.as_ref()
    }

    /// Validate and save this section.
    ///
    /// The payload is a snapshot of the store taken synchronously here;
    /// values edited after submission do not alter an in-flight save.
    /// There is no automatic retry — a retry is a user-initiated
    /// re-submit.
    pub fn submit(
        &mut self,
        store: &mut FieldStore,
        transport: &dyn SectionTransport,
    ) -> SubmitOutcome {
        let Some(endpoint) = self.section.save_endpoint().map(str::to_string) else {
            return SubmitOutcome::NotSubmittable;
        };

        self.phase = SectionPhase::Validating;
        let validation = validate_section(store, &self.section.elements);
        if !validation.is_valid {
            let error_count = validation.errors.len();
            for (key, message) in validation.errors {
                store.set_error(key, message);
            }
            self.phase = SectionPhase::IdleWithError;
            self.status = Some(SaveStatus::Error {
                message: "Please fix validation errors before saving".to_string(),
            });
            return SubmitOutcome::RejectedByValidation { error_count };
        }

        self.phase = SectionPhase::Saving;
        self.status = None;
        let payload = build_payload(&self.section.elements, store);

        match transport.save_section(&endpoint, &payload) {
            Ok(ack) => {
                self.phase = SectionPhase::Idle;
                let message = if ack.message.is_empty() {
                    "Section saved successfully".to_string()
                } else {
                    ack.message
                };
                self.status = Some(SaveStatus::Success { message });
                SubmitOutcome::Saved
            }
            Err(err) => {
                warn!("section '{}' save failed: {}", self.section.key, err);
                let auth_expired = err.is_auth_expired();
                self.phase = SectionPhase::IdleWithError;
                self.status = Some(SaveStatus::Error { message: err.message });
                SubmitOutcome::SaveFailed { auth_expired }
            }
        }
    }

    /// Collapse/reset: clear this section's own keys plus all nested
    /// dependent keys from the store, and return to Idle.
    pub fn reset(&mut self, store: &mut FieldStore) {
        let keys = collect_api_keys(&self.section.elements);
        store.reset_keys(keys.iter().map(String::as_str));
        self.phase = SectionPhase::Idle;
        self.status = None;
    }
}

/// Build a section's save payload: every element whose api key has a store
/// entry contributes `{apiKey: value}`, recursing into dependent fields
/// unconditionally — collapsed dependents keep previously captured
/// answers. Output order follows the element walk.
pub fn build_payload(elements: &[Element], values: &impl ValueLookup) -> Map<String, Value> {
    let mut payload = Map::new();
    collect_payload(elements, values, &mut payload);
    payload
}

fn collect_payload(
    elements: &[Element],
    values: &impl ValueLookup,
    payload: &mut Map<String, Value>,
) {
    for element in elements {
        if let Some(key) = element.api_key.as_deref()
            && let Some(value) = values.lookup(key)
        {
            payload.insert(key.to_string(), value.clone());
        }
        collect_payload(element.dependents(), values, payload);
    }
}
