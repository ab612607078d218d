//! The form engine: schema provider plus orchestration across the store,
//! resolver, validator and section controllers.
//!
//! All external concerns arrive as constructor-injected collaborator
//! traits — there are no ambient singletons. Each trait is the narrow seam
//! to exactly one concern; transport details (retries, timeouts, auth
//! headers) live behind them.

use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{
    LocationError, OptionsFetchError, SaveError, SchemaError, UploadError, UploadErrorKind,
};
use crate::normalize::normalize;
use crate::parse::parse;
use crate::primitives::sanitize_values;
use crate::resolve::{RenderedElement, resolve_visible};
use crate::section::{SectionController, SectionTransport, SubmitOutcome};
use crate::store::FieldStore;
use crate::types::{
    Element, FieldOption, FilePayload, GeoPosition, PageConfig, UploadPolicy, UploadedFile,
};
use crate::validate::validate;

// ─── Collaborator traits ────────────────────────────────────────────────────

/// Source of the raw page-config document. The engine owns parsing,
/// conformance checking and normalization; the source owns only transport.
pub trait ConfigSource {
    fn fetch_page_config(&self) -> Result<String, SchemaError>;
}

/// Resolves a remote option-list source key.
pub trait OptionsSource {
    fn fetch_options(&self, source_key: &str) -> Result<Vec<FieldOption>, OptionsFetchError>;
}

/// File-upload transport. The engine enforces size and MIME constraints
/// before this is invoked.
pub trait FileUploader {
    fn upload(&self, file: &FilePayload) -> Result<UploadedFile, UploadError>;
}

/// Device geolocation. Failure reasons are distinguished for user
/// messaging.
pub trait LocationProvider {
    fn current_position(&self) -> Result<GeoPosition, LocationError>;
}

/// The full set of injected collaborators.
pub struct Collaborators {
    pub config: Box<dyn ConfigSource>,
    pub options: Box<dyn OptionsSource>,
    pub sections: Box<dyn SectionTransport>,
    pub uploader: Box<dyn FileUploader>,
    pub location: Box<dyn LocationProvider>,
}

/// Engine-level configuration.
#[derive(Clone, Debug, Default)]
pub struct EngineOptions {
    pub upload: UploadPolicy,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Orchestrates one form instance: the immutable page config, the field
/// value store, per-section controllers and the remote-options cache.
pub struct FormEngine {
    collaborators: Collaborators,
    options: EngineOptions,
    config: Option<PageConfig>,
    store: FieldStore,
    controllers: HashMap<String, SectionController>,
    options_cache: HashMap<String, Vec<FieldOption>>,
}

impl FormEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        Self::with_options(collaborators, EngineOptions::default())
    }

    pub fn with_options(collaborators: Collaborators, options: EngineOptions) -> Self {
        FormEngine {
            collaborators,
            options,
            config: None,
            store: FieldStore::new(),
            controllers: HashMap::new(),
            options_cache: HashMap::new(),
        }
    }

    // ─── Config lifecycle ───────────────────────────────────────────────

    /// Fetch, parse, conformance-check and normalize the page config.
    ///
    /// Conformance warnings are logged; conformance errors make the whole
    /// load fail — a malformed schema is a page-level error state, not a
    /// partially rendered form.
    pub fn load(&mut self) -> Result<&PageConfig, SchemaError> {
        let raw = self.collaborators.config.fetch_page_config()?;
        let config = parse(&raw).map_err(SchemaError::Parse)?;

        let result = validate(&config);
        for w in &result.warnings {
            warn!(
                "config [{}] {}: {}",
                w.code,
                w.path.as_deref().unwrap_or("-"),
                w.message
            );
        }
        if !result.is_valid() {
            return Err(SchemaError::Validation(result.errors));
        }

        let config = normalize(config);
        self.controllers.clear();
        self.options_cache.clear();
        Ok(self.config.insert(config))
    }

    /// Explicit reload: the only way an already-loaded config changes. The
    /// store is reset too — a reloaded schema may rename keys, and stale
    /// values must not leak into the next save.
    pub fn reload(&mut self) -> Result<&PageConfig, SchemaError> {
        self.store.reset_all();
        self.load()
    }

    pub fn page(&self) -> Option<&PageConfig> {
        self.config.as_ref()
    }

    // ─── Store access ───────────────────────────────────────────────────

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FieldStore {
        &mut self.store
    }

    /// Record a user edit. Clears any existing error for the field; the
    /// value is re-validated only on the next submit.
    pub fn set_value(&mut self, api_key: impl Into<String>, value: Value) {
        self.store.set_value(api_key, value);
    }

    pub fn touch(&mut self, api_key: impl Into<String>) {
        self.store.set_touched(api_key);
    }

    /// Bulk pre-fill from a previous workflow stage. Values are sanitized
    /// (strings trimmed, empties dropped) before merging.
    pub fn prefill(&mut self, values: impl IntoIterator<Item = (String, Value)>) {
        self.store.set_many(sanitize_values(values));
    }

    // ─── Rendering ──────────────────────────────────────────────────────

    /// The ordered list of elements a section should render right now.
    pub fn visible_elements(&self, section_key: &str) -> Vec<RenderedElement<'_>> {
        let Some(section) = self.config.as_ref().and_then(|c| c.section(section_key)) else {
            return Vec::new();
        };
        resolve_visible(&section.elements, &self.store)
    }

    /// Whether the element owning `api_key` is in any section's currently
    /// resolved tree.
    pub fn is_mounted(&self, api_key: &str) -> bool {
        let Some(config) = self.config.as_ref() else {
            return false;
        };
        config.sections().any(|section| {
            resolve_visible(&section.elements, &self.store)
                .iter()
                .any(|r| r.element.api_key.as_deref() == Some(api_key))
        })
    }

    // ─── Options ────────────────────────────────────────────────────────

    /// The option list for a select-like element: static options if
    /// embedded, otherwise the cached or freshly fetched remote list.
    /// A fetch failure logs a warning and yields an empty list — the
    /// element renders without options rather than crashing the tree; the
    /// next call retries.
    pub fn options_for(&mut self, api_key: &str) -> Vec<FieldOption> {
        let Some(element) = self.config.as_ref().and_then(|c| c.element(api_key)) else {
            return Vec::new();
        };
        if let Some(options) = &element.options
            && !options.is_empty()
        {
            return options.clone();
        }
        let Some(source) = element.options_source.clone() else {
            return Vec::new();
        };

        if let Some(cached) = self.options_cache.get(&source) {
            return cached.clone();
        }
        match self.collaborators.options.fetch_options(&source) {
            Ok(options) => {
                self.options_cache.insert(source, options.clone());
                options
            }
            Err(err) => {
                warn!("failed to load options: {}", err);
                Vec::new()
            }
        }
    }

    /// Completion path for an event-driven host that ran the options fetch
    /// itself: apply the result unless the owning element has since left
    /// the visible tree, in which case the stale result is discarded.
    /// Returns whether the result was applied.
    pub fn apply_fetched_options(
        &mut self,
        api_key: &str,
        source_key: &str,
        options: Vec<FieldOption>,
    ) -> bool {
        if !self.is_mounted(api_key) {
            debug!(
                "discarding options for '{}': element '{}' is no longer mounted",
                source_key, api_key
            );
            return false;
        }
        self.options_cache.insert(source_key.to_string(), options);
        true
    }

    // ─── Section operations ─────────────────────────────────────────────

    /// Pre-fill a section from its fetch endpoint. Sections without one
    /// simply have nothing to hydrate. Returns the number of fields
    /// merged.
    pub fn hydrate_section(&mut self, section_key: &str) -> Result<usize, SaveError> {
        let Some(endpoint) = self
            .config
            .as_ref()
            .and_then(|c| c.section(section_key))
            .and_then(|s| s.fetch_endpoint())
            .map(str::to_string)
        else {
            return Ok(0);
        };

        let fetched = self.collaborators.sections.fetch_section(&endpoint)?;
        let values = sanitize_values(fetched);
        let count = values.len();
        self.store.set_many(values);
        Ok(count)
    }

    /// Validate and save a section. See [`SectionController::submit`] for
    /// the state machine. An auth-expired failure is reported in the
    /// outcome so the host can clear credentials and redirect — that side
    /// effect is deliberately outside the engine.
    pub fn submit_section(&mut self, section_key: &str) -> SubmitOutcome {
        if !self.controllers.contains_key(section_key) {
            let Some(section) = self.config.as_ref().and_then(|c| c.section(section_key)) else {
                warn!("submit for unknown section '{}'", section_key);
                return SubmitOutcome::NotSubmittable;
            };
            self.controllers
                .insert(section_key.to_string(), SectionController::new(section.clone()));
        }
        let Some(controller) = self.controllers.get_mut(section_key) else {
            return SubmitOutcome::NotSubmittable;
        };
        controller.submit(&mut self.store, self.collaborators.sections.as_ref())
    }

    /// The controller state for a section, if it has been interacted with.
    pub fn section_state(&self, section_key: &str) -> Option<&SectionController> {
        self.controllers.get(section_key)
    }

    /// Collapse/reset a section: clear its own keys plus all nested
    /// dependent keys so stale values do not leak into a later save.
    pub fn reset_section(&mut self, section_key: &str) {
        if let Some(controller) = self.controllers.get_mut(section_key) {
            controller.reset(&mut self.store);
            return;
        }
        if let Some(section) = self.config.as_ref().and_then(|c| c.section(section_key)) {
            let keys = crate::resolve::collect_api_keys(&section.elements);
            self.store.reset_keys(keys.iter().map(String::as_str));
        }
    }

    /// Full form reset: every field, every section controller.
    pub fn reset_form(&mut self) {
        self.store.reset_all();
        self.controllers.clear();
    }

    // ─── Uploads ────────────────────────────────────────────────────────

    /// Upload a file for an image element. Size and MIME-type constraints
    /// are enforced locally first; a rejected file never reaches the
    /// transport. On success the resulting URL becomes the field value.
    pub fn upload_image(
        &mut self,
        api_key: &str,
        file: &FilePayload,
    ) -> Result<UploadedFile, UploadError> {
        if let Err(err) = self.options.upload.check(file) {
            self.store.set_error(api_key, err.message.clone());
            return Err(err);
        }

        self.store.set_touched(api_key);
        match self.collaborators.uploader.upload(file) {
            Ok(uploaded) => {
                self.store.set_value(api_key, Value::String(uploaded.url.clone()));
                Ok(uploaded)
            }
            Err(err) => {
                warn!("upload for '{}' failed: {}", api_key, err);
                self.store.set_error(api_key, "Failed to upload image");
                Err(UploadError { kind: UploadErrorKind::Transport, ..err })
            }
        }
    }

    // ─── Geolocation ────────────────────────────────────────────────────

    /// Capture the device position into an element's value. Each failure
    /// reason carries its own user-facing message, written to the field's
    /// error slot.
    pub fn capture_location(&mut self, api_key: &str) -> Result<GeoPosition, LocationError> {
        self.store.set_touched(api_key);
        match self.collaborators.location.current_position() {
            Ok(position) => {
                let value = serde_json::to_value(&position).unwrap_or(Value::Null);
                self.store.set_value(api_key, value);
                Ok(position)
            }
            Err(err) => {
                self.store.set_error(api_key, err.message.clone());
                Err(err)
            }
        }
    }

    /// The auxiliary info elements revealed by an element's current value,
    /// empty when the restricting value does not match.
    pub fn restricted_details<'a>(&self, element: &'a Element) -> &'a [Element] {
        let current = element
            .api_key
            .as_deref()
            .map(|k| self.store.value(k))
            .unwrap_or(&Value::Null);
        crate::resolve::restricted_details_for(element, current)
    }
}
