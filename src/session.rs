//! One interactive session against one service origin.
//!
//! The session owns the fetched catalog, the preset library derived from
//! it, and the active form. The three are only ever replaced together, so
//! a failed refresh can never leave the form pointing at a stale catalog.

use crate::client::{ClientError, HealthStatus, PredictionClient, PredictionResult};
use crate::form::{FormError, FormModel};
use crate::payload::{self, BatchOutcome, PayloadError, PayloadOutcome};
use crate::present::{self, Summary};
use crate::presets::{self, Preset, PresetLibrary};
use crate::schema::{ModelCatalog, ModelKind};

/// Session-level failures; each leaves the session usable.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A network operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// A form operation was rejected.
    #[error(transparent)]
    Form(#[from] FormError),
    /// A payload could not be built.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// No model is selected yet (catalog empty or never fetched).
    #[error("No model selected; fetch the catalog and pick a model first")]
    NoSelection,
    /// The selected model has no preset at the requested position.
    #[error("No preset #{index} for the selected model")]
    UnknownPreset {
        /// The out-of-range index.
        index: usize,
    },
}

/// Explicit session state: client, catalog, presets, and the active form.
#[derive(Debug)]
pub struct Session {
    client: PredictionClient,
    catalog: ModelCatalog,
    presets: PresetLibrary,
    form: Option<FormModel>,
}

impl Session {
    /// A session with nothing fetched yet. The model list stays empty until
    /// a catalog refresh succeeds.
    pub fn new(client: PredictionClient) -> Self {
        Self {
            client,
            catalog: ModelCatalog::default(),
            presets: PresetLibrary::default(),
            form: None,
        }
    }

    /// Create a session and fetch the catalog in one step.
    pub fn connect(client: PredictionClient) -> Result<Self, SessionError> {
        let mut session = Self::new(client);
        session.refresh_catalog()?;
        Ok(session)
    }

    /// The network client the session is bound to.
    pub fn client(&self) -> &PredictionClient {
        &self.client
    }

    /// The most recently fetched catalog.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Models the catalog currently declares, in display order.
    pub fn available_models(&self) -> Vec<ModelKind> {
        self.catalog.available()
    }

    /// The active form, if a model is selected.
    pub fn form(&self) -> Option<&FormModel> {
        self.form.as_ref()
    }

    /// The selected model kind, if any.
    pub fn selected(&self) -> Option<ModelKind> {
        self.form.as_ref().map(FormModel::kind)
    }

    /// Re-fetch the catalog, replacing catalog, presets, and form together.
    ///
    /// On failure nothing changes. On success the current selection is kept
    /// when the new catalog still declares it, and field values carry over
    /// by name so a refresh does not wipe in-progress edits.
    pub fn refresh_catalog(&mut self) -> Result<(), SessionError> {
        let catalog = self.client.fetch_catalog()?;
        let presets = PresetLibrary::from_catalog(&catalog);
        let form = rebuild_form(&catalog, self.form.as_ref());
        self.catalog = catalog;
        self.presets = presets;
        self.form = form;
        Ok(())
    }

    /// Switch the active model, rebuilding the form with cleared values.
    pub fn select_model(&mut self, kind: ModelKind) -> Result<(), SessionError> {
        let form = FormModel::build(kind, &self.catalog)?;
        self.form = Some(form);
        Ok(())
    }

    /// Overwrite one field of the active form.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        let form = self.form.as_mut().ok_or(SessionError::NoSelection)?;
        form.set_value(name, value)?;
        Ok(())
    }

    /// Clear every field of the active form.
    pub fn clear_form(&mut self) -> Result<(), SessionError> {
        let form = self.form.as_mut().ok_or(SessionError::NoSelection)?;
        form.clear();
        Ok(())
    }

    /// Presets for the selected model, in menu order.
    pub fn presets(&self) -> &[Preset] {
        match self.selected() {
            Some(kind) => self.presets.presets_for(kind),
            None => &[],
        }
    }

    /// Fill the form from the preset at `index`; returns the preset's name.
    pub fn apply_preset(&mut self, index: usize) -> Result<String, SessionError> {
        let kind = self.selected().ok_or(SessionError::NoSelection)?;
        let preset = self
            .presets
            .presets_for(kind)
            .get(index)
            .cloned()
            .ok_or(SessionError::UnknownPreset { index })?;
        let form = self.form.as_mut().ok_or(SessionError::NoSelection)?;
        presets::apply(&preset, form);
        Ok(preset.name)
    }

    /// Build a sanitized payload from the form, with an optional raw JSON
    /// override merged on top.
    pub fn build_payload(
        &self,
        override_json: Option<&str>,
    ) -> Result<PayloadOutcome, SessionError> {
        let form = self.form.as_ref().ok_or(SessionError::NoSelection)?;
        Ok(payload::build_with_override(form, override_json)?)
    }

    /// Build a sanitized batch payload for the selected model.
    pub fn build_batch(&self, rows_json: &str) -> Result<BatchOutcome, SessionError> {
        let kind = self.selected().ok_or(SessionError::NoSelection)?;
        let entry = self
            .catalog
            .entry(kind)
            .ok_or(SessionError::NoSelection)?;
        Ok(payload::build_batch(entry, rows_json)?)
    }

    /// Submit a payload to the service.
    pub fn predict(
        &self,
        payload: &payload::RequestPayload,
    ) -> Result<PredictionResult, SessionError> {
        Ok(self.client.predict(payload)?)
    }

    /// Submit a batch payload to the service.
    pub fn predict_batch(
        &self,
        payload: &payload::BatchPayload,
    ) -> Result<Vec<PredictionResult>, SessionError> {
        Ok(self.client.predict_batch(payload)?)
    }

    /// Check service health.
    pub fn health(&self) -> Result<HealthStatus, SessionError> {
        Ok(self.client.health()?)
    }

    /// Summarize a response using the catalog's cluster labels.
    pub fn present(&self, result: &PredictionResult) -> Summary {
        present::present(result, self.catalog.cluster_labels())
    }
}

fn rebuild_form(catalog: &ModelCatalog, previous: Option<&FormModel>) -> Option<FormModel> {
    let kind = previous
        .map(FormModel::kind)
        .filter(|kind| catalog.entry(*kind).is_some())
        .or_else(|| catalog.available().first().copied())?;
    let entry = catalog.entry(kind)?;
    let mut form = FormModel::from_entry(entry);
    if let Some(previous) = previous
        && previous.kind() == kind
    {
        for field in form.fields().to_vec() {
            let value = previous.value_of(&field.name).to_string();
            if !value.is_empty() {
                let _ = form.set_value(&field.name, value);
            }
        }
    }
    Some(form)
}
