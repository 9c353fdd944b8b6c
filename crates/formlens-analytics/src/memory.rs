//! Process-local implementations of the collaborator traits.
//!
//! Used by the CLI to run over exported JSON and by tests. A real deployment
//! plugs its own database-backed repository and schema provider in instead.

use async_trait::async_trait;
use formlens_cache::ResponseChange;
use formlens_core::{
    CollaborativeSchemaSource, FormId, FormLensError, FormResponse, FormSchema,
    FormSchemaProvider, ResponseRepository, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Responses grouped by form, kept in insertion order and sorted on read.
#[derive(Clone, Default)]
pub struct InMemoryResponseStore {
    forms: Arc<RwLock<HashMap<FormId, Vec<FormResponse>>>>,
}

impl InMemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (matched by `response_id`) a response.
    pub fn upsert(&self, form_id: &str, response: FormResponse) -> ResponseChange {
        let mut forms = self.forms.write();
        let responses = forms.entry(form_id.to_string()).or_default();
        match responses
            .iter_mut()
            .find(|existing| existing.response_id == response.response_id)
        {
            Some(existing) => {
                *existing = response;
                ResponseChange::Updated
            }
            None => {
                responses.push(response);
                ResponseChange::Created
            }
        }
    }

    pub fn extend(&self, form_id: &str, responses: impl IntoIterator<Item = FormResponse>) {
        for response in responses {
            self.upsert(form_id, response);
        }
    }

    pub fn remove(&self, form_id: &str, response_id: &str) -> Option<FormResponse> {
        let mut forms = self.forms.write();
        let responses = forms.get_mut(form_id)?;
        let index = responses
            .iter()
            .position(|r| r.response_id == response_id)?;
        Some(responses.remove(index))
    }

    pub fn count(&self, form_id: &str) -> usize {
        self.forms.read().get(form_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ResponseRepository for InMemoryResponseStore {
    async fn list_responses(&self, form_id: &str) -> Result<Vec<FormResponse>> {
        let mut responses = self.forms.read().get(form_id).cloned().unwrap_or_default();
        responses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(responses)
    }
}

/// Known forms and their saved layouts.
///
/// A form registered without a layout answers `Ok(None)`; a form that was never
/// registered answers [`FormLensError::FormNotFound`].
#[derive(Clone, Default)]
pub struct InMemorySchemaStore {
    schemas: Arc<RwLock<HashMap<FormId, Option<FormSchema>>>>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the form known without giving it a layout.
    pub fn register_form(&self, form_id: &str) {
        self.schemas.write().entry(form_id.to_string()).or_insert(None);
    }

    pub fn set_schema(&self, form_id: &str, schema: FormSchema) {
        self.schemas.write().insert(form_id.to_string(), Some(schema));
    }

    pub fn remove_form(&self, form_id: &str) -> bool {
        self.schemas.write().remove(form_id).is_some()
    }
}

#[async_trait]
impl FormSchemaProvider for InMemorySchemaStore {
    async fn get_schema(&self, form_id: &str) -> Result<Option<FormSchema>> {
        self.schemas
            .read()
            .get(form_id)
            .cloned()
            .ok_or_else(|| FormLensError::FormNotFound(form_id.to_string()))
    }
}

/// Stand-in for the collaborative editing document store.
#[derive(Clone, Default)]
pub struct InMemoryCollaborativeSource {
    documents: Arc<RwLock<HashMap<FormId, FormSchema>>>,
}

impl InMemoryCollaborativeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_document(&self, form_id: &str, schema: FormSchema) {
        self.documents.write().insert(form_id.to_string(), schema);
    }
}

#[async_trait]
impl CollaborativeSchemaSource for InMemoryCollaborativeSource {
    async fn load_schema(&self, form_id: &str) -> Result<Option<FormSchema>> {
        Ok(self.documents.read().get(form_id).cloned())
    }
}
