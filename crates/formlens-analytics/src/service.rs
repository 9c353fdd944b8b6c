use crate::analyzers::{analyzer_for, AnalysisInput, TextOptions};
use crate::extraction::extract_field_values;
use crate::results::{FieldAnalyticsResult, FormAnalyticsReport};
use formlens_cache::{
    CacheConfig, CacheInvalidationListener, CacheKey, CacheStats, CacheStore, InvalidationListener,
    InvalidationManager, LoggingInvalidationListener, ResponseChange, TtlCache,
};
use formlens_core::{
    AnalyticsConfig, CacheSettings, CollaborativeSchemaSource, FieldDefinition, FieldType,
    FormLensConfig, FormLensError, FormResponse, FormSchema, FormSchemaProvider,
    ResponseRepository, Result,
};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Cache namespace of computed per-field aggregates.
pub const FIELD_ANALYTICS_NAMESPACE: &str = "field_analytics";
/// Cache namespace of fetched response lists.
pub const RESPONSES_NAMESPACE: &str = "responses";

const RESPONSE_LIST_KIND: &str = "all";

/// Everything the service keeps in its cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Responses(Arc<Vec<FormResponse>>),
    Field(Arc<FieldAnalyticsResult>),
}

/// Entry point used by the resolver layer.
///
/// Field aggregates and response lists are cached per form. Nothing here
/// invalidates on its own: the response write path must call
/// [`FieldAnalyticsService::response_changed`] or
/// [`FieldAnalyticsService::invalidate_field_analytics_cache`] after every
/// create, update or delete.
pub struct FieldAnalyticsService {
    responses: Arc<dyn ResponseRepository>,
    schemas: Arc<dyn FormSchemaProvider>,
    collaborative: Option<Arc<dyn CollaborativeSchemaSource>>,
    cache: Arc<TtlCache<CachedValue>>,
    invalidation: InvalidationManager,
    analytics: AnalyticsConfig,
    cache_settings: CacheSettings,
    text_options: TextOptions,
}

impl FieldAnalyticsService {
    pub fn new(
        responses: Arc<dyn ResponseRepository>,
        schemas: Arc<dyn FormSchemaProvider>,
        config: &FormLensConfig,
    ) -> Self {
        let cache = Arc::new(TtlCache::new(CacheConfig::from(&config.cache)));

        let mut invalidation = InvalidationManager::new();
        let store: Arc<dyn CacheStore<CachedValue>> = cache.clone();
        invalidation.add_listener(Arc::new(CacheInvalidationListener::new(store)));
        invalidation.add_listener(Arc::new(LoggingInvalidationListener));

        Self {
            responses,
            schemas,
            collaborative: None,
            cache,
            invalidation,
            analytics: config.analytics.clone(),
            cache_settings: config.cache.clone(),
            text_options: TextOptions::from(&config.analytics),
        }
    }

    /// Consult `source` when the primary schema provider has no fields for a form.
    pub fn with_collaborative_source(mut self, source: Arc<dyn CollaborativeSchemaSource>) -> Self {
        self.collaborative = Some(source);
        self
    }

    pub fn add_invalidation_listener(&mut self, listener: Arc<dyn InvalidationListener>) {
        self.invalidation.add_listener(listener);
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        &self.cache
    }

    /// Aggregate for one field, served from cache when a live entry exists.
    ///
    /// Layout and unknown field types fail with
    /// [`FormLensError::UnsupportedFieldType`] before anything is fetched.
    #[instrument(skip(self))]
    pub async fn get_field_analytics(
        &self,
        form_id: &str,
        field_id: &str,
        field_type: &FieldType,
        field_label: &str,
    ) -> Result<FieldAnalyticsResult> {
        let analyzer = analyzer_for(field_type, &self.text_options)?;

        let key = CacheKey::new(
            FIELD_ANALYTICS_NAMESPACE,
            form_id,
            field_id,
            field_type.as_str(),
        );
        if let Some(CachedValue::Field(cached)) = self.cache.get(&key).await? {
            debug!("Field analytics cache hit");
            return Ok(cached.as_ref().clone());
        }

        let responses = self.form_responses(form_id).await?;
        let values = extract_field_values(&responses, field_id);
        let result = analyzer.analyze(&AnalysisInput {
            responses: &values,
            field_id,
            field_type,
            field_label,
            total_form_responses: responses.len(),
        });
        debug!(
            answers = values.len(),
            form_responses = responses.len(),
            "Computed field analytics"
        );

        self.cache
            .insert(
                key,
                CachedValue::Field(Arc::new(result.clone())),
                Some(self.cache_settings.analytics_ttl()),
            )
            .await?;
        Ok(result)
    }

    /// Resolve a field's type and label from the form schema, then analyze it.
    #[instrument(skip(self))]
    pub async fn get_field_analytics_by_id(
        &self,
        form_id: &str,
        field_id: &str,
    ) -> Result<FieldAnalyticsResult> {
        let schema = self
            .load_schema(form_id)
            .await?
            .ok_or_else(|| FormLensError::FormNotFound(form_id.to_string()))?;
        let field = schema.find_field(field_id).ok_or_else(|| {
            FormLensError::InvalidOperation(format!(
                "field '{}' does not exist in form '{}'",
                field_id, form_id
            ))
        })?;

        self.get_field_analytics(form_id, &field.id, &field.field_type, &field.label)
            .await
    }

    /// Aggregates for every answerable field of the form.
    ///
    /// A form without a schema (or an unknown form) yields an empty report.
    /// Fields are analyzed `batch_size` at a time; the first failing field
    /// fails the whole call.
    #[instrument(skip(self))]
    pub async fn get_all_fields_analytics(&self, form_id: &str) -> Result<FormAnalyticsReport> {
        let schema = match self.load_schema(form_id).await {
            Ok(Some(schema)) => schema,
            Ok(None) => {
                info!("Form {} has no schema yet, returning empty report", form_id);
                return Ok(FormAnalyticsReport::empty(form_id));
            }
            Err(FormLensError::FormNotFound(_)) => {
                info!("Form {} not found, returning empty report", form_id);
                return Ok(FormAnalyticsReport::empty(form_id));
            }
            Err(e) => return Err(e),
        };

        let fields: Vec<&FieldDefinition> = schema
            .fields()
            .filter(|field| !field.field_type.is_structural())
            .collect();
        let responses = self.form_responses(form_id).await?;

        let batch_size = self.analytics.batch_size.max(1);
        let mut results = Vec::with_capacity(fields.len());
        for batch in fields.chunks(batch_size) {
            let batch_results = try_join_all(batch.iter().map(|field| {
                self.get_field_analytics(form_id, &field.id, &field.field_type, &field.label)
            }))
            .await?;
            results.extend(batch_results);
        }

        info!(
            "Analyzed {} fields over {} responses for form {}",
            results.len(),
            responses.len(),
            form_id
        );
        Ok(FormAnalyticsReport {
            form_id: form_id.to_string(),
            total_responses: responses.len(),
            fields: results,
        })
    }

    /// Drop every cached response list and field aggregate of the form.
    #[instrument(skip(self))]
    pub async fn invalidate_field_analytics_cache(&self, form_id: &str) -> Result<()> {
        self.invalidation
            .invalidate_form(form_id, "field analytics invalidated")
            .await
    }

    /// Notify listeners (the cache among them) that a response changed.
    #[instrument(skip(self))]
    pub async fn response_changed(
        &self,
        form_id: &str,
        response_id: &str,
        change: ResponseChange,
    ) -> Result<()> {
        self.invalidation
            .response_changed(form_id, response_id, change)
            .await
    }

    /// Sweep expired cache entries; returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.snapshot_stats()
    }

    /// Primary schema, then the collaborative document when the primary one has no fields.
    async fn load_schema(&self, form_id: &str) -> Result<Option<FormSchema>> {
        if let Some(schema) = self.schemas.get_schema(form_id).await? {
            if !schema.is_empty() {
                return Ok(Some(schema));
            }
        }

        if let Some(source) = &self.collaborative {
            debug!("Primary schema empty, trying collaborative document");
            if let Some(schema) = source.load_schema(form_id).await? {
                if !schema.is_empty() {
                    return Ok(Some(schema));
                }
            }
        }
        Ok(None)
    }

    async fn form_responses(&self, form_id: &str) -> Result<Arc<Vec<FormResponse>>> {
        let key = CacheKey::new(RESPONSES_NAMESPACE, form_id, "", RESPONSE_LIST_KIND);
        if let Some(CachedValue::Responses(cached)) = self.cache.get(&key).await? {
            return Ok(cached);
        }

        let responses = Arc::new(self.responses.list_responses(form_id).await?);
        self.cache
            .insert(
                key,
                CachedValue::Responses(Arc::clone(&responses)),
                Some(self.cache_settings.response_ttl()),
            )
            .await?;
        Ok(responses)
    }
}
