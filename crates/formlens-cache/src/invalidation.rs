use crate::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formlens_core::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseChange {
    Created,
    Updated,
    Deleted,
}

/// Invalidation event types
#[derive(Debug, Clone)]
pub enum InvalidationEvent {
    /// A response of the form was created, edited or deleted
    ResponseChanged {
        form_id: String,
        response_id: String,
        change: ResponseChange,
        at: DateTime<Utc>,
    },
    /// Explicit purge of everything cached for the form
    Manual { form_id: String, reason: String },
}

impl InvalidationEvent {
    pub fn form_id(&self) -> &str {
        match self {
            InvalidationEvent::ResponseChanged { form_id, .. } => form_id,
            InvalidationEvent::Manual { form_id, .. } => form_id,
        }
    }
}

/// Trait for handling invalidation events
#[async_trait]
pub trait InvalidationListener: Send + Sync {
    async fn on_invalidation(&self, event: &InvalidationEvent) -> Result<()>;

    /// A required listener's failure fails the dispatch. Observers are logged and skipped.
    fn is_required(&self) -> bool {
        false
    }
}

/// Fans response-mutation events out to registered listeners.
///
/// The analytics engine never invalidates on its own; the response ingestion
/// path is expected to call [`InvalidationManager::response_changed`] after
/// every create, update or delete.
#[derive(Default)]
pub struct InvalidationManager {
    listeners: Vec<Arc<dyn InvalidationListener>>,
}

impl InvalidationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn InvalidationListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub async fn response_changed(
        &self,
        form_id: &str,
        response_id: &str,
        change: ResponseChange,
    ) -> Result<()> {
        self.dispatch(InvalidationEvent::ResponseChanged {
            form_id: form_id.to_string(),
            response_id: response_id.to_string(),
            change,
            at: Utc::now(),
        })
        .await
    }

    pub async fn invalidate_form(&self, form_id: &str, reason: &str) -> Result<()> {
        self.dispatch(InvalidationEvent::Manual {
            form_id: form_id.to_string(),
            reason: reason.to_string(),
        })
        .await
    }

    /// Every listener sees the event. The first error from a required
    /// listener is returned once all listeners have run.
    pub async fn dispatch(&self, event: InvalidationEvent) -> Result<()> {
        let mut first_error = None;
        for listener in &self.listeners {
            if let Err(e) = listener.on_invalidation(&event).await {
                warn!("Invalidation listener failed: {:?}", e);
                if listener.is_required() && first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Simple logging invalidation listener
pub struct LoggingInvalidationListener;

#[async_trait]
impl InvalidationListener for LoggingInvalidationListener {
    async fn on_invalidation(&self, event: &InvalidationEvent) -> Result<()> {
        match event {
            InvalidationEvent::ResponseChanged {
                form_id,
                response_id,
                change,
                at,
            } => {
                info!(
                    "Cache invalidation: response '{}' of form '{}' {:?} at {}",
                    response_id, form_id, change, at
                );
            }
            InvalidationEvent::Manual { form_id, reason } => {
                info!(
                    "Cache invalidation: form '{}' purged, reason: {}",
                    form_id, reason
                );
            }
        }
        Ok(())
    }
}

/// Listener that purges every cached entry belonging to the event's form.
pub struct CacheInvalidationListener<V> {
    cache: Arc<dyn CacheStore<V>>,
}

impl<V> CacheInvalidationListener<V> {
    pub fn new(cache: Arc<dyn CacheStore<V>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<V> InvalidationListener for CacheInvalidationListener<V>
where
    V: Send + Sync + 'static,
{
    async fn on_invalidation(&self, event: &InvalidationEvent) -> Result<()> {
        let removed = self.cache.invalidate_form(event.form_id()).await?;
        debug!(
            form_id = event.form_id(),
            removed, "Purged cached entries for form"
        );
        Ok(())
    }

    fn is_required(&self) -> bool {
        true
    }
}
