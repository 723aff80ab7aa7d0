use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::ReferencePolicy, dao::document_store::DocumentStore, error::ServiceError};

/// Cheaply clonable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and request-independent settings.
pub struct AppState {
    document_store: RwLock<Option<Arc<dyn DocumentStore>>>,
    degraded: watch::Sender<bool>,
    reference_policy: ReferencePolicy,
    resource_prefix: String,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    /// `resource_prefix` is prepended to every link the API hands out.
    pub fn new(reference_policy: ReferencePolicy, resource_prefix: impl Into<String>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            document_store: RwLock::new(None),
            degraded: degraded_tx,
            reference_policy,
            resource_prefix: resource_prefix.into(),
        })
    }

    /// Obtain a handle to the current document store, if one is installed.
    pub async fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.document_store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`Self::document_store`] but fails with [`ServiceError::Degraded`]
    /// while no healthy backend is available.
    pub async fn require_document_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.document_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new document store implementation and leave degraded mode.
    pub async fn install_document_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.document_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current document store and enter degraded mode.
    pub async fn clear_document_store(&self) {
        {
            let mut guard = self.document_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Server-side reference checking applied by the record services.
    pub fn reference_policy(&self) -> ReferencePolicy {
        self.reference_policy
    }

    /// Route prefix under which the resource endpoints are mounted (`""` or `/segment`).
    pub fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }
}
