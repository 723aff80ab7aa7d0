//! Search/create/read/update/delete for one record collection.
//!
//! A single [`RecordService`] is instantiated per entity kind; the field list,
//! defaults and sort order all come from the [`Record`] shape.

use std::{marker::PhantomData, sync::Arc};

use tracing::debug;

use crate::{
    config::ReferencePolicy,
    dao::{
        document_store::DocumentStore,
        models::{Fields, Filter, Record, RecordId, Stored},
    },
    dto::payload::RecordPayload,
    error::ServiceError,
    state::SharedState,
};

/// Entity service bound to the collection of `R`.
pub struct RecordService<R> {
    store: Arc<dyn DocumentStore>,
    policy: ReferencePolicy,
    record: PhantomData<fn() -> R>,
}

impl<R: Record> RecordService<R> {
    /// Service over `store`, checking references according to `policy`.
    pub fn new(store: Arc<dyn DocumentStore>, policy: ReferencePolicy) -> Self {
        Self {
            store,
            policy,
            record: PhantomData,
        }
    }

    /// Bind a service to the storage handle currently installed in `state`.
    pub async fn from_state(state: &SharedState) -> Result<Self, ServiceError> {
        let store = state.require_document_store().await?;
        Ok(Self::new(store, state.reference_policy()))
    }

    /// Records matching every `(field, value)` pair of `filter`, in the fixed sort order.
    pub async fn search(&self, filter: Filter) -> Result<Vec<Stored<R>>, ServiceError> {
        let documents = self.store.find(R::COLLECTION, filter, R::FIELDS).await?;
        debug!(
            collection = R::COLLECTION,
            count = documents.len(),
            "searched records"
        );
        Ok(documents.into_iter().map(Stored::from).collect())
    }

    /// Store a new record; omitted or falsy fields become empty strings.
    pub async fn create(&self, payload: Option<&RecordPayload>) -> Result<Stored<R>, ServiceError> {
        let record = payload.map(R::from_payload).unwrap_or_default();
        self.check_references(&record, R::FIELDS).await?;

        let document = self.store.insert(R::COLLECTION, record.to_fields()).await?;
        debug!(collection = R::COLLECTION, id = %document.id, "created record");
        Ok(document.into())
    }

    /// Load one record; `Ok(None)` when nothing is stored under `id`.
    pub async fn read(&self, id: &str) -> Result<Option<Stored<R>>, ServiceError> {
        let id = RecordId::parse(id)?;
        let document = self.store.find_one(R::COLLECTION, id).await?;
        Ok(document.map(Stored::from))
    }

    /// Overwrite the fields that are present and truthy in `payload`.
    ///
    /// Returns `Ok(None)` without touching storage when the record is absent.
    pub async fn update(
        &self,
        id: &str,
        payload: Option<&RecordPayload>,
    ) -> Result<Option<Stored<R>>, ServiceError> {
        let id = RecordId::parse(id)?;
        let Some(existing) = self.store.find_one(R::COLLECTION, id.clone()).await? else {
            debug!(collection = R::COLLECTION, %id, "update target not found");
            return Ok(None);
        };

        let mut record = R::from_fields(&existing.fields);
        let applied = payload.map(|payload| record.apply(payload)).unwrap_or_default();
        if applied.is_empty() {
            return Ok(Some(Stored { id, record }));
        }
        self.check_references(&record, &applied).await?;

        let set: Fields = applied
            .iter()
            .map(|name| {
                (
                    (*name).to_owned(),
                    record.field(name).unwrap_or_default().to_owned(),
                )
            })
            .collect();
        let updated = self.store.update(R::COLLECTION, id, set).await?;
        if let Some(document) = &updated {
            debug!(collection = R::COLLECTION, id = %document.id, fields = ?applied, "updated record");
        }
        Ok(updated.map(Stored::from))
    }

    /// Remove a record, returning how many were deleted (0 or 1).
    pub async fn delete(&self, id: &str) -> Result<u64, ServiceError> {
        let id = RecordId::parse(id)?;
        let deleted = self.store.delete(R::COLLECTION, id.clone()).await?;
        debug!(collection = R::COLLECTION, %id, deleted, "deleted record");
        Ok(deleted)
    }

    /// Reject references among `written` that name no existing record.
    async fn check_references(&self, record: &R, written: &[&str]) -> Result<(), ServiceError> {
        if self.policy == ReferencePolicy::Soft {
            return Ok(());
        }

        for reference in record.references() {
            if !written.contains(&reference.field) {
                continue;
            }
            let filter = Filter::all().with(reference.target_field, reference.value.clone());
            let matches = self.store.find(reference.collection, filter, &[]).await?;
            if matches.is_empty() {
                return Err(ServiceError::Validation(format!(
                    "{} `{}` is not known",
                    reference.label, reference.value
                )));
            }
        }
        Ok(())
    }
}
